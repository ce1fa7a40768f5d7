//! Undo/redo over committed library versions
//!
//! Libraries are immutable and share unchanged subtrees, so keeping a
//! version is as cheap as keeping a handle to it. The stack therefore stores
//! whole `NodeLibrary` values rather than edit commands.

use std::collections::VecDeque;

use crate::library::NodeLibrary;

/// Undo/redo stack of library versions
#[derive(Debug)]
pub struct UndoStack {
    versions: VecDeque<NodeLibrary>,
    /// Index of the version currently shown
    current: usize,
    max_versions: usize,
}

impl UndoStack {
    /// Create a stack that remembers at most `max_versions` versions
    pub fn new(max_versions: usize) -> Self {
        Self {
            versions: VecDeque::new(),
            current: 0,
            max_versions: max_versions.max(1),
        }
    }

    /// Record a newly committed version, discarding any redo history.
    pub fn push(&mut self, library: NodeLibrary) {
        self.versions.truncate(self.current + 1);
        self.versions.push_back(library);
        self.current = self.versions.len() - 1;

        while self.versions.len() > self.max_versions {
            self.versions.pop_front();
            self.current = self.current.saturating_sub(1);
        }
    }

    /// Step back one version
    pub fn undo(&mut self) -> Option<&NodeLibrary> {
        if self.can_undo() {
            self.current -= 1;
            self.versions.get(self.current)
        } else {
            None
        }
    }

    /// Step forward one version
    pub fn redo(&mut self) -> Option<&NodeLibrary> {
        if self.can_redo() {
            self.current += 1;
            self.versions.get(self.current)
        } else {
            None
        }
    }

    pub fn current(&self) -> Option<&NodeLibrary> {
        self.versions.get(self.current)
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.versions.len()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn clear(&mut self) {
        self.versions.clear();
        self.current = 0;
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionRepository;
    use crate::node::Node;

    fn make_library(name: &str) -> NodeLibrary {
        NodeLibrary::with_root_node(name, Node::new("root").unwrap(), FunctionRepository::core())
    }

    #[test]
    fn test_push_and_undo() {
        let mut stack = UndoStack::new(10);
        stack.push(make_library("first"));
        stack.push(make_library("second"));
        stack.push(make_library("third"));

        assert_eq!(stack.current().unwrap().name(), "third");
        assert_eq!(stack.undo().unwrap().name(), "second");
        assert_eq!(stack.undo().unwrap().name(), "first");
        assert!(stack.undo().is_none());
    }

    #[test]
    fn test_redo() {
        let mut stack = UndoStack::new(10);
        stack.push(make_library("first"));
        stack.push(make_library("second"));

        stack.undo();
        assert_eq!(stack.redo().unwrap().name(), "second");
        assert!(stack.redo().is_none());
    }

    #[test]
    fn test_push_truncates_redo() {
        let mut stack = UndoStack::new(10);
        stack.push(make_library("first"));
        stack.push(make_library("second"));
        stack.undo();

        stack.push(make_library("third"));
        assert!(!stack.can_redo());
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.current().unwrap().name(), "third");
    }

    #[test]
    fn test_max_versions() {
        let mut stack = UndoStack::new(3);
        for i in 0..5 {
            stack.push(make_library(&format!("library_{i}")));
        }

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.current().unwrap().name(), "library_4");
        stack.undo();
        stack.undo();
        assert!(!stack.can_undo());
        assert_eq!(stack.current().unwrap().name(), "library_2");
    }

    #[test]
    fn test_can_undo_redo() {
        let mut stack = UndoStack::new(10);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());

        stack.push(make_library("first"));
        assert!(!stack.can_undo());

        stack.push(make_library("second"));
        assert!(stack.can_undo());
        assert!(!stack.can_redo());

        stack.undo();
        assert!(!stack.can_undo());
        assert!(stack.can_redo());
    }
}
