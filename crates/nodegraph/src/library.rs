//! Node libraries: a root network plus the functions it renders against

use std::sync::Arc;

use crate::error::{NodeGraphError, Result};
use crate::function::FunctionRepository;
use crate::node::{self, Node};

/// One immutable version of an editable document
///
/// Cloning is cheap: the node tree and the repository are shared.
#[derive(Debug, Clone)]
pub struct NodeLibrary {
    name: String,
    root: Arc<Node>,
    repository: Arc<FunctionRepository>,
    version: u64,
}

impl NodeLibrary {
    /// Create a library whose root network derives from the root prototype
    pub fn new(name: impl Into<String>, repository: FunctionRepository) -> Result<Self> {
        let root = Node::new("root")?;
        Ok(Self::with_root_node(name, root, repository))
    }

    pub fn with_root_node(
        name: impl Into<String>,
        root: impl Into<Arc<Node>>,
        repository: FunctionRepository,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            repository: Arc::new(repository),
            version: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn repository(&self) -> &Arc<FunctionRepository> {
        &self.repository
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Look up a node by absolute path; `/` is the root network.
    pub fn node_at(&self, path: &str) -> Result<&Arc<Node>> {
        let mut current = &self.root;
        for segment in node::segments(path)? {
            current = current
                .child(segment)
                .ok_or_else(|| NodeGraphError::NodeNotFound(path.to_string()))?;
        }
        Ok(current)
    }

    /// A new version with a different root network
    pub fn with_root(&self, root: impl Into<Arc<Node>>) -> Self {
        Self {
            name: self.name.clone(),
            root: root.into(),
            repository: Arc::clone(&self.repository),
            version: self.version + 1,
        }
    }

    /// A new version with the node at `path` replaced. Only the nodes on the
    /// path to the root are rebuilt; every other subtree is shared.
    pub fn with_node_replaced(&self, path: &str, replacement: Node) -> Result<Self> {
        let segments = node::segments(path)?;
        let root = replace_at(&self.root, &segments, replacement, path)?;
        Ok(self.with_root(root))
    }

    /// Same content under a new version number, used when history is restored
    pub(crate) fn restamped(&self, version: u64) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    pub fn with_repository(&self, repository: FunctionRepository) -> Self {
        Self {
            name: self.name.clone(),
            root: Arc::clone(&self.root),
            repository: Arc::new(repository),
            version: self.version + 1,
        }
    }
}

fn replace_at(current: &Arc<Node>, segments: &[&str], replacement: Node, path: &str) -> Result<Node> {
    match segments.split_first() {
        None => Ok(replacement),
        Some((first, rest)) => {
            let child = current
                .child(first)
                .ok_or_else(|| NodeGraphError::NodeNotFound(path.to_string()))?;
            let new_child = replace_at(child, rest, replacement, path)?;
            current.with_child_replaced(first, new_child)
        }
    }
}
