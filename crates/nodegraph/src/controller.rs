//! Structural editing
//!
//! [`NodeLibraryController`] applies one edit at a time to the current
//! [`NodeLibrary`]. Each edit either commits a complete new version or fails
//! and leaves the current version untouched. Listeners are notified after
//! the commit, and never for a failed edit.
//!
//! # Usage
//!
//! ```ignore
//! let mut controller = NodeLibraryController::new(library);
//! controller.add_node("/", number)?;
//! let name = controller.create_node("/", &prototype)?;
//! controller.connect("/", "number", "output", &name, "value")?;
//! ```

use std::sync::Arc;

use crate::error::Result;
use crate::events::{ListenerId, ListenerRegistry, NodeEvent, NodeEventListener};
use crate::library::NodeLibrary;
use crate::node::{Connection, Node};
use crate::undo::UndoStack;
use crate::value::Value;

/// Controller options
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Number of library versions kept for undo
    pub undo_limit: usize,
}

impl ControllerConfig {
    pub fn with_undo_limit(mut self, undo_limit: usize) -> Self {
        self.undo_limit = undo_limit.max(1);
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { undo_limit: 100 }
    }
}

/// Applies structural edits to a node library
pub struct NodeLibraryController {
    library: NodeLibrary,
    listeners: ListenerRegistry,
    history: UndoStack,
}

impl NodeLibraryController {
    pub fn new(library: NodeLibrary) -> Self {
        Self::with_config(library, ControllerConfig::default())
    }

    pub fn with_config(library: NodeLibrary, config: ControllerConfig) -> Self {
        let mut history = UndoStack::new(config.undo_limit);
        history.push(library.clone());
        Self {
            library,
            listeners: ListenerRegistry::new(),
            history,
        }
    }

    /// The current committed version
    pub fn library(&self) -> &NodeLibrary {
        &self.library
    }

    pub fn node_at(&self, path: &str) -> Result<&Arc<Node>> {
        self.library.node_at(path)
    }

    pub fn add_listener<L: NodeEventListener + 'static>(&self, listener: &Arc<L>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Add a node under `parent`. Fails if a sibling has the same name.
    pub fn add_node(&mut self, parent: &str, node: impl Into<Arc<Node>>) -> Result<()> {
        let node = node.into();
        let name = node.name().to_string();
        let next = self.edit(parent, |network| network.with_child_added(node))?;
        self.commit(next, |version| NodeEvent::NodeAdded {
            parent: parent.to_string(),
            node: name,
            version,
        });
        Ok(())
    }

    /// Derive a node from `prototype` and add it under a fresh name: the
    /// prototype's name followed by the smallest unused positive number.
    pub fn create_node(&mut self, parent: &str, prototype: &Arc<Node>) -> Result<String> {
        let network = self.library.node_at(parent)?;
        let name = unique_name(network, prototype.name());
        let node = prototype.extend().with_name(&name)?;
        self.add_node(parent, node)?;
        Ok(name)
    }

    /// Remove a node and every connection that references it
    pub fn remove_node(&mut self, parent: &str, name: &str) -> Result<()> {
        let next = self.edit(parent, |network| network.with_child_removed(name))?;
        self.commit(next, |version| NodeEvent::NodeRemoved {
            parent: parent.to_string(),
            node: name.to_string(),
            version,
        });
        Ok(())
    }

    pub fn rename_node(&mut self, parent: &str, old_name: &str, new_name: &str) -> Result<()> {
        let next = self.edit(parent, |network| network.with_child_renamed(old_name, new_name))?;
        self.commit(next, |version| NodeEvent::NodeRenamed {
            parent: parent.to_string(),
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            version,
        });
        Ok(())
    }

    /// Set the stored value of an input port on the node at `node_path`
    pub fn set_port_value(&mut self, node_path: &str, port: &str, value: Value) -> Result<()> {
        let next = self.edit(node_path, |node| node.with_input_value(port, value))?;
        self.commit(next, |version| NodeEvent::PortValueChanged {
            node: node_path.to_string(),
            port: port.to_string(),
            version,
        });
        Ok(())
    }

    pub fn set_rendered_child(&mut self, parent: &str, child: Option<&str>) -> Result<()> {
        let next = self.edit(parent, |network| network.with_rendered_child(child))?;
        self.commit(next, |version| NodeEvent::RenderedChildChanged {
            parent: parent.to_string(),
            rendered_child: child.map(str::to_string),
            version,
        });
        Ok(())
    }

    /// Connect two siblings of the network at `parent`. A connection into a
    /// single-cardinality port supersedes the previous one.
    pub fn connect(
        &mut self,
        parent: &str,
        output_node: &str,
        output_port: &str,
        input_node: &str,
        input_port: &str,
    ) -> Result<Connection> {
        let connection = Connection::new(output_node, output_port, input_node, input_port);
        let next = self.edit(parent, |network| network.with_connection_added(connection.clone()))?;
        self.commit(next, |version| NodeEvent::ConnectionAdded {
            parent: parent.to_string(),
            connection: connection.clone(),
            version,
        });
        Ok(connection)
    }

    pub fn disconnect(&mut self, parent: &str, connection: &Connection) -> Result<()> {
        let next = self.edit(parent, |network| network.disconnect(connection))?;
        self.commit(next, |version| NodeEvent::ConnectionRemoved {
            parent: parent.to_string(),
            connection: connection.clone(),
            version,
        });
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous version. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(previous);
        true
    }

    /// Re-apply an undone version. Returns false if there is none.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(next);
        true
    }

    fn edit<F>(&self, path: &str, f: F) -> Result<NodeLibrary>
    where
        F: FnOnce(&Node) -> Result<Node>,
    {
        let node = self.library.node_at(path)?;
        let replacement = f(node)?;
        self.library.with_node_replaced(path, replacement)
    }

    fn commit<F>(&mut self, library: NodeLibrary, event: F)
    where
        F: FnOnce(u64) -> NodeEvent,
    {
        self.library = library;
        self.history.push(self.library.clone());
        let event = event(self.library.version());
        log::debug!("Committed version {}: {:?}", self.library.version(), event);
        self.listeners.dispatch(&event);
    }

    fn restore(&mut self, library: NodeLibrary) {
        // Versions only move forward, even when content moves back.
        self.library = library.restamped(self.library.version() + 1);
        let version = self.library.version();
        log::debug!("Restored library history as version {}", version);
        self.listeners.dispatch(&NodeEvent::LibraryRestored { version });
    }
}

/// `base` followed by the smallest positive integer not used by a child
fn unique_name(network: &Node, base: &str) -> String {
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !network.has_child(candidate))
        .unwrap_or_else(|| base.to_string())
}
