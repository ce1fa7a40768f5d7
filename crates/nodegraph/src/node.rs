//! Persistent node tree
//!
//! A `Node` is an immutable value. Every `with_*` transformation returns a
//! new node and leaves the receiver untouched. Children are shared through
//! `Arc`, so an edit only copies the edited node itself; the unchanged
//! subtrees are reused by reference.
//!
//! Nodes are addressed by slash-separated paths relative to the library
//! root: `/` is the root network, `/a/b` is child `b` of child `a`.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{NodeGraphError, Result};
use crate::port::{Port, PortDirection};
use crate::value::{Point, Value};

/// Name of the canonical root prototype
pub const ROOT_NAME: &str = "_root";

/// Name given to nodes derived directly from the root prototype
pub const DEFAULT_NAME: &str = "node";

static ROOT: Lazy<Arc<Node>> = Lazy::new(|| {
    Arc::new(Node {
        prototype: None,
        name: ROOT_NAME.to_string(),
        description: String::new(),
        function: None,
        position: Point::ZERO,
        inputs: Vec::new(),
        outputs: Vec::new(),
        children: Vec::new(),
        connections: Vec::new(),
        rendered_child: None,
    })
});

/// A directed edge between two sibling nodes of one network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub output_node: String,
    pub output_port: String,
    pub input_node: String,
    pub input_port: String,
}

impl Connection {
    pub fn new(
        output_node: impl Into<String>,
        output_port: impl Into<String>,
        input_node: impl Into<String>,
        input_port: impl Into<String>,
    ) -> Self {
        Self {
            output_node: output_node.into(),
            output_port: output_port.into(),
            input_node: input_node.into(),
            input_port: input_port.into(),
        }
    }

    /// Whether this connection starts or ends at the named node
    pub fn touches(&self, node: &str) -> bool {
        self.output_node == node || self.input_node == node
    }

    fn renamed(&self, old: &str, new: &str) -> Self {
        let rename = |n: &String| if n == old { new.to_string() } else { n.clone() };
        Self {
            output_node: rename(&self.output_node),
            output_port: self.output_port.clone(),
            input_node: rename(&self.input_node),
            input_port: self.input_port.clone(),
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.output_node, self.output_port, self.input_node, self.input_port
        )
    }
}

/// An immutable graph element: ports, an optional function and an optional
/// child network
#[derive(Debug, Clone)]
pub struct Node {
    prototype: Option<Arc<Node>>,
    name: String,
    description: String,
    function: Option<String>,
    position: Point,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    children: Vec<Arc<Node>>,
    connections: Vec<Connection>,
    rendered_child: Option<String>,
}

impl Node {
    /// The shared root prototype every node derives from
    pub fn root() -> Arc<Node> {
        Arc::clone(&ROOT)
    }

    /// Derive a new node named `name` from the root prototype
    pub fn new(name: impl Into<String>) -> Result<Node> {
        Node::root().extend().with_name(name)
    }

    /// Derive a copy of this node that records it as its prototype.
    pub fn extend(self: &Arc<Self>) -> Node {
        let mut node = Node::clone(self);
        node.prototype = Some(Arc::clone(self));
        if node.name == ROOT_NAME {
            node.name = DEFAULT_NAME.to_string();
        }
        node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn prototype(&self) -> Option<&Arc<Node>> {
        self.prototype.as_ref()
    }

    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn rendered_child_name(&self) -> Option<&str> {
        self.rendered_child.as_deref()
    }

    pub fn rendered_child(&self) -> Option<&Arc<Node>> {
        self.rendered_child.as_deref().and_then(|name| self.child(name))
    }

    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name() == name)
    }

    pub fn child(&self, name: &str) -> Option<&Arc<Node>> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    pub fn is_network(&self) -> bool {
        !self.children.is_empty()
    }

    /// Connections feeding `input_node.input_port`, in insertion order
    pub fn incoming<'a>(
        &'a self,
        input_node: &'a str,
        input_port: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.input_node == input_node && c.input_port == input_port)
    }

    pub fn is_connected(&self, input_node: &str, input_port: &str) -> bool {
        self.incoming(input_node, input_port).next().is_some()
    }

    // --- Attribute transformations ---

    pub fn with_name(&self, name: impl Into<String>) -> Result<Node> {
        let name = name.into();
        validate_name(&name)?;
        let mut node = self.clone();
        node.name = name;
        Ok(node)
    }

    pub fn with_description(&self, description: impl Into<String>) -> Node {
        let mut node = self.clone();
        node.description = description.into();
        node
    }

    pub fn with_position(&self, position: Point) -> Node {
        let mut node = self.clone();
        node.position = position;
        node
    }

    pub fn with_function(&self, identifier: impl Into<String>) -> Node {
        let mut node = self.clone();
        node.function = Some(identifier.into());
        node
    }

    pub fn without_function(&self) -> Node {
        let mut node = self.clone();
        node.function = None;
        node
    }

    // --- Port transformations ---

    /// Add a port to the input or output group according to its direction
    pub fn with_port_added(&self, port: Port) -> Result<Node> {
        let group = match port.direction() {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        };
        if group.iter().any(|p| p.name() == port.name()) {
            return Err(NodeGraphError::DuplicateName {
                kind: "Port",
                name: port.name().to_string(),
                parent: self.name.clone(),
            });
        }
        let mut node = self.clone();
        match port.direction() {
            PortDirection::Input => node.inputs.push(port),
            PortDirection::Output => node.outputs.push(port),
        }
        Ok(node)
    }

    pub fn with_input_added(&self, port: Port) -> Result<Node> {
        if port.is_output() {
            return Err(NodeGraphError::InvalidPort(format!(
                "{} is an output port",
                port.name()
            )));
        }
        self.with_port_added(port)
    }

    pub fn with_output_added(&self, port: Port) -> Result<Node> {
        let port = if port.is_output() { port } else { port.output() };
        self.with_port_added(port)
    }

    pub fn with_input_removed(&self, name: &str) -> Result<Node> {
        let index = self.input_index(name)?;
        let mut node = self.clone();
        node.inputs.remove(index);
        Ok(node)
    }

    pub fn with_output_removed(&self, name: &str) -> Result<Node> {
        let index = self.output_index(name)?;
        let mut node = self.clone();
        node.outputs.remove(index);
        Ok(node)
    }

    /// Replace an input port in place, keeping its position in the argument order
    pub fn with_input_changed(&self, name: &str, port: Port) -> Result<Node> {
        let index = self.input_index(name)?;
        if port.name() != name && self.input(port.name()).is_some() {
            return Err(NodeGraphError::DuplicateName {
                kind: "Port",
                name: port.name().to_string(),
                parent: self.name.clone(),
            });
        }
        if port.is_output() {
            return Err(NodeGraphError::InvalidPort(format!(
                "{} is an output port",
                port.name()
            )));
        }
        let mut node = self.clone();
        node.inputs[index] = port;
        Ok(node)
    }

    pub fn with_output_changed(&self, name: &str, port: Port) -> Result<Node> {
        let index = self.output_index(name)?;
        if port.name() != name && self.output(port.name()).is_some() {
            return Err(NodeGraphError::DuplicateName {
                kind: "Port",
                name: port.name().to_string(),
                parent: self.name.clone(),
            });
        }
        let port = if port.is_output() { port } else { port.output() };
        let mut node = self.clone();
        node.outputs[index] = port;
        Ok(node)
    }

    pub fn with_input_renamed(&self, old: &str, new: &str) -> Result<Node> {
        let port = self.input(old).cloned().ok_or_else(|| self.port_missing(old))?;
        self.with_input_changed(old, port.renamed(new))
    }

    /// Set the stored value of an input port, coercing it to the port type
    pub fn with_input_value(&self, name: &str, value: Value) -> Result<Node> {
        let index = self.input_index(name)?;
        let port = self.inputs[index].clone().with_value(value)?;
        let mut node = self.clone();
        node.inputs[index] = port;
        Ok(node)
    }

    /// Set the stored value of an output port
    pub fn with_output_value(&self, name: &str, value: Value) -> Result<Node> {
        let index = self.output_index(name)?;
        let port = self.outputs[index].clone().with_value(value)?;
        let mut node = self.clone();
        node.outputs[index] = port;
        Ok(node)
    }

    // --- Child transformations ---

    pub fn with_child_added(&self, child: impl Into<Arc<Node>>) -> Result<Node> {
        let child = child.into();
        if self.has_child(&child.name) {
            return Err(NodeGraphError::DuplicateName {
                kind: "Node",
                name: child.name.clone(),
                parent: self.name.clone(),
            });
        }
        let mut node = self.clone();
        node.children.push(child);
        Ok(node)
    }

    /// Remove a child together with every connection that references it.
    pub fn with_child_removed(&self, name: &str) -> Result<Node> {
        let index = self.child_index(name)?;
        let mut node = self.clone();
        node.children.remove(index);
        node.connections.retain(|c| !c.touches(name));
        if node.rendered_child.as_deref() == Some(name) {
            node.rendered_child = None;
        }
        Ok(node)
    }

    /// Replace a child. If the replacement has a different name, connections
    /// and the rendered child follow it.
    pub fn with_child_replaced(&self, name: &str, child: impl Into<Arc<Node>>) -> Result<Node> {
        let child = child.into();
        let index = self.child_index(name)?;
        let new_name = child.name.clone();
        if new_name != name && self.has_child(&new_name) {
            return Err(NodeGraphError::DuplicateName {
                kind: "Node",
                name: new_name,
                parent: self.name.clone(),
            });
        }
        let mut node = self.clone();
        node.children[index] = child;
        if new_name != name {
            node.connections = node
                .connections
                .iter()
                .map(|c| c.renamed(name, &new_name))
                .collect();
            if node.rendered_child.as_deref() == Some(name) {
                node.rendered_child = Some(new_name);
            }
        }
        Ok(node)
    }

    pub fn with_child_renamed(&self, old: &str, new: &str) -> Result<Node> {
        let child = self
            .child(old)
            .ok_or_else(|| NodeGraphError::NodeNotFound(old.to_string()))?;
        let renamed = child.with_name(new)?;
        self.with_child_replaced(old, renamed)
    }

    /// Select the child that represents this network's output.
    pub fn with_rendered_child(&self, name: Option<&str>) -> Result<Node> {
        if let Some(name) = name {
            self.child_index(name)?;
        }
        let mut node = self.clone();
        node.rendered_child = name.map(str::to_string);
        Ok(node)
    }

    // --- Connection transformations ---

    /// Connect two children. A single-cardinality input keeps only the newest
    /// connection; a multiple-cardinality input appends unless the identical
    /// connection already exists.
    pub fn connect(
        &self,
        output_node: &str,
        output_port: &str,
        input_node: &str,
        input_port: &str,
    ) -> Result<Node> {
        self.with_connection_added(Connection::new(
            output_node,
            output_port,
            input_node,
            input_port,
        ))
    }

    pub fn with_connection_added(&self, connection: Connection) -> Result<Node> {
        let source = self
            .child(&connection.output_node)
            .ok_or_else(|| NodeGraphError::NodeNotFound(connection.output_node.clone()))?;
        if source.output(&connection.output_port).is_none() {
            return Err(NodeGraphError::port_not_found(
                &connection.output_node,
                &connection.output_port,
            ));
        }
        let target = self
            .child(&connection.input_node)
            .ok_or_else(|| NodeGraphError::NodeNotFound(connection.input_node.clone()))?;
        let port = target.input(&connection.input_port).ok_or_else(|| {
            NodeGraphError::port_not_found(&connection.input_node, &connection.input_port)
        })?;

        let mut node = self.clone();
        if port.is_multiple() {
            if node.connections.contains(&connection) {
                return Ok(node);
            }
        } else {
            node.connections.retain(|c| {
                !(c.input_node == connection.input_node && c.input_port == connection.input_port)
            });
        }
        node.connections.push(connection);
        Ok(node)
    }

    /// Remove exactly this connection
    pub fn disconnect(&self, connection: &Connection) -> Result<Node> {
        let index = self
            .connections
            .iter()
            .position(|c| c == connection)
            .ok_or_else(|| NodeGraphError::ConnectionNotFound(connection.to_string()))?;
        let mut node = self.clone();
        node.connections.remove(index);
        Ok(node)
    }

    // --- Helpers ---

    fn input_index(&self, name: &str) -> Result<usize> {
        self.inputs
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| self.port_missing(name))
    }

    fn output_index(&self, name: &str) -> Result<usize> {
        self.outputs
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| self.port_missing(name))
    }

    fn child_index(&self, name: &str) -> Result<usize> {
        self.children
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| NodeGraphError::NodeNotFound(name.to_string()))
    }

    fn port_missing(&self, port: &str) -> NodeGraphError {
        NodeGraphError::port_not_found(&self.name, port)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name == ROOT_NAME {
        return Err(NodeGraphError::ReservedName(name.to_string()));
    }
    if name.is_empty() || name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(NodeGraphError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Join a parent path and a child name
pub fn path(parent: &str, name: &str) -> String {
    if parent == "/" || parent.is_empty() {
        format!("/{name}")
    } else {
        format!("{}/{name}", parent.trim_end_matches('/'))
    }
}

/// Split an absolute path into its child names. `/` yields no segments.
pub fn segments(path: &str) -> Result<Vec<&str>> {
    if !path.starts_with('/') {
        return Err(NodeGraphError::NodeNotFound(format!(
            "{path} (paths must start with '/')"
        )));
    }
    Ok(path.split('/').filter(|s| !s.is_empty()).collect())
}
