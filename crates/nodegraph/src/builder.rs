//! Fluent builder for node networks
//!
//! Provides a compact way to assemble a network programmatically. Errors
//! (duplicate names, unknown ports, values of the wrong type) are collected
//! and reported by [`NetworkBuilder::build`].

use crate::error::{NodeGraphError, Result};
use crate::node::{Connection, Node};
use crate::port::{Port, PortType};
use crate::value::Value;

/// Fluent builder for constructing networks
///
/// # Example
///
/// ```ignore
/// let network = NetworkBuilder::new("net")
///     .node("number", "math/number")
///     .input("value", PortType::Float, 10.0)
///     .output("output", PortType::Float)
///     .node("negate", "math/negate")
///     .input("value", PortType::Float, 0.0)
///     .output("output", PortType::Float)
///     .connect("number", "output", "negate", "value")
///     .rendered_child("negate")
///     .build()?;
/// ```
pub struct NetworkBuilder {
    name: String,
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    rendered_child: Option<String>,
    error: Option<NodeGraphError>,
}

impl NetworkBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
            rendered_child: None,
            error: None,
        }
    }

    /// Add a child node bound to `function`
    pub fn node(mut self, name: &str, function: &str) -> Self {
        match Node::new(name) {
            Ok(node) => self.nodes.push(node.with_function(function)),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Add a prebuilt child node
    pub fn add_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add an input port holding `value` to the most recently added node
    pub fn input(self, name: &str, port_type: PortType, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.modify_last(|node| {
            let port = Port::new(name, port_type)?.with_value(value)?;
            node.with_input_added(port)
        })
    }

    /// Add a gathering input port to the most recently added node
    pub fn multiple_input(self, name: &str, port_type: PortType) -> Self {
        self.modify_last(|node| node.with_input_added(Port::new(name, port_type)?.multiple()))
    }

    /// Add an output port to the most recently added node
    pub fn output(self, name: &str, port_type: PortType) -> Self {
        self.modify_last(|node| node.with_output_added(Port::new(name, port_type)?))
    }

    pub fn connect(mut self, output_node: &str, output_port: &str, input_node: &str, input_port: &str) -> Self {
        self.connections
            .push(Connection::new(output_node, output_port, input_node, input_port));
        self
    }

    pub fn rendered_child(mut self, name: &str) -> Self {
        self.rendered_child = Some(name.to_string());
        self
    }

    /// Assemble the network, reporting the first error encountered
    pub fn build(self) -> Result<Node> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut network = Node::new(self.name)?;
        for node in self.nodes {
            network = network.with_child_added(node)?;
        }
        for connection in self.connections {
            network = network.with_connection_added(connection)?;
        }
        network.with_rendered_child(self.rendered_child.as_deref())
    }

    fn modify_last<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Node) -> Result<Node>,
    {
        if self.error.is_some() {
            return self;
        }
        let Some(last) = self.nodes.last_mut() else {
            self.fail(NodeGraphError::NodeNotFound(
                "ports must follow a node in the builder".into(),
            ));
            return self;
        };
        match f(last) {
            Ok(node) => *last = node,
            Err(e) => self.fail(e),
        }
        self
    }

    fn fail(&mut self, error: NodeGraphError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_network() {
        let network = NetworkBuilder::new("net")
            .node("a", "test/identity")
            .input("value", PortType::Float, 1.0)
            .output("output", PortType::Float)
            .node("b", "test/identity")
            .input("value", PortType::Float, 0.0)
            .output("output", PortType::Float)
            .connect("a", "output", "b", "value")
            .rendered_child("b")
            .build()
            .unwrap();

        assert_eq!(network.children().len(), 2);
        assert_eq!(network.connections().len(), 1);
        assert_eq!(network.rendered_child_name(), Some("b"));
        assert_eq!(network.child("a").unwrap().function(), Some("test/identity"));
    }

    #[test]
    fn test_errors_are_deferred() {
        let result = NetworkBuilder::new("net")
            .node("a", "test/identity")
            .input("value", PortType::Point, "not a point")
            .output("output", PortType::Float)
            .build();
        assert!(matches!(result, Err(NodeGraphError::TypeMismatch { .. })));

        let result = NetworkBuilder::new("net")
            .node("a", "test/identity")
            .connect("a", "output", "missing", "value")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_port_without_node() {
        let result = NetworkBuilder::new("net").output("output", PortType::Float).build();
        assert!(matches!(result, Err(NodeGraphError::NodeNotFound(_))));
    }
}
