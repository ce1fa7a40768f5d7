//! Network evaluation
//!
//! A [`NodeContext`] renders nodes against a [`FunctionRepository`]. Every
//! top-level call runs one render pass: a fresh map of visitation marks
//! (in progress / done) and a fresh results cache. Within a pass each node is
//! evaluated at most once. A node reached again while it is still in
//! progress closes a cycle; the walk stops there and readers see the node's
//! stored output values instead. Cycles are legal and never an error.
//!
//! Inputs are bound to the function positionally, in the order the node
//! declares its input ports. Connections only exist between siblings, so a
//! pass is scoped to one network.
//!
//! A list arriving over a connection at a port of a single-value type is
//! matched: the function runs once per item, up to the length of the
//! shortest such list, and every output becomes the list of per-call values.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{NodeGraphError, Result};
use crate::function::{Function, FunctionRepository, DEFAULT_OUTPUT};
use crate::library::NodeLibrary;
use crate::node::{self, Connection, Node};
use crate::port::{Port, PortType};
use crate::value::Value;

/// Output values of one node, keyed by port name
pub type PortValues = BTreeMap<String, Value>;

/// Output values of every node touched in a pass, keyed by node path
pub type RenderResults = HashMap<String, PortValues>;

const ZERO_FUNCTION: &str = "core/zero";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Renders nodes and keeps the results of the most recent pass
pub struct NodeContext {
    repository: Arc<FunctionRepository>,
    results: RenderResults,
}

impl NodeContext {
    pub fn new(repository: Arc<FunctionRepository>) -> Self {
        Self {
            repository,
            results: RenderResults::new(),
        }
    }

    /// Context rendering against a library's function repository
    pub fn for_library(library: &NodeLibrary) -> Self {
        Self::new(Arc::clone(library.repository()))
    }

    pub fn repository(&self) -> &Arc<FunctionRepository> {
        &self.repository
    }

    /// Evaluate exactly this node from its own port values and return its
    /// primary output.
    pub fn render(&mut self, node: &Node) -> Result<Option<Value>> {
        self.run(None, |pass| pass.render(node))?;
        Ok(self.primary_output(node))
    }

    /// Evaluate a node and return all of its outputs
    pub fn render_node(&mut self, node: &Node) -> Result<PortValues> {
        self.run(None, |pass| pass.render(node))?;
        Ok(self.node_results(node).cloned().unwrap_or_default())
    }

    /// Render the network's rendered child. A network without one renders
    /// to the value of `core/zero`.
    pub fn render_network(&mut self, network: &Node) -> Result<Option<Value>> {
        match network.rendered_child_name() {
            Some(child) => self.render_child(network, child),
            None => {
                self.results.clear();
                let zero = self.repository.function(ZERO_FUNCTION)?;
                zero.invoke(&[]).map_err(|source| NodeGraphError::Invocation {
                    function: ZERO_FUNCTION.to_string(),
                    source,
                })
            }
        }
    }

    /// Render one child, resolving its inputs through the network's connections
    pub fn render_child(&mut self, network: &Node, child: &str) -> Result<Option<Value>> {
        let child = network
            .child(child)
            .ok_or_else(|| NodeGraphError::NodeNotFound(node::path("/", child)))?;
        self.run(Some(network), |pass| pass.render(child))?;
        Ok(self.primary_output(child))
    }

    /// Render a node and return the value of one output port
    pub fn render_port(&mut self, node: &Node, port: &str) -> Result<Value> {
        if node.output(port).is_none() && !(node.outputs().is_empty() && port == DEFAULT_OUTPUT) {
            return Err(NodeGraphError::port_not_found(node.name(), port));
        }
        self.run(None, |pass| pass.render(node))?;
        self.result(node, port)
            .cloned()
            .or_else(|| node.output(port).and_then(Port::value).cloned())
            .ok_or_else(|| NodeGraphError::MissingValue {
                node: node.name().to_string(),
                port: port.to_string(),
            })
    }

    /// Every `(node path, port) -> value` produced by the last pass
    pub fn results(&self) -> &RenderResults {
        &self.results
    }

    pub fn node_results(&self, node: &Node) -> Option<&PortValues> {
        self.results.get(&node::path("/", node.name()))
    }

    pub fn result(&self, node: &Node, port: &str) -> Option<&Value> {
        self.node_results(node).and_then(|values| values.get(port))
    }

    fn run<F>(&mut self, network: Option<&Node>, f: F) -> Result<()>
    where
        F: FnOnce(&mut RenderPass<'_>) -> Result<()>,
    {
        let repository = Arc::clone(&self.repository);
        let mut pass = RenderPass {
            repository: &repository,
            network,
            marks: HashMap::new(),
            results: RenderResults::new(),
        };
        log::debug!(
            "Render pass started in {}",
            network.map(Node::name).unwrap_or("<detached>")
        );
        let outcome = f(&mut pass);
        log::debug!(
            "Render pass finished: {} nodes evaluated, {}",
            pass.marks.len(),
            if outcome.is_ok() { "ok" } else { "failed" }
        );
        // Partial results stay inspectable after a failure.
        self.results = pass.results;
        outcome
    }

    fn primary_output(&self, node: &Node) -> Option<Value> {
        let values = self.node_results(node);
        match node.outputs().first() {
            Some(port) => values
                .and_then(|v| v.get(port.name()))
                .or_else(|| port.value())
                .cloned(),
            None => values.and_then(|v| v.get(DEFAULT_OUTPUT)).cloned(),
        }
    }
}

/// Per-call evaluation state. Never shared between passes.
struct RenderPass<'a> {
    repository: &'a FunctionRepository,
    network: Option<&'a Node>,
    marks: HashMap<String, Mark>,
    results: RenderResults,
}

impl RenderPass<'_> {
    fn render(&mut self, node: &Node) -> Result<()> {
        let path = node::path("/", node.name());
        match self.marks.get(node.name()) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                log::debug!("Cycle reached {}; using its stored outputs", path);
                return Ok(());
            }
            None => {}
        }

        self.marks.insert(node.name().to_string(), Mark::InProgress);
        log::trace!("Evaluating {}", path);
        let outcome = self.evaluate(node, &path);
        self.marks.insert(node.name().to_string(), Mark::Done);
        outcome.map_err(|e| e.at_node(path))
    }

    fn evaluate(&mut self, node: &Node, path: &str) -> Result<()> {
        let Some(identifier) = node.function() else {
            log::trace!("{} has no function", path);
            return Ok(());
        };

        let mut inputs = Vec::with_capacity(node.inputs().len());
        for port in node.inputs() {
            inputs.push(self.input_value(node, port)?);
        }

        let function = self.repository.function(identifier)?;
        let arity = function.arity();
        if !arity.accepts(inputs.len()) {
            return Err(NodeGraphError::ArityMismatch {
                function: identifier.to_string(),
                expected: arity.to_string(),
                actual: inputs.len(),
            });
        }

        let span = inputs
            .iter()
            .filter_map(|input| match input {
                Input::Matched(items) => Some(items.len()),
                Input::Single(_) => None,
            })
            .min();
        let Some(span) = span else {
            let args = inputs.into_iter().map(Input::into_single).collect();
            let outputs = invoke(identifier, function.as_ref(), node.outputs(), args)?;
            self.results.insert(path.to_string(), outputs);
            return Ok(());
        };

        // Call once per item of the shortest matched list, repeating single
        // values, and collect each output into a list.
        log::trace!("{} matches lists over {} items", path, span);
        let mut gathered: BTreeMap<String, Vec<Value>> = match node.outputs() {
            [] => BTreeMap::from([(DEFAULT_OUTPUT.to_string(), Vec::new())]),
            ports => ports.iter().map(|p| (p.name().to_string(), Vec::new())).collect(),
        };
        for i in 0..span {
            let args = inputs.iter().map(|input| input.item(i)).collect();
            for (port, value) in invoke(identifier, function.as_ref(), node.outputs(), args)? {
                gathered.entry(port).or_default().push(value);
            }
        }
        let outputs = gathered
            .into_iter()
            .map(|(port, values)| (port, Value::List(values)))
            .collect();
        self.results.insert(path.to_string(), outputs);
        Ok(())
    }

    fn input_value(&mut self, node: &Node, port: &Port) -> Result<Input> {
        let incoming: Vec<Connection> = match self.network {
            Some(network) => network.incoming(node.name(), port.name()).cloned().collect(),
            None => Vec::new(),
        };

        if port.is_multiple() {
            let item_type = match port.port_type() {
                PortType::List => PortType::Any,
                other => other.clone(),
            };
            let mut items = Vec::new();
            for connection in &incoming {
                match self.upstream_value(connection)? {
                    Value::List(values) => {
                        for value in values {
                            items.push(value.coerce(&item_type)?);
                        }
                    }
                    value => items.push(value.coerce(&item_type)?),
                }
            }
            return Ok(Input::Single(Value::List(items)));
        }

        match incoming.first() {
            Some(connection) => match self.upstream_value(connection)? {
                Value::List(items) if is_matched(&items, port.port_type()) => items
                    .into_iter()
                    .map(|item| item.coerce(port.port_type()))
                    .collect::<Result<Vec<_>>>()
                    .map(Input::Matched),
                value => value.coerce(port.port_type()).map(Input::Single),
            },
            None => port
                .value()
                .cloned()
                .map(Input::Single)
                .ok_or_else(|| NodeGraphError::MissingValue {
                    node: node.name().to_string(),
                    port: port.name().to_string(),
                }),
        }
    }

    fn upstream_value(&mut self, connection: &Connection) -> Result<Value> {
        let network = self
            .network
            .ok_or_else(|| NodeGraphError::NodeNotFound(connection.output_node.clone()))?;
        let upstream = network
            .child(&connection.output_node)
            .ok_or_else(|| NodeGraphError::NodeNotFound(connection.output_node.clone()))?;
        self.render(upstream)?;

        let computed = self
            .results
            .get(&node::path("/", upstream.name()))
            .and_then(|values| values.get(&connection.output_port));
        if let Some(value) = computed {
            return Ok(value.clone());
        }
        let port = upstream
            .output(&connection.output_port)
            .ok_or_else(|| NodeGraphError::port_not_found(upstream.name(), &connection.output_port))?;
        port.value().cloned().ok_or_else(|| NodeGraphError::MissingValue {
            node: upstream.name().to_string(),
            port: port.name().to_string(),
        })
    }
}

/// A resolved input port: one value, or a list whose items are fed to the
/// function one call at a time.
enum Input {
    Single(Value),
    Matched(Vec<Value>),
}

impl Input {
    fn item(&self, i: usize) -> Value {
        match self {
            Input::Single(value) => value.clone(),
            Input::Matched(items) => items[i].clone(),
        }
    }

    fn into_single(self) -> Value {
        match self {
            Input::Single(value) => value,
            Input::Matched(items) => Value::List(items),
        }
    }
}

/// Whether a list arriving at a port of this type is iterated rather than
/// passed whole. `list`, `any` and custom ports take lists as they are; a
/// pair of numbers on a point port is a point.
fn is_matched(items: &[Value], port_type: &PortType) -> bool {
    match port_type {
        PortType::List | PortType::Any | PortType::Custom(_) => false,
        PortType::Point => {
            !(items.len() == 2 && items.iter().all(|v| matches!(v, Value::Int(_) | Value::Float(_))))
        }
        _ => true,
    }
}

fn invoke(
    identifier: &str,
    function: &dyn Function,
    outputs: &[Port],
    args: Vec<Value>,
) -> Result<PortValues> {
    let args = args
        .into_iter()
        .enumerate()
        .map(|(i, value)| value.coerce(&function.argument_type(i)))
        .collect::<Result<Vec<_>>>()?;
    let returned = function
        .invoke(&args)
        .map_err(|source| NodeGraphError::Invocation {
            function: identifier.to_string(),
            source,
        })?;
    assign_outputs(identifier, outputs, returned)
}

/// Distribute a function's return value over the node's output ports.
fn assign_outputs(identifier: &str, outputs: &[Port], returned: Option<Value>) -> Result<PortValues> {
    let mut values = PortValues::new();
    let Some(value) = returned else {
        return Ok(values);
    };
    match outputs {
        [] => {
            values.insert(DEFAULT_OUTPUT.to_string(), value);
        }
        [port] => {
            values.insert(port.name().to_string(), value.coerce(port.port_type())?);
        }
        ports => match value {
            Value::List(items) if items.len() == ports.len() => {
                for (port, item) in ports.iter().zip(items) {
                    values.insert(port.name().to_string(), item.coerce(port.port_type())?);
                }
            }
            Value::List(items) => {
                return Err(NodeGraphError::OutputMismatch {
                    function: identifier.to_string(),
                    expected: ports.len(),
                    actual: items.len(),
                })
            }
            single => {
                let port = &ports[0];
                values.insert(port.name().to_string(), single.coerce(port.port_type())?);
            }
        },
    }
    Ok(values)
}
