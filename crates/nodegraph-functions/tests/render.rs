//! End-to-end rendering against the standard libraries

use std::io::Write;
use std::sync::Arc;

use nodegraph::{
    Connection, EventLog, Node, NodeContext, NodeGraphError, NodeLibrary, NodeLibraryController,
    Point, Port, PortType, Value,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn context() -> NodeContext {
    init_logging();
    NodeContext::new(Arc::new(nodegraph_functions::repository()))
}

fn float_node(name: &str, function: &str, inputs: &[(&str, f64)]) -> Node {
    let mut node = Node::new(name).unwrap().with_function(function);
    for (port, value) in inputs {
        node = node.with_input_added(Port::float(*port, *value).unwrap()).unwrap();
    }
    node.with_output_added(Port::new("output", PortType::Float).unwrap())
        .unwrap()
}

#[test]
fn test_add_binds_every_input() {
    let mut ctx = context();
    let node = Node::new("add")
        .unwrap()
        .with_function("math/add")
        .with_input_added(Port::int("v1", 1).unwrap())
        .unwrap()
        .with_input_added(Port::int("v2", 2).unwrap())
        .unwrap()
        .with_input_added(Port::int("v3", 3).unwrap())
        .unwrap()
        .with_output_added(Port::new("output", PortType::Float).unwrap())
        .unwrap();

    assert_eq!(ctx.render(&node).unwrap(), Some(Value::Float(6.0)));
}

#[test]
fn test_inputs_bind_in_declaration_order() {
    let mut ctx = context();

    let a_then_b = float_node("subtract", "math/subtract", &[("a", 10.0), ("b", 3.0)]);
    assert_eq!(ctx.render(&a_then_b).unwrap(), Some(Value::Float(7.0)));

    let b_then_a = float_node("subtract", "math/subtract", &[("b", 3.0), ("a", 10.0)]);
    assert_eq!(ctx.render(&b_then_a).unwrap(), Some(Value::Float(-7.0)));
}

#[test]
fn test_multiple_outputs() {
    let mut ctx = context();
    let node = ctx
        .repository()
        .node_for_function("corevector/pointToValues")
        .unwrap()
        .with_input_value("point1", Value::Point(Point::new(11.0, 22.0)))
        .unwrap();

    let outputs = ctx.render_node(&node).unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs.get("x"), Some(&Value::Float(11.0)));
    assert_eq!(outputs.get("y"), Some(&Value::Float(22.0)));
    assert_eq!(ctx.render_port(&node, "y").unwrap(), Value::Float(22.0));
}

#[test]
fn test_unresolved_functions() {
    let repository = nodegraph_functions::repository();
    for identifier in ["badnamespace/foo", "math/doesNotExist"] {
        let err = repository.function(identifier).err().unwrap();
        assert!(matches!(err, NodeGraphError::UnresolvedFunction { .. }));
    }

    let mut ctx = context();
    let node = Node::new("broken").unwrap().with_function("badnamespace/foo");
    let err = ctx.render(&node).unwrap_err();
    assert!(matches!(err, NodeGraphError::NodeRender { ref path, .. } if path == "/broken"));
    assert!(matches!(
        err.root_cause(),
        NodeGraphError::UnresolvedFunction { .. }
    ));
    assert_eq!(
        err.root_cause().to_string(),
        "Could not find function badnamespace/foo: unknown namespace."
    );
}

#[test]
fn test_list_flows_between_nodes() {
    let mut ctx = context();
    let numbers = Node::new("numbers")
        .unwrap()
        .with_function("math/makeNumbers")
        .with_input_added(Port::string("string", "1 2 3 4").unwrap())
        .unwrap()
        .with_output_added(Port::new("output", PortType::List).unwrap())
        .unwrap();
    let sum = Node::new("sum")
        .unwrap()
        .with_function("math/sum")
        .with_input_added(Port::new("values", PortType::List).unwrap())
        .unwrap()
        .with_output_added(Port::new("output", PortType::Float).unwrap())
        .unwrap();
    let network = Node::new("net")
        .unwrap()
        .with_child_added(numbers)
        .unwrap()
        .with_child_added(sum)
        .unwrap()
        .connect("numbers", "output", "sum", "values")
        .unwrap()
        .with_rendered_child(Some("sum"))
        .unwrap();

    assert_eq!(ctx.render_network(&network).unwrap(), Some(Value::Float(10.0)));
    assert!(ctx.results().contains_key("/numbers"));
}

#[test]
fn test_multiple_port_gathers_in_connection_order() {
    let mut ctx = context();
    let make = |name: &str, s: &str| {
        Node::new(name)
            .unwrap()
            .with_function("data/makeStrings")
            .with_input_added(Port::string("string", s).unwrap())
            .unwrap()
            .with_input_added(Port::string("separator", ",").unwrap())
            .unwrap()
            .with_output_added(Port::new("output", PortType::List).unwrap())
            .unwrap()
    };
    let combine = Node::new("combine")
        .unwrap()
        .with_function("list/combine")
        .with_input_added(Port::new("lists", PortType::List).unwrap().multiple())
        .unwrap()
        .with_output_added(Port::new("output", PortType::List).unwrap())
        .unwrap();
    let network = Node::new("net")
        .unwrap()
        .with_child_added(make("first", "a,b"))
        .unwrap()
        .with_child_added(make("second", "c"))
        .unwrap()
        .with_child_added(combine)
        .unwrap()
        .connect("second", "output", "combine", "lists")
        .unwrap()
        .connect("first", "output", "combine", "lists")
        .unwrap();

    assert_eq!(network.connections().len(), 2);
    let expected = Value::List(vec![Value::from("c"), Value::from("a"), Value::from("b")]);
    assert_eq!(
        ctx.render_child(&network, "combine").unwrap(),
        Some(expected)
    );
}

#[test]
fn test_cycle_is_evaluated_once() {
    let mut ctx = context();
    let a = float_node("a", "math/add", &[("value", 1.0), ("other", 0.0)])
        .with_output_value("output", Value::Float(5.0))
        .unwrap();
    let b = float_node("b", "math/invert", &[("value", 0.0)]);
    let network = Node::new("net")
        .unwrap()
        .with_child_added(a)
        .unwrap()
        .with_child_added(b)
        .unwrap()
        .connect("b", "output", "a", "other")
        .unwrap()
        .connect("a", "output", "b", "value")
        .unwrap()
        .with_rendered_child(Some("a"))
        .unwrap();

    // b reads a's stored output (5), so a = 1 + -5.
    let first = ctx.render_network(&network).unwrap();
    assert_eq!(first, Some(Value::Float(-4.0)));
    assert_eq!(ctx.results()["/b"]["output"], Value::Float(-5.0));

    let second = ctx.render_network(&network).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rendering_is_deterministic() {
    let mut ctx = context();
    let node = float_node("multiply", "math/multiply", &[("a", 2.5), ("b", 4.0)]);
    let first = ctx.render_node(&node).unwrap();
    let second = ctx.render_node(&node).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.get("output"), Some(&Value::Float(10.0)));
}

#[test]
fn test_invocation_error_names_the_node() {
    let mut ctx = context();
    let divide = float_node("divide", "math/divide", &[("a", 1.0), ("b", 0.0)]);
    let network = Node::new("net")
        .unwrap()
        .with_child_added(divide)
        .unwrap()
        .with_rendered_child(Some("divide"))
        .unwrap();

    let err = ctx.render_network(&network).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error rendering node /divide: Error while invoking math/divide: Division by zero"
    );
}

#[test]
fn test_arity_mismatch() {
    let mut ctx = context();
    let node = float_node("invert", "math/invert", &[("a", 1.0), ("b", 2.0)]);
    let err = ctx.render(&node).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        NodeGraphError::ArityMismatch { actual: 2, .. }
    ));
}

#[test]
fn test_controller_edits_render() {
    init_logging();
    let library = NodeLibrary::new("doc", nodegraph_functions::repository()).unwrap();
    let mut controller = NodeLibraryController::new(library);
    let prototype = Arc::new(
        controller
            .library()
            .repository()
            .node_for_function("math/subtract")
            .unwrap(),
    );

    let first = controller.create_node("/", &prototype).unwrap();
    let second = controller.create_node("/", &prototype).unwrap();
    assert_eq!(first, "subtract1");
    assert_eq!(second, "subtract2");

    controller
        .set_port_value("/subtract1", "float1", Value::Int(10))
        .unwrap();
    controller
        .set_port_value("/subtract1", "float2", Value::Int(3))
        .unwrap();
    let connection: Connection = controller
        .connect("/", "subtract1", "output", "subtract2", "float1")
        .unwrap();
    assert_eq!(connection.to_string(), "subtract1.output -> subtract2.float1");
    controller.set_rendered_child("/", Some("subtract2")).unwrap();

    let mut ctx = NodeContext::for_library(controller.library());
    let root = Arc::clone(controller.library().root());
    assert_eq!(ctx.render_network(&root).unwrap(), Some(Value::Float(7.0)));

    assert!(controller.undo());
    let root = Arc::clone(controller.library().root());
    assert_eq!(root.rendered_child_name(), None);
    assert_eq!(ctx.render_network(&root).unwrap(), Some(Value::Float(0.0)));
}

#[test]
fn test_controller_events_serialize() {
    init_logging();
    let library = NodeLibrary::new("doc", nodegraph_functions::repository()).unwrap();
    let mut controller = NodeLibraryController::new(library);
    let log = Arc::new(EventLog::new());
    controller.add_listener(&log);

    let prototype = Arc::new(
        controller
            .library()
            .repository()
            .node_for_function("math/invert")
            .unwrap(),
    );
    controller.create_node("/", &prototype).unwrap();
    controller
        .set_port_value("/invert1", "float1", Value::Float(2.0))
        .unwrap();

    let events: Vec<_> = log
        .events()
        .iter()
        .map(|event| serde_json::to_value(event).unwrap())
        .collect();
    assert_eq!(
        events,
        vec![
            serde_json::json!({"type": "nodeAdded", "parent": "/", "node": "invert1", "version": 1}),
            serde_json::json!({"type": "portValueChanged", "node": "/invert1", "port": "float1", "version": 2}),
        ]
    );
}

#[test]
fn test_script_library_renders_with_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shapes.js");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[{{ name: 'square', fn: function (x) {{ return x * x; }} }}]").unwrap();

    let script = nodegraph::load_library(&path).unwrap();
    let repository = nodegraph_functions::repository().with_library(script);
    assert!(repository.has_function("shapes/square"));
    assert!(repository.has_function("math/makeNumbers"));

    init_logging();
    let mut ctx = NodeContext::new(Arc::new(repository));
    let numbers = Node::new("numbers")
        .unwrap()
        .with_function("math/makeNumbers")
        .with_input_added(Port::string("string", "1 2 3").unwrap())
        .unwrap()
        .with_output_added(Port::new("output", PortType::List).unwrap())
        .unwrap();
    let square = float_node("square", "shapes/square", &[("value", 0.0)]);
    let network = Node::new("net")
        .unwrap()
        .with_child_added(numbers)
        .unwrap()
        .with_child_added(square)
        .unwrap()
        .connect("numbers", "output", "square", "value")
        .unwrap()
        .with_rendered_child(Some("square"))
        .unwrap();

    let expected = Value::List(vec![Value::Float(1.0), Value::Float(4.0), Value::Float(9.0)]);
    assert_eq!(ctx.render_network(&network).unwrap(), Some(expected));
}

#[test]
fn test_list_matching_chains_through_nodes() {
    let mut ctx = context();
    let numbers = Node::new("numbers")
        .unwrap()
        .with_function("math/makeNumbers")
        .with_input_added(Port::string("string", "1 2 3 4").unwrap())
        .unwrap()
        .with_output_added(Port::new("output", PortType::List).unwrap())
        .unwrap();
    let sum = Node::new("sum")
        .unwrap()
        .with_function("math/sum")
        .with_input_added(Port::new("values", PortType::List).unwrap())
        .unwrap()
        .with_output_added(Port::new("output", PortType::Float).unwrap())
        .unwrap();
    let network = Node::new("net")
        .unwrap()
        .with_child_added(numbers)
        .unwrap()
        .with_child_added(float_node("invert", "math/invert", &[("value", 0.0)]))
        .unwrap()
        .with_child_added(sum)
        .unwrap()
        .connect("numbers", "output", "invert", "value")
        .unwrap()
        .connect("invert", "output", "sum", "values")
        .unwrap()
        .with_rendered_child(Some("sum"))
        .unwrap();

    assert_eq!(ctx.render_network(&network).unwrap(), Some(Value::Float(-10.0)));
    let inverted = Value::List(vec![
        Value::Float(-1.0),
        Value::Float(-2.0),
        Value::Float(-3.0),
        Value::Float(-4.0),
    ]);
    assert_eq!(ctx.results()["/invert"]["output"], inverted);
}
