//! NodeGraph - dataflow network evaluation for procedural graphics
//!
//! This crate provides an immutable node model and a pull-based evaluator.
//! It supports:
//!
//! - Prototype-based nodes with typed input and output ports
//! - Networks of child nodes wired by connections
//! - Function libraries resolved by `namespace/function` identifiers
//! - Native (Rust) and script (JavaScript) function libraries
//! - Per-render memoization and cycle short-circuiting
//! - Versioned editing with change events and undo/redo
//!
//! # Architecture
//!
//! - `Node`: persistent value; every edit returns a new node
//! - `NodeLibrary`: one version of a document (root network plus functions)
//! - `NodeContext`: renders nodes against a `FunctionRepository`
//! - `NodeLibraryController`: commits edits and notifies listeners
//!
//! # Example
//!
//! ```ignore
//! use nodegraph::{FunctionRepository, NetworkBuilder, NodeContext, PortType};
//! use std::sync::Arc;
//!
//! let network = NetworkBuilder::new("net")
//!     .node("add", "math/add")
//!     .input("value1", PortType::Float, 1.0)
//!     .input("value2", PortType::Float, 2.0)
//!     .output("output", PortType::Float)
//!     .rendered_child("add")
//!     .build()?;
//!
//! let mut context = NodeContext::new(Arc::new(FunctionRepository::with_builtins()));
//! let sum = context.render_network(&network)?;
//! ```

pub mod builder;
pub mod context;
pub mod controller;
pub mod error;
pub mod events;
pub mod function;
pub mod library;
pub mod node;
pub mod port;
pub mod undo;
pub mod value;

// Re-export key types
pub use builder::NetworkBuilder;
pub use context::{NodeContext, PortValues, RenderResults};
pub use controller::{ControllerConfig, NodeLibraryController};
pub use error::{BoxError, NodeGraphError, Result};
pub use events::{EventLog, ListenerId, ListenerRegistry, NodeEvent, NodeEventListener};
pub use function::{
    load_library, Argument, Arity, Function, FunctionLibrary, FunctionRepository, LibraryFn,
    NativeFunction, NativeLibrary, ScriptLibrary,
};
pub use library::NodeLibrary;
pub use node::{Connection, Node};
pub use port::{Cardinality, Port, PortDirection, PortType};
pub use undo::UndoStack;
pub use value::{Color, OpaqueValue, Point, Value};
