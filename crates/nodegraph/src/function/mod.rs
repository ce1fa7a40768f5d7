//! Function resolution
//!
//! Nodes refer to behavior through `"namespace/name"` identifiers. A
//! [`FunctionRepository`] maps those identifiers onto [`Function`]s supplied
//! by [`FunctionLibrary`] backends:
//!
//! - [`NativeLibrary`]: Rust closures with declared argument types
//! - [`ScriptLibrary`]: JavaScript evaluated by an embedded interpreter
//!
//! Built-in libraries register themselves at link time through
//! `inventory::submit!(nodegraph::LibraryFn(...))` and are collected by
//! [`FunctionRepository::with_builtins`].

mod core_functions;
mod native;
mod repository;
mod script;

use std::path::Path;
use std::sync::Arc;

use crate::error::{BoxError, NodeGraphError, Result};
use crate::port::PortType;
use crate::value::Value;

pub use core_functions::{core_library, CORE_NAMESPACE};
pub use native::{NativeFunction, NativeLibrary, NativeLibraryBuilder};
pub use repository::{FunctionRepository, DEFAULT_OUTPUT};
pub use script::{ScriptError, ScriptLibrary};

/// A formal argument (or declared output) of a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub port_type: PortType,
}

impl Argument {
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            port_type,
        }
    }
}

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Variadic; arguments past the declared list take the last declared type
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// An invocable unit of behavior
pub trait Function: Send + Sync {
    fn name(&self) -> &str;

    /// Formal parameters in positional order
    fn arguments(&self) -> &[Argument];

    fn arity(&self) -> Arity {
        Arity::Exact(self.arguments().len())
    }

    /// Explicitly declared outputs; empty means a single conventional output
    fn outputs(&self) -> &[Argument] {
        &[]
    }

    /// Invoke with positional arguments. `Ok(None)` means the function
    /// produced nothing.
    fn invoke(&self, args: &[Value]) -> std::result::Result<Option<Value>, BoxError>;

    /// Expected type of the argument at `index`, honoring variadic tails.
    fn argument_type(&self, index: usize) -> PortType {
        let args = self.arguments();
        match args.get(index).or_else(|| args.last()) {
            Some(arg) => arg.port_type.clone(),
            None => PortType::Any,
        }
    }
}

/// A namespace of functions provided by one backend
pub trait FunctionLibrary: Send + Sync {
    fn namespace(&self) -> &str;

    /// Short description of where the library came from
    fn link(&self) -> String {
        self.namespace().to_string()
    }

    fn has_function(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    fn function(&self, name: &str) -> Option<Arc<dyn Function>>;

    fn function_names(&self) -> Vec<String>;
}

/// Constructor collected at link time for built-in libraries
pub struct LibraryFn(pub fn() -> Arc<dyn FunctionLibrary>);

inventory::collect!(LibraryFn);

/// Load a function library from a resource path, dispatching on its suffix.
pub fn load_library(path: impl AsRef<Path>) -> Result<Arc<dyn FunctionLibrary>> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js") => Ok(Arc::new(ScriptLibrary::load(path)?)),
        _ => Err(NodeGraphError::load(
            path.display().to_string(),
            "Unknown function library type",
        )),
    }
}
