//! Error types for the node graph engine

use thiserror::Error;

/// Result type alias using NodeGraphError
pub type Result<T> = std::result::Result<T, NodeGraphError>;

/// Boxed error returned by function bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while loading, editing or rendering node graphs
#[derive(Debug, Error)]
pub enum NodeGraphError {
    /// A function library failed to load
    #[error("Could not load function library {resource}: {cause}")]
    Load { resource: String, cause: String },

    /// Function identifier could not be resolved
    #[error("{reason}")]
    UnresolvedFunction { identifier: String, reason: String },

    /// A value could not be coerced to the requested type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// The function body raised an error
    #[error("Error while invoking {function}: {source}")]
    Invocation {
        function: String,
        #[source]
        source: BoxError,
    },

    /// The node supplies a different number of arguments than the function accepts
    #[error("Function {function} expects {expected} arguments, node supplies {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    /// A multi-output function returned the wrong number of values
    #[error("The return value of {function} needs to be a list with {expected} elements, got {actual}")]
    OutputMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// A port had no value to read
    #[error("Port {node}.{port} has no value")]
    MissingValue { node: String, port: String },

    /// Evaluation of a node failed
    #[error("Error rendering node {path}: {source}")]
    NodeRender {
        path: String,
        #[source]
        source: Box<NodeGraphError>,
    },

    /// Port definition rejected at construction
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// Node name is empty or contains a separator
    #[error("Invalid node name {0:?}")]
    InvalidName(String),

    /// Name is reserved for the root node
    #[error("The name {0} is reserved")]
    ReservedName(String),

    /// Sibling or port name already taken
    #[error("{kind} {name} already exists in {parent}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        parent: String,
    },

    /// No node at the given path
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Node exists but has no such port
    #[error("Port {port} not found on node {node}")]
    PortNotFound { node: String, port: String },

    /// Disconnect target does not exist
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// I/O error while reading a library resource
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeGraphError {
    /// Create a load error for a resource
    pub fn load(resource: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Load {
            resource: resource.into(),
            cause: cause.into(),
        }
    }

    /// Create an unresolved function error
    pub fn unresolved(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvedFunction {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create a port-not-found error
    pub fn port_not_found(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self::PortNotFound {
            node: node.into(),
            port: port.into(),
        }
    }

    /// Wrap this error with the path of the node being rendered.
    ///
    /// Errors that already carry a node path are returned unchanged so the
    /// innermost failing node is the one reported.
    pub fn at_node(self, path: impl Into<String>) -> Self {
        match self {
            Self::NodeRender { .. } => self,
            other => Self::NodeRender {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The error at the bottom of a chain of node render wrappers
    pub fn root_cause(&self) -> &NodeGraphError {
        match self {
            Self::NodeRender { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
