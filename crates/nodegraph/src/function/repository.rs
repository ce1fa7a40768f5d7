//! Namespace-keyed registry of function libraries

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{core_library, Function, FunctionLibrary, LibraryFn, CORE_NAMESPACE};
use crate::error::{NodeGraphError, Result};
use crate::node::Node;
use crate::port::{Port, PortType};

/// Name of the output port synthesized for functions without declared outputs
pub const DEFAULT_OUTPUT: &str = "output";

/// Resolves `"namespace/name"` identifiers to functions
///
/// The `core` library is always present.
///
/// # Usage
///
/// ```ignore
/// let repository = FunctionRepository::of([math_library()]);
/// let add = repository.function("math/add")?;
/// ```
#[derive(Clone)]
pub struct FunctionRepository {
    libraries: BTreeMap<String, Arc<dyn FunctionLibrary>>,
}

impl FunctionRepository {
    /// Build a repository from the given libraries plus the core library.
    pub fn of(libraries: impl IntoIterator<Item = Arc<dyn FunctionLibrary>>) -> Self {
        let mut map: BTreeMap<String, Arc<dyn FunctionLibrary>> = BTreeMap::new();
        for library in libraries {
            let namespace = library.namespace().to_string();
            if namespace == CORE_NAMESPACE {
                log::warn!("Ignoring library {} that shadows the core namespace", library.link());
                continue;
            }
            if let Some(previous) = map.insert(namespace, library) {
                log::warn!("Library {} replaced by a later library", previous.link());
            }
        }
        map.insert(CORE_NAMESPACE.to_string(), core_library());
        Self { libraries: map }
    }

    /// Repository with only the core library
    pub fn core() -> Self {
        Self::of(std::iter::empty())
    }

    /// Repository with every library registered through `inventory`
    pub fn with_builtins() -> Self {
        Self::of(inventory::iter::<LibraryFn>.into_iter().map(|f| (f.0)()))
    }

    /// A new repository with `library` added (or replacing its namespace)
    pub fn with_library(&self, library: Arc<dyn FunctionLibrary>) -> Self {
        let namespace = library.namespace().to_string();
        Self::of(
            self.libraries
                .iter()
                .filter(|(ns, _)| **ns != namespace && ns.as_str() != CORE_NAMESPACE)
                .map(|(_, lib)| Arc::clone(lib))
                .chain(std::iter::once(library)),
        )
    }

    pub fn library(&self, namespace: &str) -> Option<&Arc<dyn FunctionLibrary>> {
        self.libraries.get(namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    pub fn has_function(&self, identifier: &str) -> bool {
        self.function(identifier).is_ok()
    }

    /// Resolve an identifier of the form `namespace/name`.
    pub fn function(&self, identifier: &str) -> Result<Arc<dyn Function>> {
        let (namespace, name) = match identifier.split('/').collect::<Vec<_>>().as_slice() {
            [ns, name] if !ns.is_empty() && !name.is_empty() => (*ns, *name),
            _ => {
                return Err(NodeGraphError::unresolved(
                    identifier,
                    "The function identifier should be in the form 'namespace/function'.",
                ))
            }
        };
        let library = self.libraries.get(namespace).ok_or_else(|| {
            NodeGraphError::unresolved(
                identifier,
                format!("Could not find function {identifier}: unknown namespace."),
            )
        })?;
        library.function(name).ok_or_else(|| {
            NodeGraphError::unresolved(
                identifier,
                format!("Could not find function {identifier}: unknown function."),
            )
        })
    }

    /// Synthesize a prototype node for a function: one input port per formal
    /// argument and either the declared outputs or a single `output` port.
    pub fn node_for_function(&self, identifier: &str) -> Result<Node> {
        let function = self.function(identifier)?;
        let name = identifier.rsplit('/').next().unwrap_or(identifier);
        let mut node = Node::new(name)?.with_function(identifier);
        for argument in function.arguments() {
            node = node.with_input_added(Port::new(&argument.name, argument.port_type.clone())?)?;
        }
        if function.outputs().is_empty() {
            node = node.with_output_added(Port::new(DEFAULT_OUTPUT, PortType::Any)?)?;
        } else {
            for output in function.outputs() {
                node = node.with_output_added(Port::new(&output.name, output.port_type.clone())?)?;
            }
        }
        Ok(node)
    }
}

impl Default for FunctionRepository {
    fn default() -> Self {
        Self::core()
    }
}

impl fmt::Debug for FunctionRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRepository")
            .field("libraries", &self.libraries.values().map(|l| l.link()).collect::<Vec<_>>())
            .finish()
    }
}
