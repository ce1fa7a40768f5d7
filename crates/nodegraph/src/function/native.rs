//! Native function libraries backed by Rust closures

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{Argument, Arity, Function, FunctionLibrary};
use crate::error::BoxError;
use crate::port::PortType;
use crate::value::Value;

type NativeBody = dyn Fn(&[Value]) -> Result<Option<Value>, BoxError> + Send + Sync;

/// A function implemented by a Rust closure
pub struct NativeFunction {
    name: String,
    arguments: Vec<Argument>,
    arity: Arity,
    outputs: Vec<Argument>,
    body: Box<NativeBody>,
}

impl NativeFunction {
    /// Create a function with the given argument types.
    ///
    /// Argument names are derived from the type names, with a numeric suffix
    /// that keeps repeated types apart (`float1`, `float2`, `string1`).
    pub fn new<F>(name: impl Into<String>, types: &[PortType], body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Option<Value>, BoxError> + Send + Sync + 'static,
    {
        let mut counters: HashMap<&str, usize> = HashMap::new();
        let arguments: Vec<Argument> = types
            .iter()
            .map(|ty| {
                let count = counters.entry(ty.as_str()).or_insert(0);
                *count += 1;
                Argument::new(format!("{}{}", ty.as_str(), count), ty.clone())
            })
            .collect();
        let arity = Arity::Exact(arguments.len());
        Self {
            name: name.into(),
            arguments,
            arity,
            outputs: Vec::new(),
            body: Box::new(body),
        }
    }

    /// Accept `min` or more arguments; extras take the last declared type
    pub fn variadic(mut self, min: usize) -> Self {
        self.arity = Arity::AtLeast(min);
        self
    }

    /// Declare named outputs; the body must then return one value per output
    pub fn with_outputs(mut self, outputs: &[(&str, PortType)]) -> Self {
        self.outputs = outputs
            .iter()
            .map(|(name, ty)| Argument::new(*name, ty.clone()))
            .collect();
        self
    }
}

impl Function for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn outputs(&self) -> &[Argument] {
        &self.outputs
    }

    fn invoke(&self, args: &[Value]) -> Result<Option<Value>, BoxError> {
        (self.body)(args)
    }
}

/// A namespace of native functions
pub struct NativeLibrary {
    namespace: String,
    functions: BTreeMap<String, Arc<dyn Function>>,
}

impl NativeLibrary {
    pub fn builder(namespace: impl Into<String>) -> NativeLibraryBuilder {
        NativeLibraryBuilder {
            namespace: namespace.into(),
            functions: BTreeMap::new(),
        }
    }
}

impl FunctionLibrary for NativeLibrary {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn link(&self) -> String {
        format!("native:{}", self.namespace)
    }

    fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn function(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(name).cloned()
    }

    fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}

/// Fluent builder for [`NativeLibrary`]
pub struct NativeLibraryBuilder {
    namespace: String,
    functions: BTreeMap<String, Arc<dyn Function>>,
}

impl NativeLibraryBuilder {
    pub fn function(mut self, function: NativeFunction) -> Self {
        let name = function.name.clone();
        if self.functions.insert(name.clone(), Arc::new(function)).is_some() {
            log::warn!("Function {}/{} registered twice, keeping the last", self.namespace, name);
        }
        self
    }

    pub fn build(self) -> NativeLibrary {
        NativeLibrary {
            namespace: self.namespace,
            functions: self.functions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_names_are_unique() {
        let f = NativeFunction::new(
            "mix",
            &[PortType::Float, PortType::String, PortType::Float],
            |_| Ok(None),
        );
        let names: Vec<_> = f.arguments().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["float1", "string1", "float2"]);
        assert_eq!(f.arity(), Arity::Exact(3));
    }

    #[test]
    fn test_variadic_argument_type() {
        let f = NativeFunction::new("add", &[PortType::Float], |_| Ok(None)).variadic(0);
        assert!(f.arity().accepts(4));
        assert_eq!(f.argument_type(3), PortType::Float);
    }

    #[test]
    fn test_library_lookup() {
        let lib = NativeLibrary::builder("demo")
            .function(NativeFunction::new("one", &[], |_| Ok(Some(Value::Int(1)))))
            .build();
        assert_eq!(lib.namespace(), "demo");
        assert!(lib.has_function("one"));
        assert!(!lib.has_function("two"));
        let result = lib.function("one").unwrap().invoke(&[]).unwrap();
        assert_eq!(result, Some(Value::Int(1)));
        assert_eq!(lib.function_names(), vec!["one".to_string()]);
    }
}
