//! String Library

use std::sync::Arc;

use nodegraph::{FunctionLibrary, NativeFunction, NativeLibrary, PortType, Value};

pub const NAMESPACE: &str = "string";

pub fn library() -> Arc<dyn FunctionLibrary> {
    Arc::new(
        NativeLibrary::builder(NAMESPACE)
            .function(NativeFunction::new("length", &[PortType::String], |args| {
                Ok(Some(Value::Int(args[0].as_str()?.chars().count() as i64)))
            }))
            .function(NativeFunction::new("wordCount", &[PortType::String], |args| {
                Ok(Some(Value::Int(word_count(args[0].as_str()?) as i64)))
            }))
            .build(),
    )
}

inventory::submit!(nodegraph::LibraryFn(library));

/// Number of runs of word characters (letters, digits, underscore)
fn word_count(s: &str) -> usize {
    s.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .count()
}
