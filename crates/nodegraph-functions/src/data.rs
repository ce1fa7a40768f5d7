//! Data Library

use std::sync::Arc;

use nodegraph::{FunctionLibrary, NativeFunction, NativeLibrary, PortType, Value};

pub const NAMESPACE: &str = "data";

pub fn library() -> Arc<dyn FunctionLibrary> {
    Arc::new(
        NativeLibrary::builder(NAMESPACE)
            .function(NativeFunction::new(
                "makeStrings",
                &[PortType::String, PortType::String],
                |args| {
                    let strings = make_strings(args[0].as_str()?, args[1].as_str()?);
                    Ok(Some(Value::List(strings)))
                },
            ))
            .build(),
    )
}

inventory::submit!(nodegraph::LibraryFn(library));

/// Split `s` on `separator`, or into single characters when the separator
/// is empty.
fn make_strings(s: &str, separator: &str) -> Vec<Value> {
    if s.is_empty() {
        return Vec::new();
    }
    if separator.is_empty() {
        return s.chars().map(|c| Value::String(c.to_string())).collect();
    }
    s.split(separator).map(Value::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn test_make_strings() {
        assert_eq!(make_strings("a;b;c", ";"), strings(&["a", "b", "c"]));
        assert_eq!(make_strings("a;;c", ";"), strings(&["a", "", "c"]));
        assert_eq!(make_strings("abc", ""), strings(&["a", "b", "c"]));
        assert!(make_strings("", ";").is_empty());
    }
}
