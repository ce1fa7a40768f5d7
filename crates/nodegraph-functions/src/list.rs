//! List Library
//!
//! Operations on lists themselves; the items inside are not inspected except
//! by `sort`. Functions that pick items return a list, possibly empty.

use std::sync::Arc;

use nodegraph::{BoxError, FunctionLibrary, NativeFunction, NativeLibrary, PortType, Value};

use crate::error::FunctionError;

pub const NAMESPACE: &str = "list";

pub fn library() -> Arc<dyn FunctionLibrary> {
    use PortType::{Int, List};

    Arc::new(
        NativeLibrary::builder(NAMESPACE)
            .function(NativeFunction::new("count", &[List], |args| {
                Ok(Some(Value::Int(args[0].as_list()?.len() as i64)))
            }))
            .function(NativeFunction::new("first", &[List], |args| {
                Ok(Some(slice(args[0].as_list()?, 0, 1)))
            }))
            .function(NativeFunction::new("second", &[List], |args| {
                Ok(Some(slice(args[0].as_list()?, 1, 1)))
            }))
            .function(NativeFunction::new("rest", &[List], |args| {
                Ok(Some(slice(args[0].as_list()?, 1, usize::MAX)))
            }))
            .function(NativeFunction::new("last", &[List], |args| {
                let items = args[0].as_list()?;
                Ok(Some(slice(items, items.len().saturating_sub(1), 1)))
            }))
            .function(NativeFunction::new("combine", &[List], combine).variadic(0))
            .function(NativeFunction::new("reverse", &[List], |args| {
                let mut items = args[0].as_list()?.to_vec();
                items.reverse();
                Ok(Some(Value::List(items)))
            }))
            .function(NativeFunction::new("sort", &[List], |args| {
                Ok(Some(Value::List(sort(args[0].as_list()?)?)))
            }))
            .function(NativeFunction::new("subList", &[List, Int, Int], sub_list))
            .function(NativeFunction::new("shift", &[List, Int], shift))
            .build(),
    )
}

inventory::submit!(nodegraph::LibraryFn(library));

/// Up to `size` items starting at `start`, clamped to the list bounds
fn slice(items: &[Value], start: usize, size: usize) -> Value {
    Value::List(items.iter().skip(start).take(size).cloned().collect())
}

fn combine(args: &[Value]) -> Result<Option<Value>, BoxError> {
    let mut combined = Vec::new();
    for list in args {
        combined.extend_from_slice(list.as_list()?);
    }
    Ok(Some(Value::List(combined)))
}

fn sub_list(args: &[Value]) -> Result<Option<Value>, BoxError> {
    let items = args[0].as_list()?;
    let start = args[1].as_int()?.max(0) as usize;
    let size = args[2].as_int()?.max(0) as usize;
    Ok(Some(slice(items, start, size)))
}

/// Rotate left by `amount`; negative amounts rotate right.
fn shift(args: &[Value]) -> Result<Option<Value>, BoxError> {
    let mut items = args[0].as_list()?.to_vec();
    if !items.is_empty() {
        let amount = args[1].as_int()?.rem_euclid(items.len() as i64) as usize;
        items.rotate_left(amount);
    }
    Ok(Some(Value::List(items)))
}

fn sort(items: &[Value]) -> Result<Vec<Value>, FunctionError> {
    let mut sorted = items.to_vec();
    let Some(first) = items.first() else {
        return Ok(sorted);
    };

    if items.iter().all(is_number) {
        sorted.sort_by(|a, b| number(a).total_cmp(&number(b)));
    } else if items.iter().all(|v| matches!(v, Value::String(_))) {
        sorted.sort_by(|a, b| a.as_str().ok().cmp(&b.as_str().ok()));
    } else if items.iter().all(|v| matches!(v, Value::Boolean(_))) {
        sorted.sort_by_key(|v| v.as_bool().ok());
    } else if items.iter().all(|v| v.type_name() == first.type_name()) {
        return Err(FunctionError::Unsortable(first.type_name().to_string()));
    } else {
        return Err(FunctionError::MixedSort);
    }
    Ok(sorted)
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_))
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}
