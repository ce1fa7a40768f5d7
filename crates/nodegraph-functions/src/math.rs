//! Math Library
//!
//! Arithmetic on floats. Integer inputs are widened by the engine before
//! the function body runs, so every result is a float.

use std::sync::Arc;

use nodegraph::{BoxError, FunctionLibrary, NativeFunction, NativeLibrary, PortType, Value};

use crate::error::FunctionError;

pub const NAMESPACE: &str = "math";

pub fn library() -> Arc<dyn FunctionLibrary> {
    use PortType::{Float, List, String};

    Arc::new(
        NativeLibrary::builder(NAMESPACE)
            .function(NativeFunction::new("add", &[Float], add).variadic(0))
            .function(NativeFunction::new("subtract", &[Float, Float], |args| {
                Ok(Some(Value::Float(args[0].as_float()? - args[1].as_float()?)))
            }))
            .function(NativeFunction::new("multiply", &[Float, Float], |args| {
                Ok(Some(Value::Float(args[0].as_float()? * args[1].as_float()?)))
            }))
            .function(NativeFunction::new("divide", &[Float, Float], divide))
            .function(NativeFunction::new("invert", &[Float], |args| {
                Ok(Some(Value::Float(-args[0].as_float()?)))
            }))
            .function(NativeFunction::new("sum", &[List], sum))
            .function(NativeFunction::new("makeNumbers", &[String], make_numbers))
            .build(),
    )
}

inventory::submit!(nodegraph::LibraryFn(library));

fn add(args: &[Value]) -> Result<Option<Value>, BoxError> {
    let mut total = 0.0;
    for arg in args {
        total += arg.as_float()?;
    }
    Ok(Some(Value::Float(total)))
}

fn divide(args: &[Value]) -> Result<Option<Value>, BoxError> {
    let divisor = args[1].as_float()?;
    if divisor == 0.0 {
        return Err(FunctionError::DivisionByZero.into());
    }
    Ok(Some(Value::Float(args[0].as_float()? / divisor)))
}

/// Sum of a list of numbers; an empty list sums to zero.
fn sum(args: &[Value]) -> Result<Option<Value>, BoxError> {
    add(args[0].as_list()?)
}

/// Parse whitespace-separated numbers into a list
fn make_numbers(args: &[Value]) -> Result<Option<Value>, BoxError> {
    let numbers = args[0]
        .as_str()?
        .split_whitespace()
        .map(|word| {
            word.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| FunctionError::NotANumber(word.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Value::List(numbers)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Option<Value>, BoxError> {
        library().function(name).unwrap().invoke(args)
    }

    #[test]
    fn test_add_is_variadic() {
        let f = library().function("add").unwrap();
        assert!(f.arity().accepts(0));
        assert!(f.arity().accepts(5));
        assert_eq!(call("add", &[]).unwrap(), Some(Value::Float(0.0)));
        assert_eq!(
            call("add", &[Value::Float(1.0), Value::Float(2.5)]).unwrap(),
            Some(Value::Float(3.5))
        );
    }

    #[test]
    fn test_subtract_is_positional() {
        assert_eq!(
            call("subtract", &[Value::Float(10.0), Value::Float(3.0)]).unwrap(),
            Some(Value::Float(7.0))
        );
    }

    #[test]
    fn test_divide_by_zero() {
        let err = call("divide", &[Value::Float(1.0), Value::Float(0.0)]).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero");
        assert_eq!(
            call("divide", &[Value::Float(9.0), Value::Float(3.0)]).unwrap(),
            Some(Value::Float(3.0))
        );
    }

    #[test]
    fn test_sum() {
        let values = Value::List(vec![Value::Float(1.0), Value::Int(2), Value::Float(3.0)]);
        assert_eq!(call("sum", &[values]).unwrap(), Some(Value::Float(6.0)));
        assert_eq!(call("sum", &[Value::List(vec![])]).unwrap(), Some(Value::Float(0.0)));
    }

    #[test]
    fn test_make_numbers() {
        let result = call("makeNumbers", &[Value::from("1 2 3 4")]).unwrap();
        assert_eq!(
            result,
            Some(Value::List(vec![
                Value::Float(1.0),
                Value::Float(2.0),
                Value::Float(3.0),
                Value::Float(4.0),
            ]))
        );
        assert_eq!(
            call("makeNumbers", &[Value::from("")]).unwrap(),
            Some(Value::List(vec![]))
        );
        assert!(call("makeNumbers", &[Value::from("1 two")]).is_err());
    }
}
