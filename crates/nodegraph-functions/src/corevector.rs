//! Core Vector Library
//!
//! Conversions between points and their coordinates.

use std::sync::Arc;

use nodegraph::{FunctionLibrary, NativeFunction, NativeLibrary, Point, PortType, Value};

pub const NAMESPACE: &str = "corevector";

pub fn library() -> Arc<dyn FunctionLibrary> {
    Arc::new(
        NativeLibrary::builder(NAMESPACE)
            .function(
                NativeFunction::new("pointToValues", &[PortType::Point], |args| {
                    let point = args[0].as_point()?;
                    Ok(Some(Value::List(vec![
                        Value::Float(point.x),
                        Value::Float(point.y),
                    ])))
                })
                .with_outputs(&[("x", PortType::Float), ("y", PortType::Float)]),
            )
            .function(NativeFunction::new(
                "valuesToPoint",
                &[PortType::Float, PortType::Float],
                |args| {
                    let point = Point::new(args[0].as_float()?, args[1].as_float()?);
                    Ok(Some(Value::Point(point)))
                },
            ))
            .build(),
    )
}

inventory::submit!(nodegraph::LibraryFn(library));
