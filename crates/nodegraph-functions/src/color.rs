//! Color Library

use std::sync::Arc;

use nodegraph::{Color, FunctionLibrary, NativeFunction, NativeLibrary, PortType, Value};

pub const NAMESPACE: &str = "color";

pub fn library() -> Arc<dyn FunctionLibrary> {
    use PortType::Float;

    Arc::new(
        NativeLibrary::builder(NAMESPACE)
            .function(NativeFunction::new("rgb", &[Float, Float, Float, Float], |args| {
                let color = Color::rgba(
                    args[0].as_float()?,
                    args[1].as_float()?,
                    args[2].as_float()?,
                    args[3].as_float()?,
                );
                Ok(Some(Value::Color(color)))
            }))
            .build(),
    )
}

inventory::submit!(nodegraph::LibraryFn(library));
