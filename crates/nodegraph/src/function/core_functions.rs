//! The always-present `core` library

use std::sync::Arc;

use super::{FunctionLibrary, NativeFunction, NativeLibrary};
use crate::value::Value;

pub const CORE_NAMESPACE: &str = "core";

/// Build the core library. `zero` takes no arguments and returns `0.0`.
pub fn core_library() -> Arc<dyn FunctionLibrary> {
    Arc::new(
        NativeLibrary::builder(CORE_NAMESPACE)
            .function(NativeFunction::new("zero", &[], |_| Ok(Some(Value::Float(0.0)))))
            .build(),
    )
}
