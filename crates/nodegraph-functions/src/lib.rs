//! NodeGraph Functions
//!
//! Standard function libraries for the nodegraph engine. Each library
//! registers itself with `inventory`, so linking this crate is enough for
//! `FunctionRepository::with_builtins()` to find it.
//!
//! # Libraries
//!
//! - **math**: arithmetic on floats, `sum` and `makeNumbers`
//! - **list**: picking, slicing, combining and ordering lists
//! - **string**: `length` and `wordCount`
//! - **corevector**: conversions between points and coordinates
//! - **color**: `rgb`
//! - **data**: `makeStrings`

pub mod color;
pub mod corevector;
pub mod data;
pub mod error;
pub mod list;
pub mod math;
pub mod string;

pub use error::FunctionError;

use std::sync::Arc;

use nodegraph::{FunctionLibrary, FunctionRepository};

/// Every standard library, for hosts that register libraries explicitly
pub fn libraries() -> Vec<Arc<dyn FunctionLibrary>> {
    vec![
        math::library(),
        list::library(),
        string::library(),
        corevector::library(),
        color::library(),
        data::library(),
    ]
}

/// Repository holding the core library plus every standard library
pub fn repository() -> FunctionRepository {
    let libraries = libraries();
    log::debug!("Building repository from {} standard libraries", libraries.len());
    FunctionRepository::of(libraries)
}
