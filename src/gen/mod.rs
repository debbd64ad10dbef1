//! Constants that define the current build and execution environment.

use std::collections::HashMap;

#[rustfmt::skip]
pub mod build;
pub use self::build::*;

#[rustfmt::skip]
pub mod _build;
pub use self::_build::*;

pub fn dependencies_map() -> HashMap<&'static str, &'static str> {
    HashMap::from(DEPENDENCIES)
}
