// src/unit/mod.rs

//! The unit model: immutable job definitions and the registry that builds
//! them from provider definitions.

pub mod model;
pub mod registry;
pub mod tokens;

pub use model::{FLAG_NORETURN, Import, Unit};
pub use registry::{Provider, UnitRegistry, unit_from_config};
