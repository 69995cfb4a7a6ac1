// src/config/mod.rs

//! Plan file loading and validation for sessiondag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a plan file from disk (`loader.rs`).
//! - Validate structural invariants (`validate.rs`).
//! - Turn `[selection]` into a desired job list (`selection.rs`).

pub mod loader;
pub mod model;
pub mod selection;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{
    CheckpointSection, PlanFile, ProviderConfig, RawPlanFile, SelectionSection, SessionSection,
    UnitConfig,
};
pub use selection::Selection;
