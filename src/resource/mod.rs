// src/resource/mod.rs

//! Resource records and the requirement expressions evaluated against them.

pub mod expr;
pub mod program;
pub mod record;

pub use expr::ExpressionError;
pub use program::{
    ExpressionOutcome, RequirementError, RequirementExpression, RequirementProgram,
    Satisfaction, is_satisfied,
};
pub use record::{ResourceMap, ResourceRecord, records_from_text};
