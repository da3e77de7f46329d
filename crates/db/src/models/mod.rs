//! Row models and DTOs.
//!
//! Each row type derives `FromRow` and converts into the matching domain
//! record from `machwatch-core`.

pub mod issue;
pub mod machine;
pub mod report;
