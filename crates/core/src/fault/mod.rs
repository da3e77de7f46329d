//! Fault detection domain logic.
//!
//! Contains the threshold evaluator and the issue merger. All logic in this
//! module is pure (no store access): the caller fetches the machine and any
//! open issue, passes them in, and performs the resulting writes itself.

pub mod evaluator;
pub mod merge;
