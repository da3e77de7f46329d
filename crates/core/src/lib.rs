//! Domain core of the machine monitoring engine.
//!
//! - [`fault`]: threshold evaluation and issue merging (pure).
//! - [`light_status`]: dashboard lamp derivation (pure).
//! - [`issue`], [`machine`], [`report`]: domain records and their rules.
//! - [`store`]: ports implemented by storage adapters.

pub mod error;
pub mod event_names;
pub mod fault;
pub mod issue;
pub mod light_status;
pub mod machine;
pub mod report;
pub mod store;
pub mod types;
