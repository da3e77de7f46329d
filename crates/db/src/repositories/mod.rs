//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod issue_repo;
pub mod machine_repo;
pub mod report_repo;

pub use issue_repo::IssueRepo;
pub use machine_repo::MachineRepo;
pub use report_repo::ReportRepo;
