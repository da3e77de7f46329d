//! Well-known monitor event type constants.
//!
//! Published on the in-process event bus by the ingestion loop and the issue
//! workflow service, and matched by the machine status sync task.

/// A new issue was opened for a machine.
pub const EVENT_ISSUE_CREATED: &str = "issue.created";

/// A report was merged into an existing open issue.
pub const EVENT_ISSUE_MERGED: &str = "issue.merged";

/// An issue moved forward in the repair workflow.
pub const EVENT_ISSUE_STATUS_CHANGED: &str = "issue.status_changed";

/// Source entity kind attached to issue events.
pub const ENTITY_ISSUE: &str = "issue";

/// Entity kind used when a machine lookup fails.
pub const ENTITY_MACHINE: &str = "machine";
