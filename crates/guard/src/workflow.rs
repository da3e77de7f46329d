//! Repair workflow for issues: start a fix, then close it with a
//! description.

use std::sync::Arc;

use machwatch_core::error::CoreError;
use machwatch_core::event_names::{ENTITY_ISSUE, EVENT_ISSUE_STATUS_CHANGED};
use machwatch_core::issue::{plan_transition, Issue, IssueStatus};
use machwatch_core::light_status::{compute_light_status, LightStatus};
use machwatch_core::store::LogStore;
use machwatch_core::types::DbId;
use machwatch_events::{EventBus, MonitorEvent};

use crate::error::GuardError;

pub struct IssueService {
    logs: Arc<dyn LogStore>,
    bus: Arc<EventBus>,
}

impl IssueService {
    pub fn new(logs: Arc<dyn LogStore>, bus: Arc<EventBus>) -> Self {
        Self { logs, bus }
    }

    /// Open -> InProgress. The issue stops absorbing new reports.
    pub async fn start_fix(&self, issue_id: DbId) -> Result<Issue, GuardError> {
        self.transition(issue_id, IssueStatus::InProgress, None).await
    }

    /// InProgress -> Fixed. `description` must not be blank.
    pub async fn mark_fixed(&self, issue_id: DbId, description: &str) -> Result<Issue, GuardError> {
        self.transition(issue_id, IssueStatus::Fixed, Some(description))
            .await
    }

    /// Current light status of a machine, from its unresolved issues.
    pub async fn light_status(&self, machine_id: DbId) -> Result<LightStatus, GuardError> {
        let issues = self.logs.list_unresolved(machine_id).await?;
        Ok(compute_light_status(&issues))
    }

    async fn transition(
        &self,
        issue_id: DbId,
        target: IssueStatus,
        fix_description: Option<&str>,
    ) -> Result<Issue, GuardError> {
        let mut issue = self
            .logs
            .get_issue(issue_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: ENTITY_ISSUE,
                id: issue_id,
            })?;

        let from = issue.status;
        let patch = plan_transition(&issue, target, fix_description)?;
        self.logs.update_issue(issue_id, &patch).await?;
        patch.apply_to(&mut issue);

        tracing::info!(
            issue_id,
            machine_id = issue.machine_id,
            from = %from,
            to = %target,
            "Issue status changed"
        );
        self.bus.publish(
            MonitorEvent::new(EVENT_ISSUE_STATUS_CHANGED, issue.machine_id)
                .with_issue(issue_id)
                .with_payload(serde_json::json!({
                    "from": from.as_str(),
                    "to": target.as_str(),
                })),
        );

        Ok(issue)
    }
}
