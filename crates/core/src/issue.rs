//! Issues ("logs"): tracked fault records and their repair workflow.
//!
//! An issue moves strictly forward through [`IssueStatus`]:
//! `Open -> InProgress -> Fixed`. A fixed issue never reopens; a violation
//! arriving after closure opens a brand-new issue.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::report::SoundLevel;
use crate::types::{DbId, Timestamp};

/// Status ID type matching the SMALLINT `issue_statuses` lookup table.
pub type StatusId = i16;

/// Repair workflow status of an issue.
///
/// Discriminants match the seed order of the `issue_statuses` table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open = 1,
    InProgress = 2,
    Fixed = 3,
}

impl IssueStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Resolve a database status ID.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(IssueStatus::Open),
            2 => Ok(IssueStatus::InProgress),
            3 => Ok(IssueStatus::Fixed),
            other => Err(CoreError::Validation(format!(
                "unknown issue status id {other}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Fixed => "fixed",
        }
    }

    /// Open and in-progress issues both count towards the light status.
    pub fn is_unresolved(self) -> bool {
        match self {
            IssueStatus::Open | IssueStatus::InProgress => true,
            IssueStatus::Fixed => false,
        }
    }

    /// Only untouched open issues absorb new violations.
    pub fn is_mergeable(self) -> bool {
        match self {
            IssueStatus::Open => true,
            IssueStatus::InProgress | IssueStatus::Fixed => false,
        }
    }

    /// Whether `next` is the single legal step forward from `self`.
    pub fn can_transition_to(self, next: IssueStatus) -> bool {
        match (self, next) {
            (IssueStatus::Open, IssueStatus::InProgress) => true,
            (IssueStatus::InProgress, IssueStatus::Fixed) => true,
            (IssueStatus::Open, _) | (IssueStatus::InProgress, _) | (IssueStatus::Fixed, _) => {
                false
            }
        }
    }
}

impl From<IssueStatus> for StatusId {
    fn from(value: IssueStatus) -> Self {
        value as StatusId
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked fault record for one machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub id: DbId,
    pub machine_id: DbId,
    /// Comma-separated list of active problems, e.g.
    /// `"High Temp (91.0°C), AI Audio Anomaly"`.
    pub message: String,
    /// Heuristic severity, 0-100, accumulated across merges.
    pub fault_probability: i32,
    /// Latest observed temperature in °C.
    pub temperature: f64,
    /// Latest observed vibration in g.
    pub vibration: f64,
    /// Most severe sound label seen since the issue opened.
    pub sound: SoundLevel,
    pub status: IssueStatus,
    pub fix_description: Option<String>,
    /// The report that opened this issue.
    pub report_id: Option<DbId>,
    /// Every report folded into this issue, the opening one included.
    pub merged_report_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Issue {
    /// True when `report_id` opened this issue or was merged into it.
    pub fn references_report(&self, report_id: DbId) -> bool {
        self.report_id == Some(report_id) || self.merged_report_ids.contains(&report_id)
    }
}

/// Everything needed to insert a new issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDraft {
    pub machine_id: DbId,
    pub message: String,
    pub fault_probability: i32,
    pub temperature: f64,
    pub vibration: f64,
    pub sound: SoundLevel,
    pub status: IssueStatus,
    pub report_id: DbId,
}

/// Partial update applied to an existing issue. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssuePatch {
    pub message: Option<String>,
    pub fault_probability: Option<i32>,
    pub temperature: Option<f64>,
    pub vibration: Option<f64>,
    pub sound: Option<SoundLevel>,
    pub status: Option<IssueStatus>,
    pub fix_description: Option<String>,
    /// Report id appended to `merged_report_ids`.
    pub merged_report_id: Option<DbId>,
}

impl IssuePatch {
    /// Apply the patch to an in-memory issue.
    pub fn apply_to(&self, issue: &mut Issue) {
        if let Some(message) = &self.message {
            issue.message = message.clone();
        }
        if let Some(probability) = self.fault_probability {
            issue.fault_probability = probability;
        }
        if let Some(temperature) = self.temperature {
            issue.temperature = temperature;
        }
        if let Some(vibration) = self.vibration {
            issue.vibration = vibration;
        }
        if let Some(sound) = self.sound {
            issue.sound = sound;
        }
        if let Some(status) = self.status {
            issue.status = status;
        }
        if let Some(description) = &self.fix_description {
            issue.fix_description = Some(description.clone());
        }
        if let Some(report_id) = self.merged_report_id {
            if !issue.merged_report_ids.contains(&report_id) {
                issue.merged_report_ids.push(report_id);
            }
        }
    }
}

/// Build the patch that moves `issue` to `target`.
///
/// Closing an issue requires a non-blank description of the fix.
pub fn plan_transition(
    issue: &Issue,
    target: IssueStatus,
    fix_description: Option<&str>,
) -> Result<IssuePatch, CoreError> {
    if !issue.status.can_transition_to(target) {
        return Err(CoreError::InvalidTransition {
            from: issue.status,
            to: target,
        });
    }

    let mut patch = IssuePatch {
        status: Some(target),
        ..IssuePatch::default()
    };

    if target == IssueStatus::Fixed {
        let description = fix_description.map(str::trim).unwrap_or_default();
        if description.is_empty() {
            return Err(CoreError::Validation(
                "Please describe the fix".to_string(),
            ));
        }
        patch.fix_description = Some(description.to_string());
    }

    Ok(patch)
}
