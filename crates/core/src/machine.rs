//! Machine profiles, their operating limits and the coarse dashboard status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::issue::{Issue, IssueStatus};
use crate::types::DbId;

/// Default reporting interval for a new machine, in seconds.
pub const DEFAULT_REPORT_INTERVAL_SECS: i32 = 15;

/// A monitored machine with its configured sensor limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Machine {
    pub id: DbId,
    pub name: String,
    /// Lower temperature bound in °C.
    pub min_temp: f64,
    /// Upper temperature bound in °C. Readings above it score as a fault.
    pub max_temp: f64,
    /// Lower vibration bound in g.
    pub min_vib: f64,
    /// Upper vibration bound in g. Readings above it score as a fault.
    pub max_vib: f64,
    pub interval_secs: i32,
    pub notes: Option<String>,
    pub image: Option<String>,
    pub status: MachineStatus,
}

/// Coarse traffic-light status persisted on the machine row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    #[default]
    Green,
    Yellow,
    Red,
}

impl MachineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MachineStatus::Green => "green",
            MachineStatus::Yellow => "yellow",
            MachineStatus::Red => "red",
        }
    }

    /// Derive the coarse status from a machine's issues.
    ///
    /// Any open issue makes the machine red; otherwise any issue under repair
    /// makes it yellow. Fixed issues never count.
    pub fn from_issues(issues: &[Issue]) -> Self {
        if issues.iter().any(|i| i.status == IssueStatus::Open) {
            MachineStatus::Red
        } else if issues.iter().any(|i| i.status == IssueStatus::InProgress) {
            MachineStatus::Yellow
        } else {
            MachineStatus::Green
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "green" => Ok(MachineStatus::Green),
            "yellow" => Ok(MachineStatus::Yellow),
            "red" => Ok(MachineStatus::Red),
            other => Err(CoreError::Validation(format!(
                "unknown machine status '{other}'"
            ))),
        }
    }
}

/// DTO for registering a machine.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_limits"))]
pub struct NewMachine {
    #[validate(length(min = 1, message = "Machine name is required"))]
    pub name: String,
    #[validate(range(min = -50.0, max = 200.0, message = "Min temperature must be between -50°C and 200°C"))]
    pub min_temp: f64,
    #[validate(range(min = -50.0, max = 200.0, message = "Max temperature must be between -50°C and 200°C"))]
    pub max_temp: f64,
    #[validate(range(min = 0.0, message = "Vibration values cannot be negative"))]
    pub min_vib: f64,
    #[validate(range(min = 0.0, message = "Vibration values cannot be negative"))]
    pub max_vib: f64,
    #[validate(range(min = 1, max = 3600, message = "Report interval must be between 1 and 3600 seconds"))]
    pub interval_secs: i32,
    pub notes: Option<String>,
    pub image: Option<String>,
}

fn validate_limits(machine: &NewMachine) -> Result<(), ValidationError> {
    if machine.name.trim().is_empty() {
        return Err(ValidationError::new("name_blank").with_message("Machine name is required".into()));
    }
    if machine.min_temp >= machine.max_temp {
        return Err(ValidationError::new("temperature_bounds")
            .with_message("Min temperature must be less than max temperature".into()));
    }
    if machine.min_vib >= machine.max_vib {
        return Err(ValidationError::new("vibration_bounds")
            .with_message("Min vibration must be less than max vibration".into()));
    }
    Ok(())
}

impl NewMachine {
    /// Run every field and cross-field check, flattening failures into a
    /// single [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))
    }
}
