//! Sensor reports and the categorical sound classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Audio classification attached to every report.
///
/// Variants are declared in increasing severity so the derived `Ord` can be
/// used to keep the worst label seen.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SoundLevel {
    #[default]
    Normal,
    Noise,
    Bad,
}

impl SoundLevel {
    /// The label stored in the database and shown on the dashboard.
    pub fn as_str(self) -> &'static str {
        match self {
            SoundLevel::Normal => "Normal",
            SoundLevel::Noise => "Noise",
            SoundLevel::Bad => "Bad",
        }
    }
}

impl fmt::Display for SoundLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Normal" => Ok(SoundLevel::Normal),
            "Noise" => Ok(SoundLevel::Noise),
            "Bad" => Ok(SoundLevel::Bad),
            other => Err(CoreError::Validation(format!(
                "unknown sound level '{other}'"
            ))),
        }
    }
}

/// A validated sensor sample from one machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: DbId,
    pub machine_id: DbId,
    /// Temperature in °C.
    pub temp: f64,
    /// Vibration in g.
    pub vib: f64,
    pub sound: SoundLevel,
    pub recorded_at: Timestamp,
}

/// A report exactly as it arrived from the feed, before validation.
///
/// Sensor columns are nullable in storage and upstream devices have been
/// known to send garbage, so every reading is optional here.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    pub id: DbId,
    pub machine_id: DbId,
    pub temp: Option<f64>,
    pub vib: Option<f64>,
    pub sound: Option<String>,
    pub recorded_at: Timestamp,
}

impl RawReport {
    /// Validate readings and produce a [`Report`].
    ///
    /// A missing sound label means the microphone heard nothing unusual and
    /// maps to [`SoundLevel::Normal`]. Missing or non-finite temperature and
    /// vibration readings reject the report.
    pub fn validate(self) -> Result<Report, CoreError> {
        let temp = require_finite(self.temp, "temp", self.id)?;
        let vib = require_finite(self.vib, "vib", self.id)?;
        let sound = match self.sound.as_deref() {
            None | Some("") => SoundLevel::Normal,
            Some(label) => label.parse()?,
        };

        Ok(Report {
            id: self.id,
            machine_id: self.machine_id,
            temp,
            vib,
            sound,
            recorded_at: self.recorded_at,
        })
    }
}

fn require_finite(value: Option<f64>, field: &str, report_id: DbId) -> Result<f64, CoreError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(CoreError::Validation(format!(
            "report {report_id}: {field} is not a finite number ({v})"
        ))),
        None => Err(CoreError::Validation(format!(
            "report {report_id}: {field} is missing"
        ))),
    }
}
