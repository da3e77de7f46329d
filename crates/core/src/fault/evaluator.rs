//! Threshold evaluation for incoming sensor reports.
//!
//! Each sensor dimension contributes a fixed number of points when it is in
//! violation. Weights are not configurable per machine. Only over-threshold
//! readings score: a machine running cold is not considered at risk.

use serde::Serialize;

use crate::error::CoreError;
use crate::machine::Machine;
use crate::report::{Report, SoundLevel};

/// Points contributed when the temperature exceeds the machine maximum.
pub const TEMPERATURE_POINTS: i32 = 40;

/// Points contributed when the vibration exceeds the machine maximum.
pub const VIBRATION_POINTS: i32 = 40;

/// Points contributed by a `Bad` sound classification.
pub const SOUND_BAD_POINTS: i32 = 50;

/// Points contributed by a `Noise` sound classification.
pub const SOUND_NOISE_POINTS: i32 = 20;

/// Which sensor dimensions of a report are in violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FaultSignal {
    pub temperature_exceeded: bool,
    pub vibration_exceeded: bool,
    pub sound_level: SoundLevel,
}

impl FaultSignal {
    /// True when nothing in the report needs attention.
    pub fn is_zero(&self) -> bool {
        !self.temperature_exceeded
            && !self.vibration_exceeded
            && self.sound_level == SoundLevel::Normal
    }
}

/// A single scored problem found in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    HighTemperature { value: f64, limit: f64 },
    HighVibration { value: f64, limit: f64 },
    AudioAnomaly,
    AbnormalNoise,
}

impl Violation {
    /// Fault points this violation adds to the raw probability.
    pub fn points(&self) -> i32 {
        match self {
            Violation::HighTemperature { .. } => TEMPERATURE_POINTS,
            Violation::HighVibration { .. } => VIBRATION_POINTS,
            Violation::AudioAnomaly => SOUND_BAD_POINTS,
            Violation::AbnormalNoise => SOUND_NOISE_POINTS,
        }
    }

    /// Human-readable phrase used in issue messages.
    pub fn phrase(&self) -> String {
        match self {
            Violation::HighTemperature { value, .. } => format!("High Temp ({value:.1}°C)"),
            Violation::HighVibration { value, .. } => format!("High Vib ({value:.2}g)"),
            Violation::AudioAnomaly => "AI Audio Anomaly".to_string(),
            Violation::AbnormalNoise => "Abnormal Noise".to_string(),
        }
    }
}

/// Outcome of evaluating one report against its machine's limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub signal: FaultSignal,
    /// Violations in message order: temperature, vibration, sound.
    pub violations: Vec<Violation>,
    /// Sum of violation points before any merge-time cap.
    pub raw_probability: i32,
}

impl Evaluation {
    /// True when at least one dimension scored.
    pub fn is_violation(&self) -> bool {
        self.raw_probability > 0
    }

    /// Message phrases for every violation, in order.
    pub fn phrases(&self) -> Vec<String> {
        self.violations.iter().map(Violation::phrase).collect()
    }
}

/// Evaluate a report against the limits configured on its machine.
///
/// Fails with [`CoreError::Validation`] when the report belongs to another
/// machine or carries non-finite readings; nothing is scored in that case.
pub fn evaluate(report: &Report, machine: &Machine) -> Result<Evaluation, CoreError> {
    if report.machine_id != machine.id {
        return Err(CoreError::Validation(format!(
            "report {} belongs to machine {}, not {}",
            report.id, report.machine_id, machine.id
        )));
    }
    if !report.temp.is_finite() || !report.vib.is_finite() {
        return Err(CoreError::Validation(format!(
            "report {} carries non-finite readings",
            report.id
        )));
    }

    let mut violations = Vec::new();

    let temperature_exceeded = report.temp > machine.max_temp;
    if temperature_exceeded {
        violations.push(Violation::HighTemperature {
            value: report.temp,
            limit: machine.max_temp,
        });
    }

    let vibration_exceeded = report.vib > machine.max_vib;
    if vibration_exceeded {
        violations.push(Violation::HighVibration {
            value: report.vib,
            limit: machine.max_vib,
        });
    }

    match report.sound {
        SoundLevel::Bad => violations.push(Violation::AudioAnomaly),
        SoundLevel::Noise => violations.push(Violation::AbnormalNoise),
        SoundLevel::Normal => {}
    }

    let raw_probability = violations.iter().map(Violation::points).sum();

    Ok(Evaluation {
        signal: FaultSignal {
            temperature_exceeded,
            vibration_exceeded,
            sound_level: report.sound,
        },
        violations,
        raw_probability,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
