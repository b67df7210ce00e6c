//! Record of what an ensemble run wrote

use super::config::EnsembleMode;
use crate::perturbation::{PerturbedVariable, SizeClass, StrengthClass};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// One perturbed track written by a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberOutput {
    /// Output name without extension, e.g. `wind_speed_3`
    pub name: String,
    /// 1-based member index
    pub member: usize,
    /// Variables perturbed in this track with the factor drawn for each
    pub perturbations: Vec<(PerturbedVariable, f64)>,
}

/// Track written with scaled central pressure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledOutput {
    /// Output name without extension
    pub name: String,
    /// Multiplier applied to central pressure
    pub scale: f64,
}

/// Summary of an ensemble run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleReport {
    /// Storm label, e.g. `AL06 FLORENCE`
    pub storm: String,
    /// Base seed actually used
    pub seed: u64,
    /// Member layout
    pub mode: EnsembleMode,
    /// Initial strength bucket
    pub strength: StrengthClass,
    /// Initial size bucket
    pub size: SizeClass,
    /// Name of the unperturbed baseline
    pub original: String,
    /// Scaled central pressure track, if one was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_pressure: Option<ScaledOutput>,
    /// Perturbed tracks in variable-then-member order
    pub outputs: Vec<MemberOutput>,
}

impl EnsembleReport {
    /// Save as pretty JSON
    ///
    /// # Errors
    /// Returns error if the report cannot be serialized or written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ReportError::SerializeFailed(e.to_string()))?;
        fs::write(path, contents).map_err(|e| ReportError::SaveFailed(e.to_string()))?;
        Ok(())
    }

    /// Load a previously saved report
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ReportError::LoadFailed(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| ReportError::ParseFailed(e.to_string()))
    }
}

/// Errors that can occur saving or loading a report
#[derive(Debug)]
pub enum ReportError {
    /// Failed to load file
    LoadFailed(String),
    /// Failed to parse file contents
    ParseFailed(String),
    /// Failed to serialize report
    SerializeFailed(String),
    /// Failed to save file
    SaveFailed(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            ReportError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            ReportError::SerializeFailed(msg) => write!(f, "Failed to serialize: {msg}"),
            ReportError::SaveFailed(msg) => write!(f, "Failed to save: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}
