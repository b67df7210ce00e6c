//! Error taxonomy for ensemble generation
//!
//! - [`ConfigurationError`]: the request cannot be served (unknown variable,
//!   missing error table, zero members). Fatal, never retried.
//! - [`EnsembleError::PhysicalConsistency`]: the base track has a central
//!   pressure at or above its background pressure, so Holland-B is undefined.
//! - [`EnsembleError::Io`]: provider/writer failures, passed through unchanged.
//!
//! Perturbations that leave the physical bounds are clamped and are not errors.

use crate::io::TrackIoError;
use crate::perturbation::PerturbedVariable;
use chrono::{DateTime, Utc};
use std::fmt;

/// Invalid request or missing static data
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Variable name not recognised
    UnknownVariable(String),
    /// Bucket label not valid for this variable's classification
    UnrecognizedBucket {
        /// Variable being looked up
        variable: PerturbedVariable,
        /// Offending bucket label
        bucket: String,
    },
    /// No historical error table exists for this variable
    MissingErrorModel(PerturbedVariable),
    /// Ensemble size must be at least one
    NonPositiveMemberCount(usize),
    /// Nothing was requested for perturbation
    NoVariables,
    /// Central pressure multiplier is zero, negative or not finite
    InvalidPressureScale(f64),
    /// A series does not line up with the track
    SeriesLengthMismatch {
        /// Series name
        series: &'static str,
        /// Number of track records
        expected: usize,
        /// Length supplied
        found: usize,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnknownVariable(name) => {
                write!(f, "unknown perturbation variable '{name}'")
            }
            ConfigurationError::UnrecognizedBucket { variable, bucket } => {
                write!(f, "bucket '{bucket}' is not a classification of {variable}")
            }
            ConfigurationError::MissingErrorModel(variable) => {
                write!(f, "no historical forecast error table for {variable}")
            }
            ConfigurationError::NonPositiveMemberCount(count) => {
                write!(f, "ensemble member count must be positive, got {count}")
            }
            ConfigurationError::NoVariables => write!(f, "no variables selected for perturbation"),
            ConfigurationError::InvalidPressureScale(scale) => {
                write!(f, "central pressure scale must be positive and finite, got {scale}")
            }
            ConfigurationError::SeriesLengthMismatch {
                series,
                expected,
                found,
            } => write!(
                f,
                "{series} series has {found} values but the track has {expected} records"
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Any failure of an ensemble run
#[derive(Debug)]
pub enum EnsembleError {
    /// Invalid request or missing static data
    Configuration(ConfigurationError),
    /// Central pressure is not below background pressure
    PhysicalConsistency {
        /// Record index within the track
        record: usize,
        /// Record validation time
        time: DateTime<Utc>,
        /// Central pressure (mbar)
        central_pressure: f64,
        /// Background pressure (mbar)
        background_pressure: f64,
    },
    /// Track provider or writer failure
    Io(TrackIoError),
    /// A single ensemble member failed; aborts the run
    Member {
        /// Output name of the member, e.g. `wind_speed_3`
        name: String,
        /// What went wrong
        source: Box<EnsembleError>,
    },
}

impl EnsembleError {
    /// Wrap an error with the member that produced it
    pub fn in_member(self, name: impl Into<String>) -> Self {
        EnsembleError::Member {
            name: name.into(),
            source: Box::new(self),
        }
    }
}

impl fmt::Display for EnsembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnsembleError::Configuration(e) => write!(f, "configuration error: {e}"),
            EnsembleError::PhysicalConsistency {
                record,
                time,
                central_pressure,
                background_pressure,
            } => write!(
                f,
                "record {record} at {time}: central pressure {central_pressure} mb is not below \
                 background pressure {background_pressure} mb, Holland B is undefined"
            ),
            EnsembleError::Io(e) => write!(f, "track I/O error: {e}"),
            EnsembleError::Member { name, source } => write!(f, "member {name} failed: {source}"),
        }
    }
}

impl std::error::Error for EnsembleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnsembleError::Configuration(e) => Some(e),
            EnsembleError::Io(e) => Some(e),
            EnsembleError::Member { source, .. } => Some(source.as_ref()),
            EnsembleError::PhysicalConsistency { .. } => None,
        }
    }
}

impl From<ConfigurationError> for EnsembleError {
    fn from(e: ConfigurationError) -> Self {
        EnsembleError::Configuration(e)
    }
}

impl From<TrackIoError> for EnsembleError {
    fn from(e: TrackIoError) -> Self {
        EnsembleError::Io(e)
    }
}
