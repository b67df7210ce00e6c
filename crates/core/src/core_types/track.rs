//! Storm track value type
//!
//! A [`Track`] is an ordered sequence of [`TrackRecord`]s, one per validation
//! time. Ensemble members are produced by cloning a base track and replacing
//! whole series through [`Track::set_series`]; nothing mutates a shared track
//! in place.

use super::units::{Knots, Millibars, NauticalMiles};
use crate::error::{ConfigurationError, EnsembleError};
use chrono::{DateTime, Utc};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar per-record quantities that can be read or replaced as a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackField {
    /// Maximum sustained wind speed (kt)
    MaxSustainedWindSpeed,
    /// Minimum central pressure (mbar)
    CentralPressure,
    /// Background (outer isobar) pressure (mbar)
    BackgroundPressure,
    /// Radius of maximum winds (nm)
    RadiusOfMaximumWinds,
}

impl TrackField {
    /// Column name used in log messages and errors
    pub const fn name(self) -> &'static str {
        match self {
            Self::MaxSustainedWindSpeed => "max_sustained_wind_speed",
            Self::CentralPressure => "central_pressure",
            Self::BackgroundPressure => "background_pressure",
            Self::RadiusOfMaximumWinds => "radius_of_maximum_winds",
        }
    }
}

impl fmt::Display for TrackField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wind radii for one isotach, clockwise from the north-east quadrant (nm)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IsotachRadii {
    /// Isotach wind speed (kt), typically 34, 50 or 64
    pub wind_speed: u32,
    /// NEQ, SEQ, SWQ, NWQ radii
    pub radii: [u32; 4],
}

/// ATCF columns that are carried through to the writer but never perturbed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AtcfExtras {
    /// Development level (TS, HU, EX, ...)
    pub development_level: String,
    /// Isotachs reported for this time, in file order (one ATCF line each)
    pub isotachs: Vec<IsotachRadii>,
    /// Radius of the last closed isobar (nm)
    pub outer_isobar_radius: f64,
    /// Gust speed (kt)
    pub gusts: f64,
    /// Eye diameter (nm)
    pub eye_diameter: f64,
    /// Storm heading (degrees clockwise from north)
    pub direction: f64,
    /// Storm translation speed (kt)
    pub speed: f64,
}

/// One storm state at a validation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Validation time
    pub time: DateTime<Utc>,
    /// Storm centre as (longitude, latitude) in degrees
    pub position: Point2<f64>,
    /// Maximum sustained wind speed
    pub max_sustained_wind_speed: Knots,
    /// Minimum central pressure
    pub central_pressure: Millibars,
    /// Ambient pressure at the outer closed isobar
    pub background_pressure: Millibars,
    /// Radius of maximum winds
    pub radius_of_maximum_winds: NauticalMiles,
    /// Passthrough columns
    pub extras: AtcfExtras,
}

impl TrackRecord {
    /// Create a record with empty passthrough columns
    pub fn new(
        time: DateTime<Utc>,
        position: Point2<f64>,
        max_sustained_wind_speed: Knots,
        central_pressure: Millibars,
        background_pressure: Millibars,
        radius_of_maximum_winds: NauticalMiles,
    ) -> Self {
        Self {
            time,
            position,
            max_sustained_wind_speed,
            central_pressure,
            background_pressure,
            radius_of_maximum_winds,
            extras: AtcfExtras::default(),
        }
    }

    /// Read one scalar field
    pub fn get(&self, field: TrackField) -> f64 {
        match field {
            TrackField::MaxSustainedWindSpeed => *self.max_sustained_wind_speed,
            TrackField::CentralPressure => *self.central_pressure,
            TrackField::BackgroundPressure => *self.background_pressure,
            TrackField::RadiusOfMaximumWinds => *self.radius_of_maximum_winds,
        }
    }

    /// Replace one scalar field
    pub fn set(&mut self, field: TrackField, value: f64) {
        match field {
            TrackField::MaxSustainedWindSpeed => self.max_sustained_wind_speed = Knots::new(value),
            TrackField::CentralPressure => self.central_pressure = Millibars::new(value),
            TrackField::BackgroundPressure => self.background_pressure = Millibars::new(value),
            TrackField::RadiusOfMaximumWinds => {
                self.radius_of_maximum_winds = NauticalMiles::new(value);
            }
        }
    }
}

/// Storm identification carried with a track
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StormInfo {
    /// Two-letter basin code (AL, EP, WP, ...)
    pub basin: String,
    /// Annual cyclone number within the basin
    pub number: u32,
    /// Storm name, upper case
    pub name: String,
}

/// Problems with the shape of a track
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    /// A track must have at least one record
    Empty,
    /// Record `index` is earlier than record `index - 1`
    OutOfOrder {
        /// Index of the offending record
        index: usize,
        /// Its validation time
        time: DateTime<Utc>,
    },
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::Empty => write!(f, "track has no records"),
            TrackError::OutOfOrder { index, time } => {
                write!(f, "record {index} at {time} is earlier than the record before it")
            }
        }
    }
}

impl std::error::Error for TrackError {}

/// An ordered storm trajectory
///
/// Deserialization goes through [`Track::new`], so a decoded track is never
/// empty or out of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrackParts")]
pub struct Track {
    storm: StormInfo,
    records: Vec<TrackRecord>,
}

/// Unchecked serialized form of a [`Track`]
#[derive(Deserialize)]
struct TrackParts {
    storm: StormInfo,
    records: Vec<TrackRecord>,
}

impl TryFrom<TrackParts> for Track {
    type Error = TrackError;

    fn try_from(parts: TrackParts) -> Result<Self, Self::Error> {
        Track::new(parts.storm, parts.records)
    }
}

impl Track {
    /// Build a track, checking it is non-empty and ordered by non-decreasing time
    ///
    /// # Errors
    /// Returns [`TrackError`] if the records are empty or out of order
    pub fn new(storm: StormInfo, records: Vec<TrackRecord>) -> Result<Self, TrackError> {
        if records.is_empty() {
            return Err(TrackError::Empty);
        }
        if let Some(index) = records
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
        {
            return Err(TrackError::OutOfOrder {
                index: index + 1,
                time: records[index + 1].time,
            });
        }
        Ok(Self { storm, records })
    }

    /// Storm identification
    pub fn storm(&self) -> &StormInfo {
        &self.storm
    }

    /// All records, ordered by time
    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed track
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The initial condition
    pub fn first(&self) -> &TrackRecord {
        // Non-empty is checked in `new`
        &self.records[0]
    }

    /// Time of the initial record
    pub fn start_time(&self) -> DateTime<Utc> {
        self.first().time
    }

    /// Time of the last record
    pub fn end_time(&self) -> DateTime<Utc> {
        self.records[self.records.len() - 1].time
    }

    /// Values of one field for every record
    pub fn series(&self, field: TrackField) -> Vec<f64> {
        self.records.iter().map(|r| r.get(field)).collect()
    }

    /// Replace one field for every record
    ///
    /// # Errors
    /// Returns a configuration error if `values` does not have one entry per record
    pub fn set_series(&mut self, field: TrackField, values: &[f64]) -> Result<(), EnsembleError> {
        if values.len() != self.records.len() {
            return Err(ConfigurationError::SeriesLengthMismatch {
                series: field.name(),
                expected: self.records.len(),
                found: values.len(),
            }
            .into());
        }
        for (record, &value) in self.records.iter_mut().zip(values) {
            record.set(field, value);
        }
        Ok(())
    }
}
