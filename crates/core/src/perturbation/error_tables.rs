//! Historical forecast error tables
//!
//! Mean absolute errors of official forecasts, stratified by initial storm
//! strength (wind speed) or initial storm size (radius of maximum winds), at
//! fixed validation-time anchors.
//!
//! The radius tables are published in statute miles as a (minimum, maximum)
//! error envelope. They are converted to nautical miles once, on first use, and
//! served as `'static` slices afterwards.
//!
//! Cross-track and along-track errors are not tabulated; asking for them is a
//! configuration error.

use super::classification::{Bucket, SizeClass, StrengthClass};
use super::variables::PerturbedVariable;
use crate::core_types::STATUTE_MILES_PER_NAUTICAL_MILE;
use crate::error::ConfigurationError;
use std::sync::OnceLock;

/// Validation-time anchors (hours) for strength-stratified tables
pub const STRENGTH_ANCHORS: [f64; 8] = [0.0, 12.0, 24.0, 36.0, 48.0, 72.0, 96.0, 120.0];

/// Validation-time anchors (hours) for size-stratified tables
pub const SIZE_ANCHORS: [f64; 9] = [0.0, 12.0, 24.0, 36.0, 48.0, 60.0, 72.0, 96.0, 120.0];

// Maximum sustained wind speed mean absolute error (kt)
const WIND_WEAK_KT: [f64; 8] = [1.45, 4.01, 6.17, 8.42, 10.46, 14.28, 18.26, 19.91];
const WIND_MEDIUM_KT: [f64; 8] = [2.26, 5.75, 8.54, 9.97, 11.28, 13.11, 13.46, 12.62];
const WIND_STRONG_KT: [f64; 8] = [2.80, 7.94, 11.53, 13.27, 12.66, 13.41, 13.46, 13.55];

/// Minimum/maximum error envelope for one size bucket
#[derive(Debug, Clone, Copy, PartialEq)]
struct RangeColumns {
    min: [f64; 9],
    max: [f64; 9],
}

// Radius of maximum winds error envelope (statute miles)
const RMW_STATUTE: [(SizeClass, RangeColumns); 5] = [
    (
        SizeClass::VerySmall,
        RangeColumns {
            min: [0.0, -13.82, -19.67, -21.37, -26.31, -32.71, -39.12, -46.80, -52.68],
            max: [0.0, 1.27, 0.22, 1.02, 0.00, -2.59, -5.18, -7.15, -12.91],
        },
    ),
    (
        SizeClass::Small,
        RangeColumns {
            min: [0.0, -10.47, -14.54, -15.80, -17.23, -18.12, -19.01, -21.81, -24.55],
            max: [0.0, 4.17, 6.70, 6.13, 6.54, 6.93, 7.32, 9.33, 8.03],
        },
    ),
    (
        SizeClass::Medium,
        RangeColumns {
            min: [0.0, -8.57, -13.41, -10.87, -9.26, -9.34, -9.42, -7.41, -7.40],
            max: [0.0, 8.21, 10.62, 13.93, 15.62, 16.04, 16.46, 16.51, 16.70],
        },
    ),
    (
        SizeClass::Large,
        RangeColumns {
            min: [0.0, -10.66, -7.64, -5.68, -3.25, -1.72, -0.19, 3.65, 2.59],
            max: [0.0, 14.77, 17.85, 22.07, 27.60, 27.08, 26.56, 26.80, 28.30],
        },
    ),
    (
        SizeClass::VeryLarge,
        RangeColumns {
            min: [0.0, -15.36, -10.37, 3.14, 12.10, 12.21, 12.33, 6.66, 7.19],
            max: [0.0, 21.43, 29.96, 37.22, 39.27, 39.10, 38.93, 34.40, 35.93],
        },
    ),
];

static RMW_NAUTICAL: OnceLock<[RangeColumns; 5]> = OnceLock::new();

fn rmw_nautical() -> &'static [RangeColumns; 5] {
    RMW_NAUTICAL.get_or_init(|| {
        RMW_STATUTE.map(|(_, columns)| RangeColumns {
            min: columns.min.map(|sm| sm / STATUTE_MILES_PER_NAUTICAL_MILE),
            max: columns.max.map(|sm| sm / STATUTE_MILES_PER_NAUTICAL_MILE),
        })
    })
}

const fn size_index(class: SizeClass) -> usize {
    match class {
        SizeClass::VerySmall => 0,
        SizeClass::Small => 1,
        SizeClass::Medium => 2,
        SizeClass::Large => 3,
        SizeClass::VeryLarge => 4,
    }
}

/// Error magnitudes at each anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorMagnitudes {
    /// One mean absolute error per anchor
    Symmetric(&'static [f64]),
    /// Minimum and maximum error per anchor
    Range {
        /// Error curve reached when the draw is 1
        min: &'static [f64],
        /// Error curve reached when the draw is 0
        max: &'static [f64],
    },
}

/// One error table: anchors plus the magnitudes tabulated at them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorTable {
    /// Strictly increasing validation times (hours)
    pub anchors: &'static [f64],
    /// Tabulated magnitudes, same length as `anchors`
    pub magnitudes: ErrorMagnitudes,
}

/// Fetch the error table for a variable and bucket
///
/// # Errors
/// - [`ConfigurationError::MissingErrorModel`] for cross-track and along-track
/// - [`ConfigurationError::UnrecognizedBucket`] if the bucket is of the wrong
///   classification for the variable
pub fn lookup(variable: PerturbedVariable, bucket: Bucket) -> Result<AnchorTable, ConfigurationError> {
    let mismatch = || ConfigurationError::UnrecognizedBucket {
        variable,
        bucket: bucket.label().to_string(),
    };
    match (variable, bucket) {
        (PerturbedVariable::MaxSustainedWindSpeed, Bucket::Strength(class)) => {
            let errors: &'static [f64] = match class {
                StrengthClass::Weak => &WIND_WEAK_KT,
                StrengthClass::Medium => &WIND_MEDIUM_KT,
                StrengthClass::Strong => &WIND_STRONG_KT,
            };
            Ok(AnchorTable {
                anchors: &STRENGTH_ANCHORS,
                magnitudes: ErrorMagnitudes::Symmetric(errors),
            })
        }
        (PerturbedVariable::RadiusOfMaximumWinds, Bucket::Size(class)) => {
            let columns = &rmw_nautical()[size_index(class)];
            Ok(AnchorTable {
                anchors: &SIZE_ANCHORS,
                magnitudes: ErrorMagnitudes::Range {
                    min: &columns.min,
                    max: &columns.max,
                },
            })
        }
        (PerturbedVariable::CrossTrack | PerturbedVariable::AlongTrack, Bucket::Strength(_)) => {
            Err(ConfigurationError::MissingErrorModel(variable))
        }
        _ => Err(mismatch()),
    }
}
