//! Perturbable storm variables
//!
//! Each variable knows which track field it drives, how its random factor is
//! drawn, which classification selects its error table, and its physical bounds.

use crate::core_types::TrackField;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a variable's per-member random factor is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionKind {
    /// Symmetric mean-absolute error scaled by a standard normal draw
    Gaussian,
    /// Convex combination of a minimum and maximum error curve
    Range,
}

/// Which initial-condition classification keys a variable's error table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationKind {
    /// Initial maximum sustained wind speed
    Strength,
    /// Initial radius of maximum winds
    Size,
}

/// A variable that the ensemble can perturb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbedVariable {
    /// Maximum sustained wind speed; central pressure follows via Holland-B
    #[serde(rename = "wind_speed")]
    MaxSustainedWindSpeed,
    /// Radius of maximum winds
    RadiusOfMaximumWinds,
    /// Track position normal to the direction of motion
    CrossTrack,
    /// Track position along the direction of motion
    AlongTrack,
}

impl PerturbedVariable {
    /// Every variable, in output order
    pub const ALL: [PerturbedVariable; 4] = [
        PerturbedVariable::MaxSustainedWindSpeed,
        PerturbedVariable::RadiusOfMaximumWinds,
        PerturbedVariable::CrossTrack,
        PerturbedVariable::AlongTrack,
    ];

    /// Name used for output files and on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::MaxSustainedWindSpeed => "wind_speed",
            Self::RadiusOfMaximumWinds => "radius_of_maximum_winds",
            Self::CrossTrack => "cross_track",
            Self::AlongTrack => "along_track",
        }
    }

    /// Stable small integer used to derive per-variable random streams
    pub const fn stream_id(self) -> u64 {
        match self {
            Self::MaxSustainedWindSpeed => 1,
            Self::RadiusOfMaximumWinds => 2,
            Self::CrossTrack => 3,
            Self::AlongTrack => 4,
        }
    }

    /// Track field holding this variable, `None` for position offsets
    pub const fn field(self) -> Option<TrackField> {
        match self {
            Self::MaxSustainedWindSpeed => Some(TrackField::MaxSustainedWindSpeed),
            Self::RadiusOfMaximumWinds => Some(TrackField::RadiusOfMaximumWinds),
            Self::CrossTrack | Self::AlongTrack => None,
        }
    }

    /// Random factor distribution
    pub const fn distribution(self) -> DistributionKind {
        match self {
            Self::RadiusOfMaximumWinds => DistributionKind::Range,
            Self::MaxSustainedWindSpeed | Self::CrossTrack | Self::AlongTrack => {
                DistributionKind::Gaussian
            }
        }
    }

    /// Classification used to select the error table
    pub const fn classification(self) -> ClassificationKind {
        match self {
            Self::RadiusOfMaximumWinds => ClassificationKind::Size,
            Self::MaxSustainedWindSpeed | Self::CrossTrack | Self::AlongTrack => {
                ClassificationKind::Strength
            }
        }
    }

    /// Inclusive physical bounds, `None` when unbounded
    pub const fn bounds(self) -> Option<(f64, f64)> {
        match self {
            Self::MaxSustainedWindSpeed => Some((25.0, 165.0)),
            Self::RadiusOfMaximumWinds => Some((5.0, 200.0)),
            Self::CrossTrack | Self::AlongTrack => None,
        }
    }

    /// Clamp a perturbed series to the physical bounds
    pub fn clamp(self, mut series: Vec<f64>) -> Vec<f64> {
        if let Some((lower, upper)) = self.bounds() {
            for value in &mut series {
                *value = value.clamp(lower, upper);
            }
        }
        series
    }
}

impl fmt::Display for PerturbedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PerturbedVariable {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wind_speed" | "max_sustained_wind_speed" | "vmax" => Ok(Self::MaxSustainedWindSpeed),
            "radius_of_maximum_winds" | "rmw" => Ok(Self::RadiusOfMaximumWinds),
            "cross_track" => Ok(Self::CrossTrack),
            "along_track" => Ok(Self::AlongTrack),
            _ => Err(ConfigurationError::UnknownVariable(s.to_string())),
        }
    }
}
