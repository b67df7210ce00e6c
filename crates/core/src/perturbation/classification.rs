//! Initial-condition classification
//!
//! The historical error statistics are stratified by how strong or how large the
//! storm is at the start of the forecast. Both classifiers are total: every
//! finite input lands in exactly one bucket.

use super::variables::{ClassificationKind, PerturbedVariable};
use crate::core_types::{Knots, NauticalMiles};
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storm strength bucket from initial maximum sustained wind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrengthClass {
    /// Below 50 kt
    Weak,
    /// 50 kt to 95 kt inclusive
    Medium,
    /// Above 95 kt
    Strong,
}

impl StrengthClass {
    /// Label as used in the published error tables
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weak => "<50kt",
            Self::Medium => "50-95kt",
            Self::Strong => ">95kt",
        }
    }
}

/// Storm size bucket from initial radius of maximum winds (statute miles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    /// Below 15 sm
    VerySmall,
    /// 15 sm up to 25 sm
    Small,
    /// 25 sm up to 35 sm
    Medium,
    /// 35 sm up to 45 sm
    Large,
    /// 45 sm and above
    VeryLarge,
}

impl SizeClass {
    /// Label as used in the published error tables
    pub const fn label(self) -> &'static str {
        match self {
            Self::VerySmall => "<15sm",
            Self::Small => "15-25sm",
            Self::Medium => "25-35sm",
            Self::Large => "35-45sm",
            Self::VeryLarge => ">45sm",
        }
    }
}

/// Either kind of bucket, as used to key the error tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    /// Strength bucket
    Strength(StrengthClass),
    /// Size bucket
    Size(SizeClass),
}

impl Bucket {
    /// Which classifier produced this bucket
    pub const fn kind(self) -> ClassificationKind {
        match self {
            Self::Strength(_) => ClassificationKind::Strength,
            Self::Size(_) => ClassificationKind::Size,
        }
    }

    /// Table label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Strength(class) => class.label(),
            Self::Size(class) => class.label(),
        }
    }

    /// Parse a table label for the given variable
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UnrecognizedBucket`] if the label is not one of
    /// the variable's classification labels
    pub fn parse_for(variable: PerturbedVariable, label: &str) -> Result<Self, ConfigurationError> {
        let trimmed = label.trim();
        let found = match variable.classification() {
            ClassificationKind::Strength => [
                StrengthClass::Weak,
                StrengthClass::Medium,
                StrengthClass::Strong,
            ]
            .into_iter()
            .find(|c| c.label() == trimmed)
            .map(Bucket::Strength),
            ClassificationKind::Size => [
                SizeClass::VerySmall,
                SizeClass::Small,
                SizeClass::Medium,
                SizeClass::Large,
                SizeClass::VeryLarge,
            ]
            .into_iter()
            .find(|c| c.label() == trimmed)
            .map(Bucket::Size),
        };
        found.ok_or_else(|| ConfigurationError::UnrecognizedBucket {
            variable,
            bucket: label.to_string(),
        })
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify initial intensity: `< 50` weak, `> 95` strong, otherwise medium
pub fn intensity_class(wind: Knots) -> StrengthClass {
    if *wind < 50.0 {
        StrengthClass::Weak
    } else if *wind > 95.0 {
        StrengthClass::Strong
    } else {
        StrengthClass::Medium
    }
}

/// Classify initial size after converting the radius to statute miles
///
/// Each threshold belongs to the bucket above it (`< 15` is very small, so
/// exactly 15 sm is small).
pub fn size_class(rmw: NauticalMiles) -> SizeClass {
    let sm = *rmw.to_statute_miles();
    if sm < 15.0 {
        SizeClass::VerySmall
    } else if sm < 25.0 {
        SizeClass::Small
    } else if sm < 35.0 {
        SizeClass::Medium
    } else if sm < 45.0 {
        SizeClass::Large
    } else {
        SizeClass::VeryLarge
    }
}

/// Select the bucket a variable uses given the two initial-condition classes
pub fn bucket_for(
    variable: PerturbedVariable,
    strength: StrengthClass,
    size: SizeClass,
) -> Bucket {
    match variable.classification() {
        ClassificationKind::Strength => Bucket::Strength(strength),
        ClassificationKind::Size => Bucket::Size(size),
    }
}
