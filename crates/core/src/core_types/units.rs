//! Semantic unit types for storm quantities
//!
//! Best-track data mixes knots, millibars and nautical miles, while the
//! Holland relation works in SI and the historical radius errors are tabulated
//! in statute miles. These newtypes keep the conversions explicit.
//!
//! # Design Philosophy
//! - All types wrap `f64`; track values are small series and precision matters
//!   more than memory
//! - Total ordering via `Ord` (NaN handled as greater than all values)
//! - Conversions are named methods plus `From` impls between related types
//! - Serde support for serialization
//!
//! # Usage
//! ```
//! use storm_ensemble_core::core_types::units::{Knots, NauticalMiles};
//!
//! let wind = Knots::new(100.0);
//! assert!((*wind.to_meters_per_second() - 51.4444444).abs() < 1e-6);
//!
//! let rmw = NauticalMiles::new(20.0);
//! assert!((*rmw.to_statute_miles() - 23.01562).abs() < 1e-5);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Mul, Sub};

/// Knots to metres per second
pub const KNOTS_TO_METERS_PER_SECOND: f64 = 0.514444444;

/// Millibars (hectopascals) to pascals
pub const MILLIBARS_TO_PASCALS: f64 = 100.0;

/// Statute miles per nautical mile
pub const STATUTE_MILES_PER_NAUTICAL_MILE: f64 = 1.150781;

/// Compare f64 values with total ordering using Rust's built-in `total_cmp`
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// ============================================================================
// VELOCITY TYPES
// ============================================================================

/// Wind speed in knots
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Knots(f64);

impl Eq for Knots {}

impl PartialOrd for Knots {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Knots {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Knots {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Knots {
    /// Create a new wind speed
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Knots(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to metres per second
    #[inline]
    #[must_use]
    pub fn to_meters_per_second(self) -> MetersPerSecond {
        MetersPerSecond(self.0 * KNOTS_TO_METERS_PER_SECOND)
    }
}

impl From<f64> for Knots {
    fn from(v: f64) -> Self {
        Knots(v)
    }
}

impl From<Knots> for f64 {
    fn from(v: Knots) -> f64 {
        v.0
    }
}

impl From<Knots> for MetersPerSecond {
    fn from(v: Knots) -> MetersPerSecond {
        v.to_meters_per_second()
    }
}

impl Add for Knots {
    type Output = Knots;
    fn add(self, rhs: Knots) -> Knots {
        Knots(self.0 + rhs.0)
    }
}

impl Sub for Knots {
    type Output = Knots;
    fn sub(self, rhs: Knots) -> Knots {
        Knots(self.0 - rhs.0)
    }
}

impl Mul<f64> for Knots {
    type Output = Knots;
    fn mul(self, rhs: f64) -> Knots {
        Knots(self.0 * rhs)
    }
}

impl fmt::Display for Knots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} kt", self.0)
    }
}

/// Velocity in metres per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MetersPerSecond(f64);

impl Eq for MetersPerSecond {}

impl PartialOrd for MetersPerSecond {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetersPerSecond {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for MetersPerSecond {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl MetersPerSecond {
    /// Create a new velocity
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        MetersPerSecond(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to knots
    #[inline]
    #[must_use]
    pub fn to_knots(self) -> Knots {
        Knots(self.0 / KNOTS_TO_METERS_PER_SECOND)
    }
}

impl From<MetersPerSecond> for Knots {
    fn from(v: MetersPerSecond) -> Knots {
        v.to_knots()
    }
}

impl fmt::Display for MetersPerSecond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} m/s", self.0)
    }
}

// ============================================================================
// PRESSURE TYPES
// ============================================================================

/// Pressure in millibars (hPa)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Millibars(f64);

impl Eq for Millibars {}

impl PartialOrd for Millibars {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Millibars {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Millibars {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Millibars {
    /// Standard ambient pressure used when a track has no outer isobar
    pub const STANDARD_BACKGROUND: Millibars = Millibars(1013.0);

    /// Create a new pressure
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Millibars(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to pascals
    #[inline]
    #[must_use]
    pub fn to_pascals(self) -> Pascals {
        Pascals(self.0 * MILLIBARS_TO_PASCALS)
    }
}

impl From<f64> for Millibars {
    fn from(v: f64) -> Self {
        Millibars(v)
    }
}

impl From<Millibars> for f64 {
    fn from(v: Millibars) -> f64 {
        v.0
    }
}

impl From<Millibars> for Pascals {
    fn from(v: Millibars) -> Pascals {
        v.to_pascals()
    }
}

// Pressure difference stays in millibars (e.g. background - central = deficit)
impl Sub for Millibars {
    type Output = Millibars;
    fn sub(self, rhs: Millibars) -> Millibars {
        Millibars(self.0 - rhs.0)
    }
}

impl fmt::Display for Millibars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} mb", self.0)
    }
}

/// Pressure in pascals
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Pascals(f64);

impl Deref for Pascals {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Pascals {
    /// Create a new pressure
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Pascals(value)
    }

    /// Convert to millibars
    #[inline]
    #[must_use]
    pub fn to_millibars(self) -> Millibars {
        Millibars(self.0 / MILLIBARS_TO_PASCALS)
    }
}

impl fmt::Display for Pascals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} Pa", self.0)
    }
}

// ============================================================================
// DISTANCE TYPES
// ============================================================================

/// Distance in nautical miles
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NauticalMiles(f64);

impl Eq for NauticalMiles {}

impl PartialOrd for NauticalMiles {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NauticalMiles {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for NauticalMiles {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl NauticalMiles {
    /// Create a new distance
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        NauticalMiles(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to statute miles
    #[inline]
    #[must_use]
    pub fn to_statute_miles(self) -> StatuteMiles {
        StatuteMiles(self.0 * STATUTE_MILES_PER_NAUTICAL_MILE)
    }
}

impl From<f64> for NauticalMiles {
    fn from(v: f64) -> Self {
        NauticalMiles(v)
    }
}

impl From<NauticalMiles> for f64 {
    fn from(v: NauticalMiles) -> f64 {
        v.0
    }
}

impl From<NauticalMiles> for StatuteMiles {
    fn from(v: NauticalMiles) -> StatuteMiles {
        v.to_statute_miles()
    }
}

impl Add for NauticalMiles {
    type Output = NauticalMiles;
    fn add(self, rhs: NauticalMiles) -> NauticalMiles {
        NauticalMiles(self.0 + rhs.0)
    }
}

impl fmt::Display for NauticalMiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} nm", self.0)
    }
}

/// Distance in statute miles
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StatuteMiles(f64);

impl Eq for StatuteMiles {}

impl PartialOrd for StatuteMiles {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StatuteMiles {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for StatuteMiles {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl StatuteMiles {
    /// Create a new distance
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        StatuteMiles(value)
    }

    /// Convert to nautical miles
    #[inline]
    #[must_use]
    pub fn to_nautical_miles(self) -> NauticalMiles {
        NauticalMiles(self.0 / STATUTE_MILES_PER_NAUTICAL_MILE)
    }
}

impl From<StatuteMiles> for NauticalMiles {
    fn from(v: StatuteMiles) -> NauticalMiles {
        v.to_nautical_miles()
    }
}

impl fmt::Display for StatuteMiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} sm", self.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
