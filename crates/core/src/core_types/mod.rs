//! Core types: units and the storm track model

pub mod track;
pub mod units;

pub use track::{AtcfExtras, IsotachRadii, StormInfo, Track, TrackError, TrackField, TrackRecord};
pub use units::*;
