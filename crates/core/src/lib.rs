//! Storm Ensemble Core Library
//!
//! Generates ensembles of tropical cyclone tracks by perturbing a base best
//! track with historical forecast error statistics. Perturbed wind speeds are
//! coupled back to central pressure through the Holland (1980) B parameter so
//! every member stays on the base storm's pressure–wind curve.
//!
//! ## Pipeline
//!
//! - Load a base track ([`io::TrackProvider`], ATCF b-deck by default)
//! - Derive Holland B, validation times and the initial strength/size classes
//! - Interpolate the matching error table onto the validation times
//! - Draw one factor per member, perturb, clamp and write ([`io::TrackWriter`])

// Core types and utilities
pub mod core_types;
pub mod error;

// Error statistics and sampling
pub mod perturbation;

// Holland-B and track-derived quantities
pub mod physics;

// Track sources and sinks
pub mod io;

// Ensemble orchestration
pub mod ensemble;

// Re-export core types
pub use core_types::{Knots, MetersPerSecond, Millibars, NauticalMiles, Pascals, StatuteMiles};
pub use core_types::{StormInfo, Track, TrackField, TrackRecord};
pub use error::{ConfigurationError, EnsembleError};

// Re-export ensemble types
pub use ensemble::{EnsembleConfig, EnsembleGenerator, EnsembleMode, EnsembleReport};
pub use io::{AtcfFileProvider, DateWindow, Fort22Writer, MemoryWriter, TrackIoError};
pub use perturbation::PerturbedVariable;
