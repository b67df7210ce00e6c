//! Derived-quantity engine
//!
//! Validation times, initial conditions and the Holland-B pressure–wind
//! relationship used to keep perturbed tracks physically consistent.

pub mod derived;
pub mod holland;

pub use derived::{compute_initial, compute_vt_hours};
pub use holland::{compute_holland_b, compute_pc_from_vmax, compute_vmax_from_pc, RHO_AIR};
