//! Holland (1980) pressure–wind relationship
//!
//! The Holland B shape parameter ties peak wind to the pressure deficit:
//!
//! B = ρ e Vmax² / ΔP
//!
//! Where:
//! - ρ = air density (1.15 kg/m³)
//! - e = Euler's number
//! - Vmax = maximum sustained wind (m/s)
//! - ΔP = background pressure - central pressure (Pa)
//!
//! Holding B fixed per record, a perturbed wind speed implies a new central
//! pressure, which keeps every ensemble member on the base storm's
//! pressure–wind curve.
//!
//! # References
//! - Holland, G.J. (1980). "An analytic model of the wind and pressure profiles
//!   in hurricanes". Monthly Weather Review, 108(8), 1212-1218

use crate::core_types::{Knots, MetersPerSecond, Millibars, Pascals, Track};
use crate::error::{ConfigurationError, EnsembleError};
use std::f64::consts::E;

/// Air density used by the relation (kg/m³)
pub const RHO_AIR: f64 = 1.15;

fn check_lengths(
    series: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), ConfigurationError> {
    if expected == found {
        Ok(())
    } else {
        Err(ConfigurationError::SeriesLengthMismatch {
            series,
            expected,
            found,
        })
    }
}

/// Holland B for each record of a track
///
/// # Errors
/// Returns [`EnsembleError::PhysicalConsistency`] for the first record whose
/// central pressure is not below its background pressure. Nothing is clamped.
pub fn compute_holland_b(track: &Track) -> Result<Vec<f64>, EnsembleError> {
    track
        .records()
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let deficit = (record.background_pressure - record.central_pressure).to_pascals();
            if *deficit <= 0.0 {
                return Err(EnsembleError::PhysicalConsistency {
                    record: index,
                    time: record.time,
                    central_pressure: *record.central_pressure,
                    background_pressure: *record.background_pressure,
                });
            }
            let vmax = *record.max_sustained_wind_speed.to_meters_per_second();
            Ok(vmax * vmax * RHO_AIR * E / *deficit)
        })
        .collect()
}

/// Central pressure (mbar) implied by wind speed at fixed Holland B
///
/// `holland_b` must come from the unperturbed track so the base storm's
/// pressure–wind coupling carries over to the perturbed wind.
///
/// # Errors
/// Returns a configuration error if the three series differ in length
pub fn compute_pc_from_vmax(
    vmax_kt: &[f64],
    holland_b: &[f64],
    background_pressure_mb: &[f64],
) -> Result<Vec<f64>, EnsembleError> {
    check_lengths("holland_b", vmax_kt.len(), holland_b.len())?;
    check_lengths("background_pressure", vmax_kt.len(), background_pressure_mb.len())?;
    Ok(vmax_kt
        .iter()
        .zip(holland_b)
        .zip(background_pressure_mb)
        .map(|((&vmax, &b), &pb)| {
            let vmax = *Knots::new(vmax).to_meters_per_second();
            let deficit = Pascals::new(vmax * vmax * RHO_AIR * E / b);
            pb - *deficit.to_millibars()
        })
        .collect())
}

/// Wind speed (kt) implied by central pressure at fixed Holland B
///
/// Inverse of [`compute_pc_from_vmax`]. A non-positive deficit yields zero wind.
///
/// # Errors
/// Returns a configuration error if the three series differ in length
pub fn compute_vmax_from_pc(
    central_pressure_mb: &[f64],
    holland_b: &[f64],
    background_pressure_mb: &[f64],
) -> Result<Vec<f64>, EnsembleError> {
    check_lengths("holland_b", central_pressure_mb.len(), holland_b.len())?;
    check_lengths(
        "background_pressure",
        central_pressure_mb.len(),
        background_pressure_mb.len(),
    )?;
    Ok(central_pressure_mb
        .iter()
        .zip(holland_b)
        .zip(background_pressure_mb)
        .map(|((&pc, &b), &pb)| {
            let deficit = *(Millibars::new(pb) - Millibars::new(pc)).to_pascals();
            let vmax = (b * deficit.max(0.0) / (RHO_AIR * E)).sqrt();
            *MetersPerSecond::new(vmax).to_knots()
        })
        .collect())
}
