//! Quantities derived from a track: validation times and initial conditions

use crate::core_types::{Track, TrackField};

/// Hours elapsed since the first record, one entry per record
///
/// Non-decreasing because track records are ordered by time.
pub fn compute_vt_hours(track: &Track) -> Vec<f64> {
    let start = track.start_time();
    track
        .records()
        .iter()
        .map(|record| (record.time - start).num_seconds() as f64 / 3600.0)
        .collect()
}

/// Value of a field at the initial record
pub fn compute_initial(track: &Track, field: TrackField) -> f64 {
    track.first().get(field)
}
