//! Track input and output
//!
//! The perturbation engine only needs two collaborators: something that loads a
//! base [`Track`] for a storm and something that stores each ensemble member.
//! ATCF implementations of both live in [`atcf`]; [`MemoryWriter`] keeps
//! members in memory for tests and embedding.

pub mod atcf;

pub use atcf::{format_atcf, parse_atcf, parse_atcf_datetime, AtcfFileProvider, Fort22Writer};

use crate::core_types::{Track, TrackError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Errors from loading or writing tracks
#[derive(Debug)]
pub enum TrackIoError {
    /// Failed to read a track source
    Read {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Failed to write a track
    Write {
        /// File that could not be written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Malformed line in a track source
    Parse {
        /// Source name (usually a path)
        source_name: String,
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },
    /// No records fall inside the requested window
    NoRecords {
        /// Storm identifier
        storm: String,
    },
    /// Records do not form a valid track
    InvalidTrack(TrackError),
}

impl fmt::Display for TrackIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackIoError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            TrackIoError::Write { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            TrackIoError::Parse {
                source_name,
                line,
                message,
            } => write!(f, "{source_name}:{line}: {message}"),
            TrackIoError::NoRecords { storm } => {
                write!(f, "no track records for {storm} in the requested window")
            }
            TrackIoError::InvalidTrack(e) => write!(f, "invalid track: {e}"),
        }
    }
}

impl std::error::Error for TrackIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackIoError::Read { source, .. } | TrackIoError::Write { source, .. } => Some(source),
            TrackIoError::InvalidTrack(e) => Some(e),
            TrackIoError::Parse { .. } | TrackIoError::NoRecords { .. } => None,
        }
    }
}

impl From<TrackError> for TrackIoError {
    fn from(e: TrackError) -> Self {
        TrackIoError::InvalidTrack(e)
    }
}

/// Optional inclusive start/end bounds on record times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    /// Earliest time kept
    pub start: Option<DateTime<Utc>>,
    /// Latest time kept
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    /// Window with the given bounds
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// True when `time` lies inside the window
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| time >= start) && self.end.map_or(true, |end| time <= end)
    }
}

/// Source of base tracks
pub trait TrackProvider {
    /// Load the track for `storm_id`, restricted to `window`
    ///
    /// # Errors
    /// Returns [`TrackIoError`] if the track cannot be read or is empty
    fn load(&self, storm_id: &str, window: DateWindow) -> Result<Track, TrackIoError>;
}

/// Sink for ensemble members
///
/// Writers are shared across worker threads, so they must be `Sync`.
pub trait TrackWriter: Sync {
    /// File extension of written tracks, without the dot
    fn extension(&self) -> &str;

    /// Store `track` under `name` (no extension)
    ///
    /// # Errors
    /// Returns [`TrackIoError`] if the track cannot be stored
    fn write(&self, track: &Track, name: &str) -> Result<(), TrackIoError>;
}

/// Writer that keeps every track in memory, keyed by name
#[derive(Debug, Default)]
pub struct MemoryWriter {
    tracks: Mutex<BTreeMap<String, Track>>,
}

impl MemoryWriter {
    /// Empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of a stored track
    pub fn get(&self, name: &str) -> Option<Track> {
        self.tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Names of all stored tracks, sorted
    pub fn names(&self) -> Vec<String> {
        self.tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Take all stored tracks
    pub fn into_tracks(self) -> BTreeMap<String, Track> {
        self.tracks
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl TrackWriter for MemoryWriter {
    fn extension(&self) -> &str {
        "mem"
    }

    fn write(&self, track: &Track, name: &str) -> Result<(), TrackIoError> {
        self.tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), track.clone());
        Ok(())
    }
}
