//! ATCF best-track reading and `fort.22` writing
//!
//! ATCF b-deck files are comma-separated, one line per (time, isotach). The
//! columns used here are:
//!
//! | idx | column   | use                                   |
//! |-----|----------|---------------------------------------|
//! | 0   | BASIN    | storm info                            |
//! | 1   | CY       | storm info                            |
//! | 2   | YYYYMMDDHH | synoptic time                       |
//! | 5   | TAU      | forecast hour added to the time       |
//! | 6,7 | LAT, LON | tenths of degrees with hemisphere     |
//! | 8   | VMAX     | max sustained wind (kt)               |
//! | 9   | MSLP     | central pressure (mb)                 |
//! | 10  | TY       | development level                     |
//! | 11-16 | RAD, WINDCODE, RAD1-4 | isotach radii           |
//! | 17  | POUTER   | background pressure (mb)              |
//! | 18  | ROUTER   | outer isobar radius (nm)              |
//! | 19  | RMW      | radius of maximum winds (nm)          |
//! | 20,21 | GUSTS, EYE |                                   |
//! | 25,26 | DIR, SPEED |                                   |
//! | 27  | STORMNAME |                                      |
//!
//! Missing trailing columns read as zero. A zero POUTER is filled from the
//! previous record, or 1013 mb for the first. Rows sharing a time become one
//! record carrying every isotach, and are written back as one line each.

use super::{DateWindow, TrackIoError, TrackProvider, TrackWriter};
use crate::core_types::{
    AtcfExtras, IsotachRadii, Knots, Millibars, NauticalMiles, StormInfo, Track, TrackRecord,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use nalgebra::Point2;
use rustc_hash::FxHashMap;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Minimum number of columns for a usable line (through MSLP)
const MIN_COLUMNS: usize = 10;

/// Parse an ATCF `YYYYMMDDHH` timestamp
///
/// # Errors
/// Returns a message describing the malformed timestamp
pub fn parse_atcf_datetime(text: &str) -> Result<DateTime<Utc>, String> {
    let text = text.trim();
    if text.len() != 10 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected YYYYMMDDHH, got '{text}'"));
    }
    let field = |range: std::ops::Range<usize>| -> u32 {
        // All-digit check above makes this infallible
        text[range].parse().unwrap_or_default()
    };
    let year = i32::try_from(field(0..4)).map_err(|e| e.to_string())?;
    NaiveDate::from_ymd_opt(year, field(4..6), field(6..8))
        .and_then(|date| date.and_hms_opt(field(8..10), 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("'{text}' is not a valid date and hour"))
}

fn parse_coordinate(text: &str, positive: char, negative: char) -> Result<f64, String> {
    let text = text.trim();
    let hemisphere = text
        .chars()
        .last()
        .ok_or_else(|| "empty coordinate".to_string())?;
    let tenths: f64 = text[..text.len() - hemisphere.len_utf8()]
        .trim()
        .parse()
        .map_err(|_| format!("bad coordinate '{text}'"))?;
    match hemisphere.to_ascii_uppercase() {
        c if c == positive => Ok(tenths / 10.0),
        c if c == negative => Ok(-tenths / 10.0),
        _ => Err(format!("bad hemisphere in '{text}'")),
    }
}

fn number(columns: &[&str], index: usize) -> Result<f64, String> {
    match columns.get(index).map(|c| c.trim()) {
        None | Some("") => Ok(0.0),
        Some(text) => text
            .parse()
            .map_err(|_| format!("column {index}: '{text}' is not a number")),
    }
}

fn text(columns: &[&str], index: usize) -> String {
    columns
        .get(index)
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

struct Row {
    storm: StormInfo,
    record: TrackRecord,
}

fn parse_line(line: &str) -> Result<Row, String> {
    let columns: Vec<&str> = line.split(',').collect();
    if columns.len() < MIN_COLUMNS {
        return Err(format!(
            "expected at least {MIN_COLUMNS} columns, found {}",
            columns.len()
        ));
    }

    let tau = number(&columns, 5)? as i64;
    let time = parse_atcf_datetime(columns[2])? + Duration::hours(tau);
    let lat = parse_coordinate(columns[6], 'N', 'S')?;
    let lon = parse_coordinate(columns[7], 'E', 'W')?;

    let isotach_speed = number(&columns, 11)?;
    let isotach = (isotach_speed > 0.0).then(|| -> Result<IsotachRadii, String> {
        Ok(IsotachRadii {
            wind_speed: isotach_speed as u32,
            radii: [
                number(&columns, 13)? as u32,
                number(&columns, 14)? as u32,
                number(&columns, 15)? as u32,
                number(&columns, 16)? as u32,
            ],
        })
    });

    let record = TrackRecord {
        time,
        position: Point2::new(lon, lat),
        max_sustained_wind_speed: Knots::new(number(&columns, 8)?),
        central_pressure: Millibars::new(number(&columns, 9)?),
        background_pressure: Millibars::new(number(&columns, 17)?),
        radius_of_maximum_winds: NauticalMiles::new(number(&columns, 19)?),
        extras: AtcfExtras {
            development_level: text(&columns, 10),
            isotachs: isotach.transpose()?.into_iter().collect(),
            outer_isobar_radius: number(&columns, 18)?,
            gusts: number(&columns, 20)?,
            eye_diameter: number(&columns, 21)?,
            direction: number(&columns, 25)?,
            speed: number(&columns, 26)?,
        },
    };

    let storm = StormInfo {
        basin: text(&columns, 0).to_uppercase(),
        number: number(&columns, 1)? as u32,
        name: text(&columns, 27).to_uppercase(),
    };
    Ok(Row { storm, record })
}

/// Parse an ATCF b-deck into a track
///
/// Rows sharing a validation time (one per isotach) are merged into one
/// record: scalar columns come from the first row, and each row's isotach is
/// appended unless that wind speed is already present. Only records inside
/// `window` are kept.
///
/// # Errors
/// - [`TrackIoError::Parse`] for a malformed line
/// - [`TrackIoError::NoRecords`] if nothing falls inside the window
pub fn parse_atcf<R: BufRead>(
    reader: R,
    source_name: &str,
    window: DateWindow,
) -> Result<Track, TrackIoError> {
    let mut storm: Option<StormInfo> = None;
    let mut records: Vec<TrackRecord> = Vec::new();
    let mut by_time: FxHashMap<DateTime<Utc>, usize> = FxHashMap::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| TrackIoError::Parse {
            source_name: source_name.to_string(),
            line: index + 1,
            message: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_line(&line).map_err(|message| TrackIoError::Parse {
            source_name: source_name.to_string(),
            line: index + 1,
            message,
        })?;
        if !window.contains(row.record.time) {
            continue;
        }
        if let Some(&existing) = by_time.get(&row.record.time) {
            let isotachs = &mut records[existing].extras.isotachs;
            for isotach in row.record.extras.isotachs {
                if !isotachs.iter().any(|known| known.wind_speed == isotach.wind_speed) {
                    isotachs.push(isotach);
                }
            }
            continue;
        }
        storm.get_or_insert(row.storm);
        by_time.insert(row.record.time, records.len());
        records.push(row.record);
    }

    let Some(storm) = storm else {
        return Err(TrackIoError::NoRecords {
            storm: source_name.to_string(),
        });
    };

    records.sort_by_key(|r| r.time);
    let mut previous_background = Millibars::STANDARD_BACKGROUND;
    for record in &mut records {
        if *record.background_pressure <= 0.0 {
            record.background_pressure = previous_background;
        }
        previous_background = record.background_pressure;
    }

    debug!(
        "Parsed {} records for {}{:02} from {}",
        records.len(),
        storm.basin,
        storm.number,
        source_name
    );
    Ok(Track::new(storm, records)?)
}

fn hemisphere(value: f64, positive: char, negative: char) -> String {
    let tenths = (value.abs() * 10.0).round() as u32;
    let sign = if value < 0.0 { negative } else { positive };
    format!("{tenths}{sign}")
}

fn atcf_line(storm: &StormInfo, record: &TrackRecord, isotach: &IsotachRadii) -> String {
    let extras = &record.extras;
    format!(
        "{:>2}, {:02}, {},   , BEST,   0, {:>4}, {:>5},{:>4},{:>5}, {:>2},{:>4}, NEQ,{:>5},{:>5},{:>5},{:>5},{:>5},{:>5},{:>4},{:>4},{:>4},    ,   0,    ,{:>4},{:>4},{:>11},\n",
        storm.basin,
        storm.number,
        record.time.format("%Y%m%d%H"),
        hemisphere(record.position.y, 'N', 'S'),
        hemisphere(record.position.x, 'E', 'W'),
        record.max_sustained_wind_speed.round() as i64,
        record.central_pressure.round() as i64,
        extras.development_level,
        isotach.wind_speed,
        isotach.radii[0],
        isotach.radii[1],
        isotach.radii[2],
        isotach.radii[3],
        record.background_pressure.round() as i64,
        extras.outer_isobar_radius.round() as i64,
        record.radius_of_maximum_winds.round() as i64,
        extras.gusts.round() as i64,
        extras.eye_diameter.round() as i64,
        extras.direction.round() as i64,
        extras.speed.round() as i64,
        storm.name,
    )
}

/// Format a track as ATCF best-track lines (`fort.22` layout)
///
/// One line per isotach; a record without isotachs gets a single line with
/// zero radii.
pub fn format_atcf(track: &Track) -> String {
    let storm = track.storm();
    let no_isotach = [IsotachRadii::default()];
    let mut out = String::new();
    for record in track.records() {
        let isotachs: &[IsotachRadii] = if record.extras.isotachs.is_empty() {
            &no_isotach
        } else {
            &record.extras.isotachs
        };
        for isotach in isotachs {
            out.push_str(&atcf_line(storm, record, isotach));
        }
    }
    out
}

/// Reads `b{storm_id}.dat` b-decks from a directory
#[derive(Debug, Clone)]
pub struct AtcfFileProvider {
    directory: PathBuf,
}

impl AtcfFileProvider {
    /// Provider rooted at `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path of the b-deck for a storm, e.g. `bal062018.dat` for `al062018`
    pub fn path_for(&self, storm_id: &str) -> PathBuf {
        self.directory
            .join(format!("b{}.dat", storm_id.trim().to_lowercase()))
    }

    /// Read a specific file
    ///
    /// # Errors
    /// Returns [`TrackIoError`] if the file cannot be read or parsed
    pub fn read_file(path: &Path, window: DateWindow) -> Result<Track, TrackIoError> {
        let file = fs::File::open(path).map_err(|source| TrackIoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_atcf(
            std::io::BufReader::new(file),
            &path.display().to_string(),
            window,
        )
    }
}

impl TrackProvider for AtcfFileProvider {
    fn load(&self, storm_id: &str, window: DateWindow) -> Result<Track, TrackIoError> {
        let path = self.path_for(storm_id);
        match Self::read_file(&path, window) {
            Err(TrackIoError::NoRecords { .. }) => {
                warn!("{} has no records inside the requested window", path.display());
                Err(TrackIoError::NoRecords {
                    storm: storm_id.to_string(),
                })
            }
            other => other,
        }
    }
}

/// Writes tracks as `{name}.22` in an output directory
#[derive(Debug, Clone)]
pub struct Fort22Writer {
    directory: PathBuf,
}

impl Fort22Writer {
    /// Writer into `directory`, created if missing
    ///
    /// # Errors
    /// Returns [`TrackIoError::Write`] if the directory cannot be created
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, TrackIoError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| TrackIoError::Write {
            path: directory.clone(),
            source,
        })?;
        Ok(Self { directory })
    }

    /// Path a track named `name` is written to
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.{}", self.extension()))
    }
}

impl TrackWriter for Fort22Writer {
    fn extension(&self) -> &str {
        "22"
    }

    fn write(&self, track: &Track, name: &str) -> Result<(), TrackIoError> {
        let path = self.path_for(name);
        fs::write(&path, format_atcf(track))
            .map_err(|source| TrackIoError::Write { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FLORENCE: &str = "\
AL, 06, 2018091100,   , BEST,   0, 245N,  541W,  55, 1000, TS,  34, NEQ,  100,   70,   30,   90, 1012,  180,  20,  65,   0,   L,   0,    ,   0,   0,   FLORENCE, D,
AL, 06, 2018091100,   , BEST,   0, 245N,  541W,  55, 1000, TS,  50, NEQ,   40,    0,    0,   30, 1012,  180,  20,  65,   0,   L,   0,    ,   0,   0,   FLORENCE, D,
AL, 06, 2018091106,   , BEST,   0, 247N,  553W,  65,  990, HU,  34, NEQ,  110,   80,   40,  100,    0,  180,  15,  80,   0,   L,   0,    ,   0,   0,   FLORENCE, D,
AL, 06, 2018091112,   , BEST,   0, 250N,  565W,  75,  980, HU,  34, NEQ,  120,   90,   50,  110, 1011,  190,  15,  90,   0,   L,   0,    ,   0,   0,   FLORENCE, D,
";

    #[test]
    fn test_parse_datetime() {
        assert_eq!(
            parse_atcf_datetime("2018091106"),
            Ok(Utc.with_ymd_and_hms(2018, 9, 11, 6, 0, 0).unwrap())
        );
        assert!(parse_atcf_datetime("20180911").is_err());
        assert!(parse_atcf_datetime("2018023112").is_err());
    }

    #[test]
    fn test_parse_merges_isotach_rows_and_fills_background() {
        let track = parse_atcf(FLORENCE.as_bytes(), "test", DateWindow::default()).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.storm().basin, "AL");
        assert_eq!(track.storm().number, 6);
        assert_eq!(track.storm().name, "FLORENCE");

        let first = track.first();
        assert_eq!(first.position, Point2::new(-54.1, 24.5));
        assert_eq!(*first.max_sustained_wind_speed, 55.0);
        assert_eq!(*first.central_pressure, 1000.0);
        assert_eq!(*first.radius_of_maximum_winds, 20.0);
        assert_eq!(
            first.extras.isotachs,
            vec![
                IsotachRadii {
                    wind_speed: 34,
                    radii: [100, 70, 30, 90]
                },
                IsotachRadii {
                    wind_speed: 50,
                    radii: [40, 0, 0, 30]
                },
            ]
        );
        assert_eq!(track.records()[1].extras.isotachs.len(), 1);

        // POUTER of zero takes the previous record's value
        assert_eq!(*track.records()[1].background_pressure, 1012.0);
        assert_eq!(*track.records()[2].background_pressure, 1011.0);
    }

    #[test]
    fn test_parse_respects_window() {
        let window = DateWindow::new(
            Some(Utc.with_ymd_and_hms(2018, 9, 11, 6, 0, 0).unwrap()),
            None,
        );
        let track = parse_atcf(FLORENCE.as_bytes(), "test", window).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(*track.first().max_sustained_wind_speed, 65.0);

        let empty = DateWindow::new(None, Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()));
        assert!(matches!(
            parse_atcf(FLORENCE.as_bytes(), "test", empty),
            Err(TrackIoError::NoRecords { .. })
        ));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let bad = "AL, 06, 2018091100,   , BEST,   0, 245N,  541W,  fast, 1000,\n";
        match parse_atcf(bad.as_bytes(), "bad.dat", DateWindow::default()) {
            Err(TrackIoError::Parse { line, message, .. }) => {
                assert_eq!(line, 1);
                assert!(message.contains("fast"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_formatted_track_reads_back() {
        let track = parse_atcf(FLORENCE.as_bytes(), "test", DateWindow::default()).unwrap();
        let text = format_atcf(&track);
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("AL, 06, 2018091100,"));

        let reread = parse_atcf(text.as_bytes(), "formatted", DateWindow::default()).unwrap();
        assert_eq!(reread, track);
    }

    #[test]
    fn test_every_isotach_written_back() {
        let deck = "\
AL, 06, 2018091312,   , BEST,   0, 320N,  740W, 90,  955, HU,  34, NEQ,  170,  150,  100,  140, 1010,  270,  20, 110,   0,   L,   0,    , 300,  10,   FLORENCE, D,
AL, 06, 2018091312,   , BEST,   0, 320N,  740W, 90,  955, HU,  50, NEQ,   80,   70,   50,   60, 1010,  270,  20, 110,   0,   L,   0,    , 300,  10,   FLORENCE, D,
AL, 06, 2018091312,   , BEST,   0, 320N,  740W, 90,  955, HU,  64, NEQ,   40,   35,   25,   30, 1010,  270,  20, 110,   0,   L,   0,    , 300,  10,   FLORENCE, D,
AL, 06, 2018091312,   , BEST,   0, 320N,  740W, 90,  955, HU,  64, NEQ,   99,   99,   99,   99, 1010,  270,  20, 110,   0,   L,   0,    , 300,  10,   FLORENCE, D,
";
        let track = parse_atcf(deck.as_bytes(), "test", DateWindow::default()).unwrap();
        assert_eq!(track.len(), 1);
        let speeds: Vec<u32> = track.first().extras.isotachs.iter().map(|i| i.wind_speed).collect();
        assert_eq!(speeds, vec![34, 50, 64]);
        assert_eq!(track.first().extras.isotachs[2].radii, [40, 35, 25, 30]);

        let text = format_atcf(&track);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("  50, NEQ,   80,   70,   50,   60,"));
        assert!(lines[2].contains("  64, NEQ,   40,   35,   25,   30,"));

        let reread = parse_atcf(text.as_bytes(), "formatted", DateWindow::default()).unwrap();
        assert_eq!(reread, track);
    }

    #[test]
    fn test_record_without_isotachs_writes_one_line() {
        let mut track = parse_atcf(FLORENCE.as_bytes(), "test", DateWindow::default()).unwrap();
        let mut records = track.records().to_vec();
        for record in &mut records {
            record.extras.isotachs.clear();
        }
        track = Track::new(track.storm().clone(), records).unwrap();
        let text = format_atcf(&track);
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|line| line.contains("   0, NEQ,    0,    0,    0,    0,")));
    }

    #[test]
    fn test_fort22_writer_names_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Fort22Writer::new(dir.path().join("out")).unwrap();
        let track = parse_atcf(FLORENCE.as_bytes(), "test", DateWindow::default()).unwrap();
        writer.write(&track, "wind_speed_1").unwrap();

        let path = dir.path().join("out").join("wind_speed_1.22");
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written, format_atcf(&track));
    }

    #[test]
    fn test_provider_path_convention() {
        let provider = AtcfFileProvider::new("/data");
        assert_eq!(provider.path_for("AL062018"), PathBuf::from("/data/bal062018.dat"));
    }
}
