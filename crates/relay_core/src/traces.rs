//! Input record types and their file loaders.
//!
//! Loaders are lenient: a row that cannot be parsed is skipped with a warning
//! and loading continues. Only I/O failures abort.

use std::fs::File;
use std::path::Path;

use chrono::DateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agents::AgentId;
use crate::error::SimResult;
use crate::social::DEFAULT_EDGE_WEIGHT;
use crate::spatial::Point;

/// One timestamped geographic fix of an agent. `time` is in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MobilityPoint {
    pub agent: AgentId,
    pub time: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// A recorded contact between two devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRecord {
    pub first: AgentId,
    pub second: AgentId,
    pub start_time: f64,
    pub end_time: f64,
    pub signal_strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocialEdge {
    pub first: AgentId,
    pub second: AgentId,
    pub weight: f64,
}

fn open_reader(path: &Path, delimiter: u8) -> SimResult<csv::Reader<File>> {
    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file))
}

/// Reads every row after the first `skip_rows`, handing each to `parse`.
/// Rows that fail to parse are logged and dropped.
fn read_rows<T>(
    path: &Path,
    delimiter: u8,
    skip_rows: usize,
    mut parse: impl FnMut(&StringRecord) -> Option<T>,
) -> SimResult<Vec<T>> {
    let mut reader = open_reader(path, delimiter)?;
    let mut out = Vec::new();
    let mut skipped = 0usize;
    for (line, row) in reader.records().enumerate().skip(skip_rows) {
        let parsed = match row {
            Ok(record) => parse(&record),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(_) => None,
        };
        match parsed {
            Some(value) => out.push(value),
            None => {
                skipped += 1;
                warn!(path = %path.display(), line = line + 1, "skipping malformed row");
            }
        }
    }
    info!(
        path = %path.display(),
        rows = out.len(),
        skipped,
        "loaded input file"
    );
    Ok(out)
}

fn field<T: std::str::FromStr>(record: &StringRecord, idx: usize) -> Option<T> {
    record.get(idx)?.parse().ok()
}

/// Numeric timestamps are taken as-is; RFC 3339 strings become epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    if let Ok(value) = raw.parse::<f64>() {
        return value.is_finite().then_some(value);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis() as f64)
}

/// Edge list: `first, second[, weight]`.
pub fn load_social_edges(
    path: impl AsRef<Path>,
    delimiter: u8,
    skip_rows: usize,
) -> SimResult<Vec<SocialEdge>> {
    read_rows(path.as_ref(), delimiter, skip_rows, |record| {
        let first = field(record, 0)?;
        let second = field(record, 1)?;
        let weight = match record.get(2) {
            Some(raw) if !raw.is_empty() => raw.parse().ok()?,
            _ => DEFAULT_EDGE_WEIGHT,
        };
        Some(SocialEdge {
            first,
            second,
            weight,
        })
    })
}

/// St Andrews layout: `id1, id2, start, end, upload, rssi, ...` with one header row.
pub fn load_encounter_records(path: impl AsRef<Path>) -> SimResult<Vec<EncounterRecord>> {
    read_rows(path.as_ref(), b',', 1, |record| {
        let start_time: f64 = field(record, 2)?;
        let end_time: f64 = field(record, 3)?;
        if end_time < start_time {
            return None;
        }
        Some(EncounterRecord {
            first: field(record, 0)?,
            second: field(record, 1)?,
            start_time,
            end_time,
            signal_strength: field(record, 5).unwrap_or(0.0),
        })
    })
}

/// `agent, timestamp, latitude, longitude`.
pub fn load_mobility_points(
    path: impl AsRef<Path>,
    delimiter: u8,
    skip_rows: usize,
) -> SimResult<Vec<MobilityPoint>> {
    read_rows(path.as_ref(), delimiter, skip_rows, |record| {
        Some(MobilityPoint {
            agent: field(record, 0)?,
            time: parse_timestamp(record.get(1)?)?,
            latitude: field(record, 2)?,
            longitude: field(record, 3)?,
        })
    })
}

/// One cab's trace: `lat lon occupancy epoch_seconds`, space separated.
pub fn load_cabspotting_trace(
    path: impl AsRef<Path>,
    agent: AgentId,
) -> SimResult<Vec<MobilityPoint>> {
    read_rows(path.as_ref(), b' ', 0, |record| {
        let seconds: f64 = field(record, 3)?;
        Some(MobilityPoint {
            agent,
            time: seconds * 1000.0,
            latitude: field(record, 0)?,
            longitude: field(record, 1)?,
        })
    })
}

/// An index file listing one trace file per line. Line `i` becomes agent `i`,
/// up to `limit` agents. Relative names resolve against the index's directory.
pub fn load_cabspotting_index(
    index: impl AsRef<Path>,
    limit: usize,
) -> SimResult<Vec<MobilityPoint>> {
    let index = index.as_ref();
    let base = index.parent().unwrap_or_else(|| Path::new("."));
    let names = std::fs::read_to_string(index)?;
    let mut points = Vec::new();
    for (agent, name) in names
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(limit)
        .enumerate()
    {
        points.extend(load_cabspotting_trace(base.join(name), agent as AgentId)?);
    }
    Ok(points)
}

/// Jammer coordinates on the plane, `x, y`, at most `limit` rows.
pub fn load_jammer_locations(path: impl AsRef<Path>, limit: usize) -> SimResult<Vec<Point>> {
    let mut points = read_rows(path.as_ref(), b',', 0, |record| {
        Some(Point::new(field(record, 0)?, field(record, 1)?))
    })?;
    points.truncate(limit);
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn social_edges_skip_header_and_bad_rows() {
        let file = file_with("id1,id2\n1,2\nx,3\n2,3,0.5\n");
        let edges = load_social_edges(file.path(), b',', 1).expect("load");
        assert_eq!(
            edges,
            vec![
                SocialEdge { first: 1, second: 2, weight: 1.0 },
                SocialEdge { first: 2, second: 3, weight: 0.5 },
            ]
        );
    }

    #[test]
    fn tab_separated_edges_without_header() {
        let file = file_with("0\t1\n1\t5\n");
        let edges = load_social_edges(file.path(), b'\t', 0).expect("load");
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].second, 5);
    }

    #[test]
    fn encounter_records_follow_st_andrews_columns() {
        let file = file_with(
            "id1,id2,start,end,upload,rssi,err\n3,4,100,160,0,-71,0\n4,3,50,10,0,-60,0\n",
        );
        let records = load_encounter_records(file.path()).expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].first, 3);
        assert_eq!(records[0].start_time, 100.0);
        assert_eq!(records[0].signal_strength, -71.0);
    }

    #[test]
    fn mobility_points_accept_rfc3339_timestamps() {
        let file = file_with("7,1970-01-01T00:00:01Z,37.7,-122.4\n8,2500,37.8,-122.3\n");
        let points = load_mobility_points(file.path(), b',', 0).expect("load");
        assert_eq!(points[0].time, 1000.0);
        assert_eq!(points[1].time, 2500.0);
        assert_eq!(points[1].agent, 8);
    }

    #[test]
    fn cabspotting_seconds_become_milliseconds() {
        let file = file_with("37.75 -122.39 0 1213084687\n37.76 -122.40 1 1213084750\n");
        let points = load_cabspotting_trace(file.path(), 4).expect("load");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].agent, 4);
        assert_eq!(points[0].time, 1_213_084_687_000.0);
    }

    #[test]
    fn cabspotting_index_assigns_ids_in_listing_order() {
        let dir = tempfile::tempdir().expect("dir");
        std::fs::write(dir.path().join("a.txt"), "37.7 -122.4 0 10\n").expect("write");
        std::fs::write(dir.path().join("b.txt"), "37.8 -122.3 0 20\n").expect("write");
        let index = dir.path().join("index.txt");
        std::fs::write(&index, "a.txt\nb.txt\n").expect("write");
        let points = load_cabspotting_index(&index, 10).expect("load");
        assert_eq!(points.iter().map(|p| p.agent).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn jammer_locations_are_limited() {
        let file = file_with("1,2\n3,4\n5,6\n");
        let points = load_jammer_locations(file.path(), 2).expect("load");
        assert_eq!(points, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_jammer_locations("/definitely/not/here.csv", 3).unwrap_err();
        assert!(matches!(err, crate::error::SimError::Io(_)));
    }
}
