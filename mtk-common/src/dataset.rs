//! Dataset IO
//!
//! Two on-disk formats are involved:
//! - the **record log**: JSON lines appended by the scraper, tags as a list
//! - the **dataset**: CSV with header `id,title,score,members,demographic,tags`
//!
//! Reading a dataset and writing it back unchanged preserves the row count and
//! every field value. Empty CSV fields are absent values; a non-numeric score
//! is coerced to absent, matching how the dataset was historically cleaned.

use crate::record::Record;
use crate::tags::Tags;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Column order of the CSV dataset
pub const CSV_HEADER: [&str; 6] = ["id", "title", "score", "members", "demographic", "tags"];

/// Demographic placeholder the scraper writes when the API has none
pub const UNKNOWN_DEMOGRAPHIC: &str = "Unknown";

/// One CSV row before type conversion
#[derive(Debug, Default, Deserialize, Serialize)]
struct CsvRow {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: String,
    #[serde(default)]
    members: String,
    #[serde(default)]
    demographic: String,
    #[serde(default)]
    tags: String,
}

impl CsvRow {
    fn into_record(self) -> Result<Record> {
        let id = parse_integral(&self.id)
            .ok_or_else(|| Error::InvalidInput(format!("invalid id '{}'", self.id)))?;

        let members = match self.members.trim() {
            "" => None,
            raw => match parse_integral(raw) {
                Some(v) if v < 0 => {
                    return Err(Error::InvalidInput(format!(
                        "record {}: negative members {}",
                        id, v
                    )))
                }
                Some(v) => Some(v as u64),
                None => None,
            },
        };

        let record = Record {
            id,
            title: self.title,
            score: parse_score(&self.score),
            members,
            demographic: non_empty(self.demographic),
            tags: Tags::from_raw(self.tags),
        };
        record.validate()?;
        Ok(record)
    }

    fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            score: record.score.map(|s| s.to_string()).unwrap_or_default(),
            members: record.members.map(|m| m.to_string()).unwrap_or_default(),
            demographic: record.demographic.clone().unwrap_or_default(),
            tags: record.tags.as_str().to_string(),
        }
    }
}

/// Parse an integer, accepting integral floats such as `12000.0`
fn parse_integral(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())
}

fn non_empty(raw: String) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw)
    }
}

fn open_existing(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })
}

/// Read a dataset, failing on the first malformed row
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for (index, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // Row 1 is the header
        let line = index + 2;
        let record = row?
            .into_record()
            .map_err(|e| Error::InvalidInput(format!("row {}: {}", line, e)))?;
        records.push(record);
    }
    Ok(records)
}

/// Read a dataset file, failing on the first malformed row
pub fn read_csv(path: &Path) -> Result<Vec<Record>> {
    let records = read_records(open_existing(path)?)?;
    info!(path = %path.display(), rows = records.len(), "Loaded dataset");
    Ok(records)
}

/// Result of a lenient read
#[derive(Debug, Default)]
pub struct LenientRead {
    pub records: Vec<Record>,
    /// Rows that could not be parsed and were skipped
    pub skipped: usize,
}

/// Read a dataset, skipping malformed rows instead of failing
pub fn read_records_lenient<R: Read>(reader: R) -> Result<LenientRead> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    // A missing header makes every row meaningless
    csv_reader.headers()?;

    let mut out = LenientRead::default();
    for (index, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
        match row.map_err(Error::from).and_then(CsvRow::into_record) {
            Ok(record) => out.records.push(record),
            Err(e) => {
                debug!(row = index + 2, error = %e, "Skipping malformed row");
                out.skipped += 1;
            }
        }
    }
    Ok(out)
}

/// Read a dataset file, skipping malformed rows
pub fn read_csv_lenient(path: &Path) -> Result<LenientRead> {
    read_records_lenient(open_existing(path)?)
}

/// Write records with the dataset header
pub fn write_records<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv_writer.write_record(CSV_HEADER)?;
    }
    for record in records {
        csv_writer.serialize(CsvRow::from_record(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write records to a dataset file, replacing it
pub fn write_csv(path: &Path, records: &[Record]) -> Result<()> {
    let file = File::create(path)?;
    write_records(file, records)?;
    info!(path = %path.display(), rows = records.len(), "Wrote dataset");
    Ok(())
}

// ============================================================================
// Record log (JSON lines)
// ============================================================================

/// One line of the scraper's record log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub score: Option<f64>,
    pub members: Option<u64>,
    pub demographic: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl LogRecord {
    /// Convert to a dataset record; `None` when the log line has no id
    pub fn into_record(self) -> Option<Record> {
        let id = self.id?;
        let demographic = self
            .demographic
            .filter(|d| !d.trim().is_empty() && d != UNKNOWN_DEMOGRAPHIC);
        Some(Record {
            id,
            title: self.title.unwrap_or_default(),
            score: self.score.filter(|s| s.is_finite()),
            members: self.members,
            demographic,
            tags: Tags::from_labels(&self.tags),
        })
    }
}

/// Result of reading a record log
#[derive(Debug, Default)]
pub struct LogRead {
    pub records: Vec<LogRecord>,
    /// Non-empty lines that were not valid JSON records
    pub skipped: usize,
}

/// Read a JSON lines record log, skipping blank and undecodable lines
pub fn read_log<R: BufRead>(reader: R) -> Result<LogRead> {
    let mut out = LogRead::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<LogRecord>(trimmed) {
            Ok(record) => out.records.push(record),
            Err(e) => {
                debug!(line = index + 1, error = %e, "Skipping undecodable log line");
                out.skipped += 1;
            }
        }
    }
    Ok(out)
}

/// Read a record log file
pub fn read_log_file(path: &Path) -> Result<LogRead> {
    read_log(BufReader::new(open_existing(path)?))
}

/// Append one record to a JSON lines writer
pub fn append_log<W: Write>(writer: &mut W, record: &LogRecord) -> Result<()> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")?;
    Ok(())
}

// ============================================================================
// Conversion and merging
// ============================================================================

/// Outcome of converting a record log into a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub written: usize,
    /// Undecodable lines plus lines without an id
    pub skipped: usize,
}

/// Convert a JSON lines record log into a CSV dataset sorted by id
pub fn convert_log_to_csv(input: &Path, output: &Path) -> Result<ConvertSummary> {
    let log = read_log_file(input)?;
    let total = log.records.len();
    let mut records: Vec<Record> = log
        .records
        .into_iter()
        .filter_map(LogRecord::into_record)
        .collect();
    let without_id = total - records.len();
    records.sort_by_key(|r| r.id);

    write_csv(output, &records)?;

    let summary = ConvertSummary {
        written: records.len(),
        skipped: log.skipped + without_id,
    };
    info!(
        input = %input.display(),
        output = %output.display(),
        written = summary.written,
        skipped = summary.skipped,
        "Converted record log"
    );
    Ok(summary)
}

/// Outcome of merging datasets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub files_read: usize,
    pub files_missing: Vec<PathBuf>,
    pub rows_read: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub written: usize,
}

/// Concatenate datasets in order and drop duplicate ids, keeping the first
///
/// Missing input files are reported and skipped; the merge fails only when no
/// input could be read at all.
pub fn merge_datasets(inputs: &[PathBuf], output: &Path) -> Result<MergeSummary> {
    let mut summary = MergeSummary::default();
    let mut merged: Vec<Record> = Vec::new();

    for input in inputs {
        let read = match read_csv_lenient(input) {
            Ok(read) => read,
            Err(Error::NotFound(_)) => {
                warn!(path = %input.display(), "Dataset not found, skipping");
                summary.files_missing.push(input.clone());
                continue;
            }
            Err(e) => return Err(e),
        };
        info!(
            path = %input.display(),
            rows = read.records.len(),
            malformed = read.skipped,
            "Loaded dataset for merge"
        );
        summary.files_read += 1;
        summary.rows_read += read.records.len();
        summary.malformed += read.skipped;
        merged.extend(read.records);
    }

    if summary.files_read == 0 {
        return Err(Error::NotFound("no input dataset could be read".to_string()));
    }

    let before = merged.len();
    let mut seen = HashSet::new();
    merged.retain(|r| seen.insert(r.id));
    summary.duplicates = before - merged.len();
    summary.written = merged.len();

    write_csv(output, &merged)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "id,title,score,members,demographic,tags\n\
        2,Berserk,9.47,700000,Seinen,\"Action, Adventure, Drama\"\n\
        13,One Piece,9.22,600000.0,Shounen,\"Action, Adventure\"\n\
        99,Obscure,,12,,\n";

    #[test]
    fn test_read_records_parses_fields() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].score, Some(9.47));
        assert_eq!(records[1].members, Some(600_000));
        assert_eq!(records[2].score, None);
        assert_eq!(records[2].demographic, None);
        assert!(records[2].tags.is_empty());
    }

    #[test]
    fn test_non_numeric_score_is_coerced_to_absent() {
        let csv = "id,title,score,members,demographic,tags\n1,X,N/A,5,,\n";
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records[0].score, None);
    }

    #[test]
    fn test_strict_read_reports_bad_row() {
        let csv = "id,title,score,members,demographic,tags\nabc,X,1,5,,\n";
        let err = read_records(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_lenient_read_skips_bad_rows() {
        let csv = "id,title,score,members,demographic,tags\n\
            1,A,7,5,,\n\
            oops,B,7,5,,\n\
            3,C,11,5,,\n\
            4,D,6,5,,\n";
        let read = read_records_lenient(csv.as_bytes()).unwrap();
        assert_eq!(read.records.len(), 2);
        assert_eq!(read.skipped, 2);
    }

    #[test]
    fn test_write_then_read_preserves_values() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_records(&mut buf, &records).unwrap();
        let again = read_records(buf.as_slice()).unwrap();
        assert_eq!(records, again);
    }

    #[test]
    fn test_write_empty_dataset_keeps_header() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim(), CSV_HEADER.join(","));
    }

    #[test]
    fn test_log_record_conversion() {
        let line = r#"{"id": 5, "title": "Yotsuba", "score": 8.6, "members": 90000, "demographic": "Unknown", "tags": ["Comedy", "Slice of Life"]}"#;
        let log = read_log(format!("{}\n\nnot json\n", line).as_bytes()).unwrap();
        assert_eq!(log.records.len(), 1);
        assert_eq!(log.skipped, 1);

        let record = log.records[0].clone().into_record().unwrap();
        assert_eq!(record.demographic, None);
        assert_eq!(record.tags.as_str(), "Comedy, Slice of Life");
    }

    #[test]
    fn test_append_log_writes_one_line() {
        let record = LogRecord {
            id: Some(1),
            title: Some("A".to_string()),
            score: None,
            members: Some(3),
            demographic: Some("Josei".to_string()),
            tags: vec!["Drama".to_string()],
        };
        let mut buf = Vec::new();
        append_log(&mut buf, &record).unwrap();
        append_log(&mut buf, &record).unwrap();
        let log = read_log(buf.as_slice()).unwrap();
        assert_eq!(log.records, vec![record.clone(), record]);
    }
}
