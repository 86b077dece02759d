//! Corpus loader: reads chunk records from directories of JSONL files.
//!
//! Locations are scanned in the configured order; files inside a location
//! are visited in lexical file-name order. Each line of a matching file is
//! one record. Loading is best-effort:
//!
//! - a line that is not valid JSON is skipped,
//! - a record without a non-empty text field is skipped,
//! - a missing or unreadable location or file is skipped with a warning.
//!
//! Loading stops as soon as `max_chunks` records have been accepted, so
//! content past the cap is never read.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use context_retrieval_core::models::ChunkRecord;

use crate::config::CorpusConfig;

/// Outcome of a corpus load, with the counters used by `ctxr stats`.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub chunks: Vec<ChunkRecord>,
    /// Per-file accepted record counts, in scan order.
    pub files: Vec<FileCount>,
    /// Lines that failed to parse as JSON.
    pub skipped_malformed: usize,
    /// Records parsed but carrying no usable text field.
    pub skipped_missing_text: usize,
    /// Configured locations that did not resolve to a readable directory.
    pub missing_locations: Vec<PathBuf>,
    /// True when loading stopped at `max_chunks`.
    pub cap_reached: bool,
}

#[derive(Debug, Clone)]
pub struct FileCount {
    pub path: PathBuf,
    pub loaded: usize,
}

/// Result of parsing one line of a chunk file.
#[derive(Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Chunk(String),
    MissingText,
    Malformed,
}

/// Load chunks with the default file pattern and text fields.
///
/// Convenience form of [`load_corpus`] for callers that only have a list
/// of locations and a cap.
pub fn load(locations: &[PathBuf], max_chunks: usize) -> Vec<ChunkRecord> {
    let config = CorpusConfig {
        locations: locations.to_vec(),
        max_chunks,
        ..CorpusConfig::default()
    };
    // The default patterns are valid globs, so this cannot fail.
    load_corpus(&config).map(|r| r.chunks).unwrap_or_default()
}

/// Load chunks from every configured location, up to `max_chunks`.
///
/// # Errors
///
/// Returns an error only if an `include_globs` pattern is invalid. Missing
/// locations and bad records are never errors.
pub fn load_corpus(config: &CorpusConfig) -> Result<LoadReport> {
    let include = build_globset(&config.include_globs)?;
    let mut report = LoadReport::default();

    if config.max_chunks == 0 {
        return Ok(report);
    }

    'locations: for location in &config.locations {
        let files = match list_chunk_files(location, &include, config.follow_symlinks) {
            Ok(files) => files,
            Err(e) => {
                warn!(location = %location.display(), "skipping corpus location: {e:#}");
                report.missing_locations.push(location.clone());
                continue;
            }
        };

        for path in files {
            let loaded_before = report.chunks.len();
            let stopped = load_file(&path, config, &mut report);
            let loaded = report.chunks.len() - loaded_before;
            report.files.push(FileCount { path, loaded });
            if stopped {
                report.cap_reached = true;
                break 'locations;
            }
        }
    }

    info!(
        chunks = report.chunks.len(),
        files = report.files.len(),
        skipped_malformed = report.skipped_malformed,
        skipped_missing_text = report.skipped_missing_text,
        cap_reached = report.cap_reached,
        "loaded corpus"
    );

    Ok(report)
}

/// Read records from one file into the report.
///
/// Returns `true` when the chunk cap was reached.
fn load_file(path: &Path, config: &CorpusConfig, report: &mut LoadReport) -> bool {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(file = %path.display(), "skipping unreadable chunk file: {e}");
            return false;
        }
    };
    let origin = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    read_records(file, &origin, config, report)
}

/// Read JSONL records from `reader`, attributing them to `origin`.
///
/// A line that is not UTF-8 counts as malformed. Any other read error ends
/// this file. Returns `true` when the chunk cap was reached.
fn read_records<R: Read>(
    reader: R,
    origin: &str,
    config: &CorpusConfig,
    report: &mut LoadReport,
) -> bool {
    for (ix, line) in BufReader::new(reader).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                debug!(file = %origin, line = ix, "skipping line that is not UTF-8: {e}");
                report.skipped_malformed += 1;
                continue;
            }
            Err(e) => {
                warn!(file = %origin, line = ix, "stopped reading chunk file: {e}");
                break;
            }
        };

        match parse_record(&line, &config.text_fields) {
            RecordOutcome::Chunk(text) => {
                report.chunks.push(ChunkRecord::new(text, origin, ix));
                if report.chunks.len() >= config.max_chunks {
                    return true;
                }
            }
            RecordOutcome::MissingText => {
                debug!(file = %origin, line = ix, "skipping record without text");
                report.skipped_missing_text += 1;
            }
            RecordOutcome::Malformed => {
                debug!(file = %origin, line = ix, "skipping malformed record");
                report.skipped_malformed += 1;
            }
        }
    }

    false
}

/// Parse one JSONL line into chunk text.
///
/// The first of `text_fields` holding a non-empty string is chosen, then
/// trimmed. A chosen field that is only whitespace makes the record
/// textless; later fields are not consulted. Extra fields are ignored.
pub fn parse_record(line: &str, text_fields: &[String]) -> RecordOutcome {
    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(_) => return RecordOutcome::Malformed,
    };

    let chosen = text_fields
        .iter()
        .filter_map(|field| value.get(field).and_then(|v| v.as_str()))
        .find(|text| !text.is_empty());

    match chosen.map(str::trim) {
        Some(text) if !text.is_empty() => RecordOutcome::Chunk(text.to_string()),
        _ => RecordOutcome::MissingText,
    }
}

/// List the chunk-bearing files directly inside `location`, sorted by name.
///
/// With `follow_symlinks`, a link to a regular file counts as a file.
///
/// # Errors
///
/// Returns an error if `location` is not a readable directory.
pub fn list_chunk_files(
    location: &Path,
    include: &GlobSet,
    follow_symlinks: bool,
) -> Result<Vec<PathBuf>> {
    if !location.is_dir() {
        anyhow::bail!("not a directory: {}", location.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(location)
        .min_depth(1)
        .max_depth(1)
        .follow_links(follow_symlinks)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(location = %location.display(), "skipping directory entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if include.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fields() -> Vec<String> {
        vec!["text".to_string(), "body".to_string()]
    }

    fn config(locations: Vec<PathBuf>, max_chunks: usize) -> CorpusConfig {
        CorpusConfig {
            locations,
            max_chunks,
            ..CorpusConfig::default()
        }
    }

    fn write_lines(dir: &Path, name: &str, lines: &[&str]) {
        fs::write(dir.join(name), lines.join("\n")).unwrap();
    }

    #[test]
    fn test_parse_record_text_field() {
        assert_eq!(
            parse_record(r#"{"disorder":"ocd","chunk_id":1,"text":"  hello  "}"#, &fields()),
            RecordOutcome::Chunk("hello".to_string())
        );
    }

    #[test]
    fn test_parse_record_body_fallback() {
        assert_eq!(
            parse_record(r#"{"text":"","body":"from body"}"#, &fields()),
            RecordOutcome::Chunk("from body".to_string())
        );
    }

    #[test]
    fn test_parse_record_whitespace_text_does_not_fall_back() {
        assert_eq!(
            parse_record(r#"{"text":"   ","body":"from body"}"#, &fields()),
            RecordOutcome::MissingText
        );
    }

    #[test]
    fn test_parse_record_missing_text() {
        assert_eq!(parse_record(r#"{"id":7}"#, &fields()), RecordOutcome::MissingText);
        assert_eq!(parse_record(r#"{"text":42}"#, &fields()), RecordOutcome::MissingText);
        assert_eq!(parse_record(r#"["text"]"#, &fields()), RecordOutcome::MissingText);
    }

    #[test]
    fn test_parse_record_malformed() {
        assert_eq!(parse_record("{not json", &fields()), RecordOutcome::Malformed);
        assert_eq!(parse_record("", &fields()), RecordOutcome::Malformed);
    }

    #[test]
    fn test_load_skips_bad_records_and_keeps_provenance() {
        let tmp = TempDir::new().unwrap();
        write_lines(
            tmp.path(),
            "a.jsonl",
            &[
                r#"{"text":"first"}"#,
                "garbage",
                r#"{"other":"no text"}"#,
                r#"{"text":"second"}"#,
            ],
        );

        let report = load_corpus(&config(vec![tmp.path().to_path_buf()], 10)).unwrap();
        let texts: Vec<&str> = report.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(report.chunks[1].source.origin, "a.jsonl");
        assert_eq!(report.chunks[1].source.sequence, 3);
        assert_eq!(report.skipped_malformed, 1);
        assert_eq!(report.skipped_missing_text, 1);
        assert!(!report.cap_reached);
    }

    #[test]
    fn test_non_utf8_line_is_skipped_as_malformed() {
        let tmp = TempDir::new().unwrap();
        let mut bytes = b"{\"text\":\"before\"}\n".to_vec();
        bytes.extend_from_slice(b"{\"text\":\"\xff\xfe\"}\n");
        bytes.extend_from_slice(b"{\"text\":\"after\"}\n");
        fs::write(tmp.path().join("a.jsonl"), bytes).unwrap();

        let report = load_corpus(&config(vec![tmp.path().to_path_buf()], 10)).unwrap();
        let texts: Vec<&str> = report.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["before", "after"]);
        assert_eq!(report.skipped_malformed, 1);
    }

    /// Yields its data once, then fails every later read.
    struct FailingReader {
        data: Option<Vec<u8>>,
        reads_after_data: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                None => {
                    self.reads_after_data += 1;
                    Err(std::io::Error::new(ErrorKind::Other, "device went away"))
                }
            }
        }
    }

    #[test]
    fn test_io_error_stops_reading_file() {
        let mut reader = FailingReader {
            data: Some(b"{\"text\":\"kept\"}\n".to_vec()),
            reads_after_data: 0,
        };
        let mut report = LoadReport::default();
        let stopped = read_records(&mut reader, "a.jsonl", &config(Vec::new(), 10), &mut report);

        assert!(!stopped);
        assert_eq!(report.chunks.len(), 1);
        assert_eq!(report.chunks[0].text, "kept");
        assert_eq!(report.skipped_malformed, 0);
        assert_eq!(reader.reads_after_data, 1);
    }

    #[test]
    fn test_load_orders_files_lexically_and_locations_as_given() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_lines(first.path(), "b.jsonl", &[r#"{"text":"b1"}"#]);
        write_lines(first.path(), "a.jsonl", &[r#"{"text":"a1"}"#]);
        write_lines(first.path(), "notes.txt", &[r#"{"text":"ignored"}"#]);
        write_lines(second.path(), "0.jsonl", &[r#"{"text":"z1"}"#]);

        let chunks = load(
            &[second.path().to_path_buf(), first.path().to_path_buf()],
            10,
        );
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["z1", "a1", "b1"]);
    }

    #[test]
    fn test_load_stops_at_cap() {
        let tmp = TempDir::new().unwrap();
        write_lines(
            tmp.path(),
            "a.jsonl",
            &[r#"{"text":"1"}"#, r#"{"text":"2"}"#, r#"{"text":"3"}"#],
        );
        write_lines(tmp.path(), "b.jsonl", &[r#"{"text":"4"}"#]);

        let report = load_corpus(&config(vec![tmp.path().to_path_buf()], 2)).unwrap();
        let texts: Vec<&str> = report.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2"]);
        assert!(report.cap_reached);
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn test_cap_skips_remaining_locations() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_lines(
            first.path(),
            "a.jsonl",
            &[r#"{"text":"1"}"#, r#"{"text":"2"}"#, r#"{"text":"3"}"#],
        );
        write_lines(second.path(), "b.jsonl", &[r#"{"text":"never read"}"#]);

        let report = load_corpus(&config(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            2,
        ))
        .unwrap();
        let texts: Vec<&str> = report.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2"]);
        assert!(report.cap_reached);
        assert_eq!(report.files.len(), 1);
        assert!(report.files.iter().all(|f| !f.path.starts_with(second.path())));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_chunk_file_is_loaded() {
        let shared = TempDir::new().unwrap();
        let location = TempDir::new().unwrap();
        write_lines(shared.path(), "real.jsonl", &[r#"{"text":"linked chunk"}"#]);
        std::os::unix::fs::symlink(
            shared.path().join("real.jsonl"),
            location.path().join("a.jsonl"),
        )
        .unwrap();

        let chunks = load(&[location.path().to_path_buf()], 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "linked chunk");
        assert_eq!(chunks[0].source.origin, "a.jsonl");

        let include = build_globset(&["*.jsonl".to_string()]).unwrap();
        let files = list_chunk_files(location.path(), &include, true).unwrap();
        assert_eq!(files, vec![location.path().join("a.jsonl")]);
        let files = list_chunk_files(location.path(), &include, false).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_load_cap_equal_to_total_is_exact() {
        let tmp = TempDir::new().unwrap();
        write_lines(tmp.path(), "a.jsonl", &[r#"{"text":"1"}"#, r#"{"text":"2"}"#]);
        let chunks = load(&[tmp.path().to_path_buf()], 2);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_missing_location_yields_empty() {
        let report = load_corpus(&config(vec![PathBuf::from("/definitely/not/here")], 10)).unwrap();
        assert!(report.chunks.is_empty());
        assert_eq!(report.missing_locations.len(), 1);
    }

    #[test]
    fn test_no_locations_yields_empty() {
        assert!(load(&[], 10).is_empty());
    }

    #[test]
    fn test_custom_include_globs() {
        let tmp = TempDir::new().unwrap();
        write_lines(tmp.path(), "a.jsonl", &[r#"{"text":"jsonl"}"#]);
        write_lines(tmp.path(), "b.ndjson", &[r#"{"text":"ndjson"}"#]);
        let cfg = CorpusConfig {
            include_globs: vec!["*.ndjson".to_string()],
            ..config(vec![tmp.path().to_path_buf()], 10)
        };
        let report = load_corpus(&cfg).unwrap();
        assert_eq!(report.chunks.len(), 1);
        assert_eq!(report.chunks[0].text, "ndjson");
    }

    #[test]
    fn test_invalid_glob_is_error() {
        let cfg = CorpusConfig {
            include_globs: vec!["[".to_string()],
            ..config(Vec::new(), 10)
        };
        assert!(load_corpus(&cfg).is_err());
    }
}
