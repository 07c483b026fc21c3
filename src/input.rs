//! Reading name handles from CSV exports and plain-text lists.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};

/// Progress is logged every this many CSV rows.
const PROGRESS_INTERVAL: u64 = 10_000;

/// A raw name token together with the input line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    /// 1-based line number in the source file.
    pub line: u64,
    pub text: String,
}

impl Handle {
    pub fn new(line: u64, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }
}

/// Handles read from a CSV file, plus what was skipped on the way.
#[derive(Debug, Default)]
pub struct CsvNames {
    /// Label of the first header column.
    pub column: String,
    pub handles: Vec<Handle>,
    /// Data rows whose first column was empty after trimming.
    pub empty_rows: usize,
    /// Data rows that could not be parsed or decoded.
    pub malformed_rows: usize,
}

impl CsvNames {
    /// Number of data rows seen, skipped ones included.
    pub fn total_rows(&self) -> usize {
        self.handles.len() + self.empty_rows + self.malformed_rows
    }
}

/// Strip NUL bytes and normalise `\r\n` and bare `\r` to `\n`.
pub fn sanitize(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied().filter(|&b| b != 0).peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' {
            if bytes.peek() == Some(&b'\n') {
                bytes.next();
            }
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    out
}

/// Read handles from the first column of a CSV file.
///
/// The first row is the header. Every later row contributes its trimmed
/// first column. Empty values and malformed rows are counted and skipped;
/// only failing to open the file aborts.
pub fn read_csv_handles(path: &Path) -> Result<CsvNames> {
    let raw = fs::read(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv_handles(&sanitize(&raw), path)
}

fn parse_csv_handles(cleaned: &[u8], path: &Path) -> Result<CsvNames> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(cleaned);

    let headers = reader.byte_headers()?.clone();
    let column = match headers.get(0) {
        Some(label) => String::from_utf8_lossy(label).into_owned(),
        None => return Err(Error::EmptyInput(path.to_path_buf())),
    };
    info!("Reading names from column: '{}'", column);

    let mut names = CsvNames {
        column,
        ..Default::default()
    };

    let mut rows = 0u64;
    for result in reader.byte_records() {
        rows += 1;
        if rows % PROGRESS_INTERVAL == 0 {
            info!("Processed {} rows...", rows);
        }

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                warn!("Skipping problematic row at line {}: {}", line, e);
                names.malformed_rows += 1;
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(rows + 1);

        let field = record.get(0).unwrap_or_default();
        let text = match std::str::from_utf8(field) {
            Ok(text) => text.trim(),
            Err(e) => {
                warn!("Skipping problematic row at line {}: {}", line, e);
                names.malformed_rows += 1;
                continue;
            }
        };

        if text.is_empty() {
            names.empty_rows += 1;
        } else {
            names.handles.push(Handle::new(line, text));
        }
    }

    if names.malformed_rows > 0 {
        warn!("Skipped {} problematic rows", names.malformed_rows);
    }

    Ok(names)
}

/// Read one name per line, trimming each and skipping blank lines.
/// Line numbers count the blank lines too.
pub fn read_name_lines(path: &Path) -> Result<Vec<Handle>> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut handles = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            handles.push(Handle::new(idx as u64 + 1, name));
        }
    }
    Ok(handles)
}
