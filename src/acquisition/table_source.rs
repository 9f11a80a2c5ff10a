//! Comma-separated table sample source.
//!
//! Reads a file of integer cells, one row per line, and hands out values
//! left-to-right, row by row, two at a time. Pairs may span row
//! boundaries. The file is opened on the first read and read lazily.
//!
//! ## Cell policy
//!
//! - With `columns > 0` only the first `columns` cells of a row are read;
//!   `columns = 0` reads every cell.
//! - A cell that is not an integer in `0..=255` (including bytes that are
//!   not valid UTF-8) is skipped with a warning; the rest of the row is kept.
//! - A single trailing comma does not open an extra empty cell.
//! - A row with fewer than `columns` cells is warned about; its values are
//!   still used.
//! - A single value left over at end of file is discarded with a notice.

use serde::Serialize;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{SampleSource, SourceError, SourceEvent};
use crate::types::SamplePair;

/// Parse counters, reported when the source closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub rows_read: u64,
    pub values_read: u64,
    pub pairs_emitted: u64,
    pub malformed_cells: u64,
    pub short_rows: u64,
    pub discarded_trailing: u64,
}

pub struct TableSource {
    path: PathBuf,
    columns: usize,
    reader: Option<BufReader<File>>,
    /// Parsed values of the current row not yet handed out
    row: VecDeque<u8>,
    line_buffer: Vec<u8>,
    line_number: usize,
    finished: bool,
    stats: TableStats,
}

impl TableSource {
    /// Create a source for `path`. Nothing is opened until the first read.
    pub fn new(path: impl Into<PathBuf>, columns: usize) -> Self {
        Self {
            path: path.into(),
            columns,
            reader: None,
            row: VecDeque::new(),
            line_buffer: Vec::with_capacity(256),
            line_number: 0,
            finished: false,
            stats: TableStats::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> TableStats {
        self.stats
    }

    fn ensure_open(&mut self) -> Result<(), SourceError> {
        if self.reader.is_none() {
            let file = File::open(&self.path).map_err(|source| SourceError::Unavailable {
                path: self.path.clone(),
                source,
            })?;
            debug!(path = %self.path.display(), columns = self.columns, "Opened table source");
            self.reader = Some(BufReader::new(file));
        }
        Ok(())
    }

    /// Next value in reading order, pulling new rows as needed.
    /// `None` at end of file.
    fn next_value(&mut self) -> Result<Option<u8>, SourceError> {
        loop {
            if let Some(v) = self.row.pop_front() {
                return Ok(Some(v));
            }
            if !self.read_row()? {
                return Ok(None);
            }
        }
    }

    /// Read and parse one line into `row`. Returns `false` at end of file.
    fn read_row(&mut self) -> Result<bool, SourceError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(false);
        };

        self.line_buffer.clear();
        let bytes = reader
            .read_until(b'\n', &mut self.line_buffer)
            .map_err(|source| SourceError::Read {
                line: self.line_number + 1,
                source,
            })?;
        if bytes == 0 {
            return Ok(false);
        }

        self.line_number += 1;
        self.stats.rows_read += 1;

        let line = trim_ascii(&self.line_buffer);
        let mut cells: Vec<&[u8]> = if line.is_empty() {
            Vec::new()
        } else {
            line.split(|&b| b == b',').collect()
        };
        if cells.len() > 1 && cells.last().is_some_and(|c| trim_ascii(c).is_empty()) {
            cells.pop();
        }

        let cell_count = cells.len();
        let take = if self.columns == 0 {
            cell_count
        } else {
            self.columns.min(cell_count)
        };
        for cell in &cells[..take] {
            match parse_cell(cell) {
                Some(v) => {
                    self.row.push_back(v);
                    self.stats.values_read += 1;
                }
                None => {
                    self.stats.malformed_cells += 1;
                    warn!(
                        line = self.line_number,
                        cell = %String::from_utf8_lossy(trim_ascii(cell)),
                        "Table: malformed cell skipped (expected integer 0-255)"
                    );
                }
            }
        }

        if self.columns > 0 && cell_count < self.columns {
            self.stats.short_rows += 1;
            warn!(
                line = self.line_number,
                found = cell_count,
                expected = self.columns,
                "Table: row has fewer columns than declared"
            );
        }

        Ok(true)
    }
}

/// A cell is an optionally padded integer in the byte range.
fn parse_cell(cell: &[u8]) -> Option<u8> {
    std::str::from_utf8(cell).ok()?.trim().parse::<u8>().ok()
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

impl SampleSource for TableSource {
    fn next_pair(&mut self) -> Result<SourceEvent, SourceError> {
        if self.finished {
            return Ok(SourceEvent::Exhausted);
        }
        if let Err(e) = self.ensure_open() {
            self.finished = true;
            return Err(e);
        }

        let first = match self.next_value() {
            Ok(Some(v)) => v,
            Ok(None) => {
                self.finished = true;
                return Ok(SourceEvent::Exhausted);
            }
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        match self.next_value() {
            Ok(Some(second)) => {
                self.stats.pairs_emitted += 1;
                Ok(SourceEvent::Pair(SamplePair::new(first, second)))
            }
            Ok(None) => {
                self.finished = true;
                self.stats.discarded_trailing += 1;
                info!(
                    value = first,
                    "Table: end of file with one unpaired value left, discarded"
                );
                Ok(SourceEvent::Exhausted)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn source_name(&self) -> &str {
        "table"
    }

    fn close(&mut self) {
        self.finished = true;
        if self.reader.take().is_some() {
            let s = &self.stats;
            info!(
                path = %self.path.display(),
                rows = s.rows_read,
                values = s.values_read,
                pairs = s.pairs_emitted,
                malformed = s.malformed_cells,
                short_rows = s.short_rows,
                discarded = s.discarded_trailing,
                "Table source closed"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
