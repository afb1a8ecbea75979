//! Datasets, row chunks, and source metadata.

use std::collections::HashSet;
use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TypecastError};
use crate::schema::{CellValue, Column};

/// Metadata about an ingested file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name as submitted.
    pub file: String,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, xlsx, ...).
    pub format: String,
    /// Text encoding the bytes were decoded with.
    pub encoding: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was ingested.
    pub ingested_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been ingested.
    pub fn new(
        file: impl Into<String>,
        hash: String,
        size_bytes: u64,
        format: impl Into<String>,
        encoding: impl Into<String>,
        dataset: &Dataset,
    ) -> Self {
        Self {
            file: file.into(),
            hash,
            size_bytes,
            format: format.into(),
            encoding: encoding.into(),
            row_count: dataset.row_count(),
            column_count: dataset.column_count(),
            ingested_at: Utc::now(),
        }
    }
}

/// An immutable table of named columns with equal row counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Create a dataset from columns.
    ///
    /// Duplicate names get `.1`, `.2`, ... suffixes and blank names become
    /// `Unnamed: <index>`, so every column name is a unique key.
    pub fn new(mut columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(TypecastError::IngestionParse(format!(
                "Column '{}' has {} rows, expected {}",
                bad.name,
                bad.len(),
                row_count
            )));
        }

        let names = unique_names(columns.iter().map(|c| c.name.as_str()));
        for (column, name) in columns.iter_mut().zip(names) {
            column.name = name;
        }

        Ok(Self { columns, row_count })
    }

    /// Create a dataset from a header row and row-major cells.
    ///
    /// Short rows are padded with nulls; long rows are truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let width = headers.len();
        let mut cells: Vec<Vec<CellValue>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for row in rows {
            let mut row = row.into_iter();
            for column in cells.iter_mut() {
                column.push(row.next().unwrap_or(CellValue::Null));
            }
        }

        Self::new(
            headers
                .into_iter()
                .zip(cells)
                .map(|(name, cells)| Column::new(name, cells))
                .collect(),
        )
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Split rows into `count` contiguous chunks that each own a copy of
    /// their rows.
    ///
    /// Sizes differ by at most one row; the first `row_count % count`
    /// chunks take the extra row. Chunks that would hold no rows are not
    /// produced.
    pub fn split(&self, count: usize) -> Vec<Chunk> {
        split_ranges(self.row_count, count)
            .into_iter()
            .filter(|range| !range.is_empty())
            .enumerate()
            .map(|(index, range)| {
                let columns = self
                    .columns
                    .iter()
                    .map(|column| column.slice(range.clone()))
                    .collect();
                Chunk::new(index, range, columns)
            })
            .collect()
    }

    /// The whole dataset as one chunk.
    pub fn into_single_chunk(self) -> Chunk {
        Chunk::new(0, 0..self.row_count, self.columns)
    }
}

/// Contiguous row ranges covering `0..rows`, `count` of them.
pub(crate) fn split_ranges(rows: usize, count: usize) -> Vec<Range<usize>> {
    let count = count.max(1);
    let base = rows / count;
    let extra = rows % count;

    let mut start = 0;
    (0..count)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

fn unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for (index, name) in names.enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

/// A contiguous slice of a dataset's rows, handed to exactly one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    index: usize,
    rows: Range<usize>,
    columns: Vec<Column>,
}

impl Chunk {
    /// Create a chunk covering `rows` of the source dataset.
    pub fn new(index: usize, rows: Range<usize>, columns: Vec<Column>) -> Self {
        Self {
            index,
            rows,
            columns,
        }
    }

    /// Position of the chunk in row order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Row range of the source dataset.
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Number of rows in the chunk.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Columns of the chunk.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}
