//! Data
//!
//! Column-oriented, read-only view of an uploaded delimited file. Every column
//! is stored as `f64`: booleans become 0/1, categorical text becomes integer
//! codes in sorted label order and missing cells become `NaN`.
use crate::errors::DatasetError;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Byte used internally when the delimiter is longer than one byte.
const UNIT_SEPARATOR: u8 = 0x1f;

/// Options controlling how a data file is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetOptions {
    /// Field separator, may be more than one character.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Column names to use when the file carries no header row.
    #[serde(default)]
    pub custom_header: Option<Vec<String>>,
}

fn default_delimiter() -> String {
    String::from(",")
}

impl Default for DatasetOptions {
    fn default() -> Self {
        DatasetOptions {
            delimiter: default_delimiter(),
            custom_header: None,
        }
    }
}

impl DatasetOptions {
    /// Options with the given delimiter and the file's own header.
    pub fn with_delimiter(delimiter: &str) -> Self {
        DatasetOptions {
            delimiter: delimiter.to_string(),
            custom_header: None,
        }
    }

    /// Set the header to use instead of the first line.
    pub fn set_custom_header(mut self, header: Vec<String>) -> Self {
        self.custom_header = Some(header);
        self
    }
}

/// How the raw cells of a column were interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Categorical,
}

/// A single named feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<f64>,
    /// Category labels, indexed by code. Empty unless the column is categorical.
    pub categories: Vec<String>,
}

enum Cell<'a> {
    Missing,
    Boolean(bool),
    Number(f64),
    Text(&'a str),
}

fn parse_cell(raw: &str) -> Cell<'_> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
        return Cell::Missing;
    }
    if s.eq_ignore_ascii_case("true") {
        return Cell::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Cell::Boolean(false);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Number(v),
        _ => Cell::Text(s),
    }
}

impl Column {
    /// Create a numeric column from values, `NaN` marks a missing value.
    pub fn numeric(name: &str, values: Vec<f64>) -> Self {
        Column {
            name: name.to_string(),
            kind: ColumnKind::Numeric,
            values,
            categories: Vec::new(),
        }
    }

    /// Build a column from raw text cells.
    pub fn from_cells(name: &str, cells: &[&str]) -> Self {
        let parsed: Vec<Cell> = cells.iter().map(|c| parse_cell(c)).collect();
        let has_text = parsed.iter().any(|c| matches!(c, Cell::Text(_)));

        if has_text {
            // Codes follow sorted label order, so row order never changes them.
            let mut categories: Vec<String> = cells
                .iter()
                .zip(parsed.iter())
                .filter(|(_, cell)| !matches!(cell, Cell::Missing))
                .map(|(raw, _)| raw.trim().to_string())
                .collect();
            categories.sort();
            categories.dedup();
            let values = {
                let codes: HashMap<&str, usize> =
                    categories.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();
                cells
                    .iter()
                    .zip(parsed.iter())
                    .map(|(raw, cell)| match cell {
                        Cell::Missing => f64::NAN,
                        _ => codes.get(raw.trim()).map_or(f64::NAN, |&code| code as f64),
                    })
                    .collect()
            };
            return Column {
                name: name.to_string(),
                kind: ColumnKind::Categorical,
                values,
                categories,
            };
        }

        let all_boolean = parsed.iter().all(|c| matches!(c, Cell::Missing | Cell::Boolean(_)))
            && parsed.iter().any(|c| matches!(c, Cell::Boolean(_)));
        let values = parsed
            .iter()
            .map(|c| match c {
                Cell::Missing | Cell::Text(_) => f64::NAN,
                Cell::Boolean(b) => f64::from(u8::from(*b)),
                Cell::Number(v) => *v,
            })
            .collect();
        Column {
            name: name.to_string(),
            kind: if all_boolean {
                ColumnKind::Boolean
            } else {
                ColumnKind::Numeric
            },
            values,
            categories: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing values.
    pub fn n_missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Sorted distinct non-missing values.
    pub fn distinct_values(&self) -> Vec<f64> {
        let mut v: Vec<f64> = self.values.iter().copied().filter(|v| !v.is_nan()).collect();
        v.sort_by(f64::total_cmp);
        v.dedup();
        v
    }

    /// A column is discrete when it has at most `max_levels` distinct values.
    pub fn is_discrete(&self, max_levels: usize) -> bool {
        self.kind != ColumnKind::Numeric || self.distinct_values().len() <= max_levels
    }

    /// Descriptive statistics of the column.
    pub fn summary(&self) -> ColumnSummary {
        let present: Vec<f64> = self.values.iter().copied().filter(|v| !v.is_nan()).collect();
        let (min, max, mean) = if present.is_empty() {
            (None, None, None)
        } else {
            let min = present.iter().copied().fold(f64::INFINITY, f64::min);
            let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            (Some(min), Some(max), Some(mean))
        };
        ColumnSummary {
            name: self.name.clone(),
            kind: self.kind,
            distinct: self.distinct_values().len(),
            missing: self.values.len() - present.len(),
            min,
            max,
            mean,
        }
    }
}

/// Summary statistics returned to the caller after an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub distinct: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

/// Immutable tabular dataset with unique column names.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: usize,
}

impl Dataset {
    /// Create a dataset from already built columns.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let rows = match columns.first() {
            Some(c) if !c.is_empty() => c.len(),
            _ => return Err(DatasetError::Empty),
        };
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(DatasetError::RaggedRow {
                    row: column.len().min(rows),
                    expected: rows,
                    found: column.len(),
                });
            }
            if index.insert(column.name.clone(), i).is_some() {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Dataset { columns, index, rows })
    }

    /// Parse delimited text.
    ///
    /// * `bytes` - Raw file contents.
    /// * `options` - Delimiter and optional header override.
    pub fn from_bytes(bytes: &[u8], options: &DatasetOptions) -> Result<Self, DatasetError> {
        let delimiter = options.delimiter.as_bytes();
        let (data, sep) = match delimiter.len() {
            0 => return Err(DatasetError::EmptyDelimiter),
            1 => (std::borrow::Cow::Borrowed(bytes), delimiter[0]),
            _ => {
                let text = std::str::from_utf8(bytes).map_err(|e| DatasetError::Csv(e.to_string()))?;
                let replaced = text.replace(options.delimiter.as_str(), "\u{1f}");
                (std::borrow::Cow::Owned(replaced.into_bytes()), UNIT_SEPARATOR)
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(sep)
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_ref());

        let mut records: Vec<csv::StringRecord> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DatasetError::Csv(e.to_string()))?;
            if record.len() == 1 && record.get(0).map_or(true, |f| f.trim().is_empty()) {
                continue;
            }
            records.push(record);
        }

        let (header, body): (Vec<String>, &[csv::StringRecord]) = match &options.custom_header {
            Some(h) => (h.iter().map(|s| s.trim().to_string()).collect(), &records[..]),
            None => match records.split_first() {
                Some((first, rest)) => (first.iter().map(|s| s.trim().to_string()).collect(), rest),
                None => return Err(DatasetError::Empty),
            },
        };
        if body.is_empty() {
            return Err(DatasetError::Empty);
        }

        let width = body[0].len();
        if width < 2 {
            return Err(DatasetError::DelimiterMismatch {
                delimiter: options.delimiter.clone(),
                found: width,
            });
        }
        if header.len() != width {
            return Err(DatasetError::HeaderMismatch {
                expected: header.len(),
                found: width,
            });
        }
        for (i, record) in body.iter().enumerate() {
            if record.len() != width {
                return Err(DatasetError::RaggedRow {
                    row: i + 1,
                    expected: width,
                    found: record.len(),
                });
            }
        }

        let columns = header
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let cells: Vec<&str> = body.iter().map(|r| r.get(j).unwrap_or("")).collect();
                Column::from_cells(name, &cells)
            })
            .collect();
        Dataset::from_columns(columns)
    }

    /// Parse delimited text from a reader.
    pub fn from_reader<R: Read>(mut reader: R, options: &DatasetOptions) -> Result<Self, DatasetError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| DatasetError::Csv(e.to_string()))?;
        Dataset::from_bytes(&bytes, options)
    }

    /// Parse a delimited file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P, options: &DatasetOptions) -> Result<Self, DatasetError> {
        let bytes = fs::read(path).map_err(|e| DatasetError::Csv(e.to_string()))?;
        Dataset::from_bytes(&bytes, options)
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in file order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a column in file order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.index
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    /// Get the values of a column by name.
    pub fn values(&self, name: &str) -> Result<&[f64], DatasetError> {
        self.column(name).map(|c| c.values.as_slice())
    }

    /// Iterate over the columns in file order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Summary statistics of every column.
    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.columns.iter().map(Column::summary).collect()
    }
}
