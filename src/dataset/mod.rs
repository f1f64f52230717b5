//! Typed tabular dataset (Arrow-backed)
//!
//! A [`Dataset`] is an ordered list of named, typed columns held in a single
//! Arrow `RecordBatch`. Columns are classified as:
//!
//! - **Numeric**: every integer, float, decimal and boolean type
//! - **Categorical**: everything else (strings, dates, ...), read as UTF-8
//!
//! Columns are looked up by name; an unknown name is a configuration error,
//! never a panic.
//!
//! ```rust
//! use virtual_twins::dataset::{Column, Dataset};
//!
//! let dataset = Dataset::from_columns(vec![
//!     Column::numeric("age", vec![34.0, 51.0, 47.0]),
//!     Column::categorical("arm", vec!["treated", "control", "treated"]),
//! ])?;
//! assert_eq!(dataset.shape(), (3, 2));
//! # Ok::<(), virtual_twins::Error>(())
//! ```

mod level;

pub use level::{Cell, Level};

use crate::{Error, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
    UInt32Array,
};
use arrow::compute;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

/// Number of rows returned by [`Dataset::preview`] in upload summaries
pub const PREVIEW_ROWS: usize = 5;

/// How a column participates in model preparation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Used as-is (widened to `f64`)
    Numeric,
    /// Replaced by first-seen integer codes
    Categorical,
}

impl ColumnKind {
    /// Classify an Arrow data type
    #[must_use]
    pub fn of(data_type: &DataType) -> Self {
        if data_type.is_numeric() || matches!(data_type, DataType::Boolean) {
            Self::Numeric
        } else {
            Self::Categorical
        }
    }
}

/// Named column used to assemble a [`Dataset`]
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    values: ArrayRef,
}

impl Column {
    /// Column from any Arrow array
    #[must_use]
    pub fn new(name: impl Into<String>, values: ArrayRef) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Float column
    #[must_use]
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, Arc::new(Float64Array::from(values)))
    }

    /// Integer column
    #[must_use]
    pub fn integer(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(name, Arc::new(Int64Array::from(values)))
    }

    /// Boolean column (numeric, encoded as 0/1)
    #[must_use]
    pub fn boolean(name: impl Into<String>, values: Vec<bool>) -> Self {
        Self::new(name, Arc::new(BooleanArray::from(values)))
    }

    /// String column
    #[must_use]
    pub fn categorical<S: AsRef<str>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::new(
            name,
            Arc::new(StringArray::from_iter_values(values.iter().map(|s| s.as_ref()))),
        )
    }

    /// String column with nulls
    #[must_use]
    pub fn nullable_categorical<S: AsRef<str>>(
        name: impl Into<String>,
        values: Vec<Option<S>>,
    ) -> Self {
        let array: StringArray = values
            .iter()
            .map(|v| v.as_ref().map(|s| s.as_ref()))
            .collect();
        Self::new(name, Arc::new(array))
    }

    /// Float column with nulls
    #[must_use]
    pub fn nullable_numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, Arc::new(Float64Array::from(values)))
    }
}

/// In-memory tabular dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    /// Wrap an existing record batch
    ///
    /// # Errors
    /// Returns `Error::Ingest` if two columns share a name
    pub fn from_batch(batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut seen = HashSet::new();
        for field in schema.fields() {
            if !seen.insert(field.name().as_str()) {
                return Err(Error::Ingest(format!(
                    "Duplicate column name '{}'",
                    field.name()
                )));
            }
        }
        Ok(Self { batch })
    }

    /// Assemble a dataset from named columns
    ///
    /// # Errors
    /// Returns error if columns differ in length or share a name
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let fields: Vec<Field> = columns
            .iter()
            .map(|c| Field::new(c.name.clone(), c.values.data_type().clone(), true))
            .collect();
        let arrays: Vec<ArrayRef> = columns.into_iter().map(|c| c.values).collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Self::from_batch(batch)
    }

    /// Parse CSV (header row required) with schema inference
    ///
    /// Integer, float and boolean columns become numeric; everything else
    /// is read as text.
    ///
    /// # Errors
    /// Returns `Error::Ingest` if the input is empty or malformed
    pub fn from_csv_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let format = Format::default().with_header(true);
        let (schema, _) = format
            .infer_schema(Cursor::new(&bytes), None)
            .map_err(|e| Error::Ingest(format!("Failed to infer CSV schema: {e}")))?;
        if schema.fields().is_empty() {
            return Err(Error::Ingest("CSV input has no header row".to_string()));
        }
        let schema = Arc::new(schema);

        let csv = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .build(Cursor::new(&bytes))
            .map_err(|e| Error::Ingest(format!("Failed to create CSV reader: {e}")))?;

        let mut batches = Vec::new();
        for batch in csv {
            batches.push(
                batch.map_err(|e| Error::Ingest(format!("Failed to read CSV record: {e}")))?,
            );
        }

        let batch = compute::concat_batches(&schema, &batches)?;
        Self::from_batch(batch)
    }

    /// Load a CSV file from disk
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or parsed
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    /// Underlying record batch
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// `(rows, columns)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    /// Column names in schema order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Index of a column by name
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.batch.schema().index_of(name).ok()
    }

    /// Index of a column by name, failing with a configuration error
    ///
    /// `role` names the column's purpose in the message ("Outcome", "Intervention").
    ///
    /// # Errors
    /// Returns `Error::Configuration` if no column has that name
    pub fn require_column(&self, role: &str, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::missing_column(role, name))
    }

    /// Name of the column at `index`
    #[must_use]
    pub fn column_name(&self, index: usize) -> String {
        self.batch.schema().field(index).name().clone()
    }

    /// Kind of the column at `index`
    #[must_use]
    pub fn column_kind(&self, index: usize) -> ColumnKind {
        ColumnKind::of(self.batch.column(index).data_type())
    }

    /// Column values widened to `f64` (nulls as `None`)
    ///
    /// # Errors
    /// Returns `Error::Training` if the column is not numeric
    pub fn numeric_values(&self, index: usize) -> Result<Vec<Option<f64>>> {
        let column = self.batch.column(index);
        if ColumnKind::of(column.data_type()) != ColumnKind::Numeric {
            return Err(Error::Training(format!(
                "Column '{}' is not numeric (type {})",
                self.column_name(index),
                column.data_type()
            )));
        }
        let cast = compute::cast(column, &DataType::Float64)?;
        let values = cast
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                Error::Training(format!(
                    "Failed to read column '{}' as Float64",
                    self.column_name(index)
                ))
            })?;
        Ok(values.iter().collect())
    }

    /// Column values rendered as text (nulls as `None`)
    ///
    /// # Errors
    /// Returns `Error::Training` if the column type cannot be cast to UTF-8
    pub fn text_values(&self, index: usize) -> Result<Vec<Option<String>>> {
        let column = self.batch.column(index);
        let cast = compute::cast(column, &DataType::Utf8).map_err(|e| {
            Error::Training(format!(
                "Column '{}' cannot be encoded: {e}",
                self.column_name(index)
            ))
        })?;
        let values = cast
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                Error::Training(format!(
                    "Failed to read column '{}' as Utf8",
                    self.column_name(index)
                ))
            })?;
        Ok(values.iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Column as cells
    ///
    /// # Errors
    /// Returns error if the column cannot be read
    pub fn cells(&self, index: usize) -> Result<Vec<Cell>> {
        Ok(match self.column_kind(index) {
            ColumnKind::Numeric => self
                .numeric_values(index)?
                .into_iter()
                .map(|v| v.map_or(Cell::Missing, Cell::Number))
                .collect(),
            ColumnKind::Categorical => self
                .text_values(index)?
                .into_iter()
                .map(|v| v.map_or(Cell::Missing, Cell::Text))
                .collect(),
        })
    }

    /// Per-row intervention levels of a column
    ///
    /// # Errors
    /// Returns error if the column cannot be read
    pub fn levels(&self, index: usize) -> Result<Vec<Level>> {
        Ok(self
            .cells(index)?
            .into_iter()
            .map(|cell| match cell {
                Cell::Number(v) => Level::number(v),
                Cell::Text(s) => Level::Text(s),
                Cell::Missing => Level::Missing,
            })
            .collect())
    }

    /// Row indices grouped by the distinct values of a column
    ///
    /// Groups appear in first-seen order and cover every row exactly once.
    ///
    /// # Errors
    /// Returns error if the column cannot be read
    pub fn group_rows(&self, index: usize) -> Result<Vec<(Level, Vec<u32>)>> {
        let mut positions: HashMap<Level, usize> = HashMap::new();
        let mut groups: Vec<(Level, Vec<u32>)> = Vec::new();

        for (row, level) in self.levels(index)?.into_iter().enumerate() {
            let row = u32::try_from(row)
                .map_err(|_| Error::Training(format!("Row index {row} exceeds u32 range")))?;
            match positions.get(&level) {
                Some(&pos) => groups[pos].1.push(row),
                None => {
                    positions.insert(level.clone(), groups.len());
                    groups.push((level, vec![row]));
                }
            }
        }

        Ok(groups)
    }

    /// New dataset holding only the given rows, in the given order
    ///
    /// # Errors
    /// Returns error if an index is out of bounds
    pub fn take_rows(&self, rows: &[u32]) -> Result<Self> {
        let indices = UInt32Array::from(rows.to_vec());
        let columns = self
            .batch
            .columns()
            .iter()
            .map(|column| compute::take(column.as_ref(), &indices, None))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let batch = RecordBatch::try_new(self.batch.schema(), columns)?;
        Ok(Self { batch })
    }

    /// First `n` rows as JSON records keyed by column name
    ///
    /// # Errors
    /// Returns error if a column cannot be read
    pub fn preview(&self, n: usize) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let head = Self {
            batch: self.batch.slice(0, n.min(self.num_rows())),
        };
        let names = head.column_names();
        let columns = (0..head.num_columns())
            .map(|i| head.cells(i))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..head.num_rows())
            .map(|row| {
                names
                    .iter()
                    .zip(&columns)
                    .map(|(name, cells)| (name.clone(), cells[row].to_json()))
                    .collect()
            })
            .collect())
    }
}
