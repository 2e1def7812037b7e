//! In-memory table model backed by Arrow record batches.
//!
//! A [`Table`] is an ordered set of named columns. The pipeline only ever
//! reads from it; every analysis step produces a new derived structure.
//! Columns are viewed either as numeric (any Arrow numeric type, widened to
//! `f64`) or as text (everything else, cast to UTF-8), which is enough for
//! the heuristics and statistics computed downstream.
//!
//! # Example
//!
//! ```rust
//! use dao_metrics::table::{Cell, Table};
//!
//! let table = Table::builder()
//!     .int("id", [Some(1), Some(2), None])
//!     .text("name", [Some("a"), None, Some("c")])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.num_rows(), 3);
//! let ids = table.column(0).unwrap();
//! assert_eq!(ids.cell(2), Cell::Null);
//! ```

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, Float64Array, Int64Array, RecordBatch, StringArray,
};
use arrow::compute::{can_cast_types, cast, concat_batches};
use arrow::datatypes::{DataType, Float64Type, SchemaRef};

use crate::error::{MetricsError, Result};

/// A single scalar cell as seen by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// Missing value (Arrow null, NaN, or blank string)
    Null,
    /// Numeric value
    Number(f64),
    /// Non-blank text, trimmed
    Text(&'a str),
}

impl Cell<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Canonical string key used for distinct counts and frequency tables.
    ///
    /// Integral numbers print without a fractional part so that `3.0` and `3`
    /// collapse into the same key.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            Cell::Number(v) => Some(v.to_string()),
            Cell::Text(s) => Some((*s).to_string()),
        }
    }
}

/// Values of one column after widening to the pipeline's two storage kinds.
#[derive(Debug, Clone)]
enum ColumnValues {
    Numeric(Float64Array),
    Text(StringArray),
}

/// Read-only view over one column of a [`Table`].
#[derive(Debug, Clone)]
pub struct ColumnView {
    name: String,
    values: ColumnValues,
}

impl ColumnView {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the underlying Arrow column has a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(self.values, ColumnValues::Numeric(_))
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(arr) => arr.len(),
            ColumnValues::Text(arr) => arr.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cell at `row`.
    pub fn cell(&self, row: usize) -> Cell<'_> {
        match &self.values {
            ColumnValues::Numeric(arr) => {
                if arr.is_null(row) {
                    return Cell::Null;
                }
                let value = arr.value(row);
                if value.is_nan() {
                    Cell::Null
                } else {
                    Cell::Number(value)
                }
            }
            ColumnValues::Text(arr) => {
                if arr.is_null(row) {
                    return Cell::Null;
                }
                let trimmed = arr.value(row).trim();
                if trimmed.is_empty() {
                    Cell::Null
                } else {
                    Cell::Text(trimmed)
                }
            }
        }
    }

    /// Iterates over all cells in row order.
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> + '_ {
        (0..self.len()).map(move |row| self.cell(row))
    }

    /// Number of null cells in the column.
    pub fn null_count(&self) -> usize {
        self.cells().filter(Cell::is_null).count()
    }
}

/// An immutable table of named columns.
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    /// Wraps a single record batch.
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Concatenates the batches produced by a reader into a single table.
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self { batch })
    }

    /// Starts building a table column by column.
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Position of the column named `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.batch.schema().index_of(name).ok()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns a view of the column at `index`.
    ///
    /// Fails for nested types (lists, structs, maps, unions) and for any
    /// other type that can be neither widened to `f64` nor rendered as UTF-8.
    pub fn column(&self, index: usize) -> Result<ColumnView> {
        let schema = self.batch.schema();
        let field = schema.field(index);
        let array = self.batch.column(index);
        let data_type = array.data_type();

        let values = if data_type.is_numeric() {
            let widened = cast(array, &DataType::Float64)?;
            ColumnValues::Numeric(widened.as_primitive::<Float64Type>().clone())
        } else if !data_type.is_nested() && can_cast_types(data_type, &DataType::Utf8) {
            let text = cast(array, &DataType::Utf8)?;
            ColumnValues::Text(text.as_string::<i32>().clone())
        } else {
            return Err(MetricsError::unsupported_column(
                field.name(),
                format!("type {data_type} cannot be viewed as numbers or text"),
            ));
        };

        Ok(ColumnView {
            name: field.name().clone(),
            values,
        })
    }

    /// Returns a view of the column named `name`, if present.
    pub fn column_by_name(&self, name: &str) -> Result<Option<ColumnView>> {
        match self.column_index(name) {
            Some(index) => self.column(index).map(Some),
            None => Ok(None),
        }
    }

    /// Views of every column in declared order.
    pub fn columns(&self) -> Result<Vec<ColumnView>> {
        (0..self.num_columns()).map(|i| self.column(i)).collect()
    }

    /// The underlying record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }
}

/// Builder for small tables assembled in code.
#[derive(Debug, Default)]
pub struct TableBuilder {
    columns: Vec<(String, ArrayRef)>,
}

impl TableBuilder {
    /// Appends a text column.
    pub fn text<'a, I>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let array: StringArray = values.into_iter().collect();
        self.columns.push((name.into(), Arc::new(array)));
        self
    }

    /// Appends a 64-bit integer column.
    pub fn int<I>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        let array: Int64Array = values.into_iter().collect();
        self.columns.push((name.into(), Arc::new(array)));
        self
    }

    /// Appends a 64-bit float column.
    pub fn float<I>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let array: Float64Array = values.into_iter().collect();
        self.columns.push((name.into(), Arc::new(array)));
        self
    }

    /// Appends an arbitrary Arrow array.
    pub fn array(mut self, name: impl Into<String>, array: ArrayRef) -> Self {
        self.columns.push((name.into(), array));
        self
    }

    /// Builds the table; fails if column lengths differ.
    pub fn build(self) -> Result<Table> {
        let batch = RecordBatch::try_from_iter(self.columns)?;
        Ok(Table::new(batch))
    }
}
