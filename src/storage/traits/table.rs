// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Table store trait
//!
//! [`TableStore`] is everything the expression engine needs from a physical
//! storage layer: column descriptions and typed cell reads (whole cells,
//! single elements, slices and whole-column slices). How the bytes are laid
//! out is up to the implementation.

use std::fmt;

use crate::core::{DataType, Error, Result, Shape, Slicer};
use crate::storage::stored::{StoredArray, StoredValue};

/// Whether a column holds scalars or arrays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Scalar,
    /// Array cells; `ndim` and `shape` are set when fixed for all rows
    Array {
        ndim: Option<usize>,
        shape: Option<Shape>,
    },
}

/// Description of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDesc {
    name: String,
    data_type: DataType,
    kind: ColumnKind,
}

impl ColumnDesc {
    /// Scalar column
    pub fn scalar(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            kind: ColumnKind::Scalar,
        }
    }

    /// Array column with the same shape in every row
    pub fn fixed_array(name: impl Into<String>, data_type: DataType, shape: &[usize]) -> Self {
        Self {
            name: name.into(),
            data_type,
            kind: ColumnKind::Array {
                ndim: Some(shape.len()),
                shape: Some(Shape::from_slice(shape)),
            },
        }
    }

    /// Array column whose shape may differ per row; `ndim` if fixed
    pub fn variable_array(
        name: impl Into<String>,
        data_type: DataType,
        ndim: Option<usize>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            kind: ColumnKind::Array { ndim, shape: None },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ColumnKind::Array { .. })
    }

    /// Dimensionality if known for every row
    pub fn ndim(&self) -> Option<usize> {
        match &self.kind {
            ColumnKind::Scalar => Some(0),
            ColumnKind::Array { ndim, .. } => *ndim,
        }
    }

    /// Shape if fixed for every row
    pub fn fixed_shape(&self) -> Option<&Shape> {
        match &self.kind {
            ColumnKind::Scalar => None,
            ColumnKind::Array { shape, .. } => shape.as_ref(),
        }
    }
}

impl fmt::Display for ColumnDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        match &self.kind {
            ColumnKind::Scalar => Ok(()),
            ColumnKind::Array {
                shape: Some(shape), ..
            } => write!(f, " ARRAY{}", crate::core::format_shape(shape)),
            ColumnKind::Array { ndim: Some(n), .. } => write!(f, " ARRAY ndim={}", n),
            ColumnKind::Array { .. } => write!(f, " ARRAY"),
        }
    }
}

/// Storage capability required by the expression engine
///
/// Reads of narrower numeric types are converted by the
/// [`ColumnAccessor`](crate::storage::ColumnAccessor), not by the store.
pub trait TableStore: Send + Sync + fmt::Debug {
    /// Table name
    fn name(&self) -> &str;

    /// Number of rows
    fn nrow(&self) -> usize;

    /// Description of a column, `None` if it does not exist
    fn column_desc(&self, column: &str) -> Option<ColumnDesc>;

    /// Names of all columns in table order
    fn column_names(&self) -> Vec<String>;

    fn column_exists(&self, column: &str) -> bool {
        self.column_desc(column).is_some()
    }

    fn column_type(&self, column: &str) -> Result<DataType> {
        self.column_desc(column)
            .map(|d| d.data_type())
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }

    /// Fixed shape of an array column, `None` if it varies per row
    fn column_shape(&self, column: &str) -> Result<Option<Shape>> {
        self.column_desc(column)
            .map(|d| d.fixed_shape().cloned())
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }

    /// Read a cell of a scalar column
    fn read_scalar(&self, column: &str, row: usize) -> Result<StoredValue>;

    /// Read a whole cell of an array column
    fn read_whole_array(&self, column: &str, row: usize) -> Result<StoredArray>;

    /// Shape of an array cell, `None` if the cell is undefined
    fn array_shape(&self, column: &str, row: usize) -> Result<Option<Shape>>;

    /// Whether a cell holds a value
    fn is_defined(&self, column: &str, row: usize) -> Result<bool> {
        let desc = self
            .column_desc(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        if desc.is_array() {
            Ok(self.array_shape(column, row)?.is_some())
        } else {
            Ok(row < self.nrow())
        }
    }

    /// Read the first element selected by a slicer
    fn read_element(&self, column: &str, row: usize, slicer: &Slicer) -> Result<StoredValue> {
        let array = self.read_whole_array(column, row)?;
        let resolved = slicer.resolve(array.shape(), row)?;
        array
            .element(resolved.first())
            .ok_or_else(|| Error::internal(format!("resolved position outside column '{}'", column)))
    }

    /// Read a section of an array cell
    fn read_slice(&self, column: &str, row: usize, slicer: &Slicer) -> Result<StoredArray> {
        let array = self.read_whole_array(column, row)?;
        let resolved = slicer.resolve(array.shape(), row)?;
        Ok(array.slice(&resolved))
    }

    /// Read the same section of every row
    fn read_whole_column(&self, column: &str, slicer: &Slicer) -> Result<Vec<StoredArray>> {
        (0..self.nrow())
            .map(|row| self.read_slice(column, row, slicer))
            .collect()
    }

    /// Write a cell of a scalar column
    fn put_scalar(&self, column: &str, _row: usize, _value: StoredValue) -> Result<()> {
        Err(Error::NotSupported(format!(
            "table '{}' is read-only (column '{}')",
            self.name(),
            column
        )))
    }

    /// Write a cell of an array column
    fn put_array(&self, column: &str, _row: usize, _value: StoredArray) -> Result<()> {
        Err(Error::NotSupported(format!(
            "table '{}' is read-only (column '{}')",
            self.name(),
            column
        )))
    }
}
