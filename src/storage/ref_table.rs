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

//! Row-subset view of another store
//!
//! Row `i` of a [`RefTable`] is row `rows[i]` of its parent. Selections and
//! iteration groups are `RefTable`s; they share the parent's data and lock.

use std::sync::Arc;

use crate::core::{Error, Result, Shape, Slicer};
use crate::storage::stored::{StoredArray, StoredValue};
use crate::storage::traits::{ColumnDesc, TableStore};

#[derive(Debug, Clone)]
pub struct RefTable {
    name: String,
    parent: Arc<dyn TableStore>,
    rows: Arc<[usize]>,
}

impl RefTable {
    /// View of `rows` of `parent`; every row must exist in the parent
    pub fn new(parent: Arc<dyn TableStore>, rows: Vec<usize>) -> Result<Self> {
        let rows: Arc<[usize]> = rows.into();
        let nrow = parent.nrow();
        if let Some(&row) = rows.iter().find(|&&r| r >= nrow) {
            return Err(Error::RowOutOfRange { row, nrow });
        }
        Ok(Self {
            name: parent.name().to_string(),
            parent,
            rows,
        })
    }

    pub fn parent(&self) -> &Arc<dyn TableStore> {
        &self.parent
    }

    /// Parent row numbers in view order
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Parent row number of a view row
    pub fn parent_row(&self, row: usize) -> Result<usize> {
        self.rows.get(row).copied().ok_or(Error::RowOutOfRange {
            row,
            nrow: self.rows.len(),
        })
    }
}

impl TableStore for RefTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn nrow(&self) -> usize {
        self.rows.len()
    }

    fn column_desc(&self, column: &str) -> Option<ColumnDesc> {
        self.parent.column_desc(column)
    }

    fn column_names(&self) -> Vec<String> {
        self.parent.column_names()
    }

    fn read_scalar(&self, column: &str, row: usize) -> Result<StoredValue> {
        self.parent
            .read_scalar(column, self.parent_row(row)?)
            .map_err(|e| renumber(e, row))
    }

    fn read_whole_array(&self, column: &str, row: usize) -> Result<StoredArray> {
        self.parent
            .read_whole_array(column, self.parent_row(row)?)
            .map_err(|e| renumber(e, row))
    }

    fn array_shape(&self, column: &str, row: usize) -> Result<Option<Shape>> {
        self.parent
            .array_shape(column, self.parent_row(row)?)
            .map_err(|e| renumber(e, row))
    }

    fn is_defined(&self, column: &str, row: usize) -> Result<bool> {
        match self.rows.get(row) {
            Some(&parent_row) => self.parent.is_defined(column, parent_row),
            None => Ok(false),
        }
    }

    fn read_element(&self, column: &str, row: usize, slicer: &Slicer) -> Result<StoredValue> {
        self.parent
            .read_element(column, self.parent_row(row)?, slicer)
            .map_err(|e| renumber(e, row))
    }

    fn read_slice(&self, column: &str, row: usize, slicer: &Slicer) -> Result<StoredArray> {
        self.parent
            .read_slice(column, self.parent_row(row)?, slicer)
            .map_err(|e| renumber(e, row))
    }

    fn put_scalar(&self, column: &str, row: usize, value: StoredValue) -> Result<()> {
        self.parent.put_scalar(column, self.parent_row(row)?, value)
    }

    fn put_array(&self, column: &str, row: usize, value: StoredArray) -> Result<()> {
        self.parent.put_array(column, self.parent_row(row)?, value)
    }
}

/// Report row errors with the view's row number
fn renumber(err: Error, view_row: usize) -> Error {
    match err {
        Error::IndexOutOfBounds {
            axis,
            value,
            length,
            ..
        } => Error::IndexOutOfBounds {
            row: view_row,
            axis,
            value,
            length,
        },
        Error::EmptySlice {
            axis, start, end, ..
        } => Error::EmptySlice {
            row: view_row,
            axis,
            start,
            end,
        },
        Error::ArrayShapeMismatch { left, right, .. } => Error::ArrayShapeMismatch {
            row: view_row,
            left,
            right,
        },
        Error::UndefinedArray { column, .. } => Error::UndefinedArray {
            column,
            row: view_row,
        },
        other => other,
    }
}
