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

//! In-memory column store
//!
//! Holds every column as a vector of cells. Array columns may have a fixed
//! shape, a fixed dimensionality only, or neither; individual array cells may
//! be undefined.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::{format_shape, DataType, Error, Result, Shape, Slicer};
use crate::storage::stored::{StoredArray, StoredValue};
use crate::storage::traits::{ColumnDesc, ColumnKind, TableStore};

#[derive(Debug, Clone)]
enum ColumnData {
    Scalar(Vec<StoredValue>),
    Array(Vec<Option<StoredArray>>),
}

/// Column store kept entirely in memory
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    nrow: usize,
    columns: Vec<ColumnDesc>,
    /// Column name -> position in `columns`
    index: FxHashMap<String, usize>,
    data: RwLock<Vec<ColumnData>>,
}

impl MemoryTable {
    /// Start building a table with `nrow` rows
    pub fn builder(name: impl Into<String>, nrow: usize) -> MemoryTableBuilder {
        MemoryTableBuilder {
            name: name.into(),
            nrow,
            columns: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.nrow {
            return Err(Error::RowOutOfRange {
                row,
                nrow: self.nrow,
            });
        }
        Ok(())
    }

    /// Run `f` on a defined array cell
    fn with_array<T>(
        &self,
        column: &str,
        row: usize,
        f: impl FnOnce(&StoredArray) -> Result<T>,
    ) -> Result<T> {
        let pos = self.position(column)?;
        self.check_row(row)?;
        let data = self.data.read();
        match &data[pos] {
            ColumnData::Array(cells) => match &cells[row] {
                Some(array) => f(array),
                None => Err(Error::UndefinedArray {
                    column: column.to_string(),
                    row,
                }),
            },
            ColumnData::Scalar(_) => Err(Error::shape_contract(
                "array read",
                format!("scalar column '{}'", column),
            )),
        }
    }
}

impl TableStore for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn nrow(&self) -> usize {
        self.nrow
    }

    fn column_desc(&self, column: &str) -> Option<ColumnDesc> {
        self.index.get(column).map(|&pos| self.columns[pos].clone())
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    fn read_scalar(&self, column: &str, row: usize) -> Result<StoredValue> {
        let pos = self.position(column)?;
        self.check_row(row)?;
        match &self.data.read()[pos] {
            ColumnData::Scalar(values) => Ok(values[row].clone()),
            ColumnData::Array(_) => Err(Error::shape_contract(
                "scalar read",
                format!("array column '{}'", column),
            )),
        }
    }

    fn read_whole_array(&self, column: &str, row: usize) -> Result<StoredArray> {
        self.with_array(column, row, |array| Ok(array.clone()))
    }

    fn array_shape(&self, column: &str, row: usize) -> Result<Option<Shape>> {
        let pos = self.position(column)?;
        self.check_row(row)?;
        match &self.data.read()[pos] {
            ColumnData::Array(cells) => Ok(cells[row].as_ref().map(|a| Shape::from_slice(a.shape()))),
            ColumnData::Scalar(_) => Ok(None),
        }
    }

    fn is_defined(&self, column: &str, row: usize) -> Result<bool> {
        let pos = self.position(column)?;
        if row >= self.nrow {
            return Ok(false);
        }
        match &self.data.read()[pos] {
            ColumnData::Array(cells) => Ok(cells[row].is_some()),
            ColumnData::Scalar(_) => Ok(true),
        }
    }

    fn read_element(&self, column: &str, row: usize, slicer: &Slicer) -> Result<StoredValue> {
        self.with_array(column, row, |array| {
            let resolved = slicer.resolve(array.shape(), row)?;
            array.element(resolved.first()).ok_or_else(|| {
                Error::internal(format!("resolved position outside column '{}'", column))
            })
        })
    }

    fn read_slice(&self, column: &str, row: usize, slicer: &Slicer) -> Result<StoredArray> {
        self.with_array(column, row, |array| {
            let resolved = slicer.resolve(array.shape(), row)?;
            Ok(array.slice(&resolved))
        })
    }

    fn put_scalar(&self, column: &str, row: usize, value: StoredValue) -> Result<()> {
        let pos = self.position(column)?;
        self.check_row(row)?;
        check_type(&self.columns[pos], value.data_type())?;
        match &mut self.data.write()[pos] {
            ColumnData::Scalar(values) => {
                values[row] = value;
                Ok(())
            }
            ColumnData::Array(_) => Err(Error::shape_contract(
                "scalar write",
                format!("array column '{}'", column),
            )),
        }
    }

    fn put_array(&self, column: &str, row: usize, value: StoredArray) -> Result<()> {
        let pos = self.position(column)?;
        self.check_row(row)?;
        check_cell(&self.columns[pos], &value)?;
        match &mut self.data.write()[pos] {
            ColumnData::Array(cells) => {
                cells[row] = Some(value);
                Ok(())
            }
            ColumnData::Scalar(_) => Err(Error::shape_contract(
                "array write",
                format!("scalar column '{}'", column),
            )),
        }
    }
}

fn check_type(desc: &ColumnDesc, got: DataType) -> Result<()> {
    if desc.data_type() != got {
        return Err(Error::TypeMismatch {
            column: desc.name().to_string(),
            expected: desc.data_type().to_string(),
            got: got.to_string(),
        });
    }
    Ok(())
}

/// Validate an array cell against its column description
fn check_cell(desc: &ColumnDesc, cell: &StoredArray) -> Result<()> {
    check_type(desc, cell.data_type())?;
    match desc.kind() {
        ColumnKind::Array {
            shape: Some(shape), ..
        } if shape.as_slice() != cell.shape() => Err(Error::invalid_argument(format!(
            "column '{}' has fixed shape {}, got {}",
            desc.name(),
            format_shape(shape),
            format_shape(cell.shape())
        ))),
        ColumnKind::Array {
            ndim: Some(ndim), ..
        } if *ndim != cell.shape().len() => Err(Error::invalid_argument(format!(
            "column '{}' has {} dimensions, got {}",
            desc.name(),
            ndim,
            format_shape(cell.shape())
        ))),
        _ => Ok(()),
    }
}

/// Builder for [`MemoryTable`]
#[derive(Debug)]
pub struct MemoryTableBuilder {
    name: String,
    nrow: usize,
    columns: Vec<(ColumnDesc, ColumnData)>,
}

impl MemoryTableBuilder {
    /// Add a scalar column; `values` must hold one value per row
    pub fn scalar_column(
        mut self,
        name: impl Into<String>,
        data_type: DataType,
        values: Vec<StoredValue>,
    ) -> Self {
        self.columns.push((
            ColumnDesc::scalar(name, data_type),
            ColumnData::Scalar(values),
        ));
        self
    }

    /// Add an array column; `None` cells are undefined
    pub fn array_column(mut self, desc: ColumnDesc, cells: Vec<Option<StoredArray>>) -> Self {
        self.columns.push((desc, ColumnData::Array(cells)));
        self
    }

    /// Validate all columns and build the table
    pub fn build(self) -> Result<MemoryTable> {
        let mut index = FxHashMap::default();
        let mut columns = Vec::with_capacity(self.columns.len());
        let mut data = Vec::with_capacity(self.columns.len());

        for (pos, (desc, column)) in self.columns.into_iter().enumerate() {
            if index.insert(desc.name().to_string(), pos).is_some() {
                return Err(Error::invalid_argument(format!(
                    "duplicate column '{}'",
                    desc.name()
                )));
            }
            let len = match &column {
                ColumnData::Scalar(values) => {
                    if desc.is_array() {
                        return Err(Error::invalid_argument(format!(
                            "array column '{}' given scalar values",
                            desc.name()
                        )));
                    }
                    for value in values {
                        check_type(&desc, value.data_type())?;
                    }
                    values.len()
                }
                ColumnData::Array(cells) => {
                    if !desc.is_array() {
                        return Err(Error::invalid_argument(format!(
                            "scalar column '{}' given array cells",
                            desc.name()
                        )));
                    }
                    for cell in cells.iter().flatten() {
                        check_cell(&desc, cell)?;
                    }
                    cells.len()
                }
            };
            if len != self.nrow {
                return Err(Error::invalid_argument(format!(
                    "column '{}' has {} rows, table has {}",
                    desc.name(),
                    len,
                    self.nrow
                )));
            }
            columns.push(desc);
            data.push(column);
        }

        Ok(MemoryTable {
            name: self.name,
            nrow: self.nrow,
            columns,
            index,
            data: RwLock::new(data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NdArray, SliceEnd};

    fn table() -> MemoryTable {
        MemoryTable::builder("obs", 3)
            .scalar_column(
                "ID",
                DataType::Int32,
                vec![1i32.into(), 2i32.into(), 3i32.into()],
            )
            .array_column(
                ColumnDesc::variable_array("DATA", DataType::Float32, Some(1)),
                vec![
                    Some(NdArray::from_vec(vec![1.0f32, 2.0, 3.0]).into()),
                    None,
                    Some(NdArray::from_vec(vec![4.0f32]).into()),
                ],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema() {
        let t = table();
        assert_eq!(t.name(), "obs");
        assert_eq!(t.nrow(), 3);
        assert_eq!(t.column_names(), vec!["ID".to_string(), "DATA".to_string()]);
        assert!(t.column_exists("DATA"));
        assert!(!t.column_exists("data"));
        assert_eq!(t.column_type("ID").unwrap(), DataType::Int32);
        assert_eq!(t.column_shape("DATA").unwrap(), None);
        assert!(t.column_type("NOPE").is_err());
    }

    #[test]
    fn test_reads() {
        let t = table();
        assert_eq!(t.read_scalar("ID", 2).unwrap(), StoredValue::Int32(3));
        assert_eq!(
            t.read_scalar("ID", 3).unwrap_err(),
            Error::RowOutOfRange { row: 3, nrow: 3 }
        );
        assert_eq!(t.array_shape("DATA", 0).unwrap().unwrap().as_slice(), &[3]);
        assert_eq!(t.array_shape("DATA", 1).unwrap(), None);
        assert!(!t.is_defined("DATA", 1).unwrap());
        assert!(t.is_defined("DATA", 2).unwrap());

        let err = t.read_whole_array("DATA", 1).unwrap_err();
        assert_eq!(
            err,
            Error::UndefinedArray {
                column: "DATA".to_string(),
                row: 1
            }
        );
        assert!(t.read_scalar("DATA", 0).unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_slices_per_row_shape() {
        let t = table();
        let slicer = Slicer::new(vec![1], vec![SliceEnd::MimicSource], vec![1]).unwrap();
        let part = t.read_slice("DATA", 0, &slicer).unwrap();
        assert_eq!(part, StoredArray::from(NdArray::from_vec(vec![2.0f32, 3.0])));

        // row 2 holds a single element; start 1 is out of its bounds
        let err = t.read_slice("DATA", 2, &slicer).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { row: 2, .. }));

        assert_eq!(
            t.read_element("DATA", 0, &Slicer::single(&[2])).unwrap(),
            StoredValue::Float32(3.0)
        );
    }

    #[test]
    fn test_writes_check_type_and_shape() {
        let t = table();
        t.put_scalar("ID", 0, StoredValue::Int32(10)).unwrap();
        assert_eq!(t.read_scalar("ID", 0).unwrap(), StoredValue::Int32(10));
        assert!(matches!(
            t.put_scalar("ID", 0, StoredValue::Float64(1.0)),
            Err(Error::TypeMismatch { .. })
        ));

        t.put_array("DATA", 1, NdArray::from_vec(vec![7.0f32, 8.0]).into())
            .unwrap();
        assert!(t.is_defined("DATA", 1).unwrap());
        let square = NdArray::new(&[1, 1], vec![0.0f32]).unwrap();
        assert!(t.put_array("DATA", 1, square.into()).is_err());
    }

    #[test]
    fn test_build_validation() {
        let short = MemoryTable::builder("t", 2)
            .scalar_column("A", DataType::Bool, vec![true.into()])
            .build();
        assert!(short.is_err());

        let dup = MemoryTable::builder("t", 1)
            .scalar_column("A", DataType::Bool, vec![true.into()])
            .scalar_column("A", DataType::Bool, vec![false.into()])
            .build();
        assert!(dup.is_err());

        let wrong_shape = MemoryTable::builder("t", 1)
            .array_column(
                ColumnDesc::fixed_array("A", DataType::Float64, &[2]),
                vec![Some(NdArray::from_vec(vec![1.0f64]).into())],
            )
            .build();
        assert!(wrong_shape.is_err());

        let wrong_type = MemoryTable::builder("t", 1)
            .scalar_column("A", DataType::Int16, vec![StoredValue::Int32(1)])
            .build();
        assert!(matches!(wrong_type, Err(Error::TypeMismatch { .. })));
    }
}
