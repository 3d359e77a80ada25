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

//! Column accessor
//!
//! Bridges a named column of a [`TableStore`] to the evaluator's value model.
//! All physical types are converted here and only here: integers and single
//! precision floats become `Double`, both complex widths become `Complex`.

use std::sync::Arc;

use crate::core::{
    ArrayValue, Complex, Error, Result, Scalar, Shape, ShapeClass, Slicer, ValueType,
};
use crate::storage::stored::{StoredArray, StoredValue};
use crate::storage::traits::{ColumnDesc, TableStore};

/// Convert a stored cell to an evaluator scalar
pub fn to_scalar(value: StoredValue) -> Scalar {
    match value {
        StoredValue::Bool(v) => Scalar::Bool(v),
        StoredValue::UInt8(v) => Scalar::Double(f64::from(v)),
        StoredValue::Int16(v) => Scalar::Double(f64::from(v)),
        StoredValue::UInt16(v) => Scalar::Double(f64::from(v)),
        StoredValue::Int32(v) => Scalar::Double(f64::from(v)),
        StoredValue::UInt32(v) => Scalar::Double(f64::from(v)),
        StoredValue::Float32(v) => Scalar::Double(f64::from(v)),
        StoredValue::Float64(v) => Scalar::Double(v),
        StoredValue::Complex32(v) => Scalar::Complex(Complex::from(v)),
        StoredValue::Complex64(v) => Scalar::Complex(v),
        StoredValue::String(v) => Scalar::String(v),
        StoredValue::Date(v) => Scalar::Date(v),
    }
}

/// Convert a stored array to an evaluator array
pub fn to_array(value: StoredArray) -> ArrayValue {
    match value {
        StoredArray::Bool(a) => ArrayValue::Bool(a),
        StoredArray::UInt8(a) => ArrayValue::Double(a.map(|v| f64::from(*v))),
        StoredArray::Int16(a) => ArrayValue::Double(a.map(|v| f64::from(*v))),
        StoredArray::UInt16(a) => ArrayValue::Double(a.map(|v| f64::from(*v))),
        StoredArray::Int32(a) => ArrayValue::Double(a.map(|v| f64::from(*v))),
        StoredArray::UInt32(a) => ArrayValue::Double(a.map(|v| f64::from(*v))),
        StoredArray::Float32(a) => ArrayValue::Double(a.map(|v| f64::from(*v))),
        StoredArray::Float64(a) => ArrayValue::Double(a),
        StoredArray::Complex32(a) => ArrayValue::Complex(a.map(|v| Complex::from(*v))),
        StoredArray::Complex64(a) => ArrayValue::Complex(a),
        StoredArray::String(a) => ArrayValue::String(a),
        StoredArray::Date(a) => ArrayValue::Date(a),
    }
}

/// Typed access to one column for the lifetime of a query
#[derive(Debug, Clone)]
pub struct ColumnAccessor {
    store: Arc<dyn TableStore>,
    desc: ColumnDesc,
}

impl ColumnAccessor {
    /// Bind to a column; fails if the column does not exist
    pub fn new(store: Arc<dyn TableStore>, column: &str) -> Result<Self> {
        let desc = store
            .column_desc(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        Ok(Self { store, desc })
    }

    pub fn name(&self) -> &str {
        self.desc.name()
    }

    pub fn desc(&self) -> &ColumnDesc {
        &self.desc
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    pub fn value_type(&self) -> ValueType {
        self.desc.data_type().value_type()
    }

    pub fn shape_class(&self) -> ShapeClass {
        if self.desc.is_array() {
            ShapeClass::Array
        } else {
            ShapeClass::Scalar
        }
    }

    pub fn ndim(&self) -> Option<usize> {
        self.desc.ndim()
    }

    pub fn fixed_shape(&self) -> Option<&Shape> {
        self.desc.fixed_shape()
    }

    pub fn nrow(&self) -> usize {
        self.store.nrow()
    }

    /// Value of a scalar column
    pub fn scalar_at(&self, row: usize) -> Result<Scalar> {
        self.store.read_scalar(self.name(), row).map(to_scalar)
    }

    /// Whole array of an array column
    pub fn whole_array_at(&self, row: usize) -> Result<ArrayValue> {
        self.store.read_whole_array(self.name(), row).map(to_array)
    }

    /// First element selected by the slicer
    pub fn element_at(&self, row: usize, slicer: &Slicer) -> Result<Scalar> {
        self.store
            .read_element(self.name(), row, slicer)
            .map(to_scalar)
    }

    /// Section of an array cell
    pub fn slice_at(&self, row: usize, slicer: &Slicer) -> Result<ArrayValue> {
        self.store.read_slice(self.name(), row, slicer).map(to_array)
    }

    /// The same section of every row
    pub fn whole_column(&self, slicer: &Slicer) -> Result<Vec<ArrayValue>> {
        let cells = self.store.read_whole_column(self.name(), slicer)?;
        Ok(cells.into_iter().map(to_array).collect())
    }

    /// Shape of an array cell; undefined cells are an error
    pub fn shape_at(&self, row: usize) -> Result<Shape> {
        self.store
            .array_shape(self.name(), row)?
            .ok_or_else(|| Error::UndefinedArray {
                column: self.name().to_string(),
                row,
            })
    }

    pub fn is_defined(&self, row: usize) -> Result<bool> {
        self.store.is_defined(self.name(), row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Complex32, DataType, NdArray, SliceEnd};
    use crate::storage::memory::MemoryTable;

    fn store() -> Arc<dyn TableStore> {
        let table = MemoryTable::builder("t", 2)
            .scalar_column("S", DataType::Int16, vec![StoredValue::Int16(-4), StoredValue::Int16(9)])
            .array_column(
                ColumnDesc::fixed_array("C", DataType::Complex32, &[2]),
                vec![
                    Some(StoredArray::from(NdArray::from_vec(vec![
                        Complex32::new(1.0, 2.0),
                        Complex32::new(3.0, 4.0),
                    ]))),
                    Some(StoredArray::from(NdArray::from_vec(vec![
                        Complex32::new(0.5, 0.0),
                        Complex32::new(0.0, 0.5),
                    ]))),
                ],
            )
            .build()
            .unwrap();
        Arc::new(table)
    }

    #[test]
    fn test_unknown_column_fails_at_construction() {
        let err = ColumnAccessor::new(store(), "NOPE").unwrap_err();
        assert_eq!(err, Error::ColumnNotFound("NOPE".to_string()));
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_narrow_types_promote() {
        let s = ColumnAccessor::new(store(), "S").unwrap();
        assert_eq!(s.value_type(), ValueType::Double);
        assert_eq!(s.shape_class(), ShapeClass::Scalar);
        assert_eq!(s.scalar_at(0).unwrap(), Scalar::Double(-4.0));

        let c = ColumnAccessor::new(store(), "C").unwrap();
        assert_eq!(c.value_type(), ValueType::Complex);
        assert_eq!(c.fixed_shape().unwrap().as_slice(), &[2]);
        let arr = c.whole_array_at(0).unwrap();
        assert_eq!(arr.get(1), Some(Scalar::complex(3.0, 4.0)));
    }

    #[test]
    fn test_element_and_slice() {
        let c = ColumnAccessor::new(store(), "C").unwrap();
        let elem = c.element_at(1, &Slicer::single(&[1])).unwrap();
        assert_eq!(elem, Scalar::complex(0.0, 0.5));

        let err = c.element_at(1, &Slicer::single(&[2])).unwrap_err();
        assert_eq!(err.row(), Some(1));

        let slicer = Slicer::new(vec![1], vec![SliceEnd::MimicSource], vec![1]).unwrap();
        let column = c.whole_column(&slicer).unwrap();
        assert_eq!(column.len(), 2);
        assert_eq!(column[0].get(0), Some(Scalar::complex(3.0, 4.0)));
        assert_eq!(column[1], c.slice_at(1, &slicer).unwrap());
    }
}
