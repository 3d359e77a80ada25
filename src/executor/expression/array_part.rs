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

//! Element or section of an array expression

use std::fmt;
use std::sync::Arc;

use crate::core::{
    ArrayValue, Constancy, Error, Result, Scalar, Shape, ShapeClass, Slicer, Value, ValueType,
};

use super::index::IndexNode;
use super::{fold, ExprNode, NodeRef};

/// `array[index]`
///
/// A single element index gives a scalar, any other index an array with
/// one axis per index axis.
#[derive(Debug)]
pub struct ArrayPartNode {
    array: NodeRef,
    index: IndexNode,
    shape_class: ShapeClass,
    fixed_shape: Option<Shape>,
}

impl ArrayPartNode {
    pub fn build(array: NodeRef, index: IndexNode) -> Result<NodeRef> {
        if !array.shape_class().is_array() {
            return Err(Error::invalid_index(format!(
                "cannot index scalar expression {}",
                array
            )));
        }
        index.check_against(&*array)?;

        let (shape_class, fixed_shape) = if index.is_single() {
            (ShapeClass::Scalar, None)
        } else {
            let fixed_shape = index.fixed_slicer().and_then(|slicer| {
                slicer.length().or_else(|| {
                    array
                        .fixed_shape()
                        .and_then(|shape| slicer.infer_shape(&shape))
                })
            });
            (ShapeClass::Array, fixed_shape)
        };

        fold(Arc::new(Self {
            array,
            index,
            shape_class,
            fixed_shape,
        }))
    }

    pub fn array(&self) -> &NodeRef {
        &self.array
    }

    pub fn index(&self) -> &IndexNode {
        &self.index
    }

    fn element(&self, row: usize) -> Result<Scalar> {
        if !self.index.is_single() {
            return Err(Error::shape_contract("get_scalar", self));
        }
        let slicer = self.index.slicer(row)?;
        self.array.get_element(row, &slicer)
    }

    fn section(&self, row: usize) -> Result<ArrayValue> {
        if self.index.is_single() {
            return Err(Error::shape_contract("get_array", self));
        }
        let slicer = self.index.slicer(row)?;
        self.array.get_slice(row, &slicer)
    }

    /// One bulk read of the child column when the index is the same for all rows
    fn bulk(&self, slicer: &Slicer) -> Result<Option<Vec<Value>>> {
        let Some(parts) = self.array.get_whole_column(slicer)? else {
            return Ok(None);
        };
        if !self.index.is_single() {
            return Ok(Some(parts.into_iter().map(Value::Array).collect()));
        }
        parts
            .into_iter()
            .map(|part| {
                part.get(0)
                    .map(Value::Scalar)
                    .ok_or_else(|| Error::internal(format!("empty element read for {}", self)))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

impl ExprNode for ArrayPartNode {
    fn value_type(&self) -> ValueType {
        self.array.value_type()
    }

    fn shape_class(&self) -> ShapeClass {
        self.shape_class
    }

    fn constancy(&self) -> Constancy {
        self.array.constancy().and(self.index.constancy())
    }

    fn ndim(&self) -> Option<usize> {
        match self.shape_class {
            ShapeClass::Scalar => Some(0),
            ShapeClass::Array => Some(self.index.ndim()),
        }
    }

    fn fixed_shape(&self) -> Option<Shape> {
        self.fixed_shape.clone()
    }

    fn get_scalar(&self, row: usize) -> Result<Scalar> {
        self.element(row).map_err(|e| e.in_expression(self))
    }

    fn get_array(&self, row: usize) -> Result<ArrayValue> {
        self.section(row).map_err(|e| e.in_expression(self))
    }

    fn array_shape(&self, row: usize) -> Result<Shape> {
        if let Some(shape) = &self.fixed_shape {
            return Ok(shape.clone());
        }
        let eval = || {
            let slicer = self.index.slicer(row)?;
            let source = self.array.array_shape(row)?;
            Ok(slicer.resolve(&source, row)?.length)
        };
        eval().map_err(|e: Error| e.in_expression(self))
    }

    fn is_defined(&self, row: usize) -> Result<bool> {
        self.array.is_defined(row)
    }

    fn evaluate_column(&self) -> Result<Option<Vec<Value>>> {
        match self.index.fixed_slicer() {
            Some(slicer) => self.bulk(slicer).map_err(|e| e.in_expression(self)),
            None => Ok(None),
        }
    }
}

impl fmt::Display for ArrayPartNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.array, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, NdArray};
    use crate::executor::expression::{ColumnNode, ConstantNode, IndexAxis};
    use crate::storage::{ColumnDesc, IndexOrigin, MemoryTable, StoredArray, TableStore};

    fn matrix() -> NodeRef {
        let data: Vec<f64> = (0..12).map(f64::from).collect();
        ConstantNode::node(ArrayValue::Double(NdArray::new(&[3, 4], data).unwrap()))
    }

    fn index(axes: Vec<IndexAxis>) -> IndexNode {
        IndexNode::new(axes, IndexOrigin::Zero).unwrap()
    }

    fn ragged() -> Arc<dyn TableStore> {
        Arc::new(
            MemoryTable::builder("t", 3)
                .array_column(
                    ColumnDesc::variable_array("R", DataType::Int32, Some(1)),
                    vec![
                        Some(StoredArray::from(NdArray::from_vec(vec![10i32, 11, 12]))),
                        Some(StoredArray::from(NdArray::from_vec(vec![20i32, 21]))),
                        Some(StoredArray::from(NdArray::from_vec(vec![30i32, 31, 32, 33]))),
                    ],
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_single_element_is_scalar() {
        let node = ArrayPartNode::build(
            matrix(),
            index(vec![IndexAxis::value(1.0), IndexAxis::value(2.0)]),
        )
        .unwrap();
        assert_eq!(node.shape_class(), ShapeClass::Scalar);
        // constant array and index fold
        assert!(node.is_constant());
        assert_eq!(node.get_scalar(0).unwrap(), Scalar::double(7.0));
    }

    #[test]
    fn test_section_shape_inference() {
        let fixed = ArrayPartNode::build(
            matrix(),
            index(vec![IndexAxis::span(0.0, 2.0), IndexAxis::span(1.0, 1.0)]),
        )
        .unwrap();
        assert_eq!(fixed.fixed_shape().unwrap().as_slice(), &[3, 1]);

        let inferred = ArrayPartNode::build(
            matrix(),
            index(vec![IndexAxis::full(), IndexAxis::span(2.0, 3.0)]),
        )
        .unwrap();
        assert_eq!(inferred.fixed_shape().unwrap().as_slice(), &[3, 2]);
        assert_eq!(inferred.get_array(0).unwrap().get(0), Some(Scalar::double(6.0)));
    }

    #[test]
    fn test_construction_checks() {
        let err = ArrayPartNode::build(matrix(), index(vec![IndexAxis::value(0.0)])).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, got: 1 }));

        let err = ArrayPartNode::build(
            matrix(),
            index(vec![IndexAxis::value(3.0), IndexAxis::value(0.0)]),
        )
        .unwrap_err();
        assert!(err.is_construction_error());

        let scalar = ConstantNode::node(Scalar::double(1.0));
        assert!(ArrayPartNode::build(scalar, index(vec![IndexAxis::value(0.0)])).is_err());
    }

    #[test]
    fn test_row_out_of_bounds_names_row() {
        let column = ColumnNode::node(ragged(), "R").unwrap();
        let node = ArrayPartNode::build(column, index(vec![IndexAxis::value(2.0)])).unwrap();
        assert_eq!(node.get_scalar(0).unwrap(), Scalar::double(12.0));
        let err = node.get_scalar(1).unwrap_err();
        assert_eq!(err.row(), Some(1));
        assert!(err.to_string().ends_with("(in expression R[2])"));
    }

    #[test]
    fn test_bulk_read_matches_rows() {
        let column = ColumnNode::node(ragged(), "R").unwrap();
        let node = ArrayPartNode::build(column.clone(), index(vec![IndexAxis::span(0.0, 1.0)]))
            .unwrap();
        let bulk = node.evaluate_column().unwrap().unwrap();
        assert_eq!(bulk.len(), 3);
        for (row, value) in bulk.iter().enumerate() {
            assert_eq!(value, &Value::Array(node.get_array(row).unwrap()));
        }

        let first = ArrayPartNode::build(column, index(vec![IndexAxis::value(0.0)])).unwrap();
        let bulk = first.evaluate_column().unwrap().unwrap();
        let rows: Vec<Value> = (0..3)
            .map(|row| Value::Scalar(first.get_scalar(row).unwrap()))
            .collect();
        assert_eq!(bulk, rows);
    }
}
