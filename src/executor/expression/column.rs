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

//! Column reference node

use std::fmt;
use std::sync::Arc;

use crate::core::{
    ArrayValue, Constancy, Error, Result, Scalar, Shape, ShapeClass, Slicer, Value, ValueType,
};
use crate::storage::{ColumnAccessor, TableStore};

use super::{ExprNode, NodeRef};

/// Row-indexed lookup of a table column
#[derive(Debug, Clone)]
pub struct ColumnNode {
    accessor: ColumnAccessor,
}

impl ColumnNode {
    /// Bind to a column of a store; unknown columns fail here
    pub fn new(store: Arc<dyn TableStore>, column: &str) -> Result<Self> {
        Ok(Self {
            accessor: ColumnAccessor::new(store, column)?,
        })
    }

    pub fn node(store: Arc<dyn TableStore>, column: &str) -> Result<NodeRef> {
        Ok(Arc::new(Self::new(store, column)?))
    }

    pub fn accessor(&self) -> &ColumnAccessor {
        &self.accessor
    }

    fn require(&self, class: ShapeClass, called: &str) -> Result<()> {
        if self.accessor.shape_class() == class {
            Ok(())
        } else {
            Err(Error::shape_contract(called, self))
        }
    }
}

impl ExprNode for ColumnNode {
    fn value_type(&self) -> ValueType {
        self.accessor.value_type()
    }

    fn shape_class(&self) -> ShapeClass {
        self.accessor.shape_class()
    }

    fn constancy(&self) -> Constancy {
        Constancy::Variable
    }

    fn ndim(&self) -> Option<usize> {
        match self.accessor.shape_class() {
            ShapeClass::Scalar => Some(0),
            ShapeClass::Array => self.accessor.ndim(),
        }
    }

    fn fixed_shape(&self) -> Option<Shape> {
        self.accessor.fixed_shape().cloned()
    }

    fn get_scalar(&self, row: usize) -> Result<Scalar> {
        self.require(ShapeClass::Scalar, "get_scalar")?;
        self.accessor.scalar_at(row)
    }

    fn get_array(&self, row: usize) -> Result<ArrayValue> {
        self.require(ShapeClass::Array, "get_array")?;
        self.accessor.whole_array_at(row)
    }

    fn get_element(&self, row: usize, slicer: &Slicer) -> Result<Scalar> {
        self.require(ShapeClass::Array, "get_element")?;
        self.accessor.element_at(row, slicer)
    }

    fn get_slice(&self, row: usize, slicer: &Slicer) -> Result<ArrayValue> {
        self.require(ShapeClass::Array, "get_slice")?;
        self.accessor.slice_at(row, slicer)
    }

    fn array_shape(&self, row: usize) -> Result<Shape> {
        self.require(ShapeClass::Array, "array_shape")?;
        match self.accessor.fixed_shape() {
            Some(shape) => Ok(shape.clone()),
            None => self.accessor.shape_at(row),
        }
    }

    fn is_defined(&self, row: usize) -> Result<bool> {
        self.accessor.is_defined(row)
    }

    fn get_whole_column(&self, slicer: &Slicer) -> Result<Option<Vec<ArrayValue>>> {
        self.require(ShapeClass::Array, "get_whole_column")?;
        self.accessor.whole_column(slicer).map(Some)
    }

    fn evaluate_column(&self) -> Result<Option<Vec<Value>>> {
        match (self.accessor.shape_class(), self.accessor.ndim()) {
            (ShapeClass::Array, Some(ndim)) => {
                let arrays = self.accessor.whole_column(&Slicer::full(ndim))?;
                Ok(Some(arrays.into_iter().map(Value::Array).collect()))
            }
            _ => Ok(None),
        }
    }
}

impl fmt::Display for ColumnNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.accessor.name())
    }
}
