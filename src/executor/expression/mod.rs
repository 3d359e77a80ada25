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

//! Expression node tree
//!
//! An expression is a DAG of [`ExprNode`]s shared through [`NodeRef`]. Every
//! node declares its value type and shape class at construction; both are
//! fixed for its lifetime. Evaluation pulls values row by row through
//! [`ExprNode::get_scalar`] or [`ExprNode::get_array`], whichever matches
//! the shape class.
//!
//! # Node Types
//!
//! - [`ConstantNode`] - Fixed value, same for every row
//! - [`ColumnNode`] - Column lookup through a [`ColumnAccessor`](crate::storage::ColumnAccessor)
//! - [`UnaryNode`] - Negation and logical not
//! - [`BinaryNode`] - Arithmetic, comparison, logical and membership operators
//! - [`ArrayPartNode`] - Element or section of an array, selected by an [`IndexNode`]
//!
//! [`TableExpr`] wraps a root node with the table it reads from.

pub mod array_part;
pub mod binary;
pub mod column;
pub mod constant;
pub mod expr;
pub mod index;
pub mod ops;
pub mod unary;

use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::core::{
    ArrayValue, Constancy, Error, Result, Scalar, Shape, ShapeClass, Slicer, Value, ValueType,
};

pub use array_part::ArrayPartNode;
pub use binary::BinaryNode;
pub use column::ColumnNode;
pub use constant::ConstantNode;
pub use expr::TableExpr;
pub use index::{IndexAxis, IndexNode};
pub use ops::{BinaryOp, UnaryOp};
pub use unary::UnaryNode;

/// Shared handle on a node; sub-trees may be reused by several parents
pub type NodeRef = Arc<dyn ExprNode>;

/// A node of the expression tree
///
/// Only the accessor matching [`shape_class`](ExprNode::shape_class) may be
/// called. The defaults of the other one report a contract violation.
pub trait ExprNode: Send + Sync + Debug + Display {
    /// Type of every value this node yields
    fn value_type(&self) -> ValueType;

    /// Scalar or array per row
    fn shape_class(&self) -> ShapeClass;

    /// Whether the value is the same for every row
    fn constancy(&self) -> Constancy;

    fn is_constant(&self) -> bool {
        self.constancy().is_constant()
    }

    /// Dimensionality of the result if known for all rows (0 for scalars)
    fn ndim(&self) -> Option<usize> {
        match self.shape_class() {
            ShapeClass::Scalar => Some(0),
            ShapeClass::Array => self.fixed_shape().map(|s| s.len()),
        }
    }

    /// Shape of the result if it is the same for all rows
    fn fixed_shape(&self) -> Option<Shape> {
        None
    }

    /// Value of a scalar node for a row
    fn get_scalar(&self, _row: usize) -> Result<Scalar> {
        Err(Error::shape_contract("get_scalar", self))
    }

    /// Value of an array node for a row
    fn get_array(&self, _row: usize) -> Result<ArrayValue> {
        Err(Error::shape_contract("get_array", self))
    }

    /// First element selected by a slicer
    fn get_element(&self, row: usize, slicer: &Slicer) -> Result<Scalar> {
        let array = self.get_array(row)?;
        let resolved = slicer.resolve(array.shape(), row)?;
        array
            .element(resolved.first())
            .ok_or_else(|| Error::internal(format!("resolved position outside {}", self)))
    }

    /// Section of the array selected by a slicer
    fn get_slice(&self, row: usize, slicer: &Slicer) -> Result<ArrayValue> {
        let array = self.get_array(row)?;
        let resolved = slicer.resolve(array.shape(), row)?;
        Ok(array.slice(&resolved))
    }

    /// Shape of the array for a row
    fn array_shape(&self, row: usize) -> Result<Shape> {
        if let Some(shape) = self.fixed_shape() {
            return Ok(shape);
        }
        Ok(Shape::from_slice(self.get_array(row)?.shape()))
    }

    /// Whether the node has a value for a row
    fn is_defined(&self, _row: usize) -> Result<bool> {
        Ok(true)
    }

    /// The same section of every row in one bulk read.
    ///
    /// `None` if the node cannot read its column in bulk.
    fn get_whole_column(&self, _slicer: &Slicer) -> Result<Option<Vec<ArrayValue>>> {
        Ok(None)
    }

    /// All rows in one pass, `None` if no fast path applies.
    ///
    /// Must equal calling `get_scalar`/`get_array` for every row.
    fn evaluate_column(&self) -> Result<Option<Vec<Value>>> {
        Ok(None)
    }
}

/// Evaluate a node for one row according to its shape class
pub fn evaluate_node(node: &dyn ExprNode, row: usize) -> Result<Value> {
    match node.shape_class() {
        ShapeClass::Scalar => node.get_scalar(row).map(Value::Scalar),
        ShapeClass::Array => node.get_array(row).map(Value::Array),
    }
}

/// Replace a node by a constant if all its operands are constant
pub(crate) fn fold(node: NodeRef) -> Result<NodeRef> {
    if !node.is_constant() {
        return Ok(node);
    }
    let value = evaluate_node(&*node, 0)?;
    tracing::trace!(expr = %node, value = %value, "folded constant expression");
    Ok(Arc::new(ConstantNode::new(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_accessor_is_contract_violation() {
        let scalar = ConstantNode::new(Scalar::double(1.0));
        let err = scalar.get_array(0).unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(
            err.to_string(),
            "shape contract violated: get_array called on 1"
        );

        let array = ConstantNode::new(ArrayValue::Double(crate::core::NdArray::from_vec(vec![
            1.0, 2.0,
        ])));
        assert!(array.get_scalar(0).unwrap_err().is_contract_violation());
        assert_eq!(array.ndim(), Some(1));
        assert_eq!(evaluate_node(&array, 5).unwrap().shape_class(), ShapeClass::Array);
    }
}
