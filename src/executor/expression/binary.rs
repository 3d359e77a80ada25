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

//! Binary operator node
//!
//! Operand types and statically known shapes are checked when the node is
//! built. A scalar operand combines with every element of an array operand;
//! two array operands must have the same shape in every row.

use std::fmt;
use std::sync::Arc;

use crate::core::{
    format_shape, ArrayValue, Constancy, Error, Result, Scalar, Shape, ShapeClass, ValueType,
};

use super::ops::BinaryOp;
use super::{fold, ExprNode, NodeRef};

#[derive(Debug)]
pub struct BinaryNode {
    op: BinaryOp,
    left: NodeRef,
    right: NodeRef,
    value_type: ValueType,
    shape_class: ShapeClass,
    ndim: Option<usize>,
    fixed_shape: Option<Shape>,
}

impl BinaryNode {
    /// Build `left op right`, folding it if both operands are constant
    pub fn build(op: BinaryOp, left: NodeRef, right: NodeRef) -> Result<NodeRef> {
        let value_type = op.result_type(left.value_type(), right.value_type())?;

        let (shape_class, ndim, fixed_shape) = if op == BinaryOp::In {
            if !right.shape_class().is_array() {
                return Err(Error::incompatible(
                    op.as_str(),
                    left.value_type(),
                    format!("{} scalar", right.value_type()),
                ));
            }
            (left.shape_class(), left.ndim(), left.fixed_shape())
        } else {
            match (left.shape_class(), right.shape_class()) {
                (ShapeClass::Scalar, ShapeClass::Scalar) => (ShapeClass::Scalar, Some(0), None),
                (ShapeClass::Array, ShapeClass::Scalar) => {
                    (ShapeClass::Array, left.ndim(), left.fixed_shape())
                }
                (ShapeClass::Scalar, ShapeClass::Array) => {
                    (ShapeClass::Array, right.ndim(), right.fixed_shape())
                }
                (ShapeClass::Array, ShapeClass::Array) => {
                    check_conformance(&*left, &*right)?;
                    (
                        ShapeClass::Array,
                        left.ndim().or(right.ndim()),
                        left.fixed_shape().or(right.fixed_shape()),
                    )
                }
            }
        };

        fold(Arc::new(Self {
            op,
            left,
            right,
            value_type,
            shape_class,
            ndim,
            fixed_shape,
        }))
    }

    pub fn op(&self) -> BinaryOp {
        self.op
    }

    pub fn left(&self) -> &NodeRef {
        &self.left
    }

    pub fn right(&self) -> &NodeRef {
        &self.right
    }

    fn eval_scalar(&self, row: usize) -> Result<Scalar> {
        if self.shape_class.is_array() {
            return Err(Error::shape_contract("get_scalar", self));
        }
        let left = self.left.get_scalar(row)?;
        match (self.op, left.as_bool()) {
            (BinaryOp::And, Some(false)) => return Ok(Scalar::Bool(false)),
            (BinaryOp::Or, Some(true)) => return Ok(Scalar::Bool(true)),
            _ => {}
        }
        if self.op == BinaryOp::In {
            let set = self.right.get_array(row)?;
            return Ok(Scalar::Bool(set.contains(&left)));
        }
        let right = self.right.get_scalar(row)?;
        self.op.apply(&left, &right)
    }

    fn eval_array(&self, row: usize) -> Result<ArrayValue> {
        if !self.shape_class.is_array() {
            return Err(Error::shape_contract("get_array", self));
        }
        if self.op == BinaryOp::In {
            let left = self.left.get_array(row)?;
            let set = self.right.get_array(row)?;
            let values = left.scalars().map(|v| Scalar::Bool(set.contains(&v))).collect();
            return ArrayValue::from_scalars(ValueType::Bool, left.shape(), values);
        }

        let op = self.op;
        let (shape, values) = match (self.left.shape_class(), self.right.shape_class()) {
            (ShapeClass::Array, ShapeClass::Array) => {
                let left = self.left.get_array(row)?;
                let right = self.right.get_array(row)?;
                if left.shape() != right.shape() {
                    return Err(Error::ArrayShapeMismatch {
                        row,
                        left: format_shape(left.shape()),
                        right: format_shape(right.shape()),
                    });
                }
                let values = left
                    .scalars()
                    .zip(right.scalars())
                    .map(|(a, b)| op.apply(&a, &b))
                    .collect::<Result<Vec<_>>>()?;
                (Shape::from_slice(left.shape()), values)
            }
            (ShapeClass::Array, ShapeClass::Scalar) => {
                let left = self.left.get_array(row)?;
                let right = self.right.get_scalar(row)?;
                let values = left
                    .scalars()
                    .map(|a| op.apply(&a, &right))
                    .collect::<Result<Vec<_>>>()?;
                (Shape::from_slice(left.shape()), values)
            }
            _ => {
                let left = self.left.get_scalar(row)?;
                let right = self.right.get_array(row)?;
                let values = right
                    .scalars()
                    .map(|b| op.apply(&left, &b))
                    .collect::<Result<Vec<_>>>()?;
                (Shape::from_slice(right.shape()), values)
            }
        };
        ArrayValue::from_scalars(self.value_type, &shape, values)
    }
}

/// Reject array operands whose known shapes can never match
fn check_conformance(left: &dyn ExprNode, right: &dyn ExprNode) -> Result<()> {
    if let (Some(l), Some(r)) = (left.fixed_shape(), right.fixed_shape()) {
        if l != r {
            return Err(Error::ShapeConformance {
                left: format_shape(&l),
                right: format_shape(&r),
            });
        }
    }
    if let (Some(l), Some(r)) = (left.ndim(), right.ndim()) {
        if l != r {
            return Err(Error::ShapeConformance {
                left: format!("{}-dim", l),
                right: format!("{}-dim", r),
            });
        }
    }
    Ok(())
}

impl ExprNode for BinaryNode {
    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn shape_class(&self) -> ShapeClass {
        self.shape_class
    }

    fn constancy(&self) -> Constancy {
        self.left.constancy().and(self.right.constancy())
    }

    fn ndim(&self) -> Option<usize> {
        self.ndim
    }

    fn fixed_shape(&self) -> Option<Shape> {
        self.fixed_shape.clone()
    }

    fn get_scalar(&self, row: usize) -> Result<Scalar> {
        self.eval_scalar(row).map_err(|e| e.in_expression(self))
    }

    fn get_array(&self, row: usize) -> Result<ArrayValue> {
        self.eval_array(row).map_err(|e| e.in_expression(self))
    }

    fn array_shape(&self, row: usize) -> Result<Shape> {
        if let Some(shape) = &self.fixed_shape {
            return Ok(shape.clone());
        }
        let shape = if self.op == BinaryOp::In || self.left.shape_class().is_array() {
            self.left.array_shape(row)
        } else {
            self.right.array_shape(row)
        };
        shape.map_err(|e| e.in_expression(self))
    }

    fn is_defined(&self, row: usize) -> Result<bool> {
        Ok(self.left.is_defined(row)? && self.right.is_defined(row)?)
    }
}

impl fmt::Display for BinaryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.op, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NdArray;
    use crate::executor::expression::ConstantNode;

    /// Array of length `row + 1` holding the row number
    #[derive(Debug)]
    struct Growing;

    impl fmt::Display for Growing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("g")
        }
    }

    impl ExprNode for Growing {
        fn value_type(&self) -> ValueType {
            ValueType::Double
        }
        fn shape_class(&self) -> ShapeClass {
            ShapeClass::Array
        }
        fn constancy(&self) -> Constancy {
            Constancy::Variable
        }
        fn ndim(&self) -> Option<usize> {
            Some(1)
        }
        fn get_array(&self, row: usize) -> Result<ArrayValue> {
            Ok(ArrayValue::Double(NdArray::from_vec(vec![row as f64; row + 1])))
        }
    }

    /// Scalar that fails for every row
    #[derive(Debug)]
    struct Failing;

    impl fmt::Display for Failing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl ExprNode for Failing {
        fn value_type(&self) -> ValueType {
            ValueType::Bool
        }
        fn shape_class(&self) -> ShapeClass {
            ShapeClass::Scalar
        }
        fn constancy(&self) -> Constancy {
            Constancy::Variable
        }
        fn get_scalar(&self, row: usize) -> Result<Scalar> {
            Err(Error::UndefinedArray {
                column: "boom".to_string(),
                row,
            })
        }
    }

    fn double(v: f64) -> NodeRef {
        ConstantNode::node(Scalar::double(v))
    }

    fn doubles(v: Vec<f64>) -> NodeRef {
        ConstantNode::node(ArrayValue::Double(NdArray::from_vec(v)))
    }

    #[test]
    fn test_constant_operands_fold() {
        let node = BinaryNode::build(BinaryOp::Mul, double(3.0), double(4.0)).unwrap();
        assert!(node.is_constant());
        assert_eq!(node.to_string(), "12");

        let node = BinaryNode::build(BinaryOp::In, double(2.0), doubles(vec![1.0, 2.0])).unwrap();
        assert_eq!(node.get_scalar(0).unwrap(), Scalar::Bool(true));
    }

    #[test]
    fn test_incompatible_types_fail_at_construction() {
        let err = BinaryNode::build(
            BinaryOp::Add,
            double(1.0),
            ConstantNode::node(Scalar::string("x")),
        )
        .unwrap_err();
        assert!(err.is_construction_error());
        assert!(BinaryNode::build(BinaryOp::In, double(1.0), double(1.0)).is_err());
    }

    #[test]
    fn test_scalar_broadcasts_over_array() {
        let node = BinaryNode::build(BinaryOp::Add, Arc::new(Growing), double(0.5)).unwrap();
        assert_eq!(node.shape_class(), ShapeClass::Array);
        assert_eq!(node.ndim(), Some(1));
        let value = node.get_array(1).unwrap();
        assert_eq!(value.shape(), &[2]);
        assert_eq!(value.get(0), Some(Scalar::double(1.5)));

        let node = BinaryNode::build(BinaryOp::Gt, double(1.0), Arc::new(Growing)).unwrap();
        assert_eq!(node.value_type(), ValueType::Bool);
        assert_eq!(node.get_array(2).unwrap().get(2), Some(Scalar::Bool(false)));
    }

    #[test]
    fn test_static_shape_mismatch() {
        let err = BinaryNode::build(BinaryOp::Add, doubles(vec![1.0]), doubles(vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, Error::ShapeConformance { .. }));
    }

    #[test]
    fn test_row_shape_mismatch_is_row_error() {
        let node = BinaryNode::build(BinaryOp::Add, Arc::new(Growing), doubles(vec![1.0, 2.0]))
            .unwrap();
        assert!(node.get_array(1).is_ok());
        let err = node.get_array(3).unwrap_err();
        assert_eq!(err.row(), Some(3));
        assert!(matches!(err.root(), Error::ArrayShapeMismatch { .. }));
        assert!(err
            .to_string()
            .starts_with("row 3: array shapes [4] and [2] do not conform (in expression (g + "));
    }

    #[test]
    fn test_logical_short_circuit() {
        let f = ConstantNode::node(Scalar::Bool(false));
        let t = ConstantNode::node(Scalar::Bool(true));
        let and = BinaryNode::build(BinaryOp::And, f, Arc::new(Failing)).unwrap();
        assert_eq!(and.get_scalar(4).unwrap(), Scalar::Bool(false));
        let or = BinaryNode::build(BinaryOp::Or, t.clone(), Arc::new(Failing)).unwrap();
        assert_eq!(or.get_scalar(4).unwrap(), Scalar::Bool(true));

        let and = BinaryNode::build(BinaryOp::And, t, Arc::new(Failing)).unwrap();
        let err = and.get_scalar(4).unwrap_err();
        assert_eq!(err.row(), Some(4));
        assert!(err.to_string().ends_with("(in expression (T && boom))"));
    }

    #[test]
    fn test_in_with_array_left() {
        let node = BinaryNode::build(BinaryOp::In, Arc::new(Growing), doubles(vec![2.0, 5.0]))
            .unwrap();
        assert_eq!(node.shape_class(), ShapeClass::Array);
        let value = node.get_array(2).unwrap();
        assert_eq!(value.value_type(), ValueType::Bool);
        assert!(value.scalars().all(|v| v == Scalar::Bool(true)));
        assert!(node.get_array(1).unwrap().scalars().all(|v| v == Scalar::Bool(false)));
    }
}
