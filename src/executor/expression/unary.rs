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

//! Unary operator node

use std::fmt;
use std::sync::Arc;

use crate::core::{ArrayValue, Constancy, Result, Scalar, Shape, ShapeClass, ValueType};

use super::ops::UnaryOp;
use super::{fold, ExprNode, NodeRef};

#[derive(Debug)]
pub struct UnaryNode {
    op: UnaryOp,
    operand: NodeRef,
    value_type: ValueType,
}

impl UnaryNode {
    /// Build `op operand`, folding a constant operand
    pub fn build(op: UnaryOp, operand: NodeRef) -> Result<NodeRef> {
        let value_type = op.result_type(operand.value_type())?;
        fold(Arc::new(Self {
            op,
            operand,
            value_type,
        }))
    }

    pub fn op(&self) -> UnaryOp {
        self.op
    }

    pub fn operand(&self) -> &NodeRef {
        &self.operand
    }
}

impl ExprNode for UnaryNode {
    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn shape_class(&self) -> ShapeClass {
        self.operand.shape_class()
    }

    fn constancy(&self) -> Constancy {
        self.operand.constancy()
    }

    fn ndim(&self) -> Option<usize> {
        self.operand.ndim()
    }

    fn fixed_shape(&self) -> Option<Shape> {
        self.operand.fixed_shape()
    }

    fn get_scalar(&self, row: usize) -> Result<Scalar> {
        self.operand
            .get_scalar(row)
            .and_then(|v| self.op.apply(&v))
            .map_err(|e| e.in_expression(self))
    }

    fn get_array(&self, row: usize) -> Result<ArrayValue> {
        let eval = || {
            let array = self.operand.get_array(row)?;
            let values = array
                .scalars()
                .map(|v| self.op.apply(&v))
                .collect::<Result<Vec<_>>>()?;
            ArrayValue::from_scalars(self.value_type, array.shape(), values)
        };
        eval().map_err(|e| e.in_expression(self))
    }

    fn array_shape(&self, row: usize) -> Result<Shape> {
        self.operand.array_shape(row)
    }

    fn is_defined(&self, row: usize) -> Result<bool> {
        self.operand.is_defined(row)
    }
}

impl fmt::Display for UnaryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.op, self.operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NdArray;
    use crate::executor::expression::ConstantNode;

    #[derive(Debug)]
    struct Rows;

    impl fmt::Display for Rows {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("rows")
        }
    }

    impl ExprNode for Rows {
        fn value_type(&self) -> ValueType {
            ValueType::Double
        }
        fn shape_class(&self) -> ShapeClass {
            ShapeClass::Array
        }
        fn constancy(&self) -> Constancy {
            Constancy::Variable
        }
        fn get_array(&self, row: usize) -> Result<ArrayValue> {
            Ok(ArrayValue::Double(NdArray::from_vec(vec![row as f64; row + 1])))
        }
    }

    #[test]
    fn test_constant_operand_folds() {
        let node = UnaryNode::build(UnaryOp::Not, ConstantNode::node(Scalar::Bool(false))).unwrap();
        assert!(node.is_constant());
        assert_eq!(node.to_string(), "T");
    }

    #[test]
    fn test_negate_array_elementwise() {
        let node = UnaryNode::build(UnaryOp::Negate, Arc::new(Rows)).unwrap();
        assert!(!node.is_constant());
        assert_eq!(node.to_string(), "-(rows)");
        let value = node.get_array(2).unwrap();
        assert_eq!(value.shape(), &[3]);
        assert_eq!(value.get(1), Some(Scalar::double(-2.0)));
    }

    #[test]
    fn test_type_checked_at_construction() {
        let err = UnaryNode::build(UnaryOp::Not, Arc::new(Rows)).unwrap_err();
        assert!(err.is_construction_error());
    }
}
