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

//! Table expression
//!
//! [`TableExpr`] is the handle callers build and evaluate expressions with.
//! It pairs a root node with the row count of the table it reads from, so
//! row numbers can be checked before any node is touched.
//!
//! ```ignore
//! let x = table.col("X")?;
//! let above = x.greater(&TableExpr::from(1.42e9))?;
//! let flags = above.evaluate_column()?;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::core::{ArrayValue, Error, Result, Scalar, Shape, ShapeClass, Value, ValueType};
use crate::storage::{IndexOrigin, TableStore};

use super::array_part::ArrayPartNode;
use super::binary::BinaryNode;
use super::column::ColumnNode;
use super::constant::ConstantNode;
use super::index::{IndexAxis, IndexNode};
use super::ops::{BinaryOp, UnaryOp};
use super::unary::UnaryNode;
use super::{evaluate_node, NodeRef};

#[derive(Debug, Clone)]
pub struct TableExpr {
    node: NodeRef,
    /// Rows of the table the expression reads; `None` for pure constants
    nrow: Option<usize>,
    origin: IndexOrigin,
}

impl TableExpr {
    pub fn new(node: NodeRef, nrow: Option<usize>, origin: IndexOrigin) -> Self {
        Self {
            node,
            nrow,
            origin,
        }
    }

    /// Expression yielding the same value for every row
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::new(ConstantNode::node(value), None, IndexOrigin::default())
    }

    /// Reference to a column of a store
    pub fn column(store: Arc<dyn TableStore>, column: &str, origin: IndexOrigin) -> Result<Self> {
        let nrow = store.nrow();
        Ok(Self::new(ColumnNode::node(store, column)?, Some(nrow), origin))
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn nrow(&self) -> Option<usize> {
        self.nrow
    }

    pub fn origin(&self) -> IndexOrigin {
        self.origin
    }

    pub fn is_constant(&self) -> bool {
        self.node.is_constant()
    }

    pub fn result_type(&self) -> ValueType {
        self.node.value_type()
    }

    pub fn shape_class(&self) -> ShapeClass {
        self.node.shape_class()
    }

    /// Shape of every result if known before evaluation
    pub fn result_shape(&self) -> Option<Shape> {
        self.node.fixed_shape()
    }

    pub fn ndim(&self) -> Option<usize> {
        self.node.ndim()
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    pub fn evaluate_scalar(&self, row: usize) -> Result<Scalar> {
        self.check_row(row)?;
        self.node
            .get_scalar(row)
            .map_err(|e| e.in_expression(&self.node))
    }

    pub fn evaluate_array(&self, row: usize) -> Result<ArrayValue> {
        self.check_row(row)?;
        self.node
            .get_array(row)
            .map_err(|e| e.in_expression(&self.node))
    }

    /// Scalar or array value of a row, whichever the expression yields
    pub fn evaluate(&self, row: usize) -> Result<Value> {
        self.check_row(row)?;
        evaluate_node(&*self.node, row).map_err(|e| e.in_expression(&self.node))
    }

    /// Values of all rows in row order
    pub fn evaluate_column(&self) -> Result<Vec<Value>> {
        let nrow = self.nrow.ok_or_else(|| {
            Error::invalid_argument(format!(
                "expression {} is not bound to a table",
                self.node
            ))
        })?;
        if let Some(values) = self
            .node
            .evaluate_column()
            .map_err(|e| e.in_expression(&self.node))?
        {
            tracing::trace!(expr = %self.node, nrow, "bulk column evaluation");
            return Ok(values);
        }
        (0..nrow)
            .map(|row| evaluate_node(&*self.node, row))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| e.in_expression(&self.node))
    }

    fn check_row(&self, row: usize) -> Result<()> {
        match self.nrow {
            Some(nrow) if row >= nrow => Err(Error::RowOutOfRange { row, nrow }),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Combine with another expression through a binary operator
    pub fn binary(&self, op: BinaryOp, other: &TableExpr) -> Result<TableExpr> {
        let (nrow, origin) = match (self.nrow, other.nrow) {
            (Some(a), Some(b)) if a != b => {
                return Err(Error::invalid_argument(format!(
                    "cannot combine expressions on tables of {} and {} rows",
                    a, b
                )))
            }
            (None, Some(_)) => (other.nrow, other.origin),
            _ => (self.nrow, self.origin),
        };
        let node = BinaryNode::build(op, self.node.clone(), other.node.clone())?;
        Ok(Self::new(node, nrow, origin))
    }

    pub fn unary(&self, op: UnaryOp) -> Result<TableExpr> {
        let node = UnaryNode::build(op, self.node.clone())?;
        Ok(Self::new(node, self.nrow, self.origin))
    }

    /// Element or section selected by one index per axis
    pub fn index(&self, axes: Vec<IndexAxis>) -> Result<TableExpr> {
        let index = IndexNode::new(axes, self.origin)?;
        let node = ArrayPartNode::build(self.node.clone(), index)?;
        Ok(Self::new(node, self.nrow, self.origin))
    }

    pub fn plus(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Add, other)
    }

    pub fn minus(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Sub, other)
    }

    pub fn times(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Mul, other)
    }

    pub fn divide(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Div, other)
    }

    pub fn modulo(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Mod, other)
    }

    pub fn power(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Pow, other)
    }

    pub fn equal(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Eq, other)
    }

    pub fn not_equal(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Ne, other)
    }

    pub fn less(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Lt, other)
    }

    pub fn less_equal(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Le, other)
    }

    pub fn greater(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Gt, other)
    }

    pub fn greater_equal(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Ge, other)
    }

    pub fn and(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::And, other)
    }

    pub fn or(&self, other: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::Or, other)
    }

    /// Membership in an array
    pub fn is_in(&self, set: &TableExpr) -> Result<TableExpr> {
        self.binary(BinaryOp::In, set)
    }

    pub fn negate(&self) -> Result<TableExpr> {
        self.unary(UnaryOp::Negate)
    }

    pub fn not(&self) -> Result<TableExpr> {
        self.unary(UnaryOp::Not)
    }
}

impl fmt::Display for TableExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)
    }
}

impl From<f64> for TableExpr {
    fn from(value: f64) -> Self {
        Self::constant(Scalar::Double(value))
    }
}

impl From<bool> for TableExpr {
    fn from(value: bool) -> Self {
        Self::constant(Scalar::Bool(value))
    }
}

impl From<&str> for TableExpr {
    fn from(value: &str) -> Self {
        Self::constant(Scalar::string(value))
    }
}

impl From<Scalar> for TableExpr {
    fn from(value: Scalar) -> Self {
        Self::constant(value)
    }
}

impl From<ArrayValue> for TableExpr {
    fn from(value: ArrayValue) -> Self {
        Self::constant(value)
    }
}
