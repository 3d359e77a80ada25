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

//! Constant node

use std::fmt;
use std::sync::Arc;

use crate::core::{
    ArrayValue, Constancy, Error, Result, Scalar, Shape, ShapeClass, Value, ValueType,
};

use super::{ExprNode, NodeRef};

/// A fixed value, the same for every row
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantNode {
    value: Value,
}

impl ConstantNode {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Shared node holding `value`
    pub fn node(value: impl Into<Value>) -> NodeRef {
        Arc::new(Self::new(value))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl ExprNode for ConstantNode {
    fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    fn shape_class(&self) -> ShapeClass {
        self.value.shape_class()
    }

    fn constancy(&self) -> Constancy {
        Constancy::Constant
    }

    fn fixed_shape(&self) -> Option<Shape> {
        self.value.as_array().map(|a| Shape::from_slice(a.shape()))
    }

    fn get_scalar(&self, _row: usize) -> Result<Scalar> {
        match &self.value {
            Value::Scalar(s) => Ok(s.clone()),
            Value::Array(_) => Err(Error::shape_contract("get_scalar", self)),
        }
    }

    fn get_array(&self, _row: usize) -> Result<ArrayValue> {
        match &self.value {
            Value::Array(a) => Ok(a.clone()),
            Value::Scalar(_) => Err(Error::shape_contract("get_array", self)),
        }
    }
}

impl fmt::Display for ConstantNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Scalar(Scalar::String(s)) => write!(f, "\"{}\"", s),
            other => write!(f, "{}", other),
        }
    }
}
