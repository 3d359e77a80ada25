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

//! Core type definitions for tablexpr
//!
//! This module defines the evaluator's value types ([`ValueType`]), the
//! per-row shape class ([`ShapeClass`]), row constancy ([`Constancy`]) and
//! the physical column types of the storage layer ([`DataType`]).

use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// Value types the evaluator works with
///
/// All integer and single precision storage types are promoted to
/// `Double` (or `Complex`) when read, so they do not appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// Boolean true/false
    Bool = 0,

    /// 64-bit floating point number
    Double = 1,

    /// Double precision complex number
    Complex = 2,

    /// UTF-8 text string
    String = 3,

    /// Date/time (UTC)
    Date = 4,
}

impl ValueType {
    /// Returns true if this type is numeric (Double or Complex)
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Double | ValueType::Complex)
    }

    /// Returns true if values of this type have a total order
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            ValueType::Double | ValueType::String | ValueType::Date
        )
    }

    /// Lowest common numeric type of two types (Double -> Complex).
    ///
    /// Returns `None` if either type is not numeric.
    pub fn common_numeric(self, other: ValueType) -> Option<ValueType> {
        match (self, other) {
            (ValueType::Double, ValueType::Double) => Some(ValueType::Double),
            (ValueType::Double, ValueType::Complex)
            | (ValueType::Complex, ValueType::Double)
            | (ValueType::Complex, ValueType::Complex) => Some(ValueType::Complex),
            _ => None,
        }
    }

    /// Type both operands are converted to before comparing them.
    ///
    /// Numeric types use the lowest common numeric type; strings, dates and
    /// booleans only compare with themselves, without promotion.
    pub fn comparison_type(self, other: ValueType) -> Option<ValueType> {
        if let Some(t) = self.common_numeric(other) {
            return Some(t);
        }
        if self == other {
            Some(self)
        } else {
            None
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "Bool"),
            ValueType::Double => write!(f, "Double"),
            ValueType::Complex => write!(f, "Complex"),
            ValueType::String => write!(f, "String"),
            ValueType::Date => write!(f, "Date"),
        }
    }
}

/// Whether a node yields a scalar or an array per row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeClass {
    Scalar,
    Array,
}

impl ShapeClass {
    pub fn is_array(&self) -> bool {
        matches!(self, ShapeClass::Array)
    }
}

impl fmt::Display for ShapeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeClass::Scalar => write!(f, "scalar"),
            ShapeClass::Array => write!(f, "array"),
        }
    }
}

/// Whether a node's value is the same for every row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Constancy {
    Constant,
    #[default]
    Variable,
}

impl Constancy {
    pub fn is_constant(&self) -> bool {
        matches!(self, Constancy::Constant)
    }

    /// Constant only if both sides are constant
    pub fn and(self, other: Constancy) -> Constancy {
        if self.is_constant() && other.is_constant() {
            Constancy::Constant
        } else {
            Constancy::Variable
        }
    }

    /// Conjunction over any number of operands (constant when empty)
    pub fn all(items: impl IntoIterator<Item = Constancy>) -> Constancy {
        items.into_iter().fold(Constancy::Constant, Constancy::and)
    }
}

/// Physical column data types of the storage layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    Bool = 0,
    UInt8 = 1,
    Int16 = 2,
    UInt16 = 3,
    Int32 = 4,
    UInt32 = 5,
    Float32 = 6,
    Float64 = 7,
    Complex32 = 8,
    Complex64 = 9,
    String = 10,
    Date = 11,
}

impl DataType {
    /// The evaluator type values of this storage type are read as
    pub fn value_type(&self) -> ValueType {
        match self {
            DataType::Bool => ValueType::Bool,
            DataType::UInt8
            | DataType::Int16
            | DataType::UInt16
            | DataType::Int32
            | DataType::UInt32
            | DataType::Float32
            | DataType::Float64 => ValueType::Double,
            DataType::Complex32 | DataType::Complex64 => ValueType::Complex,
            DataType::String => ValueType::String,
            DataType::Date => ValueType::Date,
        }
    }

    /// Returns true for the integer storage types
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::UInt8
                | DataType::Int16
                | DataType::UInt16
                | DataType::Int32
                | DataType::UInt32
        )
    }

    /// Returns the type ID as u8 for serialization
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Create DataType from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DataType::Bool),
            1 => Some(DataType::UInt8),
            2 => Some(DataType::Int16),
            3 => Some(DataType::UInt16),
            4 => Some(DataType::Int32),
            5 => Some(DataType::UInt32),
            6 => Some(DataType::Float32),
            7 => Some(DataType::Float64),
            8 => Some(DataType::Complex32),
            9 => Some(DataType::Complex64),
            10 => Some(DataType::String),
            11 => Some(DataType::Date),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "BOOL",
            DataType::UInt8 => "UCHAR",
            DataType::Int16 => "SHORT",
            DataType::UInt16 => "USHORT",
            DataType::Int32 => "INT",
            DataType::UInt32 => "UINT",
            DataType::Float32 => "FLOAT",
            DataType::Float64 => "DOUBLE",
            DataType::Complex32 => "COMPLEX",
            DataType::Complex64 => "DCOMPLEX",
            DataType::String => "STRING",
            DataType::Date => "DATE",
        };
        f.write_str(name)
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BOOL" | "BOOLEAN" => Ok(DataType::Bool),
            "UCHAR" | "U8" | "BYTE" => Ok(DataType::UInt8),
            "SHORT" | "I16" => Ok(DataType::Int16),
            "USHORT" | "U16" => Ok(DataType::UInt16),
            "INT" | "I32" | "INTEGER" => Ok(DataType::Int32),
            "UINT" | "U32" => Ok(DataType::UInt32),
            "FLOAT" | "F32" => Ok(DataType::Float32),
            "DOUBLE" | "F64" => Ok(DataType::Float64),
            "COMPLEX" | "C32" => Ok(DataType::Complex32),
            "DCOMPLEX" | "C64" => Ok(DataType::Complex64),
            "STRING" | "TEXT" => Ok(DataType::String),
            "DATE" | "TIME" | "EPOCH" => Ok(DataType::Date),
            _ => Err(Error::parse(format!("unknown data type '{}'", s))),
        }
    }
}
