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

//! Operators and their scalar kernels
//!
//! Type checking happens once, when a node is built (`BinaryOp::result_type`,
//! `UnaryOp::result_type`). The kernels below assume checked operand types
//! and only fail on values that cannot be represented (date overflow).

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::core::{Complex, Error, Result, Scalar, ValueType};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Floating point remainder
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// Membership of the left value(s) in the right array
    In,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::In => "IN",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Result type for the operand types, or the construction error
    pub fn result_type(&self, left: ValueType, right: ValueType) -> Result<ValueType> {
        use ValueType::*;
        let incompatible = || Error::incompatible(self.as_str(), left, right);
        match self {
            BinaryOp::Add => match (left, right) {
                (String, String) => Ok(String),
                (Date, Double) | (Double, Date) => Ok(Date),
                _ => left.common_numeric(right).ok_or_else(incompatible),
            },
            BinaryOp::Sub => match (left, right) {
                (Date, Double) => Ok(Date),
                (Date, Date) => Ok(Double),
                _ => left.common_numeric(right).ok_or_else(incompatible),
            },
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
                left.common_numeric(right).ok_or_else(incompatible)
            }
            BinaryOp::Mod => match (left, right) {
                (Double, Double) => Ok(Double),
                _ => Err(incompatible()),
            },
            BinaryOp::Eq | BinaryOp::Ne => {
                left.comparison_type(right).ok_or_else(incompatible)?;
                Ok(Bool)
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                match left.comparison_type(right) {
                    Some(t) if t.is_orderable() => Ok(Bool),
                    _ => Err(incompatible()),
                }
            }
            BinaryOp::And | BinaryOp::Or => match (left, right) {
                (Bool, Bool) => Ok(Bool),
                _ => Err(incompatible()),
            },
            BinaryOp::In => {
                left.comparison_type(right).ok_or_else(incompatible)?;
                Ok(Bool)
            }
        }
    }

    /// Apply the operator to two scalars of checked types
    ///
    /// `In` is not a scalar kernel; membership is tested on arrays.
    pub fn apply(&self, left: &Scalar, right: &Scalar) -> Result<Scalar> {
        match self {
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Mod
            | BinaryOp::Pow => self.arithmetic(left, right),
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.compare(left, right).map(Scalar::Bool)
            }
            BinaryOp::And => Ok(Scalar::Bool(as_bool(left)? && as_bool(right)?)),
            BinaryOp::Or => Ok(Scalar::Bool(as_bool(left)? || as_bool(right)?)),
            BinaryOp::In => Err(Error::internal("IN has no scalar kernel")),
        }
    }

    fn arithmetic(&self, left: &Scalar, right: &Scalar) -> Result<Scalar> {
        match (left, right) {
            (Scalar::Double(a), Scalar::Double(b)) => Ok(Scalar::Double(match self {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Mod => a % b,
                _ => a.powf(*b),
            })),
            (Scalar::String(a), Scalar::String(b)) if *self == BinaryOp::Add => {
                Ok(Scalar::string(format!("{}{}", a, b)))
            }
            (Scalar::Date(d), Scalar::Double(days)) => match self {
                BinaryOp::Add => shift_date(*d, *days),
                _ => shift_date(*d, -days),
            },
            (Scalar::Double(days), Scalar::Date(d)) => shift_date(*d, *days),
            (Scalar::Date(a), Scalar::Date(b)) => Ok(Scalar::Double(
                (*a - *b).num_milliseconds() as f64 / MILLIS_PER_DAY,
            )),
            _ => {
                let (Some(a), Some(b)) = (left.as_complex(), right.as_complex()) else {
                    return Err(self.unchecked(left, right));
                };
                Ok(Scalar::Complex(match self {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => complex_pow(a, b),
                    _ => return Err(self.unchecked(left, right)),
                }))
            }
        }
    }

    fn compare(&self, left: &Scalar, right: &Scalar) -> Result<bool> {
        let ordering = match (left, right) {
            (Scalar::Double(a), Scalar::Double(b)) => a.partial_cmp(b),
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            _ => {
                // complex: equality only
                let (Some(a), Some(b)) = (left.as_complex(), right.as_complex()) else {
                    return Err(self.unchecked(left, right));
                };
                return match self {
                    BinaryOp::Eq => Ok(a == b),
                    BinaryOp::Ne => Ok(a != b),
                    _ => Err(self.unchecked(left, right)),
                };
            }
        };
        // NaN compares unequal to everything
        Ok(match ordering {
            None => *self == BinaryOp::Ne,
            Some(o) => match self {
                BinaryOp::Eq => o == Ordering::Equal,
                BinaryOp::Ne => o != Ordering::Equal,
                BinaryOp::Lt => o == Ordering::Less,
                BinaryOp::Le => o != Ordering::Greater,
                BinaryOp::Gt => o == Ordering::Greater,
                _ => o != Ordering::Less,
            },
        })
    }

    fn unchecked(&self, left: &Scalar, right: &Scalar) -> Error {
        Error::incompatible(self.as_str(), left.value_type(), right.value_type())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        }
    }

    pub fn result_type(&self, operand: ValueType) -> Result<ValueType> {
        match (self, operand) {
            (UnaryOp::Negate, ValueType::Double | ValueType::Complex) => Ok(operand),
            (UnaryOp::Not, ValueType::Bool) => Ok(ValueType::Bool),
            _ => Err(Error::incompatible(self.as_str(), operand, "")),
        }
    }

    pub fn apply(&self, operand: &Scalar) -> Result<Scalar> {
        match (self, operand) {
            (UnaryOp::Negate, Scalar::Double(v)) => Ok(Scalar::Double(-v)),
            (UnaryOp::Negate, Scalar::Complex(v)) => Ok(Scalar::Complex(-*v)),
            (UnaryOp::Not, Scalar::Bool(v)) => Ok(Scalar::Bool(!v)),
            _ => Err(Error::incompatible(self.as_str(), operand.value_type(), "")),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn as_bool(value: &Scalar) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        Error::incompatible("logical", value.value_type(), ValueType::Bool)
    })
}

/// Move a date by a (fractional) number of days
fn shift_date(date: DateTime<Utc>, days: f64) -> Result<Scalar> {
    let millis = (days * MILLIS_PER_DAY).round();
    TimeDelta::try_milliseconds(millis as i64)
        .filter(|_| millis.is_finite())
        .and_then(|delta| date.checked_add_signed(delta))
        .map(Scalar::Date)
        .ok_or_else(|| Error::internal(format!("date {} + {} days out of range", date, days)))
}

/// Principal value of `base ^ exp`
fn complex_pow(base: Complex, exp: Complex) -> Complex {
    if base.re == 0.0 && base.im == 0.0 {
        return if exp.re == 0.0 && exp.im == 0.0 {
            Complex::from_real(1.0)
        } else {
            Complex::default()
        };
    }
    // exp(exp * ln(base))
    let ln = Complex::new(base.abs().ln(), base.im.atan2(base.re));
    let w = exp * ln;
    let scale = w.re.exp();
    Complex::new(scale * w.im.cos(), scale * w.im.sin())
}
