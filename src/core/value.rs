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

//! Runtime values of the expression evaluator
//!
//! A [`Value`] is either a [`Scalar`] or an [`ArrayValue`], each tagged with
//! one of the [`ValueType`]s.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use super::array::{format_shape, NdArray};
use super::error::{Error, Result};
use super::slicer::ResolvedSlice;
use super::types::{ShapeClass, ValueType};

// =============================================================================
// Complex numbers
// =============================================================================

/// Double precision complex number
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub const fn from_real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    /// Squared magnitude
    pub fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    pub fn abs(&self) -> f64 {
        self.re.hypot(self.im)
    }

    pub fn conj(&self) -> Self {
        Self::new(self.re, -self.im)
    }
}

impl Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Div for Complex {
    type Output = Complex;
    fn div(self, rhs: Complex) -> Complex {
        let d = rhs.norm_sqr();
        Complex::new(
            (self.re * rhs.re + self.im * rhs.im) / d,
            (self.im * rhs.re - self.re * rhs.im) / d,
        )
    }
}

impl Neg for Complex {
    type Output = Complex;
    fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.re, self.im)
    }
}

/// Single precision complex number, only used as a storage type
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

impl Complex32 {
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }
}

impl From<Complex32> for Complex {
    fn from(c: Complex32) -> Self {
        Complex::new(f64::from(c.re), f64::from(c.im))
    }
}

// =============================================================================
// Scalars
// =============================================================================

/// A single value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Double(f64),
    Complex(Complex),
    /// Arc for cheap cloning
    String(Arc<str>),
    Date(DateTime<Utc>),
}

impl Scalar {
    pub fn bool(value: bool) -> Self {
        Scalar::Bool(value)
    }

    pub fn double(value: f64) -> Self {
        Scalar::Double(value)
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Scalar::Complex(Complex::new(re, im))
    }

    pub fn string(value: impl AsRef<str>) -> Self {
        Scalar::String(Arc::from(value.as_ref()))
    }

    pub fn date(value: DateTime<Utc>) -> Self {
        Scalar::Date(value)
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Scalar::Bool(_) => ValueType::Bool,
            Scalar::Double(_) => ValueType::Double,
            Scalar::Complex(_) => ValueType::Complex,
            Scalar::String(_) => ValueType::String,
            Scalar::Date(_) => ValueType::Date,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Scalar::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Complex value, promoting a double
    pub fn as_complex(&self) -> Option<Complex> {
        match self {
            Scalar::Double(d) => Some(Complex::from_real(*d)),
            Scalar::Complex(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Scalar::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Convert to a wider type (Double -> Complex); identity for same type
    pub fn promote(self, target: ValueType) -> Option<Scalar> {
        if self.value_type() == target {
            return Some(self);
        }
        match (self, target) {
            (Scalar::Double(d), ValueType::Complex) => Some(Scalar::Complex(Complex::from_real(d))),
            _ => None,
        }
    }

    /// Total order used for sorting keys.
    ///
    /// Doubles use IEEE total ordering, complex numbers compare real then
    /// imaginary part. Values of different types order by type.
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Double(a), Scalar::Double(b)) => a.total_cmp(b),
            (Scalar::Complex(a), Scalar::Complex(b)) => {
                a.re.total_cmp(&b.re).then_with(|| a.im.total_cmp(&b.im))
            }
            (Scalar::String(a), Scalar::String(b)) => a.cmp(b),
            (Scalar::Date(a), Scalar::Date(b)) => a.cmp(b),
            _ => (self.value_type() as u8).cmp(&(other.value_type() as u8)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            Scalar::Double(d) => write!(f, "{}", d),
            Scalar::Complex(c) => write!(f, "{}", c),
            Scalar::String(s) => write!(f, "'{}'", s),
            Scalar::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<f64> for Scalar {
    fn from(d: f64) -> Self {
        Scalar::Double(d)
    }
}

impl From<Complex> for Scalar {
    fn from(c: Complex) -> Self {
        Scalar::Complex(c)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::string(s)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(d: DateTime<Utc>) -> Self {
        Scalar::Date(d)
    }
}

// =============================================================================
// Arrays
// =============================================================================

/// An N-dimensional array of one value type
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Bool(NdArray<bool>),
    Double(NdArray<f64>),
    Complex(NdArray<Complex>),
    String(NdArray<Arc<str>>),
    Date(NdArray<DateTime<Utc>>),
}

/// Run an expression on the `NdArray` inside any `ArrayValue` variant
macro_rules! on_array {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            ArrayValue::Bool($arr) => $body,
            ArrayValue::Double($arr) => $body,
            ArrayValue::Complex($arr) => $body,
            ArrayValue::String($arr) => $body,
            ArrayValue::Date($arr) => $body,
        }
    };
}

/// Same as `on_array!` but rewraps the result in the same variant
macro_rules! map_array {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            ArrayValue::Bool($arr) => ArrayValue::Bool($body),
            ArrayValue::Double($arr) => ArrayValue::Double($body),
            ArrayValue::Complex($arr) => ArrayValue::Complex($body),
            ArrayValue::String($arr) => ArrayValue::String($body),
            ArrayValue::Date($arr) => ArrayValue::Date($body),
        }
    };
}

impl ArrayValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            ArrayValue::Bool(_) => ValueType::Bool,
            ArrayValue::Double(_) => ValueType::Double,
            ArrayValue::Complex(_) => ValueType::Complex,
            ArrayValue::String(_) => ValueType::String,
            ArrayValue::Date(_) => ValueType::Date,
        }
    }

    pub fn shape(&self) -> &[usize] {
        on_array!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        on_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at a flat offset
    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            ArrayValue::Bool(a) => a.data().get(index).map(|v| Scalar::Bool(*v)),
            ArrayValue::Double(a) => a.data().get(index).map(|v| Scalar::Double(*v)),
            ArrayValue::Complex(a) => a.data().get(index).map(|v| Scalar::Complex(*v)),
            ArrayValue::String(a) => a.data().get(index).map(|v| Scalar::String(v.clone())),
            ArrayValue::Date(a) => a.data().get(index).map(|v| Scalar::Date(*v)),
        }
    }

    /// Element at a position
    pub fn element(&self, position: &[usize]) -> Option<Scalar> {
        let offset = on_array!(self, a => a.offset(position))?;
        self.get(offset)
    }

    /// Elements as scalars, first axis fastest
    pub fn scalars(&self) -> impl Iterator<Item = Scalar> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Copy out a resolved section
    pub fn slice(&self, slice: &ResolvedSlice) -> ArrayValue {
        map_array!(self, a => a.slice(slice))
    }

    /// Array with every element set to `value`
    pub fn filled(shape: &[usize], value: &Scalar) -> ArrayValue {
        match value {
            Scalar::Bool(v) => ArrayValue::Bool(NdArray::filled(shape, *v)),
            Scalar::Double(v) => ArrayValue::Double(NdArray::filled(shape, *v)),
            Scalar::Complex(v) => ArrayValue::Complex(NdArray::filled(shape, *v)),
            Scalar::String(v) => ArrayValue::String(NdArray::filled(shape, v.clone())),
            Scalar::Date(v) => ArrayValue::Date(NdArray::filled(shape, *v)),
        }
    }

    /// Build an array of `value_type` from scalars of that type
    pub fn from_scalars(
        value_type: ValueType,
        shape: &[usize],
        values: Vec<Scalar>,
    ) -> Result<ArrayValue> {
        fn collect<T>(
            values: Vec<Scalar>,
            value_type: ValueType,
            f: impl Fn(Scalar) -> Option<T>,
        ) -> Result<Vec<T>> {
            values
                .into_iter()
                .map(|s| {
                    let found = s.value_type();
                    f(s).ok_or_else(|| {
                        Error::internal(format!(
                            "cannot store {} element in {} array",
                            found, value_type
                        ))
                    })
                })
                .collect()
        }
        Ok(match value_type {
            ValueType::Bool => {
                ArrayValue::Bool(NdArray::new(shape, collect(values, value_type, |s| s.as_bool())?)?)
            }
            ValueType::Double => ArrayValue::Double(NdArray::new(
                shape,
                collect(values, value_type, |s| s.as_double())?,
            )?),
            ValueType::Complex => ArrayValue::Complex(NdArray::new(
                shape,
                collect(values, value_type, |s| s.as_complex())?,
            )?),
            ValueType::String => ArrayValue::String(NdArray::new(
                shape,
                collect(values, value_type, |s| match s {
                    Scalar::String(v) => Some(v),
                    _ => None,
                })?,
            )?),
            ValueType::Date => {
                ArrayValue::Date(NdArray::new(shape, collect(values, value_type, |s| s.as_date())?)?)
            }
        })
    }

    /// Convert to a wider type (Double -> Complex); identity for same type
    pub fn promote(self, target: ValueType) -> Option<ArrayValue> {
        if self.value_type() == target {
            return Some(self);
        }
        match (self, target) {
            (ArrayValue::Double(a), ValueType::Complex) => {
                Some(ArrayValue::Complex(a.map(|d| Complex::from_real(*d))))
            }
            _ => None,
        }
    }

    /// True if any element equals `value` (after numeric promotion)
    pub fn contains(&self, value: &Scalar) -> bool {
        match (self, value) {
            (ArrayValue::Bool(a), Scalar::Bool(v)) => a.iter().any(|x| x == v),
            (ArrayValue::Double(a), Scalar::Double(v)) => a.iter().any(|x| x == v),
            (ArrayValue::Double(a), Scalar::Complex(v)) => {
                a.iter().any(|x| Complex::from_real(*x) == *v)
            }
            (ArrayValue::Complex(a), _) => match value.as_complex() {
                Some(v) => a.iter().any(|x| *x == v),
                None => false,
            },
            (ArrayValue::String(a), Scalar::String(v)) => a.iter().any(|x| x == v),
            (ArrayValue::Date(a), Scalar::Date(v)) => a.iter().any(|x| x == v),
            _ => false,
        }
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} array {} [", self.value_type(), format_shape(self.shape()))?;
        for (i, v) in self.scalars().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

// =============================================================================
// Values
// =============================================================================

/// Result of evaluating an expression for one row
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Array(ArrayValue),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Scalar(s) => s.value_type(),
            Value::Array(a) => a.value_type(),
        }
    }

    pub fn shape_class(&self) -> ShapeClass {
        match self {
            Value::Scalar(_) => ShapeClass::Scalar,
            Value::Array(_) => ShapeClass::Array,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            Value::Scalar(_) => None,
        }
    }

    pub fn into_scalar(self) -> Option<Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Array(_) => None,
        }
    }

    pub fn into_array(self) -> Option<ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            Value::Scalar(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Array(a) => write!(f, "{}", a),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Value::Array(a)
    }
}
