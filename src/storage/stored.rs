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

//! Values in their physical storage representation

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{Complex, Complex32, DataType, NdArray, ResolvedSlice};

/// A cell of a scalar column as stored
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Bool(bool),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
    Complex32(Complex32),
    Complex64(Complex),
    String(Arc<str>),
    Date(DateTime<Utc>),
}

impl StoredValue {
    pub fn data_type(&self) -> DataType {
        match self {
            StoredValue::Bool(_) => DataType::Bool,
            StoredValue::UInt8(_) => DataType::UInt8,
            StoredValue::Int16(_) => DataType::Int16,
            StoredValue::UInt16(_) => DataType::UInt16,
            StoredValue::Int32(_) => DataType::Int32,
            StoredValue::UInt32(_) => DataType::UInt32,
            StoredValue::Float32(_) => DataType::Float32,
            StoredValue::Float64(_) => DataType::Float64,
            StoredValue::Complex32(_) => DataType::Complex32,
            StoredValue::Complex64(_) => DataType::Complex64,
            StoredValue::String(_) => DataType::String,
            StoredValue::Date(_) => DataType::Date,
        }
    }

    pub fn string(value: impl AsRef<str>) -> Self {
        StoredValue::String(Arc::from(value.as_ref()))
    }
}

macro_rules! stored_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for StoredValue {
                fn from(v: $t) -> Self {
                    StoredValue::$variant(v)
                }
            }
        )*
    };
}

stored_value_from!(
    bool => Bool,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    f32 => Float32,
    f64 => Float64,
    Complex32 => Complex32,
    Complex => Complex64,
    DateTime<Utc> => Date,
);

impl From<&str> for StoredValue {
    fn from(v: &str) -> Self {
        StoredValue::string(v)
    }
}

/// A cell of an array column as stored
#[derive(Debug, Clone, PartialEq)]
pub enum StoredArray {
    Bool(NdArray<bool>),
    UInt8(NdArray<u8>),
    Int16(NdArray<i16>),
    UInt16(NdArray<u16>),
    Int32(NdArray<i32>),
    UInt32(NdArray<u32>),
    Float32(NdArray<f32>),
    Float64(NdArray<f64>),
    Complex32(NdArray<Complex32>),
    Complex64(NdArray<Complex>),
    String(NdArray<Arc<str>>),
    Date(NdArray<DateTime<Utc>>),
}

macro_rules! on_stored {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            StoredArray::Bool($arr) => $body,
            StoredArray::UInt8($arr) => $body,
            StoredArray::Int16($arr) => $body,
            StoredArray::UInt16($arr) => $body,
            StoredArray::Int32($arr) => $body,
            StoredArray::UInt32($arr) => $body,
            StoredArray::Float32($arr) => $body,
            StoredArray::Float64($arr) => $body,
            StoredArray::Complex32($arr) => $body,
            StoredArray::Complex64($arr) => $body,
            StoredArray::String($arr) => $body,
            StoredArray::Date($arr) => $body,
        }
    };
}

macro_rules! map_stored {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            StoredArray::Bool($arr) => StoredArray::Bool($body),
            StoredArray::UInt8($arr) => StoredArray::UInt8($body),
            StoredArray::Int16($arr) => StoredArray::Int16($body),
            StoredArray::UInt16($arr) => StoredArray::UInt16($body),
            StoredArray::Int32($arr) => StoredArray::Int32($body),
            StoredArray::UInt32($arr) => StoredArray::UInt32($body),
            StoredArray::Float32($arr) => StoredArray::Float32($body),
            StoredArray::Float64($arr) => StoredArray::Float64($body),
            StoredArray::Complex32($arr) => StoredArray::Complex32($body),
            StoredArray::Complex64($arr) => StoredArray::Complex64($body),
            StoredArray::String($arr) => StoredArray::String($body),
            StoredArray::Date($arr) => StoredArray::Date($body),
        }
    };
}

impl StoredArray {
    pub fn data_type(&self) -> DataType {
        match self {
            StoredArray::Bool(_) => DataType::Bool,
            StoredArray::UInt8(_) => DataType::UInt8,
            StoredArray::Int16(_) => DataType::Int16,
            StoredArray::UInt16(_) => DataType::UInt16,
            StoredArray::Int32(_) => DataType::Int32,
            StoredArray::UInt32(_) => DataType::UInt32,
            StoredArray::Float32(_) => DataType::Float32,
            StoredArray::Float64(_) => DataType::Float64,
            StoredArray::Complex32(_) => DataType::Complex32,
            StoredArray::Complex64(_) => DataType::Complex64,
            StoredArray::String(_) => DataType::String,
            StoredArray::Date(_) => DataType::Date,
        }
    }

    pub fn shape(&self) -> &[usize] {
        on_stored!(self, a => a.shape())
    }

    pub fn len(&self) -> usize {
        on_stored!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out a resolved section
    pub fn slice(&self, slice: &ResolvedSlice) -> StoredArray {
        map_stored!(self, a => a.slice(slice))
    }

    /// Element at a position
    pub fn element(&self, position: &[usize]) -> Option<StoredValue> {
        Some(match self {
            StoredArray::Bool(a) => StoredValue::Bool(*a.get(position)?),
            StoredArray::UInt8(a) => StoredValue::UInt8(*a.get(position)?),
            StoredArray::Int16(a) => StoredValue::Int16(*a.get(position)?),
            StoredArray::UInt16(a) => StoredValue::UInt16(*a.get(position)?),
            StoredArray::Int32(a) => StoredValue::Int32(*a.get(position)?),
            StoredArray::UInt32(a) => StoredValue::UInt32(*a.get(position)?),
            StoredArray::Float32(a) => StoredValue::Float32(*a.get(position)?),
            StoredArray::Float64(a) => StoredValue::Float64(*a.get(position)?),
            StoredArray::Complex32(a) => StoredValue::Complex32(*a.get(position)?),
            StoredArray::Complex64(a) => StoredValue::Complex64(*a.get(position)?),
            StoredArray::String(a) => StoredValue::String(a.get(position)?.clone()),
            StoredArray::Date(a) => StoredValue::Date(*a.get(position)?),
        })
    }
}

macro_rules! stored_array_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<NdArray<$t>> for StoredArray {
                fn from(v: NdArray<$t>) -> Self {
                    StoredArray::$variant(v)
                }
            }
        )*
    };
}

stored_array_from!(
    bool => Bool,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    f32 => Float32,
    f64 => Float64,
    Complex32 => Complex32,
    Complex => Complex64,
    Arc<str> => String,
    DateTime<Utc> => Date,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Slicer;

    #[test]
    fn test_stored_value_types() {
        assert_eq!(StoredValue::from(3u8).data_type(), DataType::UInt8);
        assert_eq!(StoredValue::from(-3i16).data_type(), DataType::Int16);
        assert_eq!(StoredValue::from(1.5f32).data_type(), DataType::Float32);
        assert_eq!(StoredValue::from("x").data_type(), DataType::String);
    }

    #[test]
    fn test_stored_array_slice_and_element() {
        let arr = StoredArray::from(NdArray::from_vec(vec![10i16, 11, 12, 13, 14]));
        assert_eq!(arr.data_type(), DataType::Int16);
        assert_eq!(arr.element(&[3]), Some(StoredValue::Int16(13)));
        assert_eq!(arr.element(&[5]), None);

        let slicer = Slicer::new(vec![1], vec![crate::core::SliceEnd::At(3)], vec![2]).unwrap();
        let part = arr.slice(&slicer.resolve(arr.shape(), 0).unwrap());
        assert_eq!(part, StoredArray::from(NdArray::from_vec(vec![11i16, 13])));
    }
}
