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

//! N-dimensional arrays
//!
//! [`NdArray`] keeps its elements in a flat vector with the first axis
//! varying fastest, the layout used by the table column stores.

use smallvec::SmallVec;

use super::error::{Error, Result};
use super::slicer::ResolvedSlice;

/// Array shape (length per axis)
pub type Shape = SmallVec<[usize; 4]>;

/// Number of elements in an array of the given shape
#[inline]
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Render a shape as `[a, b, c]`
pub fn format_shape(shape: &[usize]) -> String {
    let parts: Vec<String> = shape.iter().map(|n| n.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Dense N-dimensional array
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T> NdArray<T> {
    /// Create an array from a shape and its elements (first axis fastest)
    pub fn new(shape: &[usize], data: Vec<T>) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::invalid_argument("array must have at least one axis"));
        }
        let expected = element_count(shape);
        if data.len() != expected {
            return Err(Error::invalid_argument(format!(
                "array of shape {} needs {} elements, got {}",
                format_shape(shape),
                expected,
                data.len()
            )));
        }
        Ok(Self {
            shape: Shape::from_slice(shape),
            data,
        })
    }

    /// Create a one-dimensional array
    pub fn from_vec(data: Vec<T>) -> Self {
        let mut shape = Shape::new();
        shape.push(data.len());
        Self { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Flat offset of a position, `None` if outside the shape
    pub fn offset(&self, pos: &[usize]) -> Option<usize> {
        if pos.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        let mut step = 1;
        for (&p, &n) in pos.iter().zip(self.shape.iter()) {
            if p >= n {
                return None;
            }
            offset += p * step;
            step *= n;
        }
        Some(offset)
    }

    /// Element at a position
    pub fn get(&self, pos: &[usize]) -> Option<&T> {
        self.offset(pos).map(|i| &self.data[i])
    }

    /// Apply a function to every element, keeping the shape
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> NdArray<U> {
        NdArray {
            shape: self.shape.clone(),
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> NdArray<T> {
    /// Array of the given shape with every element set to `value`
    pub fn filled(shape: &[usize], value: T) -> Self {
        Self {
            shape: Shape::from_slice(shape),
            data: vec![value; element_count(shape)],
        }
    }

    /// Copy out the section described by a resolved slice.
    ///
    /// The slice must have been resolved against this array's shape.
    pub fn slice(&self, slice: &ResolvedSlice) -> NdArray<T> {
        let ndim = self.shape.len();
        debug_assert_eq!(slice.ndim(), ndim);
        let out_shape = slice.length.clone();
        let n = element_count(&out_shape);
        let mut data = Vec::with_capacity(n);
        let mut counter: SmallVec<[usize; 4]> = SmallVec::from_elem(0, ndim);
        for _ in 0..n {
            let mut offset = 0;
            let mut step = 1;
            for axis in 0..ndim {
                offset += (slice.start[axis] + counter[axis] * slice.stride[axis]) * step;
                step *= self.shape[axis];
            }
            data.push(self.data[offset].clone());
            for axis in 0..ndim {
                counter[axis] += 1;
                if counter[axis] < out_shape[axis] {
                    break;
                }
                counter[axis] = 0;
            }
        }
        NdArray {
            shape: out_shape,
            data,
        }
    }
}
