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

//! Hyper-rectangular array selections
//!
//! A [`Slicer`] gives per axis a start, an inclusive end and a stride. The end
//! may be [`SliceEnd::MimicSource`], meaning "up to the last element of
//! whatever array the slicer is applied to"; such a slicer only gets concrete
//! lengths once it is [resolved](Slicer::resolve) against a source shape.

use std::fmt;

use smallvec::SmallVec;

use super::array::{format_shape, Shape};
use super::error::{Error, Result};

/// End of a slice on one axis (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceEnd {
    /// Last selected position
    At(usize),
    /// Run to the end of the source axis
    MimicSource,
}

/// Immutable description of a strided hyper-rectangular selection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slicer {
    start: Shape,
    end: SmallVec<[SliceEnd; 4]>,
    stride: Shape,
}

impl Slicer {
    /// Create a slicer; all vectors must have the same length and every
    /// stride must be positive.
    pub fn new(start: Vec<usize>, end: Vec<SliceEnd>, stride: Vec<usize>) -> Result<Self> {
        if start.is_empty() || start.len() != end.len() || start.len() != stride.len() {
            return Err(Error::invalid_argument(format!(
                "slicer needs equal, non-zero axis counts (start {}, end {}, stride {})",
                start.len(),
                end.len(),
                stride.len()
            )));
        }
        if let Some(axis) = stride.iter().position(|&s| s == 0) {
            return Err(Error::invalid_argument(format!(
                "slicer stride on axis {} must be positive",
                axis
            )));
        }
        Ok(Self {
            start: Shape::from_vec(start),
            end: SmallVec::from_vec(end),
            stride: Shape::from_vec(stride),
        })
    }

    /// Identity slicer: whole array, unit stride
    pub fn full(ndim: usize) -> Self {
        Self {
            start: SmallVec::from_elem(0, ndim),
            end: SmallVec::from_elem(SliceEnd::MimicSource, ndim),
            stride: SmallVec::from_elem(1, ndim),
        }
    }

    /// Slicer selecting exactly one element
    pub fn single(position: &[usize]) -> Self {
        Self {
            start: Shape::from_slice(position),
            end: position.iter().map(|&p| SliceEnd::At(p)).collect(),
            stride: SmallVec::from_elem(1, position.len()),
        }
    }

    pub fn ndim(&self) -> usize {
        self.start.len()
    }

    pub fn start(&self) -> &[usize] {
        &self.start
    }

    pub fn end(&self) -> &[SliceEnd] {
        &self.end
    }

    pub fn stride(&self) -> &[usize] {
        &self.stride
    }

    /// True if no axis depends on the source shape
    pub fn is_fixed(&self) -> bool {
        self.end.iter().all(|e| matches!(e, SliceEnd::At(_)))
    }

    /// Result lengths of a fixed slicer.
    ///
    /// `None` if some end mimics the source or lies before its start.
    pub fn length(&self) -> Option<Shape> {
        let mut length = Shape::new();
        for axis in 0..self.ndim() {
            match self.end[axis] {
                SliceEnd::At(end) if end >= self.start[axis] => {
                    length.push((end - self.start[axis]) / self.stride[axis] + 1);
                }
                _ => return None,
            }
        }
        Some(length)
    }

    /// Resolve against the shape of a source array.
    ///
    /// Starts and ends beyond the source shape are errors tagged with `row`;
    /// they are never clamped.
    pub fn resolve(&self, source: &[usize], row: usize) -> Result<ResolvedSlice> {
        if source.len() != self.ndim() {
            return Err(Error::ArrayShapeMismatch {
                row,
                left: format!("{}-dim index", self.ndim()),
                right: format_shape(source),
            });
        }
        let mut resolved = ResolvedSlice {
            start: Shape::new(),
            last: Shape::new(),
            stride: self.stride.clone(),
            length: Shape::new(),
        };
        for (axis, &len) in source.iter().enumerate() {
            let start = self.start[axis];
            if len == 0 && start == 0 && self.end[axis] == SliceEnd::MimicSource {
                // empty axis, empty selection
                resolved.start.push(0);
                resolved.last.push(0);
                resolved.length.push(0);
                continue;
            }
            if start >= len {
                return Err(Error::IndexOutOfBounds {
                    row,
                    axis,
                    value: start as i64,
                    length: len,
                });
            }
            let last = match self.end[axis] {
                SliceEnd::MimicSource => len - 1,
                SliceEnd::At(end) if end >= len => {
                    return Err(Error::IndexOutOfBounds {
                        row,
                        axis,
                        value: end as i64,
                        length: len,
                    })
                }
                SliceEnd::At(end) if end < start => {
                    return Err(Error::EmptySlice {
                        row,
                        axis,
                        start,
                        end,
                    })
                }
                SliceEnd::At(end) => end,
            };
            let stride = self.stride[axis];
            // The last selected element need not coincide with `last`.
            let count = (last - start) / stride + 1;
            resolved.start.push(start);
            resolved.last.push(start + (count - 1) * stride);
            resolved.length.push(count);
        }
        Ok(resolved)
    }

    /// Result shape when applied to a source of the given shape, if valid
    pub fn infer_shape(&self, source: &[usize]) -> Option<Shape> {
        self.resolve(source, 0).ok().map(|r| r.length)
    }
}

impl fmt::Display for Slicer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for axis in 0..self.ndim() {
            if axis > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:", self.start[axis])?;
            match self.end[axis] {
                SliceEnd::At(end) => write!(f, "{}", end)?,
                SliceEnd::MimicSource => {}
            }
            if self.stride[axis] != 1 {
                write!(f, ":{}", self.stride[axis])?;
            }
        }
        write!(f, "]")
    }
}

/// A slicer resolved against a concrete source shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlice {
    pub start: Shape,
    /// Position of the last selected element per axis
    pub last: Shape,
    pub stride: Shape,
    pub length: Shape,
}

impl ResolvedSlice {
    pub fn ndim(&self) -> usize {
        self.start.len()
    }

    /// Position of the first selected element
    pub fn first(&self) -> &[usize] {
        &self.start
    }
}
