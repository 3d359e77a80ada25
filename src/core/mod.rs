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

//! Core types and definitions for tablexpr
//!
//! This module contains the fundamental types used throughout the engine:
//!
//! - [`ValueType`], [`ShapeClass`], [`Constancy`] - Typed value model
//! - [`DataType`] - Physical column storage types
//! - [`Value`], [`Scalar`], [`ArrayValue`] - Runtime values
//! - [`NdArray`], [`Shape`] - N-dimensional arrays
//! - [`Slicer`] - Hyper-rectangular array selections
//! - [`Error`] - Error types for all operations

pub mod array;
pub mod error;
pub mod slicer;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use array::{element_count, format_shape, NdArray, Shape};
pub use error::{Error, ErrorCategory, Result};
pub use slicer::{ResolvedSlice, SliceEnd, Slicer};
pub use types::{Constancy, DataType, ShapeClass, ValueType};
pub use value::{ArrayValue, Complex, Complex32, Scalar, Value};
