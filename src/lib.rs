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

//! # tablexpr
//!
//! Row-wise expressions over columnar tables.
//!
//! Expressions are typed trees built from table columns, constants,
//! operators and array index parts. Each node knows its value type and
//! shape class when it is built, so type and dimension errors surface
//! before any row is read. Tables are shared between processes through a
//! file-based reader/writer lock, and grouped iteration walks the rows
//! sorted on one or more key columns.
//!
//! ## Modules
//!
//! - [`core`] - Values, arrays, slicers and errors
//! - [`storage`] - Table stores, column access and locking
//! - [`executor`] - Expression nodes and grouped iteration
//! - [`api`] - The [`Table`] handle

pub mod api;
pub mod core;
pub mod executor;
pub mod storage;

pub use core::{
    ArrayValue, Complex, Constancy, DataType, Error, ErrorCategory, NdArray, Result, Scalar,
    Shape, ShapeClass, SliceEnd, Slicer, Value, ValueType,
};

pub use storage::{
    ColumnAccessor, ColumnDesc, Config, IndexOrigin, LockOption, LockType, MemoryTable, RefTable,
    StoredArray, StoredValue, TableLock, TableLocker, TableStore,
};

pub use executor::{
    BinaryOp, ExprNode, IndexAxis, NodeRef, SortAlgorithm, SortOrder, TableExpr, TableGroup,
    TableIterator, UnaryOp,
};

pub use api::Table;
