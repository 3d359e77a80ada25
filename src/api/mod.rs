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

//! Table-level API
//!
//! [`Table`] is the handle applications work with: it opens a store under
//! the lock protocol of its directory and builds expressions, selections
//! and grouped iterations over it.
//!
//! # Quick Start
//!
//! ```ignore
//! use tablexpr::{SortAlgorithm, SortOrder, Table};
//!
//! let table = Table::open("/data/obs", store)?;
//!
//! // Row-wise expression over columns
//! let late = table.col("TIME")?.greater(&1.42e9.into())?;
//! let flags = late.evaluate_column()?;
//!
//! // Groups of rows with equal keys
//! for group in table.iterate(&["ANTENNA"], SortOrder::Ascending, SortAlgorithm::HeapSort)? {
//!     let group = group?;
//!     println!("{:?}: {} rows", group.keys(), group.len());
//! }
//! ```

pub mod table;

pub use table::Table;
