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

//! Storage module for tablexpr
//!
//! This module contains the storage layer components including:
//! - Storage traits (TableStore, ColumnDesc)
//! - Physical stored values and the column accessor converting them
//! - In-memory tables and row-subset views
//! - Configuration types
//! - Cross-process table locking

pub mod column;
pub mod config;
pub mod lock;
pub mod memory;
pub mod ref_table;
pub mod stored;
pub mod traits;

// Re-export config types
pub use config::{Config, IndexOrigin};

// Re-export trait types
pub use traits::{ColumnDesc, ColumnKind, TableStore};

// Re-export store types
pub use column::{to_array, to_scalar, ColumnAccessor};
pub use memory::{MemoryTable, MemoryTableBuilder};
pub use ref_table::RefTable;
pub use stored::{StoredArray, StoredValue};

// Re-export lock types
pub use lock::{
    merge_locks, AutoLockGuard, LockMetadata, LockOption, LockType, LockedStore, TableLock,
    TableLocker,
};
