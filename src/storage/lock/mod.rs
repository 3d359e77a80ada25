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

//! Table lock manager
//!
//! Advisory, cross-process locking of table directories:
//!
//! - [`TableLock`] / [`LockOption`] - Lock descriptors and their merge rule
//! - [`TableLocker`] - Polling acquisition on the table's lock file
//! - [`LockedStore`] - Store wrapper locking around every access
//! - [`LockMetadata`] - Lock defaults persisted in the table directory

pub mod file_lock;
pub mod locked;
pub mod locker;
pub mod metadata;
pub mod options;

pub use file_lock::{LockType, LOCK_FILE_NAME};
pub use locked::LockedStore;
pub use locker::{AutoLockGuard, TableLocker};
pub use metadata::{LockMetadata, LOCK_META_FILE_NAME};
pub use options::{merge_locks, LockOption, TableLock, DEFAULT_LOCK_INTERVAL};
