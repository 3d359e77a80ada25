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

//! Store wrapper that locks around every cell access

use std::sync::Arc;

use crate::core::{Result, Shape, Slicer};
use crate::storage::stored::{StoredArray, StoredValue};
use crate::storage::traits::{ColumnDesc, TableStore};

use super::file_lock::LockType;
use super::locker::TableLocker;

/// A [`TableStore`] whose reads take a shared lock and whose writes take an
/// exclusive lock through a [`TableLocker`]
///
/// Column descriptions are schema and are read without locking.
#[derive(Debug, Clone)]
pub struct LockedStore {
    inner: Arc<dyn TableStore>,
    locker: Arc<TableLocker>,
}

impl LockedStore {
    pub fn new(inner: Arc<dyn TableStore>, locker: Arc<TableLocker>) -> Self {
        Self { inner, locker }
    }

    pub fn inner(&self) -> &Arc<dyn TableStore> {
        &self.inner
    }

    pub fn locker(&self) -> &Arc<TableLocker> {
        &self.locker
    }
}

impl TableStore for LockedStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn nrow(&self) -> usize {
        self.inner.nrow()
    }

    fn column_desc(&self, column: &str) -> Option<ColumnDesc> {
        self.inner.column_desc(column)
    }

    fn column_names(&self) -> Vec<String> {
        self.inner.column_names()
    }

    fn read_scalar(&self, column: &str, row: usize) -> Result<StoredValue> {
        let _guard = self.locker.auto_lock(LockType::Read)?;
        self.inner.read_scalar(column, row)
    }

    fn read_whole_array(&self, column: &str, row: usize) -> Result<StoredArray> {
        let _guard = self.locker.auto_lock(LockType::Read)?;
        self.inner.read_whole_array(column, row)
    }

    fn array_shape(&self, column: &str, row: usize) -> Result<Option<Shape>> {
        let _guard = self.locker.auto_lock(LockType::Read)?;
        self.inner.array_shape(column, row)
    }

    fn is_defined(&self, column: &str, row: usize) -> Result<bool> {
        let _guard = self.locker.auto_lock(LockType::Read)?;
        self.inner.is_defined(column, row)
    }

    fn read_element(&self, column: &str, row: usize, slicer: &Slicer) -> Result<StoredValue> {
        let _guard = self.locker.auto_lock(LockType::Read)?;
        self.inner.read_element(column, row, slicer)
    }

    fn read_slice(&self, column: &str, row: usize, slicer: &Slicer) -> Result<StoredArray> {
        let _guard = self.locker.auto_lock(LockType::Read)?;
        self.inner.read_slice(column, row, slicer)
    }

    fn read_whole_column(&self, column: &str, slicer: &Slicer) -> Result<Vec<StoredArray>> {
        // one lock for the whole bulk read
        let _guard = self.locker.auto_lock(LockType::Read)?;
        self.inner.read_whole_column(column, slicer)
    }

    fn put_scalar(&self, column: &str, row: usize, value: StoredValue) -> Result<()> {
        let _guard = self.locker.auto_lock(LockType::Write)?;
        self.inner.put_scalar(column, row, value)
    }

    fn put_array(&self, column: &str, row: usize, value: StoredArray) -> Result<()> {
        let _guard = self.locker.auto_lock(LockType::Write)?;
        self.inner.put_array(column, row, value)
    }
}
