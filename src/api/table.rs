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

//! Table handle
//!
//! A [`Table`] binds a [`TableStore`] to the lock protocol of its directory
//! and is the starting point for building expressions, selecting rows and
//! iterating over key groups.
//!
//! # Examples
//!
//! ```ignore
//! use tablexpr::{Table, TableLock, LockType};
//!
//! let table = Table::open_with_lock("/data/obs", store, TableLock::user())?;
//! table.lock(LockType::Read)?;
//! let bright = table.select(&table.col("FLUX")?.greater(&1.5.into())?)?;
//! table.unlock()?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{Error, Result, ShapeClass, Value, ValueType};
use crate::executor::expression::TableExpr;
use crate::executor::iter::{SortAlgorithm, SortOrder, TableIterator};
use crate::storage::{
    merge_locks, AutoLockGuard, Config, IndexOrigin, LockMetadata, LockOption, LockType,
    LockedStore, RefTable, StoredArray, StoredValue, TableLock, TableLocker, TableStore,
};

/// Shared state of a table handle and the views derived from it
#[derive(Debug)]
struct TableInner {
    name: String,
    /// Lock-wrapped store; views wrap the parent's store
    store: Arc<dyn TableStore>,
    /// `None` for temporary tables
    locker: Option<Arc<TableLocker>>,
    dir: Option<PathBuf>,
    origin: IndexOrigin,
}

/// Handle on a table, or on a row subset of one
///
/// Clones share the same lock state.
#[derive(Debug, Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    /// Open a table with an explicit lock descriptor
    ///
    /// A read lock is taken and released to check the table is accessible.
    /// On lock timeout the error is returned and no table is opened.
    pub fn open_with_lock(
        dir: impl AsRef<Path>,
        store: Arc<dyn TableStore>,
        lock: TableLock,
    ) -> Result<Table> {
        Self::open_with_config(dir, store, Config::new().with_lock(lock))
    }

    /// Open with the descriptor recorded in the directory, or the default
    pub fn open(dir: impl AsRef<Path>, store: Arc<dyn TableStore>) -> Result<Table> {
        Self::open_with_config(dir, store, Config::default())
    }

    pub fn open_with_config(
        dir: impl AsRef<Path>,
        store: Arc<dyn TableStore>,
        config: Config,
    ) -> Result<Table> {
        let dir = dir.as_ref();
        let metadata = LockMetadata::new(dir);
        let lock = match config.lock {
            Some(lock) => lock,
            None => metadata.load()?.unwrap_or_default(),
        };

        let name = store.name().to_string();
        let locker = Arc::new(TableLocker::new(name.clone(), dir, lock)?);
        if lock.option() != LockOption::NoLocking {
            locker.lock(LockType::Read)?;
            locker.unlock()?;
        }

        if config.persist_lock_defaults && !metadata.exists() {
            metadata.store(&lock)?;
            tracing::debug!(table = %name, path = %metadata.path().display(), %lock, "recorded lock defaults");
        }
        tracing::debug!(table = %name, dir = %dir.display(), %lock, nrow = store.nrow(), "opened table");

        let store: Arc<dyn TableStore> = Arc::new(LockedStore::new(store, locker.clone()));
        Ok(Table {
            inner: Arc::new(TableInner {
                name,
                store,
                locker: Some(locker),
                dir: Some(dir.to_path_buf()),
                origin: config.index_origin,
            }),
        })
    }

    /// Table without a directory or locking, e.g. an intermediate result
    pub fn temporary(store: Arc<dyn TableStore>) -> Table {
        Table {
            inner: Arc::new(TableInner {
                name: store.name().to_string(),
                store,
                locker: None,
                dir: None,
                origin: IndexOrigin::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn nrow(&self) -> usize {
        self.inner.store.nrow()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.inner.store.column_names()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.inner.dir.as_deref()
    }

    pub fn origin(&self) -> IndexOrigin {
        self.inner.origin
    }

    /// The store reads go through (lock-wrapped unless temporary)
    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.inner.store
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Descriptor in effect; temporary tables do no locking
    pub fn lock_options(&self) -> TableLock {
        match &self.inner.locker {
            Some(locker) => *locker.options(),
            None => TableLock::no_locking(),
        }
    }

    /// Acquire a lock explicitly (user locking)
    pub fn lock(&self, mode: LockType) -> Result<()> {
        match &self.inner.locker {
            Some(locker) => locker.lock(mode),
            None => Ok(()),
        }
    }

    pub fn unlock(&self) -> Result<()> {
        match &self.inner.locker {
            Some(locker) => locker.unlock(),
            None => Ok(()),
        }
    }

    pub fn has_lock(&self, mode: LockType) -> bool {
        match &self.inner.locker {
            Some(locker) => locker.has_lock(mode),
            None => true,
        }
    }

    /// Hold the automatic lock across several accesses
    pub fn access_guard(&self, mode: LockType) -> Result<Option<AutoLockGuard<'_>>> {
        self.inner
            .locker
            .as_ref()
            .map(|locker| locker.auto_lock(mode))
            .transpose()
    }

    /// Merged descriptor for an operation spanning several tables
    pub fn combined_lock(tables: &[&Table]) -> TableLock {
        let locks: Vec<TableLock> = tables.iter().map(|t| t.lock_options()).collect();
        merge_locks(&locks)
    }

    // =========================================================================
    // Expressions and views
    // =========================================================================

    /// Expression referring to a column
    pub fn col(&self, column: &str) -> Result<TableExpr> {
        TableExpr::column(self.inner.store.clone(), column, self.inner.origin)
    }

    /// Rows for which a boolean scalar expression holds
    pub fn select(&self, predicate: &TableExpr) -> Result<Table> {
        if predicate.result_type() != ValueType::Bool
            || predicate.shape_class() != ShapeClass::Scalar
        {
            return Err(Error::invalid_argument(format!(
                "selection predicate {} must be a boolean scalar",
                predicate
            )));
        }
        let nrow = self.nrow();
        let rows = match predicate.nrow() {
            Some(n) if n != nrow => {
                return Err(Error::invalid_argument(format!(
                    "predicate on {} rows applied to table '{}' of {} rows",
                    n,
                    self.name(),
                    nrow
                )))
            }
            Some(_) => {
                let values = {
                    let _guard = self.access_guard(LockType::Read)?;
                    predicate.evaluate_column()?
                };
                values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| matches!(v, Value::Scalar(s) if s.as_bool() == Some(true)))
                    .map(|(row, _)| row)
                    .collect()
            }
            None => {
                let holds = predicate.evaluate_scalar(0)?.as_bool() == Some(true);
                if holds {
                    (0..nrow).collect()
                } else {
                    Vec::new()
                }
            }
        };
        tracing::trace!(table = %self.name(), %predicate, selected = rows.len(), nrow, "selected rows");
        self.subset(rows)
    }

    /// View of some rows, in the given order
    pub fn subset(&self, rows: Vec<usize>) -> Result<Table> {
        let view = RefTable::new(self.inner.store.clone(), rows)?;
        Ok(Table {
            inner: Arc::new(TableInner {
                name: self.inner.name.clone(),
                store: Arc::new(view),
                locker: self.inner.locker.clone(),
                dir: self.inner.dir.clone(),
                origin: self.inner.origin,
            }),
        })
    }

    /// Iterate over groups of rows with equal key values
    pub fn iterate(
        &self,
        keys: &[&str],
        order: SortOrder,
        algorithm: SortAlgorithm,
    ) -> Result<TableIterator> {
        TableIterator::new(self, keys, order, algorithm)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub fn put_scalar(&self, column: &str, row: usize, value: StoredValue) -> Result<()> {
        self.inner.store.put_scalar(column, row, value)
    }

    pub fn put_array(&self, column: &str, row: usize, value: StoredArray) -> Result<()> {
        self.inner.store.put_array(column, row, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Scalar};
    use crate::storage::MemoryTable;
    use std::time::Duration;
    use tempfile::tempdir;

    fn store() -> Arc<dyn TableStore> {
        Arc::new(
            MemoryTable::builder("obs", 4)
                .scalar_column(
                    "X",
                    DataType::Float64,
                    vec![1.0.into(), 5.0.into(), 2.0.into(), 7.0.into()],
                )
                .build()
                .unwrap(),
        )
    }

    fn quick(option: LockOption) -> TableLock {
        TableLock::with_timing(option, Duration::from_millis(5), Duration::from_millis(50))
    }

    #[test]
    fn test_open_records_lock_defaults() {
        let dir = tempdir().unwrap();
        let table = Table::open_with_lock(dir.path(), store(), quick(LockOption::UserLocking))
            .unwrap();
        assert_eq!(table.lock_options().option(), LockOption::UserLocking);
        drop(table);

        let reopened = Table::open(dir.path(), store()).unwrap();
        assert_eq!(reopened.lock_options().option(), LockOption::UserLocking);
        assert_eq!(reopened.lock_options().interval(), Duration::from_millis(5));
    }

    #[test]
    fn test_select_rows() {
        let dir = tempdir().unwrap();
        let table = Table::open(dir.path(), store()).unwrap();
        let predicate = table.col("X").unwrap().greater(&TableExpr::from(1.5)).unwrap();
        let selected = table.select(&predicate).unwrap();
        assert_eq!(selected.nrow(), 3);
        let x = selected.col("X").unwrap();
        assert_eq!(x.evaluate_scalar(1).unwrap(), Scalar::double(2.0));

        assert_eq!(table.select(&TableExpr::from(false)).unwrap().nrow(), 0);
        assert!(table.select(&table.col("X").unwrap()).is_err());
    }

    #[test]
    fn test_user_locking_requires_lock_for_reads() {
        let dir = tempdir().unwrap();
        let table = Table::open_with_lock(dir.path(), store(), quick(LockOption::UserLocking))
            .unwrap();
        let x = table.col("X").unwrap();
        let err = x.evaluate_scalar(0).unwrap_err();
        assert!(matches!(err.root(), Error::TableNotLocked(_)));

        table.lock(LockType::Read).unwrap();
        assert!(table.has_lock(LockType::Read));
        assert_eq!(x.evaluate_scalar(0).unwrap(), Scalar::double(1.0));
        table.unlock().unwrap();
        assert!(!table.has_lock(LockType::Read));
    }

    #[test]
    fn test_writes_take_exclusive_lock() {
        let dir = tempdir().unwrap();
        let table = Table::open_with_lock(dir.path(), store(), quick(LockOption::AutoLocking))
            .unwrap();
        table.put_scalar("X", 0, 3.0.into()).unwrap();
        assert_eq!(
            table.col("X").unwrap().evaluate_scalar(0).unwrap(),
            Scalar::double(3.0)
        );
        assert!(!table.has_lock(LockType::Read));
    }

    #[test]
    fn test_temporary_table() {
        let table = Table::temporary(store());
        assert!(table.dir().is_none());
        assert_eq!(table.lock_options().option(), LockOption::NoLocking);
        assert!(table.has_lock(LockType::Write));
        table.lock(LockType::Write).unwrap();
    }

    #[test]
    fn test_combined_lock() {
        let dir = tempdir().unwrap();
        let a = Table::open_with_lock(
            dir.path().join("a"),
            store(),
            TableLock::user_no_read().with_interval(Duration::from_secs(5)),
        )
        .unwrap();
        let b = Table::open_with_lock(
            dir.path().join("b"),
            store(),
            TableLock::auto().with_interval(Duration::from_secs(2)),
        )
        .unwrap();
        let merged = Table::combined_lock(&[&a, &b]);
        assert_eq!(merged.option(), LockOption::AutoLocking);
        assert!(merged.read_locking());
        assert_eq!(merged.interval(), Duration::from_secs(2));
    }
}
