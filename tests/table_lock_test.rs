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

//! Cross-handle table locking

use std::sync::Arc;
use std::time::Duration;

use tablexpr::{
    DataType, Error, LockOption, LockType, MemoryTable, Scalar, StoredValue, Table, TableLock,
    TableStore,
};

fn store() -> Arc<dyn TableStore> {
    Arc::new(
        MemoryTable::builder("obs", 3)
            .scalar_column(
                "X",
                DataType::Float64,
                vec![1.0.into(), 2.0.into(), 3.0.into()],
            )
            .build()
            .unwrap(),
    )
}

fn quick(option: LockOption) -> TableLock {
    TableLock::with_timing(option, Duration::from_millis(5), Duration::from_millis(50))
}

#[test]
fn test_readers_share_writer_excludes() {
    let dir = tempfile::tempdir().unwrap();
    let a = Table::open_with_lock(dir.path(), store(), quick(LockOption::UserLocking)).unwrap();
    let b = Table::open_with_lock(dir.path(), store(), quick(LockOption::UserLocking)).unwrap();

    a.lock(LockType::Read).unwrap();
    b.lock(LockType::Read).unwrap();
    assert!(a.has_lock(LockType::Read));
    assert!(!a.has_lock(LockType::Write));

    let err = b.lock(LockType::Write).unwrap_err();
    assert!(err.is_lock_timeout());
    assert!(matches!(err, Error::LockTimeout { ref mode, .. } if mode == "write"));

    a.unlock().unwrap();
    b.lock(LockType::Write).unwrap();
    assert!(b.has_lock(LockType::Write));
    assert!(a.lock(LockType::Read).unwrap_err().is_recoverable());
}

#[test]
fn test_open_fails_while_writer_holds_lock() {
    let dir = tempfile::tempdir().unwrap();
    let writer =
        Table::open_with_lock(dir.path(), store(), quick(LockOption::UserLocking)).unwrap();
    writer.lock(LockType::Write).unwrap();

    let err = Table::open_with_lock(dir.path(), store(), quick(LockOption::AutoLocking))
        .unwrap_err();
    assert!(err.is_lock_timeout());

    // no locking skips the access check
    let unlocked =
        Table::open_with_lock(dir.path(), store(), TableLock::no_locking()).unwrap();
    assert!(unlocked.has_lock(LockType::Write));

    drop(writer);
    Table::open_with_lock(dir.path(), store(), quick(LockOption::AutoLocking)).unwrap();
}

#[test]
fn test_auto_locking_reads_wait_for_writer() {
    let dir = tempfile::tempdir().unwrap();
    let reader =
        Table::open_with_lock(dir.path(), store(), quick(LockOption::AutoLocking)).unwrap();
    let writer =
        Table::open_with_lock(dir.path(), store(), quick(LockOption::UserLocking)).unwrap();
    let x = reader.col("X").unwrap();

    assert_eq!(x.evaluate_scalar(1).unwrap(), Scalar::double(2.0));
    assert!(!reader.has_lock(LockType::Read));

    writer.lock(LockType::Write).unwrap();
    let err = x.evaluate_scalar(1).unwrap_err();
    assert!(err.is_lock_timeout());

    writer.unlock().unwrap();
    assert_eq!(x.evaluate_scalar(2).unwrap(), Scalar::double(3.0));
}

#[test]
fn test_no_read_locking_ignores_writer() {
    let dir = tempfile::tempdir().unwrap();
    let reader = Table::open_with_lock(
        dir.path(),
        store(),
        quick(LockOption::AutoLocking).with_read_locking(false),
    )
    .unwrap();
    let writer =
        Table::open_with_lock(dir.path(), store(), quick(LockOption::UserLocking)).unwrap();
    writer.lock(LockType::Write).unwrap();

    let x = reader.col("X").unwrap();
    assert_eq!(x.evaluate_scalar(0).unwrap(), Scalar::double(1.0));
    assert!(reader
        .put_scalar("X", 0, StoredValue::Float64(4.0))
        .unwrap_err()
        .is_lock_timeout());
}

#[test]
fn test_user_locking_write() {
    let dir = tempfile::tempdir().unwrap();
    let table = Table::open_with_lock(dir.path(), store(), quick(LockOption::UserLocking)).unwrap();
    let err = table.put_scalar("X", 0, 9.0.into()).unwrap_err();
    assert!(matches!(err, Error::TableNotLocked(ref name) if name == "obs"));

    table.lock(LockType::Write).unwrap();
    table.put_scalar("X", 0, 9.0.into()).unwrap();
    assert_eq!(
        table.col("X").unwrap().evaluate_scalar(0).unwrap(),
        Scalar::double(9.0)
    );
    table.unlock().unwrap();
}

#[test]
fn test_lock_defaults_persist() {
    let dir = tempfile::tempdir().unwrap();
    let lock = TableLock::user_no_read().with_interval(Duration::from_millis(250));
    Table::open_with_lock(dir.path(), store(), lock).unwrap();

    let reopened = Table::open(dir.path(), store()).unwrap();
    assert_eq!(reopened.lock_options(), lock);

    // an explicit descriptor wins over the recorded one
    let explicit = Table::open_with_lock(dir.path(), store(), TableLock::auto()).unwrap();
    assert_eq!(explicit.lock_options().option(), LockOption::AutoLocking);
}

#[test]
fn test_merged_descriptor_of_two_tables() {
    let dir = tempfile::tempdir().unwrap();
    let user = Table::open_with_lock(
        dir.path().join("user"),
        store(),
        TableLock::user_no_read().with_interval(Duration::from_secs(5)),
    )
    .unwrap();
    let auto = Table::open_with_lock(
        dir.path().join("auto"),
        store(),
        TableLock::auto().with_interval(Duration::from_secs(2)),
    )
    .unwrap();
    let temp = Table::temporary(store());

    let merged = Table::combined_lock(&[&user, &auto, &temp]);
    assert_eq!(merged.option(), LockOption::AutoLocking);
    assert!(merged.read_locking());
    assert_eq!(merged.interval(), Duration::from_secs(2));
    assert!(!merged.is_default_interval());
}
