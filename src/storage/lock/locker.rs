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

//! Cross-process table locker
//!
//! A [`TableLocker`] owns one handle on the table's lock file and applies a
//! [`TableLock`] descriptor to it:
//!
//! - `AutoLocking`: every access goes through [`TableLocker::auto_lock`],
//!   which acquires the needed lock and releases it when the returned guard
//!   drops. Guards nest; an inner guard reuses a lock that is already held.
//! - `UserLocking`: the caller calls [`TableLocker::lock`] and
//!   [`TableLocker::unlock`]; accesses without a held lock are refused.
//! - `NoLocking`: nothing is coordinated.
//!
//! Acquisition polls at the descriptor's interval until the maximum wait is
//! exhausted and then fails with a recoverable `LockTimeout`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::{Error, Result};

use super::file_lock::{self, LockType};
use super::options::{LockOption, TableLock};

/// Longest wait when taking back a lock under a descriptor that waits forever
const RESTORE_MAX_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct LockState {
    file: File,
    held: Option<LockType>,
}

/// Applies a lock descriptor to one table directory
#[derive(Debug)]
pub struct TableLocker {
    table: String,
    dir: PathBuf,
    lock: TableLock,
    state: Mutex<LockState>,
}

impl TableLocker {
    /// Open the lock file of `dir`; no lock is taken yet
    pub fn new(table: impl Into<String>, dir: impl AsRef<Path>, lock: TableLock) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let file = file_lock::open_lock_file(&dir)?;
        Ok(Self {
            table: table.into(),
            dir,
            lock,
            state: Mutex::new(LockState { file, held: None }),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn options(&self) -> &TableLock {
        &self.lock
    }

    /// Lock currently held by this handle
    pub fn held(&self) -> Option<LockType> {
        self.state.lock().held
    }

    /// True if a lock at least as strong as `mode` is held.
    ///
    /// Always true under `NoLocking`.
    pub fn has_lock(&self, mode: LockType) -> bool {
        if self.lock.option() == LockOption::NoLocking {
            return true;
        }
        matches!(self.held(), Some(held) if held >= mode)
    }

    /// Acquire a lock, waiting up to the descriptor's maximum wait.
    ///
    /// Holding a stronger lock already satisfies the request. Changing the
    /// mode releases the current lock first; if the new mode cannot be
    /// acquired the previous one is taken back before the error returns.
    pub fn lock(&self, mode: LockType) -> Result<()> {
        self.lock_with_wait(mode, self.lock.max_wait())
    }

    /// Same as [`lock`](Self::lock) with an explicit maximum wait
    pub fn lock_with_wait(&self, mode: LockType, max_wait: Duration) -> Result<()> {
        if self.lock.option() == LockOption::NoLocking {
            return Ok(());
        }
        let mut state = self.state.lock();
        if matches!(state.held, Some(held) if held >= mode) {
            return Ok(());
        }
        self.change_mode(&mut state, mode, max_wait)
    }

    /// Release the held lock, if any
    pub fn unlock(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.release(&mut state)
    }

    /// Lock for one access under the descriptor's rules.
    ///
    /// The returned guard restores the previous lock state when dropped.
    pub fn auto_lock(&self, mode: LockType) -> Result<AutoLockGuard<'_>> {
        let noop = AutoLockGuard {
            locker: self,
            restore: None,
        };
        if self.lock.option() == LockOption::NoLocking
            || (mode == LockType::Read && !self.lock.read_locking())
        {
            return Ok(noop);
        }

        let mut state = self.state.lock();
        let previous = state.held;
        if matches!(previous, Some(held) if held >= mode) {
            return Ok(noop);
        }

        if self.lock.option() == LockOption::UserLocking {
            return Err(Error::TableNotLocked(self.table.clone()));
        }

        self.change_mode(&mut state, mode, self.lock.max_wait())?;
        Ok(AutoLockGuard {
            locker: self,
            restore: Some(previous),
        })
    }

    /// Move from the held lock (if any) to `mode`.
    ///
    /// On failure the previous lock is re-acquired, so the caller keeps the
    /// state it had.
    fn change_mode(
        &self,
        state: &mut LockState,
        mode: LockType,
        max_wait: Duration,
    ) -> Result<()> {
        let previous = state.held;
        self.release(state)?;
        let err = match self.acquire(state, mode, max_wait) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        if let Some(previous) = previous {
            if let Err(restore) = self.acquire(state, previous, self.restore_wait()) {
                tracing::warn!(
                    table = %self.table,
                    mode = %previous,
                    error = %restore,
                    "failed to take back table lock"
                );
            }
        }
        Err(err)
    }

    /// Wait used when taking back a lock; never unbounded
    fn restore_wait(&self) -> Duration {
        match self.lock.max_wait() {
            wait if wait.is_zero() => RESTORE_MAX_WAIT,
            wait => wait,
        }
    }

    fn acquire(&self, state: &mut LockState, mode: LockType, max_wait: Duration) -> Result<()> {
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if file_lock::try_lock(&state.file, mode)? {
                if mode == LockType::Write {
                    file_lock::write_holder(&mut state.file)?;
                }
                state.held = Some(mode);
                tracing::debug!(
                    table = %self.table,
                    %mode,
                    attempts,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "acquired table lock"
                );
                return Ok(());
            }

            let waited = started.elapsed();
            if !max_wait.is_zero() && waited >= max_wait {
                let holder = file_lock::read_holder(&self.dir);
                tracing::warn!(
                    table = %self.table,
                    %mode,
                    waited_ms = waited.as_millis() as u64,
                    ?holder,
                    "timed out waiting for table lock"
                );
                return Err(Error::LockTimeout {
                    table: self.table.clone(),
                    mode: mode.to_string(),
                    waited_ms: waited.as_millis() as u64,
                    holder,
                });
            }

            if attempts == 1 {
                tracing::debug!(table = %self.table, %mode, "table lock busy, waiting");
            }
            let mut pause = self.lock.interval();
            if !max_wait.is_zero() {
                pause = pause.min(max_wait - waited);
            }
            std::thread::sleep(pause);
        }
    }

    fn release(&self, state: &mut LockState) -> Result<()> {
        let Some(held) = state.held.take() else {
            return Ok(());
        };
        if held == LockType::Write {
            file_lock::clear_holder(&state.file)?;
        }
        file_lock::unlock(&state.file)?;
        tracing::debug!(table = %self.table, mode = %held, "released table lock");
        Ok(())
    }
}

/// Restores the lock state of a [`TableLocker`] on drop
#[must_use = "the lock is released when the guard drops"]
#[derive(Debug)]
pub struct AutoLockGuard<'a> {
    locker: &'a TableLocker,
    /// `None` if the guard took no lock
    restore: Option<Option<LockType>>,
}

impl AutoLockGuard<'_> {
    /// True if this guard acquired a lock
    pub fn acquired(&self) -> bool {
        self.restore.is_some()
    }
}

impl Drop for AutoLockGuard<'_> {
    fn drop(&mut self) {
        let Some(previous) = self.restore.take() else {
            return;
        };
        let locker = self.locker;
        let mut state = locker.state.lock();
        let result = locker.release(&mut state).and_then(|_| match previous {
            Some(mode) => locker.acquire(&mut state, mode, locker.restore_wait()),
            None => Ok(()),
        });
        if let Err(err) = result {
            tracing::warn!(table = %locker.table, error = %err, "failed to restore table lock");
        }
    }
}
