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

//! Lock descriptors
//!
//! A [`TableLock`] tells how a table handle coordinates with other processes.
//! The no-read-locking variants of automatic and user locking are not separate
//! options: they are stored as the base option with `read_locking == false`,
//! which leaves exactly four effective states besides the interval settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::core::{Error, Result};

/// Default interval between lock polls and inspections
pub const DEFAULT_LOCK_INTERVAL: Duration = Duration::from_secs(5);

/// Locking option, ordered from weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LockOption {
    /// No coordination; only safe for a single writer or readers only
    NoLocking = 0,
    /// The caller acquires and releases locks explicitly
    UserLocking = 1,
    /// Locks are acquired around every access and released afterwards
    #[default]
    AutoLocking = 2,
}

impl LockOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockOption::NoLocking => "nolock",
            LockOption::UserLocking => "user",
            LockOption::AutoLocking => "auto",
        }
    }
}

impl fmt::Display for LockOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock descriptor of a table handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableLock {
    option: LockOption,
    read_locking: bool,
    /// Zero waits indefinitely
    max_wait: Duration,
    interval: Duration,
    is_default_interval: bool,
}

impl Default for TableLock {
    fn default() -> Self {
        Self::new(LockOption::AutoLocking)
    }
}

impl TableLock {
    /// Descriptor with read locking, no wait limit and the default interval
    pub fn new(option: LockOption) -> Self {
        Self {
            option,
            read_locking: true,
            max_wait: Duration::ZERO,
            interval: DEFAULT_LOCK_INTERVAL,
            is_default_interval: true,
        }
    }

    /// Descriptor with an explicit interval and maximum wait
    pub fn with_timing(option: LockOption, interval: Duration, max_wait: Duration) -> Self {
        Self {
            option,
            read_locking: true,
            max_wait,
            interval,
            is_default_interval: false,
        }
    }

    pub fn auto() -> Self {
        Self::new(LockOption::AutoLocking)
    }

    /// Automatic locking without locks for reading
    pub fn auto_no_read() -> Self {
        Self::new(LockOption::AutoLocking).with_read_locking(false)
    }

    pub fn user() -> Self {
        Self::new(LockOption::UserLocking)
    }

    /// User locking without locks for reading
    pub fn user_no_read() -> Self {
        Self::new(LockOption::UserLocking).with_read_locking(false)
    }

    pub fn no_locking() -> Self {
        Self::new(LockOption::NoLocking)
    }

    /// Builder method to set read locking
    pub fn with_read_locking(mut self, read_locking: bool) -> Self {
        self.read_locking = read_locking;
        self
    }

    /// Builder method to set the maximum wait
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Builder method to set a non-default interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self.is_default_interval = false;
        self
    }

    pub fn option(&self) -> LockOption {
        self.option
    }

    pub fn read_locking(&self) -> bool {
        self.read_locking
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_default_interval(&self) -> bool {
        self.is_default_interval
    }

    /// Whether reads need a lock under this descriptor
    pub fn locks_reads(&self) -> bool {
        self.option != LockOption::NoLocking && self.read_locking
    }

    /// Combine with the descriptor of another table taking part in the same
    /// operation.
    ///
    /// The stronger option wins and brings its maximum wait along (on a tie
    /// the left side keeps its own). Read locking is required if either side
    /// requires it. The smaller of the non-default intervals is used.
    pub fn merge(&mut self, other: &TableLock) {
        if other.option > self.option {
            self.option = other.option;
            self.max_wait = other.max_wait;
        }
        if other.read_locking {
            self.read_locking = true;
        }
        if !other.is_default_interval
            && (self.is_default_interval || self.interval > other.interval)
        {
            self.interval = other.interval;
            self.is_default_interval = false;
        }
    }

    /// Merged copy of two descriptors
    pub fn merged(mut self, other: &TableLock) -> TableLock {
        self.merge(other);
        self
    }
}

/// Fold [`TableLock::merge`] over several descriptors
///
/// Returns the default descriptor for an empty input.
pub fn merge_locks<'a>(locks: impl IntoIterator<Item = &'a TableLock>) -> TableLock {
    let mut iter = locks.into_iter();
    match iter.next() {
        Some(first) => iter.fold(*first, |acc, lock| acc.merged(lock)),
        None => TableLock::default(),
    }
}

impl fmt::Display for TableLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.option)?;
        if self.option != LockOption::NoLocking && !self.read_locking {
            write!(f, "noread")?;
        }
        write!(
            f,
            " (interval {} ms, max wait {} ms)",
            self.interval.as_millis(),
            self.max_wait.as_millis()
        )
    }
}

impl FromStr for TableLock {
    type Err = Error;

    /// Parse the short option names, case insensitive
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "autolocking" => Ok(TableLock::auto()),
            "autonoread" | "autonoreadlocking" => Ok(TableLock::auto_no_read()),
            "user" | "userlocking" => Ok(TableLock::user()),
            "usernoread" | "usernoreadlocking" => Ok(TableLock::user_no_read()),
            "nolock" | "nolocking" | "none" => Ok(TableLock::no_locking()),
            other => Err(Error::parse(format!("unknown lock option '{}'", other))),
        }
    }
}
