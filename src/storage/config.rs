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

//! Table configuration
//!

use crate::core::{Error, Result};
use crate::storage::lock::TableLock;

/// Origin of user-visible index values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrigin {
    /// First element has index 0
    #[default]
    Zero = 0,
    /// First element has index 1
    One = 1,
}

impl IndexOrigin {
    pub fn offset(&self) -> i64 {
        *self as i64
    }
}

impl TryFrom<i64> for IndexOrigin {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(IndexOrigin::Zero),
            1 => Ok(IndexOrigin::One),
            other => Err(Error::invalid_argument(format!(
                "index origin must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

/// Configuration used when opening a table
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin subtracted from every index value
    /// Default: 0
    pub index_origin: IndexOrigin,

    /// Lock descriptor for the table handle
    /// Default: None, meaning the persisted descriptor or else automatic locking
    pub lock: Option<TableLock>,

    /// Record the lock descriptor in the table directory on first open
    /// Default: true
    pub persist_lock_defaults: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_origin: IndexOrigin::Zero,
            lock: None,
            persist_lock_defaults: true,
        }
    }
}

impl Config {
    /// Creates a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the index origin
    pub fn with_index_origin(mut self, origin: IndexOrigin) -> Self {
        self.index_origin = origin;
        self
    }

    /// Builder method to set the lock descriptor
    pub fn with_lock(mut self, lock: TableLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Builder method to enable/disable persisting lock defaults
    pub fn with_persist_lock_defaults(mut self, enabled: bool) -> Self {
        self.persist_lock_defaults = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::lock::LockOption;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.index_origin, IndexOrigin::Zero);
        assert!(config.lock.is_none());
        assert!(config.persist_lock_defaults);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new()
            .with_index_origin(IndexOrigin::One)
            .with_lock(TableLock::user())
            .with_persist_lock_defaults(false);

        assert_eq!(config.index_origin.offset(), 1);
        assert_eq!(config.lock.unwrap().option(), LockOption::UserLocking);
        assert!(!config.persist_lock_defaults);
    }

    #[test]
    fn test_index_origin_from_i64() {
        assert_eq!(IndexOrigin::try_from(0).unwrap(), IndexOrigin::Zero);
        assert_eq!(IndexOrigin::try_from(1).unwrap(), IndexOrigin::One);
        assert!(IndexOrigin::try_from(2).is_err()); // Only 0 and 1 are valid
    }
}
