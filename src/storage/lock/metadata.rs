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

//! Persisted lock defaults of a table
//!
//! The descriptor chosen when a table directory is first opened is written to
//! `lock.meta` as `key=value` lines, so later opens by cooperating processes
//! use the same option and interval:
//!
//! ```text
//! option=auto
//! read_locking=true
//! interval_ms=5000
//! default_interval=true
//! max_wait_ms=0
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::{Error, Result};

use super::options::{LockOption, TableLock};

/// Name of the metadata file inside a table directory
pub const LOCK_META_FILE_NAME: &str = "lock.meta";

/// Lock metadata file of one table directory
#[derive(Debug, Clone)]
pub struct LockMetadata {
    path: PathBuf,
}

impl LockMetadata {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(LOCK_META_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted descriptor, `None` if nothing was recorded
    pub fn load(&self) -> Result<Option<TableLock>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        parse(&text).map(Some)
    }

    /// Write the descriptor, replacing any previous record
    pub fn store(&self, lock: &TableLock) -> Result<()> {
        // Write to a temp file and rename so readers never see half a record
        let tmp = self.path.with_extension("meta.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(render(lock).as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn render(lock: &TableLock) -> String {
    format!(
        "option={}\nread_locking={}\ninterval_ms={}\ndefault_interval={}\nmax_wait_ms={}\n",
        lock.option(),
        lock.read_locking(),
        lock.interval().as_millis(),
        lock.is_default_interval(),
        lock.max_wait().as_millis()
    )
}

fn parse(text: &str) -> Result<TableLock> {
    let mut option = None;
    let mut read_locking = true;
    let mut interval = None;
    let mut default_interval = true;
    let mut max_wait = Duration::ZERO;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| Error::parse(format!("malformed lock metadata line '{}'", line)))?;
        let value = value.trim();
        match key.trim() {
            "option" => {
                option = Some(match value {
                    "auto" => LockOption::AutoLocking,
                    "user" => LockOption::UserLocking,
                    "nolock" => LockOption::NoLocking,
                    other => {
                        return Err(Error::parse(format!("unknown lock option '{}'", other)))
                    }
                })
            }
            "read_locking" => read_locking = parse_bool(key, value)?,
            "interval_ms" => interval = Some(Duration::from_millis(parse_u64(key, value)?)),
            "default_interval" => default_interval = parse_bool(key, value)?,
            "max_wait_ms" => max_wait = Duration::from_millis(parse_u64(key, value)?),
            // unknown keys are left for newer writers
            _ => {}
        }
    }

    let option = option.ok_or_else(|| Error::parse("lock metadata without option"))?;
    let mut lock = TableLock::new(option)
        .with_read_locking(read_locking)
        .with_max_wait(max_wait);
    if let (Some(interval), false) = (interval, default_interval) {
        lock = lock.with_interval(interval);
    }
    Ok(lock)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .map_err(|_| Error::parse(format!("invalid boolean '{}' for {}", value, key)))
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::parse(format!("invalid number '{}' for {}", value, key)))
}
