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

//! OS-level advisory locks on a table's lock file.
//!
//! Readers take a shared lock, writers an exclusive one. All attempts are
//! non-blocking; waiting is done by the caller's polling loop. It uses:
//! - `flock()` on Unix systems (Linux, macOS)
//! - `LockFileEx()` on Windows
//!
//! The OS drops the lock when the holding process exits, so a crashed holder
//! never blocks other processes past their next poll.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use crate::core::{Error, Result};

/// Name of the lock file inside a table directory
pub const LOCK_FILE_NAME: &str = "table.lock";

/// Kind of lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockType {
    /// Shared lock
    Read,
    /// Exclusive lock
    Write,
}

impl LockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockType::Read => "read",
            LockType::Write => "write",
        }
    }
}

impl std::fmt::Display for LockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open (creating if needed) the lock file of a table directory
pub fn open_lock_file(dir: &Path) -> Result<File> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::lock_io(format!("failed to create table directory: {}", e)))?;
    // Never truncate here: the file may carry the PID of the current writer.
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(dir.join(LOCK_FILE_NAME))
        .map_err(|e| Error::lock_io(format!("failed to open lock file: {}", e)))
}

/// Record the current process as the lock holder
pub fn write_holder(file: &mut File) -> Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", std::process::id())?;
    file.flush()?;
    Ok(())
}

/// Forget the recorded holder
pub fn clear_holder(file: &File) -> Result<()> {
    file.set_len(0)?;
    Ok(())
}

/// PID recorded in the lock file, if any
pub fn read_holder(dir: &Path) -> Option<u32> {
    fs::read_to_string(dir.join(LOCK_FILE_NAME))
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

// ============================================================================
// Unix implementation (Linux, macOS, etc.)
// ============================================================================

/// Try to take the lock without blocking; `Ok(false)` if another process
/// holds a conflicting lock.
#[cfg(unix)]
pub fn try_lock(file: &File, mode: LockType) -> Result<bool> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let op = match mode {
        LockType::Read => libc::LOCK_SH,
        LockType::Write => libc::LOCK_EX,
    };

    let result = unsafe { libc::flock(fd, op | libc::LOCK_NB) };

    if result != 0 {
        let errno = std::io::Error::last_os_error();
        if errno.raw_os_error() == Some(libc::EWOULDBLOCK) {
            return Ok(false);
        }
        return Err(Error::lock_io(format!(
            "failed to acquire {} lock: {}",
            mode, errno
        )));
    }

    Ok(true)
}

/// Release the lock held through this file
#[cfg(unix)]
pub fn unlock(file: &File) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
    if result != 0 {
        return Err(Error::lock_io(format!(
            "failed to release lock: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

// ============================================================================
// Windows implementation
// ============================================================================

#[cfg(windows)]
pub fn try_lock(file: &File, mode: LockType) -> Result<bool> {
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, HANDLE};
    use windows_sys::Win32::Storage::FileSystem::{
        LockFileEx, LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY,
    };
    use windows_sys::Win32::System::IO::OVERLAPPED;

    let handle = file.as_raw_handle() as HANDLE;
    let flags = match mode {
        LockType::Read => LOCKFILE_FAIL_IMMEDIATELY,
        LockType::Write => LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
    };

    let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };

    let result = unsafe {
        LockFileEx(
            handle,
            flags,
            0,
            1, // Lock 1 byte
            0,
            &mut overlapped,
        )
    };

    if result == 0 {
        let error = std::io::Error::last_os_error();
        if error.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) {
            return Ok(false);
        }
        return Err(Error::lock_io(format!(
            "failed to acquire {} lock: {}",
            mode, error
        )));
    }

    Ok(true)
}

#[cfg(windows)]
pub fn unlock(file: &File) -> Result<()> {
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::Foundation::HANDLE;
    use windows_sys::Win32::Storage::FileSystem::UnlockFileEx;
    use windows_sys::Win32::System::IO::OVERLAPPED;

    let handle = file.as_raw_handle() as HANDLE;
    let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };

    let result = unsafe { UnlockFileEx(handle, 0, 1, 0, &mut overlapped) };
    if result == 0 {
        return Err(Error::lock_io(format!(
            "failed to release lock: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

// ============================================================================
// Fallback for other platforms (no-op, just a warning)
// ============================================================================

#[cfg(not(any(unix, windows)))]
pub fn try_lock(_file: &File, _mode: LockType) -> Result<bool> {
    tracing::warn!("file locking not supported on this platform");
    Ok(true)
}

#[cfg(not(any(unix, windows)))]
pub fn unlock(_file: &File) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_shared_locks_coexist() {
        let dir = tempdir().unwrap();
        let a = open_lock_file(dir.path()).unwrap();
        let b = open_lock_file(dir.path()).unwrap();

        assert!(try_lock(&a, LockType::Read).unwrap());
        assert!(try_lock(&b, LockType::Read).unwrap());
        assert!(dir.path().join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn test_exclusive_lock_conflicts() {
        let dir = tempdir().unwrap();
        let mut a = open_lock_file(dir.path()).unwrap();
        let b = open_lock_file(dir.path()).unwrap();

        assert!(try_lock(&a, LockType::Write).unwrap());
        write_holder(&mut a).unwrap();
        assert!(!try_lock(&b, LockType::Read).unwrap());
        assert!(!try_lock(&b, LockType::Write).unwrap());

        // Note: On Windows the locked byte can't be read by other handles
        #[cfg(unix)]
        assert_eq!(read_holder(dir.path()), Some(std::process::id()));

        clear_holder(&a).unwrap();
        unlock(&a).unwrap();
        assert!(try_lock(&b, LockType::Write).unwrap());
        assert_eq!(read_holder(dir.path()), None);
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempdir().unwrap();
        {
            let a = open_lock_file(dir.path()).unwrap();
            assert!(try_lock(&a, LockType::Write).unwrap());
        }
        let b = open_lock_file(dir.path()).unwrap();
        assert!(try_lock(&b, LockType::Write).unwrap());
    }
}
