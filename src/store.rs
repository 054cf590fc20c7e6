// This file is part of the untouch package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore (win) filetimes btime lpcreationtime

//! Filesystem timestamp access.
//!
//! The rest of the program only talks to [`TimestampStore`]; [`FsStore`]
//! is the real filesystem behind it.

use std::io;
use std::path::Path;

use filetime::FileTime;

/// The three timestamp attributes a filesystem keeps for a path.
///
/// Values are pass-through: whatever resolution the host exposes is
/// preserved (seconds plus nanoseconds).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimestampTriple {
    pub created: FileTime,
    pub written: FileTime,
    pub accessed: FileTime,
}

/// Read/write access to a path's timestamp attributes.
pub trait TimestampStore {
    fn exists(&self, path: &Path) -> bool;

    /// Reads all three timestamps of `path`.
    fn get(&self, path: &Path) -> io::Result<TimestampTriple>;

    /// Writes the given timestamps to `path`. A `None` field leaves the
    /// on-disk value unchanged.
    fn set(
        &self,
        path: &Path,
        created: Option<FileTime>,
        written: Option<FileTime>,
        accessed: Option<FileTime>,
    ) -> io::Result<()>;
}

/// The real filesystem.
pub struct FsStore;

impl TimestampStore for FsStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn get(&self, path: &Path) -> io::Result<TimestampTriple> {
        let meta = std::fs::metadata(path)?;
        let written = FileTime::from_last_modification_time(&meta);
        Ok(TimestampTriple {
            // Not every unix filesystem records a birth time.
            created: FileTime::from_creation_time(&meta).unwrap_or(written),
            written,
            accessed: FileTime::from_last_access_time(&meta),
        })
    }

    #[cfg(windows)]
    fn set(
        &self,
        path: &Path,
        created: Option<FileTime>,
        written: Option<FileTime>,
        accessed: Option<FileTime>,
    ) -> io::Result<()> {
        windows::set_file_times(path, created, written, accessed)
    }

    #[cfg(not(windows))]
    fn set(
        &self,
        path: &Path,
        _created: Option<FileTime>,
        written: Option<FileTime>,
        accessed: Option<FileTime>,
    ) -> io::Result<()> {
        // Unix exposes no interface for rewriting the birth time, so a
        // selected creation field is accepted and skipped here.
        match (accessed, written) {
            (Some(atime), Some(mtime)) => filetime::set_file_times(path, atime, mtime),
            (Some(atime), None) => filetime::set_file_atime(path, atime),
            (None, Some(mtime)) => filetime::set_file_mtime(path, mtime),
            (None, None) => Ok(()),
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::io;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use std::ptr;

    use filetime::FileTime;
    use windows_sys::Win32::Foundation::{CloseHandle, FILETIME, INVALID_HANDLE_VALUE};
    use windows_sys::Win32::Storage::FileSystem::{
        CreateFileW, SetFileTime, FILE_FLAG_BACKUP_SEMANTICS, FILE_SHARE_READ, FILE_SHARE_WRITE,
        FILE_WRITE_ATTRIBUTES, OPEN_EXISTING,
    };

    /// Seconds between 1601-01-01 (the FILETIME epoch) and the unix epoch.
    const EPOCH_OFFSET: i64 = 11_644_473_600;

    fn to_windows_filetime(time: FileTime) -> FILETIME {
        // 100-nanosecond intervals since 1601; FILETIME cannot represent
        // anything earlier, so clamp at the epoch.
        let intervals = ((time.unix_seconds() + EPOCH_OFFSET) * 10_000_000
            + i64::from(time.nanoseconds() / 100))
        .max(0);
        FILETIME {
            dwLowDateTime: intervals as u32,
            dwHighDateTime: (intervals >> 32) as u32,
        }
    }

    /// `SetFileTime` with a NULL pointer for every unchanged field.
    pub(super) fn set_file_times(
        path: &Path,
        created: Option<FileTime>,
        written: Option<FileTime>,
        accessed: Option<FileTime>,
    ) -> io::Result<()> {
        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let handle = unsafe {
            CreateFileW(
                wide.as_ptr(),
                FILE_WRITE_ATTRIBUTES,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                ptr::null(),
                OPEN_EXISTING,
                // Required to open directories.
                FILE_FLAG_BACKUP_SEMANTICS,
                ptr::null_mut(),
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(io::Error::last_os_error());
        }

        let created = created.map(to_windows_filetime);
        let written = written.map(to_windows_filetime);
        let accessed = accessed.map(to_windows_filetime);
        let as_ptr =
            |t: &Option<FILETIME>| t.as_ref().map_or(ptr::null(), |t| t as *const FILETIME);

        let ok = unsafe { SetFileTime(handle, as_ptr(&created), as_ptr(&accessed), as_ptr(&written)) };
        let result = if ok == 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        };
        unsafe { CloseHandle(handle) };
        result
    }
}
