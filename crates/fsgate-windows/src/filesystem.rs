use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use fsgate_platform::filesystem::{unix_seconds, EntryStat, FileSystem};
use tracing::warn;

pub struct WindowsFileSystem;

impl WindowsFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for WindowsFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn stat(&self, path: &Path) -> io::Result<Option<EntryStat>> {
        let meta = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let is_symlink = fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        Ok(Some(EntryStat {
            size: meta.len(),
            modified: meta.modified().map(unix_seconds).unwrap_or(0.0),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            is_symlink,
        }))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(path)? {
            match entry {
                Ok(e) => result.push(e.path()),
                Err(e) => warn!("skipping dir entry in {}: {}", path.display(), e),
            }
        }
        Ok(result)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        fs::write(path, data)
    }

    fn create_dir(&self, path: &Path, parents: bool) -> io::Result<()> {
        if parents {
            return fs::create_dir_all(path);
        }
        match fs::create_dir(path) {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
            other => other,
        }
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        // fs::copy carries the read-only attribute, which may leave `to` unwritable,
        // so the timestamps are set by path rather than through a write handle
        let copied = fs::copy(from, to)?;
        let meta = fs::metadata(from)?;
        filetime::set_file_times(
            to,
            FileTime::from_last_access_time(&meta),
            FileTime::from_last_modification_time(&meta),
        )?;
        Ok(copied)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
