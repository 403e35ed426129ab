use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use fsgate_platform::filesystem::{unix_seconds, EntryStat, FileSystem};

pub struct UnixFileSystem;

impl UnixFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnixFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that mean "nothing is there" rather than a real failure.
/// ENOTDIR shows up when a middle component is a regular file.
fn is_absent(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ENOTDIR)
}

impl FileSystem for UnixFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn stat(&self, path: &Path) -> io::Result<Option<EntryStat>> {
        let meta = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if is_absent(&e) => return Ok(None),
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
                Err(e) => tracing::warn!("skipping dir entry in {}: {}", path.display(), e),
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
        // fs::copy carries the permission bits, which may leave `to` read-only,
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_stat_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let fs = UnixFileSystem::new();
        assert!(fs.stat(&dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn test_stat_through_file_component_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        let fs = UnixFileSystem::new();
        assert!(fs.stat(&file.join("child")).unwrap().is_none());
    }

    #[test]
    fn test_stat_follows_symlink_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let stat = UnixFileSystem::new().stat(&link).unwrap().unwrap();
        assert!(stat.is_dir);
        assert!(!stat.is_file);
        assert!(stat.is_symlink);
    }

    #[test]
    fn test_dangling_symlink_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();
        assert!(UnixFileSystem::new().stat(&link).unwrap().is_none());
    }

    #[test]
    fn test_create_dir_without_parents_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("made");
        let fs = UnixFileSystem::new();
        fs.create_dir(&target, false).unwrap();
        fs.create_dir(&target, false).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_create_dir_without_parents_fails_on_missing_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let err = UnixFileSystem::new()
            .create_dir(&dir.path().join("a/b/c"), false)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_copy_preserves_mode_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.sh");
        let dst = dir.path().join("dst.sh");
        fs::write(&src, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o750)).unwrap();
        let old = FileTime::from_unix_time(1_000_000, 0);
        filetime::set_file_times(&src, old, old).unwrap();

        let fs_impl = UnixFileSystem::new();
        assert_eq!(fs_impl.copy_file(&src, &dst).unwrap(), 10);

        let stat = fs_impl.stat(&dst).unwrap().unwrap();
        assert_eq!(fs::metadata(&dst).unwrap().permissions().mode() & 0o7777, 0o750);
        assert_eq!(stat.modified, 1_000_000.0);
    }

    #[test]
    fn test_copy_read_only_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("ro.txt");
        let dst = dir.path().join("out.txt");
        fs::write(&src, b"locked").unwrap();
        let old = FileTime::from_unix_time(2_000_000, 0);
        filetime::set_file_times(&src, old, old).unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o444)).unwrap();

        let fs_impl = UnixFileSystem::new();
        assert_eq!(fs_impl.copy_file(&src, &dst).unwrap(), 6);

        assert_eq!(fs::read(&dst).unwrap(), b"locked");
        assert_eq!(fs::metadata(&dst).unwrap().permissions().mode() & 0o7777, 0o444);
        assert_eq!(fs_impl.stat(&dst).unwrap().unwrap().modified, 2_000_000.0);
    }
}
