use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Metadata for a single path, with file type resolved through symlinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryStat {
    pub size: u64,
    /// Seconds since the Unix epoch (negative before it)
    pub modified: f64,
    pub is_dir: bool,
    pub is_file: bool,
    /// Set when the path itself is a symlink, regardless of its target
    pub is_symlink: bool,
}

/// Filesystem primitives used by the gateway.
///
/// Paths handed to these methods are already resolved; implementations do no
/// home expansion or normalization of their own. Every method reports the raw
/// `io::Error` so callers can classify it by kind.
pub trait FileSystem: Send + Sync {
    /// Canonicalize an existing path, following every symlink
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Stat a path. `Ok(None)` when nothing exists there (a dangling symlink
    /// counts as nothing).
    fn stat(&self, path: &Path) -> io::Result<Option<EntryStat>>;

    /// Immediate children of a directory, in directory order
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate `path` and write `data` fully
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Create a directory. With `parents`, missing ancestors are created too.
    /// Succeeds if the directory already exists.
    fn create_dir(&self, path: &Path, parents: bool) -> io::Result<()>;

    /// Copy file content, permissions and timestamps. Returns bytes copied.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// Convert a timestamp to fractional seconds since the Unix epoch
pub fn unix_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}
