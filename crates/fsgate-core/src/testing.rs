//! Shared fixtures for handler tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fsgate_platform::filesystem::{EntryStat, FileSystem};
use fsgate_unix::filesystem::UnixFileSystem;

use crate::config::GatewayConfig;
use crate::files::FileHandler;
use crate::resolver::PathResolver;

/// A scratch directory with a `home/` inside it. Relative paths resolve
/// against the root and `~` against `home/`.
pub struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("home")).unwrap();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> PathBuf {
        self.root.clone()
    }

    pub fn root_str(&self) -> String {
        self.root.display().to_string()
    }

    pub fn path_str(&self, rel: &str) -> String {
        self.root.join(rel).display().to_string()
    }

    pub fn file(&self, rel: &str, content: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn dir(&self, rel: &str) {
        fs::create_dir_all(self.root.join(rel)).unwrap();
    }

    pub fn resolver(&self) -> PathResolver {
        PathResolver::default()
            .with_home(self.root.join("home"))
            .with_base(self.root.clone())
    }

    pub fn handler(&self) -> FileHandler {
        self.handler_with(GatewayConfig::default())
    }

    pub fn handler_with(&self, config: GatewayConfig) -> FileHandler {
        FileHandler::new(Arc::new(UnixFileSystem::new()), self.resolver(), config)
    }

    pub fn handler_on(&self, fs: impl FileSystem + 'static) -> FileHandler {
        FileHandler::new(Arc::new(fs), self.resolver(), GatewayConfig::default())
    }
}

/// Passes every call through to the real filesystem and records it
#[derive(Clone, Default)]
pub struct RecordingFileSystem {
    inner: Arc<UnixFileSystem>,
    calls: Arc<Mutex<Vec<String>>>,
}

const MUTATING: [&str; 4] = ["write_file", "create_dir", "copy_file", "remove_file"];

impl RecordingFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| MUTATING.iter().any(|m| c.starts_with(m)))
            .collect()
    }

    fn record(&self, op: &str, path: &Path) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", op, path.display()));
    }
}

impl FileSystem for RecordingFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.record("canonicalize", path);
        self.inner.canonicalize(path)
    }

    fn stat(&self, path: &Path) -> io::Result<Option<EntryStat>> {
        self.record("stat", path);
        self.inner.stat(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.record("read_dir", path);
        self.inner.read_dir(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.record("read_file", path);
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.record("write_file", path);
        self.inner.write_file(path, data)
    }

    fn create_dir(&self, path: &Path, parents: bool) -> io::Result<()> {
        self.record("create_dir", path);
        self.inner.create_dir(path, parents)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        self.record("copy_file", to);
        self.inner.copy_file(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.record("remove_file", path);
        self.inner.remove_file(path)
    }
}

/// Real filesystem whose directory enumeration is always refused
#[derive(Default)]
pub struct UnreadableDirFileSystem {
    inner: UnixFileSystem,
}

impl FileSystem for UnreadableDirFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.inner.canonicalize(path)
    }

    fn stat(&self, path: &Path) -> io::Result<Option<EntryStat>> {
        self.inner.stat(path)
    }

    fn read_dir(&self, _path: &Path) -> io::Result<Vec<PathBuf>> {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.inner.write_file(path, data)
    }

    fn create_dir(&self, path: &Path, parents: bool) -> io::Result<()> {
        self.inner.create_dir(path, parents)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        self.inner.copy_file(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.inner.remove_file(path)
    }
}
