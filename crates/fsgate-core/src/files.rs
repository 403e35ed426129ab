use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fsgate_platform::filesystem::{EntryStat, FileSystem};
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::filter::FileFilter;
use crate::protocol::{
    CopyInfo, CopyRequest, DeleteRequest, DirInfo, DirectoryEntry, FileInfo, ListRequest,
    MakeDirRequest, ReadRequest, WriteRequest,
};
use crate::resolver::PathResolver;

pub const MAX_SIZE_MB_RANGE: RangeInclusive<u32> = 1..=100;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ListResult {
    pub current_path: PathBuf,
    pub files: Vec<DirectoryEntry>,
    pub directories: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone)]
pub struct ReadResult {
    pub content: String,
    pub info: FileInfo,
}

#[derive(Debug, Clone)]
pub struct WriteResult {
    /// Characters (not bytes) of content written
    pub chars_written: usize,
    pub info: FileInfo,
}

#[derive(Debug, Clone)]
pub struct CopyResult {
    pub source_name: String,
    pub info: CopyInfo,
}

#[derive(Debug, Clone)]
pub struct DeleteResult {
    pub path: PathBuf,
}

/// Handles the filesystem operations: List, Read, Write, Copy, MakeDir and
/// Delete. Each one checks its preconditions in a fixed order and stops at
/// the first violation.
pub struct FileHandler {
    fs: Arc<dyn FileSystem>,
    resolver: PathResolver,
    config: GatewayConfig,
}

impl FileHandler {
    pub fn new(fs: Arc<dyn FileSystem>, resolver: PathResolver, config: GatewayConfig) -> Self {
        Self {
            fs,
            resolver,
            config,
        }
    }

    /// The directory a List call without `dir` browses
    pub fn default_directory(&self) -> &str {
        self.config.default_directory.as_deref().unwrap_or("~")
    }

    pub fn list(&self, req: &ListRequest) -> Result<ListResult, GatewayError> {
        let raw = req.dir.as_deref().unwrap_or_else(|| self.default_directory());
        let filter = FileFilter::new(req.filter.as_deref().unwrap_or("*"))?;
        let path = self.resolve(raw)?;

        info!("list: {} (hidden={})", path.display(), req.show_hidden);

        let stat = self.stat(&path)?.ok_or_else(|| not_found(&path))?;
        if !stat.is_dir {
            return Err(GatewayError::NotADirectory {
                path: display(&path),
            });
        }

        let children = self
            .fs
            .read_dir(&path)
            .map_err(|e| GatewayError::from_io(e, &path))?;

        let mut files = Vec::new();
        let mut directories = Vec::new();

        for child in children {
            let Some(name) = child.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if !req.show_hidden && name.starts_with('.') {
                continue;
            }

            let stat = match self.fs.stat(&child) {
                Ok(Some(s)) => s,
                Ok(None) => {
                    debug!("skipping dangling entry {}", child.display());
                    continue;
                }
                Err(e) => {
                    warn!("skipping {}: {}", child.display(), e);
                    continue;
                }
            };

            let entry = DirectoryEntry {
                name,
                path: display(&child),
                size: if stat.is_file { stat.size } else { 0 },
                modified: stat.modified,
                is_dir: stat.is_dir,
                is_file: stat.is_file,
                is_symlink: stat.is_symlink,
            };

            if stat.is_dir {
                directories.push(entry);
            } else if stat.is_file && filter.matches(&child) {
                files.push(entry);
            }
        }

        files.sort_by_cached_key(|e| e.name.to_lowercase());
        directories.sort_by_cached_key(|e| e.name.to_lowercase());

        Ok(ListResult {
            current_path: path,
            files,
            directories,
        })
    }

    pub fn read(&self, req: &ReadRequest) -> Result<ReadResult, GatewayError> {
        let max_size_mb = req.max_size_mb.unwrap_or(self.config.default_max_size_mb);
        check_range("max_size_mb", max_size_mb, &MAX_SIZE_MB_RANGE)?;

        let path = self.resolve(&req.path)?;
        info!("read: {} ({})", path.display(), req.encoding);

        let stat = self.stat(&path)?.ok_or_else(|| not_found(&path))?;
        if !stat.is_file {
            return Err(GatewayError::NotAFile {
                path: display(&path),
            });
        }

        let limit = u64::from(max_size_mb) * MIB;
        let too_large = |size: u64| GatewayError::TooLarge {
            size,
            limit_mb: max_size_mb,
        };
        if stat.size > limit {
            return Err(too_large(stat.size));
        }

        let bytes = self
            .fs
            .read_file(&path)
            .map_err(|e| GatewayError::from_io(e, &path))?;
        // The file may have grown since it was stat'ed
        if bytes.len() as u64 > limit {
            return Err(too_large(bytes.len() as u64));
        }

        let content = codec::decode(&bytes, req.encoding)?;

        Ok(ReadResult {
            content,
            info: FileInfo {
                name: file_name(&path),
                path: display(&path),
                size: bytes.len() as u64,
                modified: stat.modified,
                encoding: req.encoding,
            },
        })
    }

    /// Not atomic: a failure midway can leave a partially written file.
    pub fn write(&self, req: &WriteRequest) -> Result<WriteResult, GatewayError> {
        let path = self.resolve(&req.path)?;
        info!("write: {} (overwrite={})", path.display(), req.overwrite);

        if let Some(existing) = self.stat(&path)? {
            if !req.overwrite {
                return Err(GatewayError::AlreadyExists {
                    path: display(&path),
                });
            }
            if !existing.is_file {
                return Err(GatewayError::NotAFile {
                    path: display(&path),
                });
            }
        }

        let data = codec::encode(&req.content, req.encoding)?;

        self.create_parents(&path)?;
        self.fs
            .write_file(&path, &data)
            .map_err(|e| GatewayError::from_io(e, &path))?;

        let stat = self.stat_after_mutation(&path)?;
        Ok(WriteResult {
            chars_written: req.content.chars().count(),
            info: FileInfo {
                name: file_name(&path),
                path: display(&path),
                size: stat.size,
                modified: stat.modified,
                encoding: req.encoding,
            },
        })
    }

    pub fn copy(&self, req: &CopyRequest) -> Result<CopyResult, GatewayError> {
        let src = self.resolve(&req.source)?;
        let dst = self.resolve(&req.destination)?;
        info!("copy: {} -> {}", src.display(), dst.display());

        match self.stat(&src)? {
            None => {
                return Err(GatewayError::SourceNotFound {
                    path: display(&src),
                })
            }
            Some(stat) if !stat.is_file => {
                return Err(GatewayError::SourceNotAFile {
                    path: display(&src),
                })
            }
            Some(_) => {}
        }

        if let Some(existing) = self.stat(&dst)? {
            if !req.overwrite {
                return Err(GatewayError::DestinationExists {
                    path: display(&dst),
                });
            }
            if !existing.is_file {
                return Err(GatewayError::NotAFile {
                    path: display(&dst),
                });
            }
        }

        // Copying a file onto itself would truncate it
        if src == dst {
            return Err(GatewayError::invalid_argument(format!(
                "source and destination are the same file: {}",
                src.display()
            )));
        }

        self.create_parents(&dst)?;
        self.fs
            .copy_file(&src, &dst)
            .map_err(|e| GatewayError::from_io(e, &dst))?;

        let stat = self.stat_after_mutation(&dst)?;
        Ok(CopyResult {
            source_name: file_name(&src),
            info: CopyInfo {
                source: display(&src),
                destination: display(&dst),
                size: stat.size,
                modified: stat.modified,
            },
        })
    }

    pub fn make_dir(&self, req: &MakeDirRequest) -> Result<DirInfo, GatewayError> {
        let path = self.resolve(&req.path)?;
        info!("make_dir: {} (parents={})", path.display(), req.create_parents);

        if let Some(stat) = self.stat(&path)? {
            if stat.is_dir {
                return Ok(DirInfo::Existing {
                    path: display(&path),
                    exists: true,
                });
            }
            return Err(GatewayError::NotADirectory {
                path: display(&path),
            });
        }

        self.fs
            .create_dir(&path, req.create_parents)
            .map_err(|e| match (e.kind(), path.parent()) {
                // Only possible without create_parents: an ancestor is missing
                (std::io::ErrorKind::NotFound, Some(parent)) => not_found(parent),
                _ => GatewayError::from_io(e, &path),
            })?;

        let stat = self.stat_after_mutation(&path)?;
        Ok(DirInfo::Created {
            path: display(&path),
            created: true,
            modified: stat.modified,
        })
    }

    pub fn delete(&self, req: &DeleteRequest) -> Result<DeleteResult, GatewayError> {
        if !req.confirm {
            return Err(GatewayError::ConfirmationRequired);
        }

        let path = self.resolve(&req.path)?;
        info!("delete: {}", path.display());

        let stat = self.stat(&path)?.ok_or_else(|| not_found(&path))?;
        if !stat.is_file {
            return Err(GatewayError::NotAFile {
                path: display(&path),
            });
        }

        self.fs
            .remove_file(&path)
            .map_err(|e| GatewayError::from_io(e, &path))?;

        Ok(DeleteResult { path })
    }

    fn resolve(&self, raw: &str) -> Result<PathBuf, GatewayError> {
        self.resolver.resolve(self.fs.as_ref(), raw)
    }

    fn stat(&self, path: &Path) -> Result<Option<EntryStat>, GatewayError> {
        self.fs
            .stat(path)
            .map_err(|e| GatewayError::from_io(e, path))
    }

    fn stat_after_mutation(&self, path: &Path) -> Result<EntryStat, GatewayError> {
        self.stat(path)?.ok_or_else(|| GatewayError::Unhandled {
            message: format!("{} disappeared right after it was written", path.display()),
        })
    }

    fn create_parents(&self, path: &Path) -> Result<(), GatewayError> {
        match path.parent() {
            Some(parent) => self
                .fs
                .create_dir(parent, true)
                .map_err(|e| GatewayError::from_io(e, parent)),
            None => Ok(()),
        }
    }
}

pub(crate) fn check_range<T>(
    name: &str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<(), GatewayError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(GatewayError::invalid_argument(format!(
            "{} must be between {} and {}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}

fn not_found(path: &Path) -> GatewayError {
    GatewayError::NotFound {
        path: display(path),
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| display(path))
}
