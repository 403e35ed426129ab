//! User path → absolute, symlink-resolved path.
//!
//! Resolution never checks existence. The existing prefix of a path is
//! canonicalized through the [`FileSystem`] (so symlinks are followed) and
//! whatever does not exist yet is appended lexically. This lets Write and
//! MakeDir target paths that are about to be created while every operation
//! still reports "not found" and "wrong type" as separate failures.

use std::path::{Component, PathBuf};

use fsgate_platform::filesystem::FileSystem;
use tracing::debug;

use crate::error::GatewayError;

#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    home: Option<PathBuf>,
    /// Base for relative paths; the process working directory when unset
    base: Option<PathBuf>,
}

impl PathResolver {
    /// Resolver for the current user, home taken from the platform's
    /// conventional location.
    pub fn new() -> Self {
        Self {
            home: directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()),
            base: None,
        }
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Validate raw input and expand a leading `~`
    pub fn expand(&self, raw: &str) -> Result<PathBuf, GatewayError> {
        if raw.is_empty() {
            return Err(GatewayError::malformed("path is empty"));
        }
        if raw.contains('\0') {
            return Err(GatewayError::malformed("path contains a NUL byte"));
        }

        let rest = if raw == "~" {
            Some("")
        } else {
            raw.strip_prefix("~/")
                .or_else(|| if cfg!(windows) { raw.strip_prefix("~\\") } else { None })
        };

        match rest {
            Some(rest) => {
                let home = self.home.as_ref().ok_or_else(|| GatewayError::Unhandled {
                    message: "Could not determine home directory".into(),
                })?;
                Ok(if rest.is_empty() { home.clone() } else { home.join(rest) })
            }
            None => Ok(PathBuf::from(raw)),
        }
    }

    /// Expand, absolutize and canonicalize `raw`
    pub fn resolve(&self, fs: &dyn FileSystem, raw: &str) -> Result<PathBuf, GatewayError> {
        let expanded = self.expand(raw)?;
        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            self.base_dir()?.join(expanded)
        };

        let mut resolved = PathBuf::new();
        let mut on_disk = true;

        for component in absolute.components() {
            match component {
                Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(name) => {
                    resolved.push(name);
                    if on_disk {
                        match fs.canonicalize(&resolved) {
                            Ok(canonical) => resolved = canonical,
                            Err(e) => {
                                debug!("{} not canonicalized: {}", resolved.display(), e);
                                on_disk = false;
                            }
                        }
                    }
                }
            }
        }

        debug!("resolved {:?} -> {}", raw, resolved.display());
        Ok(resolved)
    }

    fn base_dir(&self) -> Result<PathBuf, GatewayError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => std::env::current_dir().map_err(|e| GatewayError::Unhandled {
                message: format!("cannot determine working directory: {}", e),
            }),
        }
    }
}
