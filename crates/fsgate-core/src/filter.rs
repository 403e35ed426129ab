use std::path::{Path, MAIN_SEPARATOR};

use globset::{GlobBuilder, GlobMatcher};

use crate::error::GatewayError;

/// Glob filter applied to file entries in a listing.
///
/// A pattern without a separator is matched against the file name. A relative
/// pattern with separators must match the trailing components of the path and
/// an absolute one the whole path. `*` never crosses a separator.
#[derive(Debug, Clone)]
pub struct FileFilter {
    matcher: Option<(GlobMatcher, Scope)>,
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Name,
    Path,
}

impl FileFilter {
    pub fn new(pattern: &str) -> Result<Self, GatewayError> {
        if pattern.is_empty() || pattern == "*" {
            return Ok(Self { matcher: None });
        }

        let has_separator = pattern.contains('/') || pattern.contains(MAIN_SEPARATOR);
        let (glob, scope) = if Path::new(pattern).is_absolute() {
            (pattern.to_string(), Scope::Path)
        } else if has_separator {
            (format!("**/{}", pattern), Scope::Path)
        } else {
            (pattern.to_string(), Scope::Name)
        };

        let matcher = GlobBuilder::new(&glob)
            .literal_separator(true)
            .case_insensitive(cfg!(windows))
            .build()
            .map_err(|e| {
                GatewayError::invalid_argument(format!("invalid filter {:?}: {}", pattern, e))
            })?
            .compile_matcher();

        Ok(Self {
            matcher: Some((matcher, scope)),
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        match &self.matcher {
            None => true,
            Some((matcher, Scope::Name)) => path
                .file_name()
                .map(|name| matcher.is_match(name))
                .unwrap_or(false),
            Some((matcher, Scope::Path)) => matcher.is_match(path),
        }
    }
}
