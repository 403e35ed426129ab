use std::io;
use std::path::Path;

use serde_json::{json, Map, Value};
use thiserror::Error;

const MIB: f64 = 1024.0 * 1024.0;

/// Every way a gateway operation can fail.
///
/// Handlers never let these escape as panics; the encoder folds them into the
/// same output shape as a success.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Path does not exist: {path}")]
    NotFound { path: String },

    #[error("Path is not a file: {path}")]
    NotAFile { path: String },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("File exists and overwrite is disabled: {path}")]
    AlreadyExists { path: String },

    #[error("Source file does not exist: {path}")]
    SourceNotFound { path: String },

    #[error("Source is not a file: {path}")]
    SourceNotAFile { path: String },

    #[error("Destination exists and overwrite is disabled: {path}")]
    DestinationExists { path: String },

    #[error("File too large ({:.2} MB > {limit_mb} MB)", mebibytes(.size))]
    TooLarge { size: u64, limit_mb: u32 },

    #[error("confirm must be true to delete files")]
    ConfirmationRequired,

    #[error("Working directory does not exist: {path}")]
    InvalidWorkingDirectory { path: String },

    #[error("Command timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("Malformed path: {reason}")]
    Malformed { reason: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Cannot decode file as {encoding}: {reason}")]
    Decode { encoding: &'static str, reason: String },

    #[error("Cannot encode content as {encoding}: {reason}")]
    Encode { encoding: &'static str, reason: String },

    #[error("{message}")]
    Unhandled { message: String },
}

fn mebibytes(bytes: &u64) -> f64 {
    *bytes as f64 / MIB
}

impl GatewayError {
    /// Classify an OS error raised while operating on `path`
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => GatewayError::NotFound { path },
            io::ErrorKind::PermissionDenied => GatewayError::PermissionDenied { path },
            io::ErrorKind::AlreadyExists => GatewayError::AlreadyExists { path },
            _ => GatewayError::Unhandled {
                message: format!("{}: {}", path, err),
            },
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        GatewayError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        GatewayError::Malformed {
            reason: reason.into(),
        }
    }

    /// Stable snake_case name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound { .. } => "not_found",
            GatewayError::NotAFile { .. } => "not_a_file",
            GatewayError::NotADirectory { .. } => "not_a_directory",
            GatewayError::PermissionDenied { .. } => "permission_denied",
            GatewayError::AlreadyExists { .. } => "already_exists",
            GatewayError::SourceNotFound { .. } => "source_not_found",
            GatewayError::SourceNotAFile { .. } => "source_not_a_file",
            GatewayError::DestinationExists { .. } => "destination_exists",
            GatewayError::TooLarge { .. } => "too_large",
            GatewayError::ConfirmationRequired => "confirmation_required",
            GatewayError::InvalidWorkingDirectory { .. } => "invalid_working_directory",
            GatewayError::Timeout { .. } => "timeout",
            GatewayError::Malformed { .. } => "malformed",
            GatewayError::InvalidArgument { .. } => "invalid_argument",
            GatewayError::Decode { .. } => "decode",
            GatewayError::Encode { .. } => "encode",
            GatewayError::Unhandled { .. } => "unhandled",
        }
    }

    /// The error payload: `{"error": message, "kind": ..., <context>}`
    pub fn payload(&self) -> Value {
        let mut map = Map::new();
        map.insert("error".into(), Value::String(self.to_string()));
        map.insert("kind".into(), Value::String(self.kind().into()));

        match self {
            GatewayError::NotFound { path }
            | GatewayError::NotAFile { path }
            | GatewayError::NotADirectory { path }
            | GatewayError::PermissionDenied { path }
            | GatewayError::AlreadyExists { path }
            | GatewayError::SourceNotFound { path }
            | GatewayError::SourceNotAFile { path }
            | GatewayError::DestinationExists { path }
            | GatewayError::InvalidWorkingDirectory { path } => {
                map.insert("path".into(), json!(path));
            }
            GatewayError::TooLarge { size, limit_mb } => {
                map.insert("size".into(), json!(size));
                map.insert("max_size_mb".into(), json!(limit_mb));
            }
            GatewayError::Timeout { secs } => {
                map.insert("timeout_secs".into(), json!(secs));
            }
            GatewayError::Decode { encoding, .. } | GatewayError::Encode { encoding, .. } => {
                map.insert("encoding".into(), json!(encoding));
            }
            _ => {}
        }

        Value::Object(map)
    }

    /// Human-readable status line
    pub fn status(&self) -> String {
        format!("Error: {}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_io_classification() {
        let path = PathBuf::from("/tmp/x");
        let err = GatewayError::from_io(io::Error::from(io::ErrorKind::NotFound), &path);
        assert_eq!(err.kind(), "not_found");

        let err =
            GatewayError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), &path);
        assert!(matches!(err, GatewayError::PermissionDenied { ref path } if path == "/tmp/x"));

        let err = GatewayError::from_io(io::Error::other("disk on fire"), &path);
        assert_eq!(err.kind(), "unhandled");
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_too_large_message_and_payload() {
        let err = GatewayError::TooLarge {
            size: 2 * 1024 * 1024,
            limit_mb: 1,
        };
        assert_eq!(err.to_string(), "File too large (2.00 MB > 1 MB)");

        let payload = err.payload();
        assert_eq!(payload["error"], "File too large (2.00 MB > 1 MB)");
        assert_eq!(payload["kind"], "too_large");
        assert_eq!(payload["size"], 2_097_152);
    }

    #[test]
    fn test_status_prefix() {
        assert_eq!(
            GatewayError::Timeout { secs: 1 }.status(),
            "Error: Command timed out after 1 seconds"
        );
    }

    #[test]
    fn test_payload_carries_path() {
        let err = GatewayError::AlreadyExists {
            path: "/data/out.txt".into(),
        };
        assert_eq!(err.payload()["path"], "/data/out.txt");
    }
}
