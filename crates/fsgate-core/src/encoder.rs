//! Folds handler results into response tuples.
//!
//! A failure keeps the arity of its operation's outputs: structured outputs
//! become the error payload and status-like outputs become `Error: ...`.

use serde::Serialize;
use serde_json::Value;

use crate::error::GatewayError;
use crate::files::{CopyResult, DeleteResult, ListResult, ReadResult, WriteResult};
use crate::protocol::{CommandResult, DirInfo, Response};

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        GatewayError::Unhandled {
            message: format!("failed to serialize payload: {}", e),
        }
        .payload()
    })
}

/// `raw_dir` is what the caller asked for; failures echo it back as
/// `current_path` unless the directory was already resolved.
pub fn list_response(raw_dir: &str, result: Result<ListResult, GatewayError>) -> Response {
    match result {
        Ok(list) => Response::List {
            files: to_value(&list.files),
            directories: to_value(&list.directories),
            current_path: list.current_path.display().to_string(),
        },
        Err(err) => {
            let current_path = match &err {
                GatewayError::PermissionDenied { path } => path.clone(),
                _ => raw_dir.to_string(),
            };
            let payload = err.payload();
            Response::List {
                files: payload.clone(),
                directories: payload,
                current_path,
            }
        }
    }
}

pub fn read_response(result: Result<ReadResult, GatewayError>) -> Response {
    match result {
        Ok(read) => Response::Read {
            content: read.content,
            file_info: to_value(&read.info),
        },
        Err(err) => Response::Read {
            content: err.status(),
            file_info: err.payload(),
        },
    }
}

pub fn write_response(result: Result<WriteResult, GatewayError>) -> Response {
    match result {
        Ok(write) => Response::Write {
            status: format!(
                "Successfully wrote {} characters to {}",
                write.chars_written, write.info.name
            ),
            file_info: to_value(&write.info),
        },
        Err(err) => Response::Write {
            status: err.status(),
            file_info: err.payload(),
        },
    }
}

pub fn copy_response(result: Result<CopyResult, GatewayError>) -> Response {
    match result {
        Ok(copy) => Response::Copy {
            status: format!(
                "Successfully copied {} to {}",
                copy.source_name, copy.info.destination
            ),
            file_info: to_value(&copy.info),
        },
        Err(err) => Response::Copy {
            status: err.status(),
            file_info: err.payload(),
        },
    }
}

pub fn make_dir_response(result: Result<DirInfo, GatewayError>) -> Response {
    match result {
        Ok(info) => {
            let status = match &info {
                DirInfo::Existing { path, .. } => format!("Directory already exists: {}", path),
                DirInfo::Created { path, .. } => {
                    format!("Successfully created directory: {}", path)
                }
            };
            Response::MakeDir {
                status,
                directory_info: to_value(&info),
            }
        }
        Err(err) => Response::MakeDir {
            status: err.status(),
            directory_info: err.payload(),
        },
    }
}

pub fn delete_response(result: Result<DeleteResult, GatewayError>) -> Response {
    let status = match result {
        Ok(deleted) => format!("Successfully deleted: {}", deleted.path.display()),
        Err(err) => err.status(),
    };
    Response::Delete { status }
}

pub fn exec_response(result: Result<CommandResult, GatewayError>) -> Response {
    match result {
        Ok(out) => Response::Exec {
            stdout: out.stdout,
            stderr: out.stderr,
            return_code: out.return_code,
        },
        Err(err) => Response::Exec {
            stdout: String::new(),
            stderr: err.status(),
            return_code: -1,
        },
    }
}
