use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Requests ---

/// One gateway call, tagged by `"op"`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    List(ListRequest),
    Read(ReadRequest),
    Write(WriteRequest),
    Copy(CopyRequest),
    MakeDir(MakeDirRequest),
    Delete(DeleteRequest),
    Exec(ExecRequest),
}

impl Request {
    pub fn op_name(&self) -> &'static str {
        match self {
            Request::List(_) => "list",
            Request::Read(_) => "read",
            Request::Write(_) => "write",
            Request::Copy(_) => "copy",
            Request::MakeDir(_) => "make_dir",
            Request::Delete(_) => "delete",
            Request::Exec(_) => "exec",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest {
    /// Directory to browse; configured default directory, then `~`, when unset
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub show_hidden: bool,
    /// Glob for files (directories are never filtered); `*` when unset
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadRequest {
    pub path: String,
    #[serde(default)]
    pub encoding: Encoding,
    /// Size ceiling in MiB, 1..=100
    #[serde(default)]
    pub max_size_mb: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRequest {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyRequest {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeDirRequest {
    pub path: String,
    #[serde(default = "default_true")]
    pub create_parents: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub path: String,
    /// Must be true; nothing is touched otherwise
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecRequest {
    /// Full command line for the host shell
    pub command: String,
    /// Working directory; the caller's home when unset or blank
    #[serde(default)]
    pub cwd: Option<String>,
    /// 1..=300
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub capture_output: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "ascii")]
    Ascii,
    #[serde(rename = "latin-1")]
    Latin1,
    #[serde(rename = "binary")]
    Binary,
}

impl Encoding {
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
            Encoding::Binary => "binary",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "ascii" => Ok(Encoding::Ascii),
            "latin-1" | "latin1" => Ok(Encoding::Latin1),
            "binary" => Ok(Encoding::Binary),
            other => Err(format!(
                "unknown encoding {:?} (expected utf-8, ascii, latin-1 or binary)",
                other
            )),
        }
    }
}

// --- Payloads ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    /// 0 unless the entry is a regular file
    pub size: u64,
    pub modified: f64,
    pub is_dir: bool,
    pub is_file: bool,
    pub is_symlink: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub modified: f64,
    pub encoding: Encoding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyInfo {
    pub source: String,
    pub destination: String,
    /// Size and mtime of the destination after the copy
    pub size: u64,
    pub modified: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirInfo {
    Created {
        path: String,
        created: bool,
        modified: f64,
    },
    Existing {
        path: String,
        exists: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// Child's exit code, or -1 when it did not run or did not finish
    pub return_code: i32,
}

// --- Responses ---

/// Output tuple of one call. Failures use the same shape, with `"error"` in
/// the structured outputs and an `Error: ...` status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Response {
    List {
        files: Value,
        directories: Value,
        current_path: String,
    },
    Read {
        content: String,
        file_info: Value,
    },
    Write {
        status: String,
        file_info: Value,
    },
    Copy {
        status: String,
        file_info: Value,
    },
    MakeDir {
        status: String,
        directory_info: Value,
    },
    Delete {
        status: String,
    },
    Exec {
        stdout: String,
        stderr: String,
        return_code: i32,
    },
}

impl Response {
    /// The outputs as strings, in declaration order. Structured outputs are
    /// pretty-printed JSON.
    pub fn outputs(&self) -> Vec<String> {
        match self {
            Response::List {
                files,
                directories,
                current_path,
            } => vec![pretty(files), pretty(directories), current_path.clone()],
            Response::Read { content, file_info } => vec![content.clone(), pretty(file_info)],
            Response::Write { status, file_info } | Response::Copy { status, file_info } => {
                vec![status.clone(), pretty(file_info)]
            }
            Response::MakeDir {
                status,
                directory_info,
            } => vec![status.clone(), pretty(directory_info)],
            Response::Delete { status } => vec![status.clone()],
            Response::Exec {
                stdout,
                stderr,
                return_code,
            } => vec![stdout.clone(), stderr.clone(), return_code.to_string()],
        }
    }

    /// Error message carried by this response, if it reports a failure
    pub fn error(&self) -> Option<&str> {
        match self {
            Response::List { files, .. } => files.get("error").and_then(Value::as_str),
            Response::Read { file_info, .. }
            | Response::Write { file_info, .. }
            | Response::Copy { file_info, .. } => file_info.get("error").and_then(Value::as_str),
            Response::MakeDir { directory_info, .. } => {
                directory_info.get("error").and_then(Value::as_str)
            }
            Response::Delete { status } => status.strip_prefix("Error: "),
            Response::Exec {
                stdout,
                stderr,
                return_code,
            } if *return_code == -1 && stdout.is_empty() => stderr.strip_prefix("Error: "),
            Response::Exec { .. } => None,
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let req: Request = serde_json::from_value(json!({"op": "list"})).unwrap();
        let Request::List(list) = req else { panic!("expected list") };
        assert!(list.dir.is_none());
        assert!(!list.show_hidden);

        let req: Request =
            serde_json::from_value(json!({"op": "make_dir", "path": "/tmp/x"})).unwrap();
        let Request::MakeDir(mkdir) = req else { panic!("expected make_dir") };
        assert!(mkdir.create_parents);

        let req: Request =
            serde_json::from_value(json!({"op": "exec", "command": "ls"})).unwrap();
        let Request::Exec(exec) = req else { panic!("expected exec") };
        assert!(exec.capture_output);
        assert!(exec.timeout_secs.is_none());
    }

    #[test]
    fn test_encoding_wire_names() {
        let req: ReadRequest =
            serde_json::from_value(json!({"path": "f", "encoding": "latin-1"})).unwrap();
        assert_eq!(req.encoding, Encoding::Latin1);
        assert!(serde_json::from_value::<ReadRequest>(json!({"path": "f", "encoding": "utf-16"}))
            .is_err());
        assert_eq!("UTF8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert!("ebcdic".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_delete_requires_explicit_confirm() {
        let req: DeleteRequest = serde_json::from_value(json!({"path": "x"})).unwrap();
        assert!(!req.confirm);
    }

    #[test]
    fn test_dir_info_shapes() {
        let existing = DirInfo::Existing {
            path: "/d".into(),
            exists: true,
        };
        assert_eq!(
            serde_json::to_value(&existing).unwrap(),
            json!({"path": "/d", "exists": true})
        );
    }

    #[test]
    fn test_outputs_arity() {
        let resp = Response::Exec {
            stdout: "hi\n".into(),
            stderr: String::new(),
            return_code: 0,
        };
        assert_eq!(resp.outputs(), vec!["hi\n", "", "0"]);

        let resp = Response::Delete {
            status: "Error: confirm must be true to delete files".into(),
        };
        assert_eq!(resp.outputs().len(), 1);
        assert_eq!(resp.error(), Some("confirm must be true to delete files"));
    }

    #[test]
    fn test_response_tagging() {
        let resp = Response::MakeDir {
            status: "ok".into(),
            directory_info: json!({}),
        };
        assert_eq!(serde_json::to_value(&resp).unwrap()["op"], "make_dir");
    }
}
