use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use fsgate_core::protocol::{
    CopyRequest, DeleteRequest, Encoding, ExecRequest, ListRequest, MakeDirRequest, ReadRequest,
    Request, WriteRequest,
};
use fsgate_core::{Gateway, GatewayConfig};
use fsgate_platform::filesystem::FileSystem;
use fsgate_platform::shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "fsgate")]
#[command(about = "Filesystem and process gateway")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(long, env = "FSGATE_CONFIG_PATH", global = true)]
    config_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "FSGATE_LOG_LEVEL", global = true)]
    log_level: String,

    /// Print the output tuple one value per block instead of the JSON response
    #[arg(long, global = true)]
    tuple: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a directory
    List {
        /// Directory to browse (default: configured directory, then home)
        dir: Option<String>,
        #[arg(long)]
        show_hidden: bool,
        /// Glob applied to file names
        #[arg(long)]
        filter: Option<String>,
    },
    /// Read a file
    Read {
        path: String,
        #[arg(long, default_value_t = Encoding::Utf8)]
        encoding: Encoding,
        /// Size ceiling in MB (1-100)
        #[arg(long)]
        max_size_mb: Option<u32>,
    },
    /// Write text to a file
    Write {
        path: String,
        /// Content to write; read from stdin when omitted
        #[arg(long)]
        content: Option<String>,
        #[arg(long, default_value_t = Encoding::Utf8)]
        encoding: Encoding,
        #[arg(long)]
        overwrite: bool,
    },
    /// Copy a file
    Copy {
        source: String,
        destination: String,
        #[arg(long)]
        overwrite: bool,
    },
    /// Create a directory
    Mkdir {
        path: String,
        /// Fail instead of creating missing parents
        #[arg(long)]
        no_parents: bool,
    },
    /// Delete a file
    Delete {
        path: String,
        /// Required; nothing is deleted without it
        #[arg(long)]
        confirm: bool,
    },
    /// Run a command line through the host shell
    Exec {
        command: String,
        #[arg(long)]
        cwd: Option<String>,
        /// Timeout in seconds (1-300)
        #[arg(long)]
        timeout: Option<u64>,
        /// Discard the command's output
        #[arg(long)]
        no_capture: bool,
    },
    /// Handle a raw JSON request
    Call {
        /// Request JSON; read from stdin when omitted
        #[arg(long)]
        request: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the response
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!(
        "fsgate v{} (os={}, arch={})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    );

    let config_path = cli
        .config_path
        .map(PathBuf::from)
        .unwrap_or_else(GatewayConfig::default_path);

    if config_path.exists() {
        info!("loading config from {}", config_path.display());
    } else {
        debug!("no config at {}, using defaults", config_path.display());
    }
    let config = GatewayConfig::load_or_default(&config_path)?;

    let request = build_request(cli.command)?;

    let fs = create_platform_filesystem()?;
    let shell = create_platform_shell(config.shell.as_deref())?;
    let gateway = Gateway::new(config, fs, shell);

    let response = gateway.handle(request).await;

    if cli.tuple {
        for output in response.outputs() {
            println!("{}", output);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}

fn build_request(command: Commands) -> Result<Request> {
    let request = match command {
        Commands::List {
            dir,
            show_hidden,
            filter,
        } => Request::List(ListRequest {
            dir,
            show_hidden,
            filter,
        }),
        Commands::Read {
            path,
            encoding,
            max_size_mb,
        } => Request::Read(ReadRequest {
            path,
            encoding,
            max_size_mb,
        }),
        Commands::Write {
            path,
            content,
            encoding,
            overwrite,
        } => {
            let content = match content {
                Some(c) => c,
                None => read_stdin().context("failed to read content from stdin")?,
            };
            Request::Write(WriteRequest {
                path,
                content,
                encoding,
                overwrite,
            })
        }
        Commands::Copy {
            source,
            destination,
            overwrite,
        } => Request::Copy(CopyRequest {
            source,
            destination,
            overwrite,
        }),
        Commands::Mkdir { path, no_parents } => Request::MakeDir(MakeDirRequest {
            path,
            create_parents: !no_parents,
        }),
        Commands::Delete { path, confirm } => Request::Delete(DeleteRequest { path, confirm }),
        Commands::Exec {
            command,
            cwd,
            timeout,
            no_capture,
        } => Request::Exec(ExecRequest {
            command,
            cwd,
            timeout_secs: timeout,
            capture_output: !no_capture,
        }),
        Commands::Call { request } => {
            let raw = match request {
                Some(r) => r,
                None => read_stdin().context("failed to read request from stdin")?,
            };
            serde_json::from_str(&raw).context("invalid request JSON")?
        }
    };
    Ok(request)
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(unix)]
fn create_platform_filesystem() -> Result<Arc<dyn FileSystem>> {
    Ok(Arc::new(fsgate_unix::filesystem::UnixFileSystem::new()))
}

#[cfg(target_os = "windows")]
fn create_platform_filesystem() -> Result<Arc<dyn FileSystem>> {
    Ok(Arc::new(fsgate_windows::filesystem::WindowsFileSystem::new()))
}

#[cfg(not(any(unix, target_os = "windows")))]
fn create_platform_filesystem() -> Result<Arc<dyn FileSystem>> {
    anyhow::bail!("filesystem not supported on this platform")
}

#[cfg(unix)]
fn create_platform_shell(shell: Option<&str>) -> Result<Box<dyn Shell>> {
    Ok(Box::new(fsgate_unix::shell::UnixShell::new(shell)))
}

#[cfg(target_os = "windows")]
fn create_platform_shell(shell: Option<&str>) -> Result<Box<dyn Shell>> {
    Ok(Box::new(fsgate_windows::shell::WindowsShell::new(shell)))
}

#[cfg(not(any(unix, target_os = "windows")))]
fn create_platform_shell(_shell: Option<&str>) -> Result<Box<dyn Shell>> {
    anyhow::bail!("shell execution not supported on this platform")
}
