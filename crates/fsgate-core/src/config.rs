use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Interpreter for Exec (Unix: run as `<shell> -c`; Windows: `/C`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    /// Directory browsed when a List call names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_directory: Option<String>,

    /// Read ceiling in MiB when a call names none
    #[serde(default = "default_max_size_mb")]
    pub default_max_size_mb: u32,

    /// Exec timeout in seconds when a call names none
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
}

fn default_max_size_mb() -> u32 {
    10
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            shell: None,
            default_directory: None,
            default_max_size_mb: default_max_size_mb(),
            default_timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "fsgate", "fsgate") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("fsgate-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }
}
