//! Configuration loading and root folder resolution
//!
//! Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LOUVOR_ROOT_FOLDER`, then `LOUVOR_ROOT`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! built-in defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Primary root folder environment variable
pub const ENV_ROOT_FOLDER: &str = "LOUVOR_ROOT_FOLDER";
/// Alternative root folder environment variable
pub const ENV_ROOT: &str = "LOUVOR_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "louvor.db";
/// Permanent stem storage directory inside the root folder
pub const MULTITRACK_DIR: &str = "multitracks";
/// Scratch directory for uploads and extraction workspaces
pub const SCRATCH_DIR: &str = "tmp";

/// Built-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
            log_file: None,
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Multitrack ingestion limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultitrackSettings {
    /// Age after which stored stem directories and scratch leftovers are swept
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,

    /// Upload ceiling in bytes
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,

    /// Ceiling on the total bytes one archive may unpack to
    #[serde(default = "default_max_unpacked_bytes")]
    pub max_unpacked_bytes: u64,

    /// Hard bound on directory depth when scanning an extracted archive
    #[serde(default = "default_max_scan_depth")]
    pub max_scan_depth: usize,
}

impl Default for MultitrackSettings {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
            max_archive_bytes: default_max_archive_bytes(),
            max_unpacked_bytes: default_max_unpacked_bytes(),
            max_scan_depth: default_max_scan_depth(),
        }
    }
}

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional; the file may be absent entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub multitrack: MultitrackSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_retention_hours() -> u64 {
    24
}

fn default_max_archive_bytes() -> u64 {
    2 * 1024 * 1024 * 1024 // 2 GiB
}

fn default_max_unpacked_bytes() -> u64 {
    4 * default_max_archive_bytes()
}

fn default_max_scan_depth() -> usize {
    32
}

/// Locate the config file: `~/.config/louvor/config.toml`, then
/// `/etc/louvor/config.toml` on Linux
pub fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("louvor").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/louvor/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the config file if one exists, otherwise defaults
///
/// Parse errors are logged and replaced by defaults.
pub fn load_or_default(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit.map(Path::to_path_buf).or_else(config_file_path) {
        Some(path) => path,
        None => {
            info!("No config file found, using built-in defaults");
            return TomlConfig::default();
        }
    };

    match load_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{} - using built-in defaults", e);
            TomlConfig::default()
        }
    }
}

/// Resolves the root folder from CLI, environment, TOML and defaults
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(module = %self.module_name, "Root folder from command line: {}", path.display());
            return path.clone();
        }

        for var in [ENV_ROOT_FOLDER, ENV_ROOT] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    info!(module = %self.module_name, "Root folder from {}: {}", var, path);
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(path) = &self.toml_root {
            info!(module = %self.module_name, "Root folder from TOML: {}", path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!(module = %self.module_name, "Root folder default: {}", path.display());
        path
    }
}

/// Creates the root folder layout and derives paths inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create root, stem storage and scratch directories if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        for dir in [
            self.root_folder.clone(),
            self.multitrack_storage_path(),
            self.scratch_path(),
        ] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    Error::Config(format!("Cannot create {}: {}", dir.display(), e))
                })?;
                info!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn multitrack_storage_path(&self) -> PathBuf {
        self.root_folder.join(MULTITRACK_DIR)
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.root_folder.join(SCRATCH_DIR)
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("louvor"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/louvor"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("louvor"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/louvor"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("louvor"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\louvor"))
    } else {
        PathBuf::from("./louvor_data")
    }
}
