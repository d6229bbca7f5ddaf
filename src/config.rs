//! Application configuration management.
//!
//! Configuration is layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `DUPEFINDER_` (nested keys use `__`)
//! 4. Command-line flags ([`Config::with_scan_args`])
//!
//! The loaded [`Config`] is then validated once into an immutable
//! [`ScanConfig`], which is what the scanning engine consumes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::output::ReportFormat;
use crate::scanner::{hasher::clamp_chunk_size, ExtensionFilter, DEFAULT_CHUNK_SIZE};

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DUPEFINDER_";

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal: they abort before any traversal or hashing.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No search directories were configured.
    #[error("No search directories configured")]
    NoRoots,

    /// The extension allow-list is empty.
    #[error("Allowed extension list is empty")]
    EmptyExtensions,

    /// An allow-list entry cannot name a file extension.
    #[error("Invalid extension entry: {0:?}")]
    InvalidExtension(String),

    /// The configuration sources could not be merged or parsed.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Refused to overwrite an existing configuration file.
    #[error("Configuration file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    /// The configuration file could not be written.
    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// No platform configuration directory could be determined.
    #[error("Failed to determine the configuration directory")]
    NoConfigDir,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories to scan.
    pub search_directories: Vec<PathBuf>,
    /// Allowed file extensions (case-insensitive).
    pub allowed_extensions: Vec<String>,
    /// Read chunk size in bytes.
    pub chunk_size: usize,
    /// Requested worker count. Defaults to the available parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    /// Hard upper bound on the worker count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Directory reports are written to.
    pub output_dir: PathBuf,
    /// Report file format.
    pub report_format: ReportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_directories: Vec::new(),
            allowed_extensions: vec![".png".into(), ".jpg".into(), ".jpeg".into()],
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: None,
            max_workers: None,
            follow_symlinks: false,
            output_dir: PathBuf::from("out"),
            report_format: ReportFormat::Csv,
        }
    }
}

impl Config {
    /// Load the configuration, from `explicit` if given, otherwise from the
    /// default platform-specific path. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => {
                    log::debug!("No platform config directory, using defaults and environment");
                    Self::figment(None).extract().map_err(|e| Box::new(e).into())
                }
            },
        }
    }

    /// Load the configuration from a specific TOML file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
        } else {
            log::debug!("No configuration file at {}", path.display());
        }
        Self::figment(Some(path))
            .extract()
            .map_err(|e| Box::new(e).into())
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupefinder").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides on top of the loaded layers.
    #[must_use]
    pub fn with_scan_args(mut self, args: &ScanArgs) -> Self {
        if !args.paths.is_empty() {
            self.search_directories = args.paths.clone();
        }
        if !args.extensions.is_empty() {
            self.allowed_extensions = args.extensions.clone();
        }
        if let Some(chunk_size) = args.chunk_size {
            self.chunk_size = usize::try_from(chunk_size).unwrap_or(usize::MAX);
        }
        if let Some(workers) = args.workers {
            self.workers = Some(workers);
        }
        if let Some(max_workers) = args.max_workers {
            self.max_workers = Some(max_workers);
        }
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
        if let Some(ref output_dir) = args.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(format) = args.format {
            self.report_format = format;
        }
        self
    }

    /// Validate and normalize into the immutable engine configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if there are no search directories or the
    /// extension allow-list is empty or malformed.
    pub fn to_scan_config(&self) -> Result<ScanConfig, ConfigError> {
        Ok(
            ScanConfig::new(self.search_directories.clone(), &self.allowed_extensions)?
                .with_chunk_size(self.chunk_size)
                .with_workers(self.workers)
                .with_max_workers(self.max_workers)
                .with_follow_symlinks(self.follow_symlinks),
        )
    }

    /// Render this configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write this configuration as TOML to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AlreadyExists`] if the file exists and `force`
    /// is false, or [`ConfigError::Write`] on I/O failure.
    pub fn save_to(&self, path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }

        let content = self.to_toml()?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, content).map_err(write_err)?;
        log::info!("Wrote configuration to {}", path.display());
        Ok(())
    }
}

/// Validated, immutable configuration for one scan.
///
/// Built once before a scan and passed by reference to every component.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    roots: Vec<PathBuf>,
    filter: ExtensionFilter,
    chunk_size: usize,
    workers: Option<i64>,
    max_workers: Option<usize>,
    follow_symlinks: bool,
}

impl ScanConfig {
    /// Create a scan configuration with default chunk size, worker count
    /// and symlink policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoRoots`] for an empty root list, or the
    /// extension filter's error for a bad allow-list.
    pub fn new<I, S>(roots: Vec<PathBuf>, extensions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }
        let filter = ExtensionFilter::new(extensions)?;
        Ok(Self {
            roots,
            filter,
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: None,
            max_workers: None,
            follow_symlinks: false,
        })
    }

    /// Set the read chunk size; out-of-range values are clamped.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = clamp_chunk_size(chunk_size);
        self
    }

    /// Set the requested worker count (`None` = available parallelism).
    #[must_use]
    pub fn with_workers(mut self, workers: Option<i64>) -> Self {
        self.workers = workers;
        self
    }

    /// Set an explicit worker maximum.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Follow symbolic links while walking.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Root directories, unresolved.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Extension allow-list.
    #[must_use]
    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    /// Effective chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Requested worker count, before clamping.
    #[must_use]
    pub fn workers(&self) -> Option<i64> {
        self.workers
    }

    /// Explicit worker maximum.
    #[must_use]
    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    /// Whether symlinks are followed.
    #[must_use]
    pub fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }
}
