// Configuration loading and parsing (pool.toml, bracket.toml).

use std::path::{Path, PathBuf};

use playoff_pool_core::bracket::{BracketDefinition, BracketError};
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("invalid bracket definition in {path}: {source}")]
    InvalidBracket { path: PathBuf, source: BracketError },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub pool: PoolSection,
    pub admin: AdminSection,
    pub db_path: String,
    pub max_per_participant: u8,
    pub bracket: BracketDefinition,
    /// Where the bracket came from; `None` for the built-in bracket.
    pub bracket_path: Option<PathBuf>,
}

impl Config {
    /// The pool's sport label, falling back to the bracket's.
    pub fn sport(&self) -> &str {
        self.pool.sport.as_deref().unwrap_or(&self.bracket.sport)
    }

    /// The pool's season label, falling back to the bracket's.
    pub fn season(&self) -> &str {
        self.pool.season.as_deref().unwrap_or(&self.bracket.season)
    }
}

// ---------------------------------------------------------------------------
// pool.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire pool.toml file.
#[derive(Debug, Clone, Deserialize)]
struct PoolFile {
    pool: PoolSection,
    admin: AdminSection,
    database: DatabaseSection,
    #[serde(default)]
    bracket: Option<BracketSection>,
    #[serde(default)]
    entries: EntriesSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolSection {
    pub name: String,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSection {
    pub passphrase: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct BracketSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EntriesSection {
    #[serde(default = "default_max_per_participant")]
    max_per_participant: u8,
}

impl Default for EntriesSection {
    fn default() -> Self {
        EntriesSection {
            max_per_participant: default_max_per_participant(),
        }
    }
}

fn default_max_per_participant() -> u8 {
    2
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/pool.toml` and, when it
/// names one, the bracket file it points at (relative to `config/`), all
/// under the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- pool.toml (required) ---
    let pool_path = config_dir.join("pool.toml");
    let pool_text = read_file(&pool_path)?;
    let pool_file: PoolFile = toml::from_str(&pool_text).map_err(|e| ConfigError::ParseError {
        path: pool_path.clone(),
        source: e,
    })?;

    // --- bracket (file when configured, built-in otherwise) ---
    let (bracket, bracket_path) = match &pool_file.bracket {
        Some(section) => {
            let path = config_dir.join(&section.path);
            let text = read_file(&path)?;
            let bracket: BracketDefinition =
                toml::from_str(&text).map_err(|e| ConfigError::ParseError {
                    path: path.clone(),
                    source: e,
                })?;
            (bracket, Some(path))
        }
        None => (BracketDefinition::nba_2025_playoffs(), None),
    };

    let config = Config {
        pool: pool_file.pool,
        admin: pool_file.admin,
        db_path: pool_file.database.path,
        max_per_participant: pool_file.entries.max_per_participant,
        bracket,
        bracket_path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.pool.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "pool.name".into(),
            message: "must not be empty".into(),
        });
    }

    if config.admin.passphrase.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "admin.passphrase".into(),
            message: "must not be empty".into(),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if !(1..=2).contains(&config.max_per_participant) {
        return Err(ConfigError::ValidationError {
            field: "entries.max_per_participant".into(),
            message: format!("must be 1 or 2, got {}", config.max_per_participant),
        });
    }

    config
        .bracket
        .validate()
        .map_err(|source| ConfigError::InvalidBracket {
            path: config
                .bracket_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("<built-in>")),
            source,
        })?;

    Ok(())
}
