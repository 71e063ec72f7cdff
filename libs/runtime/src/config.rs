use anyhow::{anyhow, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::paths::home_dir::resolve_home_dir;

/// Subdirectory under the platform home used when `server.home_dir` is empty.
pub const DEFAULT_HOME_SUBDIR: &str = ".users-server";

/// Environment overrides: `APP__SERVER__PORT=9000` sets `server.port`.
pub const ENV_PREFIX: &str = "APP__";

pub const DEFAULT_MAX_CONNS: u32 = 10;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

/// Effective server configuration.
///
/// `modules` holds one raw section per module (`users_info`, `api_ingress`); each
/// module deserializes its own section through `ModuleCtx::module_config`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Without it the users are kept in memory.
    pub database: Option<DatabaseConfig>,
    pub logging: Option<LoggingConfig>,
    /// Directory of `<module>.yaml` files merged into `modules`.
    #[serde(default)]
    pub modules_dir: Option<String>,
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Absolute after loading; relative log files and SQLite paths resolve against it.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Request timeout in seconds; 0 selects the ingress default.
    #[serde(default)]
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite DSN, e.g. `sqlite://database/users.db?mode=rwc`.
    pub url: String,
    pub max_conns: Option<u32>,
    pub busy_timeout_ms: Option<u32>,
}

/// Subsystem (target prefix) → sink settings; `default` catches everything else.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    /// How many rotated files to keep.
    #[serde(default)]
    pub max_backups: Option<usize>,
    /// Rotate once the active file grows past this size.
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

/// Where the users live for this run.
#[derive(Debug, Clone, Copy)]
pub enum StoreBackend<'a> {
    Memory,
    Sqlite(&'a DatabaseConfig),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // resolved to $HOME/.users-server (%APPDATA% on Windows) on load
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8087,
            timeout_sec: 0,
        }
    }
}

pub fn default_logging_config() -> LoggingConfig {
    HashMap::from([(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/users-server.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: Some(DatabaseConfig {
                url: "sqlite://database/users.db?mode=rwc".to_string(),
                max_conns: Some(DEFAULT_MAX_CONNS),
                busy_timeout_ms: Some(DEFAULT_BUSY_TIMEOUT_MS),
            }),
            logging: Some(default_logging_config()),
            ..Self::bare()
        }
    }
}

impl AppConfig {
    /// Server defaults only; optional sections appear when YAML or env sets them.
    fn bare() -> Self {
        Self {
            server: ServerConfig::default(),
            database: None,
            logging: None,
            modules_dir: None,
            modules: HashMap::new(),
        }
    }

    /// Defaults, then the YAML file, then `APP__*` variables. Resolves and creates
    /// `server.home_dir` and merges `modules_dir`.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        if !path.is_file() {
            return Err(anyhow!("Config file not found: {}", path.display()));
        }

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(Self::bare()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        config.server.resolve_home_dir()?;
        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, dir)?;
        }
        Ok(config)
    }

    /// `load_layered` when a path is given, built-in defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut config = Self::default();
                config.server.resolve_home_dir()?;
                Ok(config)
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// `--port` replaces `server.port`; `-v`/`-vv` raise the default console level.
    /// A config without a `logging` section gets the default sinks.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        let level = match args.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = level.to_string();
        }
    }

    /// `--mock` or a missing `database` section keeps users in memory.
    pub fn store_backend(&self, mock: bool) -> StoreBackend<'_> {
        match &self.database {
            Some(db) if !mock => StoreBackend::Sqlite(db),
            _ => StoreBackend::Memory,
        }
    }
}

impl ServerConfig {
    fn resolve_home_dir(&mut self) -> Result<()> {
        let configured = Some(self.home_dir.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let resolved: PathBuf = resolve_home_dir(configured, DEFAULT_HOME_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        self.home_dir = resolved.to_string_lossy().to_string();
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn max_conns(&self) -> u32 {
        self.max_conns.unwrap_or(DEFAULT_MAX_CONNS)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS).into())
    }

    /// Absolute SQLite DSN: relative paths are joined with `home_dir`, backslashes
    /// become slashes and the query string is kept. `sqlite::memory:` passes through.
    /// With `create_dirs` the database's parent directory is created.
    pub fn sqlite_dsn(&self, home_dir: &Path, create_dirs: bool) -> Result<String> {
        let raw = self.url.trim();
        if raw.is_empty() {
            return Err(anyhow!("Database URL not configured"));
        }
        if raw.eq_ignore_ascii_case("sqlite::memory:") || raw.eq_ignore_ascii_case("sqlite://:memory:")
        {
            return Ok("sqlite::memory:".to_string());
        }

        let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{raw}': {e}"))?;
        if url.scheme() != "sqlite" {
            return Err(anyhow!("Unsupported database type: {}", url.scheme()));
        }

        let rest = raw
            .strip_prefix("sqlite://")
            .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {raw})"))?;
        let (file, query) = match rest.split_once('?') {
            Some((file, query)) => (file, Some(query)),
            None => (rest, None),
        };
        if file.is_empty() {
            return Err(anyhow!("Empty SQLite path in DSN"));
        }

        let path = home_dir.join(file);
        if create_dirs {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create database directory {}", dir.display())
                })?;
            }
        }

        let mut dsn = format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"));
        if let Some(query) = query {
            dsn.push('?');
            dsn.push_str(query);
        }
        Ok(dsn)
    }
}

/// Command line arguments relevant to configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}

/// `<dir>/<module>.yaml` (or `.yml`) becomes `modules.<module>`; other files are skipped.
fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let module = match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
            }
            _ => None,
        };
        let Some(module) = module.filter(|_| path.is_file()) else {
            continue;
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read module config {}", path.display()))?;
        let section: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;
        bag.insert(module, serde_json::to_value(section)?);
    }
    Ok(())
}
