use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub sienge: SiengeConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with the browser front-end (index.html, script.js, ...)
    pub static_dir: String,
    /// Upper bound for JSON request bodies (base64 uploads), in megabytes
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: "static".to_string(),
            max_upload_mb: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/attachments.db".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiengeConfig {
    pub contracts_url: String,
    /// Candidate measurement endpoints, probed in order
    #[serde(default)]
    pub measurement_urls: Vec<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_probe_page_size")]
    pub probe_page_size: u32,
    #[serde(default = "default_contract_start_date")]
    pub contract_start_date: String,
    #[serde(default = "default_contract_end_date")]
    pub contract_end_date: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_page_size() -> u32 {
    200
}

fn default_probe_page_size() -> u32 {
    10
}

fn default_contract_start_date() -> String {
    "2020-01-01".to_string()
}

fn default_contract_end_date() -> String {
    "2030-12-31".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per upstream request, including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 5000
static_dir = "static"
max_upload_mb = 50

[database]
path = "data/attachments.db"

[sienge]
contracts_url = "https://api.sienge.com.br/silvapacker/public/api/v1/supply-contracts/all"
measurement_urls = [
    "https://api.sienge.com.br/silvapacker/public/api/v1/supply-contracts/measurements/all",
    "https://api.sienge.com.br/silvapacker/public/api/v1/measurements/all",
    "https://api.sienge.com.br/silvapacker/public/api/v1/supply-contracts/measurements",
    "https://api.sienge.com.br/silvapacker/public/api/v1/measurements",
    "https://api.sienge.com.br/silvapacker/public/api/v1/contracts/measurements/all",
    "https://api.sienge.com.br/silvapacker/public/api/v1/contracts/measurements",
]
page_size = 200
probe_page_size = 10
contract_start_date = "2020-01-01"
contract_end_date = "2030-12-31"
timeout_secs = 120

[retry]
max_attempts = 3
base_delay_ms = 500
max_delay_ms = 5000
"#;

impl Config {
    /// Rejects values the fetcher cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sienge.contracts_url.trim().is_empty() {
            anyhow::bail!("sienge.contracts_url must not be empty");
        }
        if self.sienge.page_size == 0 {
            anyhow::bail!("sienge.page_size must be greater than 0");
        }
        if self.sienge.probe_page_size == 0 {
            anyhow::bail!("sienge.probe_page_size must be greater than 0");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        Ok(())
    }

    /// Credentials from the environment win over the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(user) = std::env::var("SIENGE_USER") {
            self.sienge.username = user;
        }
        if let Ok(password) = std::env::var("SIENGE_PASSWORD") {
            self.sienge.password = password;
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Parse and validate a configuration document.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from config.toml
///
/// Search order:
/// 1. `PORTAL_CONFIG` environment variable
/// 2. `config.toml` in the working directory
/// 3. `config.toml` next to the executable
/// 4. Embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = match find_config_file() {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            parse_config(&contents).with_context(|| format!("invalid {}", path.display()))?
        }
        None => {
            tracing::info!("Using default embedded configuration");
            parse_config(DEFAULT_CONFIG)?
        }
    };

    config.apply_env_overrides();
    if config.sienge.username.is_empty() {
        tracing::warn!("Sienge username is empty; set SIENGE_USER or sienge.username");
    }

    Ok(config)
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PORTAL_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!("PORTAL_CONFIG points to a missing file: {}", path.display());
    }

    let local = PathBuf::from("config.toml");
    if local.exists() {
        return Some(local);
    }

    let exe_dir = std::env::current_exe().ok()?.parent()?.to_path_buf();
    let beside_exe = exe_dir.join("config.toml");
    if beside_exe.exists() {
        Some(beside_exe)
    } else {
        tracing::warn!("config.toml not found at: {}", beside_exe.display());
        None
    }
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> PathBuf {
    let db_path = Path::new(&config.database.path);

    if db_path.is_absolute() {
        return db_path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(db_path);
        }
    }

    PathBuf::from(&config.database.path)
}
