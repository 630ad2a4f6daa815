use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

pub mod secret;

pub use secret::resolve_table_name;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSON table files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Path to the secret blob carrying `{ "tableName": ... }`.
    /// Ignored when `TABLE_NAME_SECRET` is set in the environment.
    #[serde(default = "default_secret_file")]
    pub secret_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), secret_file: default_secret_file() }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_secret_file() -> String {
    "data/table_secret.json".to_string()
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize_from_env();
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 {
                self.worker_threads = Some(4);
            }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StorageConfig {
    /// Fill unset fields from environment variables.
    pub fn normalize_from_env(&mut self) {
        if self.data_dir.trim().is_empty() {
            if let Ok(dir) = std::env::var("DATA_DIR") {
                self.data_dir = dir;
            }
        }
        if self.secret_file.trim().is_empty() {
            if let Ok(path) = std::env::var("TABLE_NAME_SECRET_FILE") {
                self.secret_file = path;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!(
                "storage.data_dir is empty; set it in config.toml or via DATA_DIR"
            ));
        }
        Ok(())
    }
}
