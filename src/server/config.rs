use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    pub jwt_secret: String,

    #[serde(default = "default_settings_key")]
    pub settings_encryption_key: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    #[serde(default)]
    pub frontend_url: Option<String>,

    #[serde(default)]
    pub admin_username: Option<String>,

    #[serde(default)]
    pub admin_password: Option<String>,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub struct PartialServerConfig {
    pub listen_addr: Option<String>,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub settings_encryption_key: Option<String>,
    pub log_dir: Option<String>,
    pub lookup_timeout_secs: Option<u64>,
    pub frontend_url: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_url() -> String {
    "sqlite://tabelionato.db?mode=rwc".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_lookup_timeout_secs() -> u64 {
    15
}

fn default_settings_key() -> String {
    // Development key only. Production deployments must set SETTINGS_ENCRYPTION_KEY.
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f".to_string()
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) => Self::read_file(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    fn read_file(path: &Path) -> Result<PartialServerConfig, String> {
        if !path.exists() {
            return Ok(PartialServerConfig::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
    }

    pub fn merge(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Result<Self, String> {
        let final_config = ServerConfig {
            listen_addr: env_config.listen_addr.or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            database_url: env_config.database_url.or(file_config.database_url)
                .unwrap_or_else(default_database_url),
            jwt_secret: env_config.jwt_secret.or(file_config.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            settings_encryption_key: env_config.settings_encryption_key.or(file_config.settings_encryption_key)
                .unwrap_or_else(default_settings_key),
            log_dir: env_config.log_dir.or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            lookup_timeout_secs: env_config.lookup_timeout_secs.or(file_config.lookup_timeout_secs)
                .unwrap_or_else(default_lookup_timeout_secs),
            frontend_url: env_config.frontend_url.or(file_config.frontend_url),
            admin_username: env_config.admin_username.or(file_config.admin_username),
            admin_password: env_config.admin_password.or(file_config.admin_password),
        };

        if final_config.lookup_timeout_secs == 0 {
            return Err("LOOKUP_TIMEOUT_SECS must be greater than zero".to_string());
        }

        Ok(final_config)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}
