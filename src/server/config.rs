use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Marks the session cookie `Secure`. Only enable behind TLS.
    #[serde(default)]
    pub cookie_secure: bool,

    /// Account created at startup when both seed fields are set.
    #[serde(default)]
    pub seed_user_email: Option<String>,
    #[serde(default)]
    pub seed_user_password: Option<String>,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    max_connections: Option<u32>,
    listen_addr: Option<String>,
    jwt_secret: Option<String>,
    token_ttl_hours: Option<i64>,
    bcrypt_cost: Option<u32>,
    log_dir: Option<String>,
    cookie_secure: Option<bool>,
    seed_user_email: Option<String>,
    seed_user_password: Option<String>,
}

fn default_database_url() -> String {
    "sqlite://journal.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24 * 7
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) => read_config_file(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        merge(env_config, file_config)
    }
}

fn read_config_file(path: &Path) -> Result<PartialServerConfig, String> {
    if !path.exists() {
        return Ok(PartialServerConfig::default());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
    toml::from_str(&contents)
        .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
}

fn merge(
    env_config: PartialServerConfig,
    file_config: PartialServerConfig,
) -> Result<ServerConfig, String> {
    let config = ServerConfig {
        database_url: env_config.database_url.or(file_config.database_url)
            .unwrap_or_else(default_database_url),
        max_connections: env_config.max_connections.or(file_config.max_connections)
            .unwrap_or_else(default_max_connections),
        listen_addr: env_config.listen_addr.or(file_config.listen_addr)
            .unwrap_or_else(default_listen_addr),
        jwt_secret: env_config.jwt_secret.or(file_config.jwt_secret)
            .ok_or("JWT_SECRET is required")?,
        token_ttl_hours: env_config.token_ttl_hours.or(file_config.token_ttl_hours)
            .unwrap_or_else(default_token_ttl_hours),
        bcrypt_cost: env_config.bcrypt_cost.or(file_config.bcrypt_cost)
            .unwrap_or_else(default_bcrypt_cost),
        log_dir: env_config.log_dir.or(file_config.log_dir)
            .unwrap_or_else(default_log_dir),
        cookie_secure: env_config.cookie_secure.or(file_config.cookie_secure)
            .unwrap_or(false),
        seed_user_email: env_config.seed_user_email.or(file_config.seed_user_email),
        seed_user_password: env_config.seed_user_password.or(file_config.seed_user_password),
    };

    if config.max_connections == 0 {
        return Err("MAX_CONNECTIONS must be at least 1".to_string());
    }
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&config.bcrypt_cost) {
        return Err(format!(
            "BCRYPT_COST must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"
        ));
    }
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&config.token_ttl_hours) {
        return Err(format!(
            "TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}"
        ));
    }

    Ok(config)
}
