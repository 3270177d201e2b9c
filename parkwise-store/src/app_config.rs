use parkwise_shared::Masked;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Masked<String>,
    pub jwt_expiration_seconds: u64,
}

/// Default admin account created on first start when no admin exists.
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapConfig {
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: Masked<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `PARKWISE__SERVER__PORT=9000` overrides `server.port`
            .add_source(config::Environment::with_prefix("PARKWISE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
