use std::env;

use anyhow::Context;
use config::{Config, Environment, File};
use doctrack_common::DatabaseSettings;
use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_port: String,
    pub database: DatabaseSettings,
    pub uploads: UploadSettings,
    pub security: SecuritySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    pub directory: String,
    /// Upper bound for a whole multipart request
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecuritySettings {
    /// PBKDF2 rounds for passwords set through the API
    pub password_rounds: u32,
}

impl Settings {
    /// `config/default.yaml`, then `config/{RUN_MODE}.yaml`, then `APP__*`
    /// environment variables, e.g. `APP__DATABASE__URL`
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let run_mode = load_env("RUN_MODE", "development");

        let s = Config::builder()
            .add_source(File::with_name("./config/default"))
            .add_source(File::with_name(&format!("./config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("app").prefix_separator("__").separator("__"))
            .build()?;

        s.try_deserialize().with_context(|| "failed to read config")
    }
}

fn load_env(key: &str, default_value: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.into())
}
