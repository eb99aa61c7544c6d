use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub app_name: String,
    pub app_env: String,
    pub database_url: String,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub llm_provider: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub rate_limit_window_seconds: u64,
    pub rate_limit_max_calls: usize,
    pub rate_limit_paths: Vec<String>,
    pub max_quiz_items: usize,
    pub summary_cache_capacity: usize,
    pub max_upload_mb: usize,
    pub static_dir: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8000"),
            app_name: get_env_or("APP_NAME", "Assistente de Redação PT-BR"),
            app_env: get_env_or("APP_ENV", "dev"),
            database_url: get_env("DATABASE_URL")?,
            secret_key: get_env("SECRET_KEY")?,
            access_token_expire_minutes: get_env_parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 120)?,
            llm_provider: get_env_or("LLM_PROVIDER", "openai").to_lowercase(),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            openai_base_url: get_env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            llm_model: get_env_or("LLM_MODEL", "gpt-4.1-mini"),
            llm_timeout_secs: get_env_parse_or("LLM_TIMEOUT_SECS", 60)?,
            rate_limit_window_seconds: get_env_parse_or("RATE_LIMIT_WINDOW_SECONDS", 60)?,
            rate_limit_max_calls: get_env_parse_or("RATE_LIMIT_MAX_CALLS", 30)?,
            rate_limit_paths: parse_prefixes(&get_env_or("RATE_LIMIT_PATHS", "/tools,/upload,/tutor")),
            max_quiz_items: get_env_parse_or("MAX_QUIZ_ITEMS", 30)?,
            summary_cache_capacity: get_env_parse_or("SUMMARY_CACHE_CAPACITY", 256)?,
            max_upload_mb: get_env_parse_or("MAX_UPLOAD_MB", 10)?,
            static_dir: get_env_or("STATIC_DIR", "./static"),
        })
    }

    /// The gateway only talks to a live provider when both of these hold.
    pub fn llm_live(&self) -> bool {
        self.llm_provider == "openai" && self.openai_api_key.is_some()
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
