use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

/// Course categories served by the catalog.
pub const COURSE_CATEGORIES: &[&str] = &[
    "Quran Studies",
    "Fiqh & Jurisprudence",
    "Islamic History",
    "Hadith & Sunnah",
    "Arabic Language",
    "Theology & Philosophy",
    "Islamic Ethics",
    "Spirituality & Sufism",
    "Comparative Religion",
    "Islamic Finance",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// Lifetime of a login session token, in hours.
    pub session_ttl_hours: i64,
    /// Fallback preview window (seconds) when neither the subsection nor the
    /// course declares one.
    pub default_preview_duration: u32,
    pub public_rps: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            session_ttl_hours: get_env_parse("SESSION_TTL_HOURS")?,
            default_preview_duration: get_env_parse("DEFAULT_PREVIEW_DURATION")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
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
