use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use dotenvy::dotenv;
use serde::Serialize;

use crate::auth::store::default_storage_path;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CIRCUIT_FAILURES: u32 = 3;
pub const DEFAULT_CIRCUIT_RESET_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub api_url: String,
    pub storage_path: PathBuf,
    pub page_size: usize,
    pub http_timeout_secs: u64,
    pub circuit_failures: u32,
    pub circuit_reset_secs: u64,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CRM_API_URL")
            .filter(|value| !value.trim().is_empty())
            .context("CRM_API_URL must be set")?;
        url::Url::parse(&api_url)
            .with_context(|| format!("CRM_API_URL is not a valid URL: {}", api_url))?;

        let storage_path = match lookup("CRM_STORAGE_PATH").filter(|value| !value.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_storage_path()
                .context("cannot locate a home directory; set CRM_STORAGE_PATH")?,
        };

        let page_size = parse_or("CRM_PAGE_SIZE", lookup("CRM_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            anyhow::bail!("CRM_PAGE_SIZE must be at least 1");
        }

        Ok(Config {
            api_url,
            storage_path,
            page_size,
            http_timeout_secs: parse_or(
                "CRM_HTTP_TIMEOUT_SECS",
                lookup("CRM_HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            circuit_failures: parse_or(
                "CRM_CIRCUIT_FAILURES",
                lookup("CRM_CIRCUIT_FAILURES"),
                DEFAULT_CIRCUIT_FAILURES,
            )?,
            circuit_reset_secs: parse_or(
                "CRM_CIRCUIT_RESET_SECS",
                lookup("CRM_CIRCUIT_RESET_SECS"),
                DEFAULT_CIRCUIT_RESET_SECS,
            )?,
            log_format: lookup("LOG_FORMAT")
                .map(|value| value.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, value)),
        None => Ok(default),
    }
}
