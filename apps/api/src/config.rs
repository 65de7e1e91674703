use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_COMPLETION_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4";
const CONVERTER_BINARY: &str = "wkhtmltopdf";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or the converter cannot be resolved.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub completion_api_url: String,
    pub completion_model: String,
    pub completion_timeout: Duration,
    pub wkhtmltopdf_path: PathBuf,
    pub render_timeout: Duration,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub session_idle_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            completion_api_url: optional_env("COMPLETION_API_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_API_URL.to_string()),
            completion_model: optional_env("COMPLETION_MODEL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            completion_timeout: secs_env("COMPLETION_TIMEOUT_SECS", 120)?,
            wkhtmltopdf_path: resolve_converter(optional_env("WKHTMLTOPDF_PATH"))?,
            render_timeout: secs_env("RENDER_TIMEOUT_SECS", 60)?,
            template_dir: optional_env("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("html_templates")),
            output_dir: optional_env("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("generated")),
            session_idle_ttl: secs_env("SESSION_IDLE_TTL_SECS", 3600)?,
            session_sweep_interval: nonzero(secs_env("SESSION_SWEEP_INTERVAL_SECS", 300)?)
                .context("SESSION_SWEEP_INTERVAL_SECS must be greater than zero")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Resolves the HTML→PDF converter binary: an explicit path wins, otherwise
/// `wkhtmltopdf` is looked up on `PATH`.
pub fn resolve_converter(explicit: Option<String>) -> Result<PathBuf> {
    match explicit {
        Some(path) => {
            let path = PathBuf::from(path);
            if !path.is_file() {
                anyhow::bail!(
                    "WKHTMLTOPDF_PATH points to '{}', which is not a file",
                    path.display()
                );
            }
            Ok(path)
        }
        None => which::which(CONVERTER_BINARY).with_context(|| {
            format!(
                "'{CONVERTER_BINARY}' was not found on PATH; install it or set WKHTMLTOPDF_PATH"
            )
        }),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn secs_env(key: &str, default: u64) -> Result<Duration> {
    let secs = match optional_env(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

fn nonzero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}
