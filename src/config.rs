//! Configuration management for the EAM OCR server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ocr::ReadingOrder;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Worker executable
    pub engine_program: String,
    /// Arguments passed before `--lang`
    pub engine_args: Vec<String>,
    pub lang: String,
    pub engine_timeout_secs: u64,
    pub engine_init_timeout_secs: u64,
    pub reading_order: ReadingOrder,
    /// Where uploads are staged; system temp dir when unset
    pub temp_dir: Option<PathBuf>,
    /// Start the engine at boot instead of on the first request
    pub warm_up: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid OCR_READING_ORDER: {0}")]
    ReadingOrder(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                max_upload_bytes: 50 * 1024 * 1024,
            },
            ocr: OcrConfig {
                engine_program: "python3".to_string(),
                engine_args: vec!["scripts/paddle_ocr_worker.py".to_string()],
                lang: "en".to_string(),
                engine_timeout_secs: 120,
                engine_init_timeout_secs: 600,
                reading_order: ReadingOrder::Global,
                temp_dir: None,
                warm_up: false,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes),
            },
            ocr: OcrConfig {
                engine_program: env::var("OCR_ENGINE_PROGRAM")
                    .unwrap_or(defaults.ocr.engine_program),
                engine_args: env::var("OCR_ENGINE_ARGS")
                    .map(|args| args.split_whitespace().map(str::to_string).collect())
                    .unwrap_or(defaults.ocr.engine_args),
                lang: env::var("OCR_LANG").unwrap_or(defaults.ocr.lang),
                engine_timeout_secs: parse_var(
                    "OCR_ENGINE_TIMEOUT_SECS",
                    defaults.ocr.engine_timeout_secs,
                ),
                engine_init_timeout_secs: parse_var(
                    "OCR_ENGINE_INIT_TIMEOUT_SECS",
                    defaults.ocr.engine_init_timeout_secs,
                ),
                reading_order: match env::var("OCR_READING_ORDER") {
                    Ok(value) => value.parse().map_err(ConfigError::ReadingOrder)?,
                    Err(_) => defaults.ocr.reading_order,
                },
                temp_dir: env::var("OCR_TEMP_DIR").ok().map(PathBuf::from),
                warm_up: parse_var("OCR_WARM_UP", defaults.ocr.warm_up),
            },
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}='{}', using default", name, value);
            default
        }),
        Err(_) => default,
    }
}
