//! Runtime configuration read from the environment (and an optional `.env`).

use common::engine::{FormatPolicy, MonetaryStyle};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which engine turns the page shell into PDF bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfEngineKind {
    /// In-process layout with genpdf.
    Builtin,
    /// Headless Chromium `--print-to-pdf`.
    Chromium,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub files_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub pdf_engine: PdfEngineKind,
    pub chromium_path: PathBuf,
    pub pdf_timeout: Duration,
    pub watermark_text: String,
    pub format_policy: FormatPolicy,
    pub mercado_pago_token: Option<String>,
    pub public_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from("minuta.sqlite"),
            files_dir: PathBuf::from("./template_files"),
            fonts_dir: PathBuf::from("./fonts"),
            font_family: "LiberationSans".to_string(),
            pdf_engine: PdfEngineKind::Builtin,
            chromium_path: PathBuf::from("chromium"),
            pdf_timeout: Duration::from_secs(30),
            watermark_text: "PRÉ VISUALIZAÇÃO".to_string(),
            format_policy: FormatPolicy::default(),
            mercado_pago_token: None,
            public_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("MINUTA_PORT") {
            Some(v) => v.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "MINUTA_PORT",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };

        let pdf_engine = match var("MINUTA_PDF_ENGINE").as_deref() {
            None | Some("builtin") => PdfEngineKind::Builtin,
            Some("chromium") => PdfEngineKind::Chromium,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "MINUTA_PDF_ENGINE",
                    value: other.to_string(),
                    reason: "expected 'builtin' or 'chromium'".to_string(),
                })
            }
        };

        let pdf_timeout = match var("MINUTA_PDF_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "MINUTA_PDF_TIMEOUT_SECS",
                value: v.clone(),
                reason: e.to_string(),
            })?),
            None => defaults.pdf_timeout,
        };

        let monetary = match var("MINUTA_MONETARY_STYLE").as_deref() {
            None | Some("masked") => MonetaryStyle::Masked,
            Some("currency") => MonetaryStyle::Currency,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "MINUTA_MONETARY_STYLE",
                    value: other.to_string(),
                    reason: "expected 'masked' or 'currency'".to_string(),
                })
            }
        };

        Ok(Config {
            host: var("MINUTA_HOST").unwrap_or(defaults.host),
            port,
            database_path: var("MINUTA_DATABASE")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            files_dir: var("MINUTA_FILES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.files_dir),
            fonts_dir: var("MINUTA_FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.fonts_dir),
            font_family: var("MINUTA_FONT_FAMILY").unwrap_or(defaults.font_family),
            pdf_engine,
            chromium_path: var("MINUTA_CHROMIUM_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.chromium_path),
            pdf_timeout,
            watermark_text: var("MINUTA_WATERMARK_TEXT").unwrap_or(defaults.watermark_text),
            format_policy: FormatPolicy { monetary },
            mercado_pago_token: var("MERCADO_PAGO_ACCESS_TOKEN"),
            public_url: var("MINUTA_PUBLIC_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_url),
        })
    }
}
