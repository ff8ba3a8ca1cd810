// Runtime configuration
//
// Layered with the `config` crate: built-in defaults, then an optional
// `explorer-wizard.toml`, then `EXPLORER_WIZARD_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::utils::path_resolver;

pub const DEFAULT_API_BASE_URL: &str = "https://api.explorercircle.travel/api";
pub const DEFAULT_WHATSAPP_NUMBER: &str = "256700000000";
pub const ENV_PREFIX: &str = "EXPLORER_WIZARD";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    /// International format without `+`, as wa.me expects.
    pub whatsapp_number: String,
    pub request_timeout_secs: u64,
    pub min_start_lead_days: i64,
    pub typing_delay_ms: u64,
    pub completion_delay_ms: u64,
    pub max_upload_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
            request_timeout_secs: 30,
            min_start_lead_days: 20,
            typing_delay_ms: 800,
            completion_delay_ms: 1500,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        let base = url::Url::parse(self.api_base_url.trim())
            .with_context(|| format!("api_base_url is not a valid URL: {}", self.api_base_url))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(anyhow::anyhow!("api_base_url must use http or https"));
        }
        if self.whatsapp_number.is_empty()
            || !self.whatsapp_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(anyhow::anyhow!(
                "whatsapp_number must contain digits only (international format, no '+')"
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than zero"));
        }
        if self.min_start_lead_days < 0 {
            return Err(anyhow::anyhow!("min_start_lead_days cannot be negative"));
        }
        Ok(())
    }
}

/// Load configuration from the resolved config file (if any) and the environment.
pub fn load() -> Result<AppConfig> {
    let file = path_resolver::resolve_config_file();
    build(file.as_deref(), true)
}

/// Load configuration from an explicit file, still honouring environment overrides.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    build(Some(path), true)
}

fn build(file: Option<&Path>, with_env: bool) -> Result<AppConfig> {
    let d = AppConfig::default();
    let mut builder = Config::builder()
        .set_default("api_base_url", d.api_base_url.clone())?
        .set_default("whatsapp_number", d.whatsapp_number.clone())?
        .set_default("request_timeout_secs", d.request_timeout_secs as i64)?
        .set_default("min_start_lead_days", d.min_start_lead_days)?
        .set_default("typing_delay_ms", d.typing_delay_ms as i64)?
        .set_default("completion_delay_ms", d.completion_delay_ms as i64)?
        .set_default("max_upload_bytes", d.max_upload_bytes as i64)?;

    if let Some(path) = file {
        builder = builder.add_source(File::from(path).required(true));
    }
    if with_env {
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
    }

    let mut cfg: AppConfig = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;
    cfg.validate()?;

    cfg.api_base_url = cfg.api_base_url.trim().trim_end_matches('/').to_string();
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explorer-wizard.toml");
        std::fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn defaults_apply_without_file() {
        let cfg = build(None, false).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn file_overrides_defaults_and_trims_base_url() {
        let (_dir, path) = write_config(
            "api_base_url = \"http://localhost:8080/api/\"\nmin_start_lead_days = 30\n",
        );
        let cfg = build(Some(&path), false).unwrap();
        assert_eq!(cfg.api_base_url, "http://localhost:8080/api");
        assert_eq!(cfg.min_start_lead_days, 30);
        assert_eq!(cfg.typing_delay_ms, 800);
    }

    #[test]
    fn invalid_whatsapp_number_is_rejected() {
        let (_dir, path) = write_config("whatsapp_number = \"+256 700\"\n");
        let err = build(Some(&path), false).unwrap_err();
        assert!(format!("{:#}", err).contains("whatsapp_number"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let (_dir, path) = write_config("api_base_url = \"not a url\"\n");
        assert!(build(Some(&path), false).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let (_dir, path) = write_config("request_timeout_secs = 0\n");
        assert!(build(Some(&path), false).is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(build(Some(&missing), false).is_err());
    }
}
