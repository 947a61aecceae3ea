use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ReciboError;

/// Top-level recibo configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub company: CompanyConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// WhatsApp Cloud API credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Graph API base URL, without trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bearer token for the Cloud API.
    #[serde(default)]
    pub access_token: String,
    /// The business phone number id messages are sent from.
    #[serde(default)]
    pub phone_number_id: String,
    /// Token Meta echoes back on webhook verification.
    #[serde(default)]
    pub verify_token: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: String::new(),
            phone_number_id: String::new(),
            verify_token: String::new(),
        }
    }
}

/// Relational store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Remote FTP archive config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Base directory on the server holding the bucket directories.
    #[serde(default)]
    pub base_dir: String,
    /// Connect timeout in seconds for each fresh session.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_ftp_port(),
            user: String::new(),
            password: String::new(),
            base_dir: String::new(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ArchiveConfig {
    /// Whether the minimum credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.user.is_empty() && !self.password.is_empty()
    }
}

/// Inbound webhook HTTP server config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_webhook_host")]
    pub host: String,
    #[serde(default = "default_webhook_port")]
    pub port: u16,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: default_webhook_host(),
            port: default_webhook_port(),
        }
    }
}

/// Company details interpolated into menu texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyConfig {
    #[serde(default = "default_company_name")]
    pub name: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub email: String,
    /// Human-resources phone line.
    #[serde(default)]
    pub hr_line: String,
    /// Accounting phone line, shown when a receipt cannot be delivered.
    #[serde(default)]
    pub accounting_line: String,
    #[serde(default)]
    pub safety_line: String,
    #[serde(default)]
    pub pqrs_url: String,
    #[serde(default)]
    pub pqrs_email: String,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            name: default_company_name(),
            website: String::new(),
            email: String::new(),
            hr_line: String::new(),
            accounting_line: String::new(),
            safety_line: String::new(),
            pqrs_url: String::new(),
            pqrs_email: String::new(),
        }
    }
}

fn default_name() -> String {
    "recibo".to_string()
}

fn default_data_dir() -> String {
    "~/.recibo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

fn default_db_path() -> String {
    "~/.recibo/data/recibo.db".to_string()
}

fn default_ftp_port() -> u16 {
    21
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_webhook_host() -> String {
    "0.0.0.0".to_string()
}

fn default_webhook_port() -> u16 {
    8080
}

fn default_company_name() -> String {
    "la empresa".to_string()
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, ReciboError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ReciboError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| ReciboError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let cfg = load("/nonexistent/recibo.toml").unwrap();
        assert_eq!(cfg.webhook.port, 8080);
        assert_eq!(cfg.archive.port, 21);
        assert!(!cfg.archive.is_configured());
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: Config = toml::from_str(
            r#"
            [whatsapp]
            access_token = "tok"
            phone_number_id = "12345"

            [archive]
            host = "ftp.example.com"
            user = "u"
            password = "p"
            base_dir = "/public_html/receipts"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.whatsapp.phone_number_id, "12345");
        assert!(cfg.archive.is_configured());
        assert_eq!(cfg.archive.connect_timeout_secs, 30);
        assert_eq!(cfg.store.db_path, "~/.recibo/data/recibo.db");
    }

    #[test]
    fn shellexpand_home() {
        std::env::set_var("HOME", "/home/test");
        assert_eq!(shellexpand("~/x.db"), "/home/test/x.db");
        assert_eq!(shellexpand("/abs/x.db"), "/abs/x.db");
    }
}
