//! Service settings from an optional YAML file and the environment.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, environment
//! variables.
//!
//! # Example Config (YAML)
//!
//! ```yaml
//! port: 3020
//! vestaboard:
//!   api_key: "key"
//!   api_secret: "secret"
//! sayings:
//!   enabled: true
//!   host: "db.local"
//!   user: "sayings"
//!   password: "hunter2"
//!   name: "sayings"
//! transit:
//!   app_id: "abc"
//!   api_key: "def"
//! ```
//!
//! # Environment
//!
//! | Variable | Setting |
//! |---|---|
//! | `PORT` | `port` |
//! | `VESTABOARD_API_KEY` | `vestaboard.api_key` |
//! | `VESTABOARD_API_SECRET` | `vestaboard.api_secret` |
//! | `VESTABOARD_SUB_ID` | `vestaboard.subscription_id` |
//! | `SAYING_DB_ENABLE` | `sayings.enabled` (`"1"` enables) |
//! | `SAYING_DB_USER` / `SAYING_DB_PASS` | `sayings.user` / `sayings.password` |
//! | `SAYING_DB_HOST` / `SAYING_DB_PORT` | `sayings.host` / `sayings.port` |
//! | `SAYING_DB_NAME` | `sayings.name` |
//! | `OCTRANSPO_APPID` / `OCTRANSPO_APIKEY` | `transit.app_id` / `transit.api_key` |

use std::path::Path;

use serde::Deserialize;

use crate::Error;

/// Top-level service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address to bind the HTTP server to
    pub host: String,
    /// Port to bind the HTTP server to
    pub port: u16,
    /// Vestaboard credentials
    pub vestaboard: VestaboardSettings,
    /// Sayings database
    pub sayings: DatabaseSettings,
    /// OC Transpo API credentials
    pub transit: TransitSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3020,
            vestaboard: VestaboardSettings::default(),
            sayings: DatabaseSettings::default(),
            transit: TransitSettings::default(),
        }
    }
}

/// Vestaboard platform credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VestaboardSettings {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Skip the subscription lookup when already known
    pub subscription_id: Option<String>,
    pub base_url: String,
}

impl Default for VestaboardSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            subscription_id: None,
            base_url: crate::vestaboard::API_BASE_URL.to_string(),
        }
    }
}

/// MySQL connection details for the sayings tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub enabled: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: u16,
    pub name: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            user: None,
            password: None,
            host: None,
            port: 3306,
            name: None,
        }
    }
}

/// OC Transpo API credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransitSettings {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for TransitSettings {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            base_url: crate::transit::API_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings: the YAML file at `path` if given, then the process
    /// environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_yaml(&content)?
            }
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Parse settings from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(format!("Invalid config YAML: {}", e)))
    }

    /// Overlay values from an environment lookup.
    ///
    /// Takes the lookup as a function so tests don't touch the real
    /// process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = parse_port("PORT", &port)?;
        }

        let vb = &mut self.vestaboard;
        overlay(&mut vb.api_key, lookup("VESTABOARD_API_KEY"));
        overlay(&mut vb.api_secret, lookup("VESTABOARD_API_SECRET"));
        overlay(&mut vb.subscription_id, lookup("VESTABOARD_SUB_ID"));

        let db = &mut self.sayings;
        if let Some(enable) = lookup("SAYING_DB_ENABLE") {
            db.enabled = enable.trim() == "1";
        }
        overlay(&mut db.user, lookup("SAYING_DB_USER"));
        overlay(&mut db.password, lookup("SAYING_DB_PASS"));
        overlay(&mut db.host, lookup("SAYING_DB_HOST"));
        overlay(&mut db.name, lookup("SAYING_DB_NAME"));
        if let Some(port) = lookup("SAYING_DB_PORT") {
            db.port = parse_port("SAYING_DB_PORT", &port)?;
        }

        overlay(&mut self.transit.app_id, lookup("OCTRANSPO_APPID"));
        overlay(&mut self.transit.api_key, lookup("OCTRANSPO_APIKEY"));

        Ok(())
    }

    /// Socket address string for the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn overlay(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *slot = Some(value);
    }
}

fn parse_port(var: &str, value: &str) -> Result<u16, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{var} must be a port number, got '{value}'")))
}
