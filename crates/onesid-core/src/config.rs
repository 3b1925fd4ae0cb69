//! Client configuration shared by the API client and front-ends.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown auth mode {0:?} (expected \"bearer\" or \"cookie\")")]
    UnknownAuthMode(String),
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// How the client proves its identity to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// `Authorization: Bearer <token>` from the persisted session.
    #[default]
    Bearer,
    /// Session cookie kept in the client's cookie jar.
    Cookie,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" | "token" => Ok(Self::Bearer),
            "cookie" | "cookies" => Ok(Self::Cookie),
            _ => Err(ConfigError::UnknownAuthMode(s.to_string())),
        }
    }
}

/// Backend routes, relative to the base URL. Paths moved between backend
/// releases, so each one can be overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routes {
    pub login: String,
    pub logout: String,
    pub profile: String,
    pub painel: String,
    pub historico: String,
    pub submit_batch: String,
    pub add_process: String,
    pub run_monitoring: String,
    pub acknowledge: String,
    pub relevant_items: String,
    pub preferences: String,
    pub users: String,
    pub export_excel: String,
    pub export_json: String,
    pub import_items: String,
    pub import_legal_one: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            login: "/login".into(),
            logout: "/logout".into(),
            profile: "/profile".into(),
            painel: "/painel".into(),
            historico: "/historico".into(),
            submit_batch: "/add-and-run".into(),
            add_process: "/add-process".into(),
            run_monitoring: "/run-monitoring".into(),
            acknowledge: "/dar-ciencia".into(),
            relevant_items: "/itens-relevantes".into(),
            preferences: "/preferencias-usuario".into(),
            users: "/users".into(),
            export_excel: "/export-excel".into(),
            export_json: "/export-json".into(),
            import_items: "/importar-itens".into(),
            import_legal_one: "/import-legal-one".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth: AuthMode,
    pub timeout_secs: u64,
    pub routes: Routes,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            auth: AuthMode::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            routes: Routes::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
