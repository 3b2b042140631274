//! Runtime configuration
//!
//! Values come from the process environment (after `.env` is loaded).
//! The backend URL also decides which environment we are talking to,
//! which drives timeouts, progress messages and the entitlement strategy.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_MOCK_LATENCY_MS: u64 = 800;

/// Deployment the backend URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    /// Loopback and private-LAN hosts are development targets
    pub fn detect(base_url: &str) -> Self {
        let host = reqwest::Url::parse(base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_matches(['[', ']']).to_string()));

        let Some(host) = host else {
            return Self::Development;
        };

        if host.eq_ignore_ascii_case("localhost") || host.ends_with(".local") {
            return Self::Development;
        }

        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) if ip.is_loopback() || ip.is_private() || ip.is_link_local() => {
                Self::Development
            }
            Ok(IpAddr::V6(ip)) if ip.is_loopback() => Self::Development,
            _ => Self::Production,
        }
    }

    /// Hard deadline for one proxy call
    pub fn request_timeout(&self) -> Duration {
        match self {
            Self::Production => Duration::from_secs(120),
            Self::Development => Duration::from_secs(60),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Which entitlement source backs purchases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementMode {
    /// Canned successes with simulated latency
    Mock,
    /// Platform store bridge injected by the host app
    Store,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub environment: Environment,
    pub text_model: String,
    pub image_model: String,
    pub data_dir: PathBuf,
    pub entitlements: EntitlementMode,
    pub mock_latency: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_url = std::env::var("FITSWAP_BACKEND_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let backend_url = backend_url.trim_end_matches('/').to_string();

        if reqwest::Url::parse(&backend_url).is_err() {
            return Err(ConfigError::Invalid {
                key: "FITSWAP_BACKEND_URL",
                value: backend_url,
            });
        }

        let environment = Environment::detect(&backend_url);

        let data_dir = match std::env::var("FITSWAP_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .map(|d| d.join("fitswap"))
                .ok_or(ConfigError::NoDataDir)?,
        };

        let entitlements = match std::env::var("FITSWAP_ENTITLEMENTS") {
            Ok(v) => match v.to_lowercase().as_str() {
                "mock" => EntitlementMode::Mock,
                "store" => EntitlementMode::Store,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "FITSWAP_ENTITLEMENTS",
                        value: v,
                    })
                }
            },
            Err(_) if environment.is_production() => EntitlementMode::Store,
            Err(_) => EntitlementMode::Mock,
        };

        let mock_latency_ms = std::env::var("FITSWAP_MOCK_LATENCY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MOCK_LATENCY_MS);

        Ok(Self {
            backend_url,
            environment,
            text_model: std::env::var("FITSWAP_TEXT_MODEL")
                .unwrap_or_else(|_| DEFAULT_TEXT_MODEL.into()),
            image_model: std::env::var("FITSWAP_IMAGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.into()),
            data_dir,
            entitlements,
            mock_latency: Duration::from_millis(mock_latency_ms),
        })
    }

    /// Config pointing at `backend_url` with defaults everywhere else
    pub fn for_backend(backend_url: &str, data_dir: PathBuf) -> Self {
        let environment = Environment::detect(backend_url);
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            environment,
            text_model: DEFAULT_TEXT_MODEL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            data_dir,
            entitlements: EntitlementMode::Mock,
            mock_latency: Duration::ZERO,
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    pub fn profiles_db_path(&self) -> PathBuf {
        self.data_dir.join("profiles.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_development_hosts() {
        for url in [
            "http://localhost:3001",
            "http://127.0.0.1:3001",
            "http://192.168.0.12:3001",
            "http://10.0.2.2:3001",
            "http://172.20.1.5",
            "http://[::1]:3001",
        ] {
            assert_eq!(Environment::detect(url), Environment::Development, "{}", url);
        }
    }

    #[test]
    fn test_detect_production_hosts() {
        assert_eq!(
            Environment::detect("https://fitswap-backend.onrender.com"),
            Environment::Production
        );
        assert_eq!(Environment::detect("https://8.8.8.8"), Environment::Production);
    }

    #[test]
    fn test_timeouts() {
        assert_eq!(Environment::Production.request_timeout(), Duration::from_secs(120));
        assert_eq!(Environment::Development.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_for_backend_trims_slash() {
        let config = AppConfig::for_backend("https://api.fitswap.app/", PathBuf::from("/tmp/x"));
        assert_eq!(config.backend_url, "https://api.fitswap.app");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.images_dir(), PathBuf::from("/tmp/x/images"));
    }
}
