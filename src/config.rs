use crate::error::{GatewayError, Result};
use crate::models::ModelMapping;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "deepseek-gateway.toml";
const APP_DIR_NAME: &str = "deepseek-gateway";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Caller-facing model used when a request names none.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Return upstream JSON untouched instead of reshaping it.
    #[serde(default)]
    pub raw_response: bool,
    /// Extra caller → upstream aliases on top of the built-in ones.
    #[serde(default)]
    pub models: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_completions_path")]
    pub completions_path: String,
    /// Idle read timeout for the upstream connection, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    6000
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_completions_path() -> String {
    "/chat/completions".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            completions_path: default_completions_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upstream: UpstreamConfig::default(),
            default_model: default_model(),
            raw_response: false,
            models: HashMap::new(),
        }
    }
}

impl GatewayConfig {
    /// Load config from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Search standard locations for a config file, falling back to defaults.
    /// Priority: CLI arg > CWD > XDG config > home dir
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(&candidate);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.upstream.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(GatewayError::config(format!(
                "upstream.base_url must be an http(s) URL, got '{}'",
                self.upstream.base_url
            )));
        }
        if self.default_model.trim().is_empty() {
            return Err(GatewayError::config("default_model must not be empty"));
        }
        Ok(())
    }

    /// Full URL of the upstream chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/{}",
            self.upstream.base_url.trim_end_matches('/'),
            self.upstream.completions_path.trim_start_matches('/')
        )
    }

    pub fn model_mapping(&self) -> ModelMapping {
        ModelMapping::new(&self.models)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // CWD
    paths.push(PathBuf::from(CONFIG_FILE_NAME));

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join(APP_DIR_NAME).join("config.toml"));
    }
    if let Some(home) = home_dir() {
        paths.push(home.join(".config").join(APP_DIR_NAME).join("config.toml"));
        paths.push(home.join(format!(".{}", CONFIG_FILE_NAME)));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
port = 7000
default_model = "deepseek-reasoner"
raw_response = true

[upstream]
base_url = "http://localhost:9999/v1/"

[models]
"gpt-4o" = "deepseek-chat"
"#
        )
        .unwrap();

        let config = GatewayConfig::load(f.path()).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.default_model, "deepseek-reasoner");
        assert!(config.raw_response);
        assert_eq!(config.upstream.timeout_secs, 300);
        assert_eq!(
            config.completions_url(),
            "http://localhost:9999/v1/chat/completions"
        );
        assert_eq!(config.model_mapping().to_upstream("gpt-4o"), "deepseek-chat");
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.port, 6000);
        assert_eq!(config.default_model, "gpt-3.5-turbo");
        assert!(!config.raw_response);
        assert_eq!(
            config.completions_url(),
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(config.bind_addr(), "0.0.0.0:6000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let f = NamedTempFile::new().unwrap();
        let config = GatewayConfig::load(f.path()).unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.upstream.base_url, "https://api.deepseek.com/v1");
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "[upstream]\nbase_url = \"ftp://example.com\"").unwrap();

        let err = GatewayConfig::load(f.path()).unwrap_err();
        assert!(matches!(err, GatewayError::Config { .. }));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let err = GatewayConfig::find_and_load(Some(Path::new("/nonexistent/gw.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
