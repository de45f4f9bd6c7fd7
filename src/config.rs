use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub editor: EditorConfig,
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the tenant backend API; the in-memory seed backend is used when unset
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Tenant sites kept in the cache before the oldest is evicted
    pub max_cached_tenants: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Idle time after which a live-editor session is dropped
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory served under `/assets`
    pub dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 10,
            max_cached_tenants: crate::store::tenant_cache::DEFAULT_MAX_TENANTS,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // Environment variables such as SITE_BACKEND__BASE_URL
        config = config.add_source(
            config::Environment::with_prefix("SITE")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Backend base URL from config, falling back to `BACKEND_URL`
    pub fn backend_url(&self) -> Option<String> {
        self.backend
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| std::env::var("BACKEND_URL").ok())
            .map(|url| url.trim_end_matches('/').to_string())
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:3001");
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.backend.max_cached_tenants, 1024);
        assert_eq!(config.editor.session_ttl_secs, 3600);
    }

    #[test]
    fn backend_url_is_normalized() {
        let mut config = AppConfig::default();
        config.backend.base_url = Some("https://api.example.com/".to_string());
        assert_eq!(config.backend_url().as_deref(), Some("https://api.example.com"));
    }
}
