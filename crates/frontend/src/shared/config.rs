use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    /// Явный адрес backend. Если не задан, берётся хост текущей страницы и `port`.
    #[serde(default)]
    pub base_url: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AuthConfig {
    pub login_path: String,
    pub refresh_path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Default configuration embedded in the bundle
const DEFAULT_CONFIG: &str = r#"
[api]
port = 3000

[auth]
login_path = "/login"
refresh_path = "/api/system/auth/refresh"
"#;

/// localStorage key holding an optional TOML override
const CONFIG_STORAGE_KEY: &str = "app_config";

impl AppConfig {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolve the API base URL, falling back to the page host.
    pub fn api_base(&self) -> String {
        if let Some(base) = self.api.base_url.as_deref() {
            return base.trim_end_matches('/').to_string();
        }
        super::api_utils::api_base_for_port(self.api.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: None,
                port: 3000,
            },
            auth: AuthConfig {
                login_path: "/login".to_string(),
                refresh_path: "/api/system/auth/refresh".to_string(),
            },
        }
    }
}

/// Load configuration
///
/// Search order:
/// 1. TOML document in localStorage under `app_config` (for ops overrides)
/// 2. Falls back to embedded default config
pub fn load_config() -> AppConfig {
    if let Some(contents) = stored_override() {
        match AppConfig::parse(&contents) {
            Ok(config) => {
                log::info!("Loaded config override from localStorage");
                return config;
            }
            Err(e) => log::warn!("Ignoring config override: {}", e),
        }
    }

    log::debug!("Using default embedded configuration");
    AppConfig::parse(DEFAULT_CONFIG).unwrap_or_else(|e| {
        log::error!("Embedded config is broken: {}", e);
        AppConfig::default()
    })
}

fn stored_override() -> Option<String> {
    web_sys::window()?
        .local_storage()
        .ok()??
        .get_item(CONFIG_STORAGE_KEY)
        .ok()?
}
