use std::env;
use std::time::Duration;

use crate::shared::constants::STORE_CACHE_WINDOW;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub vendor: VendorConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Credentials and endpoint of the upstream knowledge base API.
///
/// A missing key is not a startup failure: the prompts endpoints answer with a
/// configuration error instead of calling upstream without credentials.
#[derive(Clone)]
pub struct VendorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Settings for the client-side prompts store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of this service's prompts endpoints
    pub api_base_url: String,
    /// How long a successful list fetch is served from memory
    pub cache_ttl: Duration,
    /// Upper bound for any single store request
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            vendor: VendorConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024; // 1MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl VendorConfig {
    const DEFAULT_BASE_URL: &'static str = "https://api.heygen.com";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("KNOWLEDGE_BASE_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let base_url = env::var("KNOWLEDGE_BASE_API_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = env::var("KNOWLEDGE_BASE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "KNOWLEDGE_BASE_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            api_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

// The key never reaches logs, even at debug level.
impl std::fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Maslow Prompts API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Prompt management proxy for the avatar service".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StoreConfig {
    const DEFAULT_API_BASE_URL: &'static str = "http://127.0.0.1:3000";
    const DEFAULT_CACHE_TTL_SECS: u64 = STORE_CACHE_WINDOW.as_secs();
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let api_base_url = env::var("PROMPTS_API_URL")
            .unwrap_or_else(|_| Self::DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let cache_ttl_secs = env::var("PROMPTS_CACHE_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_CACHE_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "PROMPTS_CACHE_TTL_SECS must be a valid number".to_string())?;

        let request_timeout_secs = env::var("PROMPTS_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "PROMPTS_REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            api_base_url,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            cache_ttl: Duration::from_secs(Self::DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(Self::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Serialised access to process environment variables for tests
#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::{Mutex, PoisonError};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Run `f` with `vars` set (`None` removes), restoring previous values after
    pub(crate) fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let previous: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
            .collect();
        for (key, value) in vars {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        for (key, value) in previous {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_env::with_env;
    use super::*;

    #[test]
    fn test_vendor_config_debug_redacts_key() {
        let config = VendorConfig {
            api_key: Some("sk-live-secret".to_string()),
            base_url: "https://vendor.test".to_string(),
            timeout: Duration::from_secs(5),
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-live-secret"));
        assert!(rendered.contains("<redacted>"));
        assert!(config.has_credentials());
    }

    #[test]
    fn test_store_config_default_cache_window_is_five_minutes() {
        let config = StoreConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.api_base_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_swagger_credentials_require_both_parts() {
        let mut config = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert_eq!(config.credentials(), None);

        config.password = Some("secret".to_string());
        assert_eq!(config.credentials(), Some("admin:secret".to_string()));
    }

    #[test]
    fn test_blank_api_key_counts_as_absent() {
        for blank in ["", "   ", "\t\n"] {
            with_env(&[("KNOWLEDGE_BASE_API_KEY", Some(blank))], || {
                let config = VendorConfig::from_env().unwrap();
                assert_eq!(config.api_key, None);
                assert!(!config.has_credentials());
            });
        }

        with_env(&[("KNOWLEDGE_BASE_API_KEY", Some("  kb-key  "))], || {
            let config = VendorConfig::from_env().unwrap();
            assert_eq!(config.api_key.as_deref(), Some("kb-key"));
        });
    }

    #[test]
    fn test_malformed_numbers_name_the_variable() {
        with_env(&[("KNOWLEDGE_BASE_TIMEOUT_SECS", Some("thirty"))], || {
            let err = VendorConfig::from_env().unwrap_err();
            assert!(err.contains("KNOWLEDGE_BASE_TIMEOUT_SECS"), "{}", err);
        });

        for var in ["PROMPTS_CACHE_TTL_SECS", "PROMPTS_REQUEST_TIMEOUT_SECS"] {
            with_env(&[(var, Some("5m"))], || {
                let err = StoreConfig::from_env().unwrap_err();
                assert!(err.contains(var), "{}", err);
            });
        }

        with_env(&[("PORT", Some("eighty"))], || {
            let err = AppConfig::from_env().unwrap_err();
            assert!(err.contains("PORT"), "{}", err);
        });
    }

    #[test]
    fn test_store_config_reads_environment() {
        with_env(
            &[
                ("PROMPTS_API_URL", Some("http://prompts.test/")),
                ("PROMPTS_CACHE_TTL_SECS", Some("60")),
                ("PROMPTS_REQUEST_TIMEOUT_SECS", Some("5")),
            ],
            || {
                let config = StoreConfig::from_env().unwrap();
                assert_eq!(config.api_base_url, "http://prompts.test");
                assert_eq!(config.cache_ttl, Duration::from_secs(60));
                assert_eq!(config.request_timeout, Duration::from_secs(5));
            },
        );
    }
}
