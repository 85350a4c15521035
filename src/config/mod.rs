use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub notifications: NotificationConfig,
    pub geocoding: GeocodingConfig,
    pub reports: ReportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which repository implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitTier {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    /// Key clients by `X-Forwarded-For`; only safe behind a proxy that sets it
    pub trust_forwarded_for: bool,
    pub generic_limit: RateLimitTier,
    pub strict_limit: RateLimitTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_audit_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
    pub sender_name: String,
    /// Inbox that receives the public contact form
    pub contact_recipient: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub association_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("ASSO_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.database.backend = match v.as_str() {
                "memory" => StoreBackend::Memory,
                _ => StoreBackend::Postgres,
            };
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_TRUST_FORWARDED_FOR") {
            self.api.trust_forwarded_for = v.parse().unwrap_or(self.api.trust_forwarded_for);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.generic_limit.max_requests = v.parse().unwrap_or(self.api.generic_limit.max_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.generic_limit.window_secs = v.parse().unwrap_or(self.api.generic_limit.window_secs);
        }
        if let Ok(v) = env::var("API_STRICT_RATE_LIMIT_REQUESTS") {
            self.api.strict_limit.max_requests = v.parse().unwrap_or(self.api.strict_limit.max_requests);
        }
        if let Ok(v) = env::var("API_STRICT_RATE_LIMIT_WINDOW_SECS") {
            self.api.strict_limit.window_secs = v.parse().unwrap_or(self.api.strict_limit.window_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }

        // Side-effect overrides
        if let Ok(v) = env::var("NOTIFICATION_WEBHOOK_URL") {
            self.notifications.webhook_url = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("NOTIFICATION_TIMEOUT_SECS") {
            self.notifications.timeout_secs = v.parse().unwrap_or(self.notifications.timeout_secs);
        }
        if let Ok(v) = env::var("NOTIFICATION_CONTACT_RECIPIENT") {
            self.notifications.contact_recipient = v;
        }
        if let Ok(v) = env::var("GEOCODING_ENABLED") {
            self.geocoding.enabled = v.parse().unwrap_or(self.geocoding.enabled);
        }
        if let Ok(v) = env::var("GEOCODING_BASE_URL") {
            self.geocoding.base_url = v;
        }
        if let Ok(v) = env::var("REPORTS_OUTPUT_DIR") {
            self.reports.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("ASSOCIATION_NAME") {
            self.reports.association_name = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                trust_forwarded_for: false,
                generic_limit: RateLimitTier { max_requests: 1000, window_secs: 60 },
                strict_limit: RateLimitTier { max_requests: 100, window_secs: 15 * 60 },
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_audit_logging: true,
            },
            notifications: NotificationConfig {
                webhook_url: None,
                timeout_secs: 10,
                sender_name: "Association".to_string(),
                contact_recipient: "contact@localhost".to_string(),
            },
            geocoding: GeocodingConfig {
                enabled: false,
                base_url: "https://nominatim.openstreetmap.org/search".to_string(),
                user_agent: "asso-admin-api".to_string(),
                timeout_secs: 5,
            },
            reports: ReportConfig {
                output_dir: PathBuf::from("./var/reports"),
                association_name: "Association".to_string(),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.server.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.enable_rate_limiting = true;
        config.api.generic_limit = RateLimitTier { max_requests: 300, window_secs: 60 };
        config.api.strict_limit = RateLimitTier { max_requests: 20, window_secs: 15 * 60 };
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.jwt_expiry_hours = 24;
        config.geocoding.enabled = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.server.max_request_size_bytes = 2 * 1024 * 1024; // 2MB
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.enable_rate_limiting = true;
        config.api.generic_limit = RateLimitTier { max_requests: 100, window_secs: 60 };
        config.api.strict_limit = RateLimitTier { max_requests: 10, window_secs: 15 * 60 };
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config.security.jwt_expiry_hours = 8;
        config.geocoding.enabled = true;
        config.reports.output_dir = PathBuf::from("/var/lib/asso/reports");
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.api.enable_rate_limiting);
        assert!(!config.api.trust_forwarded_for);
        assert_eq!(config.api.generic_limit.window_secs, 60);
        assert!(config.notifications.webhook_url.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.is_production());
        assert!(config.api.enable_rate_limiting);
        assert!(config.api.strict_limit.max_requests < config.api.generic_limit.max_requests);
    }
}
