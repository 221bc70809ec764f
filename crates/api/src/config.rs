use hyde_core::session::DEFAULT_SESSION_SALT;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `330`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to drain after the listener stops.
    pub shutdown_timeout_secs: u64,
    pub session: SessionConfig,
}

/// Settings for the anonymous session cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Salt mixed into client IP hashes.
    pub secret: String,
    /// Mark the cookie `Secure` (set in production behind TLS).
    pub cookie_secure: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                      |
    /// |-------------------------|------------------------------|
    /// | `HOST`                  | `0.0.0.0`                    |
    /// | `PORT`                  | `3000`                       |
    /// | `CORS_ORIGINS`          | `http://localhost:3001`      |
    /// | `REQUEST_TIMEOUT_SECS`  | `330`                        |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `10`                         |
    /// | `SESSION_SECRET`        | `hyde-playlist-default-salt` |
    /// | `COOKIE_SECURE`         | `false`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3001".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Music composition alone may take up to five minutes.
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "330".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            session: SessionConfig::from_env(),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("SESSION_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("SESSION_SECRET not set, using the built-in salt");
                DEFAULT_SESSION_SALT.to_string()
            });

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        Self {
            secret,
            cookie_secure,
        }
    }
}

/// Credentials and endpoints for the third-party services.
///
/// Missing keys do not stop the server; the affected endpoints answer
/// with a "not configured" error and generated media falls back to inline
/// data URLs.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: String,
    pub google_ai_api_key: Option<String>,
    pub imagen_base_url: String,
    pub storage_url: Option<String>,
    pub storage_service_key: Option<String>,
}

impl ProviderConfig {
    /// | Env Var               | Default                                      |
    /// |-----------------------|----------------------------------------------|
    /// | `ELEVENLABS_API_KEY`  | unset                                        |
    /// | `ELEVENLABS_BASE_URL` | `https://api.elevenlabs.io`                  |
    /// | `GOOGLE_AI_API_KEY`   | unset                                        |
    /// | `IMAGEN_BASE_URL`     | `https://generativelanguage.googleapis.com`  |
    /// | `STORAGE_URL`         | unset                                        |
    /// | `STORAGE_SERVICE_KEY` | unset                                        |
    pub fn from_env() -> Self {
        Self {
            elevenlabs_api_key: optional_var("ELEVENLABS_API_KEY"),
            elevenlabs_base_url: optional_var("ELEVENLABS_BASE_URL")
                .unwrap_or_else(|| hyde_providers::music::DEFAULT_BASE_URL.into()),
            google_ai_api_key: optional_var("GOOGLE_AI_API_KEY"),
            imagen_base_url: optional_var("IMAGEN_BASE_URL")
                .unwrap_or_else(|| hyde_providers::image::DEFAULT_BASE_URL.into()),
            storage_url: optional_var("STORAGE_URL"),
            storage_service_key: optional_var("STORAGE_SERVICE_KEY"),
        }
    }

    /// Every provider unset; used by tests and local runs without keys.
    pub fn unconfigured() -> Self {
        Self {
            elevenlabs_api_key: None,
            elevenlabs_base_url: hyde_providers::music::DEFAULT_BASE_URL.into(),
            google_ai_api_key: None,
            imagen_base_url: hyde_providers::image::DEFAULT_BASE_URL.into(),
            storage_url: None,
            storage_service_key: None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
