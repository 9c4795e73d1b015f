/// Default backend origin when `API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://flowbase-y89b.onrender.com";

/// Gateway configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Backend origin requests are forwarded to, with any trailing slash
    /// stripped (default: [`DEFAULT_API_URL`]).
    pub api_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
}

impl GatewayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var        | Default                              |
    /// |----------------|--------------------------------------|
    /// | `HOST`         | `0.0.0.0`                            |
    /// | `PORT`         | `3000`                               |
    /// | `API_URL`      | `https://flowbase-y89b.onrender.com` |
    /// | `CORS_ORIGINS` | `http://localhost:5173`              |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let api_url = std::env::var("API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.into())
            .trim_end_matches('/')
            .to_string();

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port,
            api_url,
            cors_origins,
        }
    }
}
