use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Auth (token verification only; issuance lives elsewhere)
    pub jwt_secret: String,
    pub jwt_issuer: String,

    // Links embedded in outbound notifications
    pub frontend_url: String,

    // Outbound mail; MAIL_API_URL unset means notifications are disabled
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: String,

    // Zone-risk thresholds (strictly-greater-than semantics)
    pub zone_red_above: u32,
    pub zone_elevated_above: u32,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("API_PORT must be a number"),
            jwt_secret: required_env("JWT_SECRET"),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "civitas".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            mail_api_url: env::var("MAIL_API_URL").ok(),
            mail_api_key: env::var("MAIL_API_KEY").ok(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@civitas.example".to_string()),
            zone_red_above: threshold_env("ZONE_RED_ABOVE", 30),
            zone_elevated_above: threshold_env("ZONE_ELEVATED_ABOVE", 10),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn threshold_env(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .map(|v| v.parse().unwrap_or_else(|_| panic!("{key} must be a number")))
        .unwrap_or(default)
}
