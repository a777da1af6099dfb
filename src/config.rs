use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in days.
    pub token_lifetime_days: i64,
    pub host: IpAddr,
    pub port: u16,
    pub cors_origin: String,
    pub environment: Environment,
    pub max_body_size: usize,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let token_lifetime_days: i64 = env_or("MYCONTACTS_TOKEN_LIFETIME_DAYS", "7")
            .parse()
            .map_err(|e| format!("Invalid MYCONTACTS_TOKEN_LIFETIME_DAYS: {e}"))?;

        let host: IpAddr = env_or("MYCONTACTS_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid MYCONTACTS_HOST: {e}"))?;

        let port: u16 = env_or("MYCONTACTS_PORT", "3001")
            .parse()
            .map_err(|e| format!("Invalid MYCONTACTS_PORT: {e}"))?;

        let cors_origin = env_or("MYCONTACTS_CORS_ORIGIN", "*");

        let environment = match env_or("MYCONTACTS_ENV", "development").as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };

        let max_body_size: usize = env_or("MYCONTACTS_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid MYCONTACTS_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("MYCONTACTS_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            token_lifetime_days,
            host,
            port,
            cors_origin,
            environment,
            max_body_size,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
