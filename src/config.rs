use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        // No fallback: a missing secret must stop the process here, not turn
        // every authenticated request into a 500.
        let jwt_secret = env::var("JWT_SECRET")?;
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
        })
    }
}
