use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub redis_url: String,
    pub token_secret: String,
    pub meeting_ttl_seconds: u64,
    pub room_capacity: usize,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            token_secret: env::var("TOKEN_SECRET").map_err(|_| ConfigError::MissingTokenSecret)?,
            meeting_ttl_seconds: env::var("MEETING_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86400),
            room_capacity: env::var("ROOM_CAPACITY")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "build".to_string()),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("TOKEN_SECRET environment variable is required")]
    MissingTokenSecret,
}
