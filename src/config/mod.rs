use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;

// Top-level configuration container
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
}

// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    // Zone used to render "now" in show-time validation messages
    pub timezone: Tz,
}

// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Uploaded show images land under this directory
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                rust_log: env::var("RUST_LOG").unwrap_or_else(|_| {
                    "planetarium_service=debug,tower_http=debug".to_string()
                }),
                timezone: env::var("TIME_ZONE")
                    .unwrap_or_else(|_| "Europe/Kiev".to_string())
                    .parse()
                    .expect("TIME_ZONE must be a valid IANA timezone name"),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            media: MediaConfig {
                upload_dir: env::var("MEDIA_ROOT")
                    .unwrap_or_else(|_| "media".to_string())
                    .into(),
            },
        }
    }
}
