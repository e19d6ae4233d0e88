use std::{collections::HashMap, env, path::PathBuf};
use tracing::warn;

/// Largest accepted PDF.
pub const MAX_UPLOAD_BYTES: usize = 30_000_000;

/// Allowance for multipart boundaries and text fields on top of the file.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

const DEV_JWT_SECRET: &str = "development-only-jwt-secret-change-me";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaConfig {
    Cloudinary {
        cloud_name: String,
        api_key: String,
        api_secret: String,
        api_url: String,
    },
    Local {
        dir: PathBuf,
        public_base_url: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub encryption: String,
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub jwt_secret: String,
    pub media: MediaConfig,
    pub smtp: Option<SmtpConfig>,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok().filter(|v| !v.is_empty()))
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).filter(|v| !v.is_empty()).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let is_production = environment == "production";

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => 5000,
        };
        let base_url = lookup("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let jwt_secret = match lookup("JWT_SECRET_KEY") {
            Some(secret) => {
                if is_production && secret.len() < 32 {
                    return Err(ConfigError::Invalid {
                        key: "JWT_SECRET_KEY",
                        reason: "must be at least 32 bytes in production".to_string(),
                    });
                }
                secret
            }
            None if is_production => return Err(ConfigError::Missing("JWT_SECRET_KEY")),
            None => {
                warn!("JWT_SECRET_KEY not set, using development secret (INSECURE!)");
                DEV_JWT_SECRET.to_string()
            }
        };

        let media = match (
            lookup("CLOUDINARY_CLOUD_NAME"),
            lookup("CLOUDINARY_API_KEY"),
            lookup("CLOUDINARY_SECRET_KEY"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => MediaConfig::Cloudinary {
                cloud_name,
                api_key,
                api_secret,
                api_url: lookup("CLOUDINARY_API_URL")
                    .unwrap_or_else(|| "https://api.cloudinary.com/v1_1".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            (None, None, None) => MediaConfig::Local {
                dir: PathBuf::from(
                    lookup("MEDIA_DIR").unwrap_or_else(|| "./data/media".to_string()),
                ),
                public_base_url: base_url.clone(),
            },
            _ => {
                return Err(ConfigError::Invalid {
                    key: "CLOUDINARY_*",
                    reason: "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and \
                             CLOUDINARY_SECRET_KEY must be set together"
                        .to_string(),
                })
            }
        };

        let smtp = match lookup("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: match lookup("SMTP_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        key: "SMTP_PORT",
                        reason: e.to_string(),
                    })?,
                    None => 587,
                },
                username: lookup("SMTP_USERNAME").ok_or(ConfigError::Missing("SMTP_USERNAME"))?,
                password: lookup("SMTP_PASSWORD").ok_or(ConfigError::Missing("SMTP_PASSWORD"))?,
                from_email: lookup("SMTP_FROM_EMAIL")
                    .ok_or(ConfigError::Missing("SMTP_FROM_EMAIL"))?,
                from_name: lookup("SMTP_FROM_NAME").unwrap_or_else(|| "PDF Notes".to_string()),
                encryption: lookup("SMTP_ENCRYPTION").unwrap_or_else(|| "starttls".to_string()),
            }),
            None => None,
        };

        Ok(Self {
            environment,
            database_url,
            host,
            port,
            base_url,
            jwt_secret,
            media,
            smtp,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        })
    }

    /// Link embedded in verification emails.
    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/api/verify/{}", self.base_url, token)
    }
}
