// Configuration chargée depuis l'environnement (après dotenv).
//
// | Variable                   | Défaut                               |
// |----------------------------|--------------------------------------|
// | HOST / PORT                | 127.0.0.1 / 8080                     |
// | DATABASE_URL               | obligatoire                          |
// | DATABASE_MAX_CONNECTIONS   | 10                                   |
// | SECRET_KEY                 | secret aléatoire (warning)           |
// | JWT_SECRET                 | SECRET_KEY                           |
// | JWT_TTL_HOURS              | 24                                   |
// | CONFIRMATION_CODES_STRICT  | false                                |
// | PAGE_SIZE                  | 10                                   |
// | SMTP_HOST                  | absent -> ConsoleMailer              |
// | SMTP_PORT                  | 587                                  |
// | SMTP_USER / SMTP_PASSWORD  | -                                    |
// | EMAIL_FROM                 | noreply@yamdb.local                  |
// | EMAIL_FAIL_SILENTLY        | false                                |

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use std::env;
use std::str::FromStr;

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "noreply@yamdb.local";
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub secret_key: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    /// Refuse aussi les codes générés pour un état antérieur du compte
    pub strict_confirmation_codes: bool,
    pub page_size: u64,
    pub email: Option<EmailConfig>,
    pub email_fail_silently: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let secret_key = match lookup("SECRET_KEY") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("SECRET_KEY not set, using a random per-process secret (tokens and codes will not survive a restart)");
                random_secret()
            }
        };
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| secret_key.clone());

        let email = lookup("SMTP_HOST").map(|smtp_host| -> Result<EmailConfig, ConfigError> {
            Ok(EmailConfig {
                smtp_host,
                smtp_port: parse_or(&lookup, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                from_address: lookup("EMAIL_FROM")
                    .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
                smtp_user: lookup("SMTP_USER"),
                smtp_password: lookup("SMTP_PASSWORD"),
            })
        });

        let page_size: u64 = parse_or(&lookup, "PAGE_SIZE", 10)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid {
                name: "PAGE_SIZE",
                value: page_size.to_string(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            secret_key,
            jwt_secret,
            jwt_ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 24)?,
            strict_confirmation_codes: parse_or(&lookup, "CONFIRMATION_CODES_STRICT", false)?,
            page_size,
            email: email.transpose()?,
            email_fail_silently: parse_or(&lookup, "EMAIL_FAIL_SILENTLY", false)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/yamdb")]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.page_size, 10);
        assert!(!config.strict_confirmation_codes);
        assert!(config.email.is_none());
        assert_eq!(config.jwt_secret, config.secret_key);
        assert!(!config.secret_key.is_empty());
    }

    #[test]
    fn test_database_url_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_smtp_and_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/yamdb"),
            ("SECRET_KEY", "s3cret"),
            ("JWT_SECRET", "jwt"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "2525"),
            ("CONFIRMATION_CODES_STRICT", "true"),
        ])
        .unwrap();

        assert_eq!(config.secret_key, "s3cret");
        assert_eq!(config.jwt_secret, "jwt");
        assert!(config.strict_confirmation_codes);
        let email = config.email.unwrap();
        assert_eq!(email.smtp_port, 2525);
        assert_eq!(email.from_address, DEFAULT_FROM_ADDRESS);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("DATABASE_URL", "x"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = load(&[("DATABASE_URL", "x"), ("PAGE_SIZE", "1000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PAGE_SIZE", .. }));
    }
}
