use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Credentials for the privileged account created at startup when it is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperuserSeed {
    pub email: String,
    pub password: String,
}

pub struct Config {
    /// `None` runs the service against the in-memory account store.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub docs_dir: PathBuf,
    pub superuser: Option<SuperuserSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::ConfigError("JWT_SECRET must be set".into()))?;

        let token_ttl_hours = parse_var("TOKEN_TTL_HOURS", 24)?;
        if token_ttl_hours <= 0 || chrono::Duration::try_hours(token_ttl_hours).is_none() {
            return Err(AppError::ConfigError(
                "TOKEN_TTL_HOURS must be a positive number of hours".into(),
            ));
        }

        let superuser = match (non_empty_var("SUPERUSER_EMAIL"), non_empty_var("SUPERUSER_PASSWORD")) {
            (Some(email), Some(password)) => Some(SuperuserSeed { email, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::ConfigError(
                    "SUPERUSER_EMAIL and SUPERUSER_PASSWORD must be set together".into(),
                ))
            }
        };

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            docs_dir: env::var("DOCS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("docs")),
            superuser,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::ConfigError(format!("{} must be a number", name))),
        Err(_) => Ok(default),
    }
}
