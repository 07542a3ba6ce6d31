use std::env;

use crate::errors::AppError;

/// Validation limits shared by the validator and the forms.
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 50;
pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const PASSWORD_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub session_key: String,
    pub host: String,
    pub port: u16,
}

/// Minimum length accepted by `actix_web::cookie::Key::from`, which would
/// otherwise panic on a shorter key.
const SESSION_KEY_MIN_BYTES: usize = 64;

impl AppConfig {
    /// Reads the configuration from the environment. `SESSION_KEY` is
    /// required and must be at least 64 bytes (checked here so a short key
    /// fails startup cleanly); everything else has a development default.
    pub fn from_env() -> Result<Self, AppError> {
        let session_key = env::var("SESSION_KEY")?;
        if session_key.len() < SESSION_KEY_MIN_BYTES {
            return Err(AppError::ConfigError(format!(
                "SESSION_KEY must be at least {} bytes",
                SESSION_KEY_MIN_BYTES
            )));
        }
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://magasin.db".to_owned());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Ok(AppConfig {
            database_url,
            session_key,
            host,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so the process-global SESSION_KEY is only touched from a
    // single thread.
    #[test]
    fn session_key_length_is_checked_at_load() {
        env::set_var("SESSION_KEY", "too-short");
        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("64 bytes"));

        let key: String = std::iter::repeat('k').take(SESSION_KEY_MIN_BYTES).collect();
        env::set_var("SESSION_KEY", &key);
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.session_key, key);

        env::remove_var("SESSION_KEY");
    }
}
