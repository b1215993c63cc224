// src/config/mod.rs
// All values come from the environment (.env is loaded first if present).

use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // ── TMDB Configuration
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,

    // ── Gemini Configuration
    pub gemini_api_key: String,
    pub gemini_model: String,

    // ── Supabase Configuration
    pub supabase_url: String,
    pub supabase_anon_key: String,

    // ── Session Configuration
    pub user_id: String,

    // ── Chat History Configuration
    pub history_message_cap: usize,

    // ── Timeouts (in seconds)
    pub gemini_timeout: u64,
    pub tmdb_timeout: u64,
    pub supabase_timeout: u64,

    // ── Logging Configuration
    pub log_level: String,
}

/// Parse an environment variable, falling back to a default.
/// Handles trailing comments and whitespace in .env values.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            clean_val.parse::<T>().unwrap_or(default)
        }
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env first if it exists; missing file is fine.
        let _ = dotenvy::dotenv();

        Self {
            tmdb_api_key: env_var_or("TMDB_API_KEY", String::new()),
            tmdb_base_url: env_var_or(
                "TMDB_BASE_URL",
                "https://api.themoviedb.org/3".to_string(),
            ),
            tmdb_image_base_url: env_var_or(
                "TMDB_IMAGE_BASE_URL",
                "https://image.tmdb.org/t/p".to_string(),
            ),
            gemini_api_key: env_var_or("GEMINI_API_KEY", String::new()),
            gemini_model: env_var_or("GEMINI_MODEL", "gemini-2.5-flash".to_string()),
            supabase_url: env_var_or("SUPABASE_URL", String::new()),
            supabase_anon_key: env_var_or("SUPABASE_ANON_KEY", String::new()),
            user_id: env_var_or("CINEMATE_USER_ID", String::new()),
            history_message_cap: env_var_or("CINEMATE_HISTORY_CAP", 50),
            gemini_timeout: env_var_or("CINEMATE_GEMINI_TIMEOUT", 120),
            tmdb_timeout: env_var_or("CINEMATE_TMDB_TIMEOUT", 30),
            supabase_timeout: env_var_or("CINEMATE_SUPABASE_TIMEOUT", 30),
            log_level: env_var_or("CINEMATE_LOG_LEVEL", "info".to_string()),
        }
    }

    /// User id for this session, generating an anonymous one when unset.
    pub fn session_user_id(&self) -> String {
        if self.user_id.is_empty() {
            format!("anon-{}", uuid::Uuid::new_v4())
        } else {
            self.user_id.clone()
        }
    }

    /// Whether durable chat storage is configured at all.
    pub fn storage_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_env();
        assert_eq!(config.history_message_cap, 50);
        assert!(config.tmdb_base_url.contains("api.themoviedb.org"));
        assert!(config.tmdb_image_base_url.contains("image.tmdb.org"));
    }

    #[test]
    fn test_anonymous_user_id() {
        let mut config = Config::from_env();
        config.user_id = String::new();
        assert!(config.session_user_id().starts_with("anon-"));

        config.user_id = "u-123".into();
        assert_eq!(config.session_user_id(), "u-123");
    }
}
