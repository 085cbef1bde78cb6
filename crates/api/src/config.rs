use std::path::PathBuf;

use quill_core::moderation::ExecutionMode;
use quill_core::posts::PostCacheConfig;
use quill_core::rate_limit::RateLimitPolicy;
use quill_core::translation::DEFAULT_TIMEOUT_SECS;

use crate::auth::jwt::JwtConfig;
use crate::integrations::openai::OpenAiConfig;

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default bound on one text-generation call. Kept below the request
/// timeout so the workflow, not the timeout layer, reports the failure.
pub const DEFAULT_TRANSLATION_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT_SECS;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Development skips CAPTCHA verification and admin email.
    pub mode: ExecutionMode,
    /// Directory holding the markdown posts.
    pub posts_dir: PathBuf,
    pub post_cache: PostCacheConfig,
    pub rate_limit: RateLimitPolicy,
    /// Upper bound on a single text-generation call.
    pub translation_timeout_secs: u64,
    /// Recipient of new-comment notifications. `None` disables them.
    pub admin_email: Option<String>,
    /// reCAPTCHA server secret. Only needed outside development.
    pub recaptcha_secret: Option<String>,
    pub openai: OpenAiConfig,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `APP_ENV`                  | `production`               |
    /// | `POSTS_DIR`                | `_posts`                   |
    /// | `POST_CACHE_MAX_ENTRIES`   | `100`                      |
    /// | `POST_CACHE_TTL_SECS`      | `2592000`                  |
    /// | `COMMENT_RATE_WINDOW_SECS` | `300`                      |
    /// | `COMMENT_RATE_LIMIT`       | `5`                        |
    /// | `TRANSLATION_TIMEOUT_SECS` | `25`                       |
    /// | `ADMIN_EMAIL`              | --                         |
    /// | `RECAPTCHA_SECRET_KEY`     | -- (required in production)|
    ///
    /// # Panics
    ///
    /// Panics on unparsable values, when `RECAPTCHA_SECRET_KEY` is missing
    /// outside development, and when `TRANSLATION_TIMEOUT_SECS` is not below
    /// `REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or(
            "REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse()
        .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let mode: ExecutionMode = env_or("APP_ENV", "production")
            .parse()
            .expect("APP_ENV must be `development` or `production`");

        let posts_dir = PathBuf::from(env_or("POSTS_DIR", "_posts"));

        let post_cache = PostCacheConfig {
            max_entries: env_or("POST_CACHE_MAX_ENTRIES", "100")
                .parse()
                .expect("POST_CACHE_MAX_ENTRIES must be a valid usize"),
            ttl: chrono::Duration::seconds(
                env_or("POST_CACHE_TTL_SECS", "2592000")
                    .parse()
                    .expect("POST_CACHE_TTL_SECS must be a valid i64"),
            ),
        };

        let rate_limit = RateLimitPolicy {
            window: chrono::Duration::seconds(
                env_or("COMMENT_RATE_WINDOW_SECS", "300")
                    .parse()
                    .expect("COMMENT_RATE_WINDOW_SECS must be a valid i64"),
            ),
            limit: env_or("COMMENT_RATE_LIMIT", "5")
                .parse()
                .expect("COMMENT_RATE_LIMIT must be a valid i64"),
        };

        let translation_timeout_secs: u64 = env_or(
            "TRANSLATION_TIMEOUT_SECS",
            &DEFAULT_TRANSLATION_TIMEOUT_SECS.to_string(),
        )
        .parse()
        .expect("TRANSLATION_TIMEOUT_SECS must be a valid u64");

        if let Err(msg) = check_timeouts(request_timeout_secs, translation_timeout_secs) {
            panic!("{msg}");
        }

        let admin_email = non_empty_env("ADMIN_EMAIL");

        let recaptcha_secret = non_empty_env("RECAPTCHA_SECRET_KEY");
        assert!(
            mode.is_development() || recaptcha_secret.is_some(),
            "RECAPTCHA_SECRET_KEY must be set outside development"
        );

        let openai = OpenAiConfig::from_env();
        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            mode,
            posts_dir,
            post_cache,
            rate_limit,
            translation_timeout_secs,
            admin_email,
            recaptcha_secret,
            openai,
            jwt,
        }
    }
}

/// A generation call must finish, or time out, before the request layer
/// gives up on the whole request.
pub fn check_timeouts(
    request_timeout_secs: u64,
    translation_timeout_secs: u64,
) -> Result<(), String> {
    if translation_timeout_secs == 0 || translation_timeout_secs >= request_timeout_secs {
        return Err(format!(
            "TRANSLATION_TIMEOUT_SECS ({translation_timeout_secs}) must be non-zero and below \
             REQUEST_TIMEOUT_SECS ({request_timeout_secs})"
        ));
    }
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts_are_ordered() {
        assert!(check_timeouts(
            DEFAULT_REQUEST_TIMEOUT_SECS,
            DEFAULT_TRANSLATION_TIMEOUT_SECS
        )
        .is_ok());
    }

    #[test]
    fn translation_timeout_must_be_below_request_timeout() {
        assert!(check_timeouts(30, 30).is_err());
        assert!(check_timeouts(30, 60).is_err());
        assert!(check_timeouts(30, 0).is_err());
        assert!(check_timeouts(30, 29).is_ok());
    }
}
