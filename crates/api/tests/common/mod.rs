//! Shared harness for HTTP-level tests.
//!
//! Builds the production router over the in-memory collaborators from
//! `quill_core::testing`, so tests need neither PostgreSQL nor network.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::TimeZone;
use http_body_util::BodyExt;
use tower::ServiceExt;

use quill_api::app::build_router;
use quill_api::auth::jwt::{generate_access_token, JwtConfig};
use quill_api::config::{
    ServerConfig, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TRANSLATION_TIMEOUT_SECS,
};
use quill_api::integrations::OpenAiConfig;
use quill_api::state::AppState;
use quill_core::clock::Clock;
use quill_core::comments::CommentStore;
use quill_core::content_filter::ContentFilter;
use quill_core::moderation::{ExecutionMode, ModerationPipeline};
use quill_core::posts::{PostCacheConfig, PostStore};
use quill_core::rate_limit::{RateLimitPolicy, RateLimiter};
use quill_core::testing::{
    ManualClock, MemoryDatabase, MemoryPostSource, RecordingNotifier, ScriptedGenerator,
    StaticCaptcha,
};
use quill_core::translation::TranslationWorkflow;
use quill_core::types::{DbId, Timestamp};

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

pub const ALICE: DbId = 1;
pub const BOB: DbId = 2;
pub const ADMIN: DbId = 3;

/// Build a test `ServerConfig` with the production timeouts.
pub fn test_config(mode: ExecutionMode) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        mode,
        posts_dir: PathBuf::from("_posts"),
        post_cache: PostCacheConfig::default(),
        rate_limit: RateLimitPolicy::default(),
        translation_timeout_secs: DEFAULT_TRANSLATION_TIMEOUT_SECS,
        admin_email: None,
        recaptcha_secret: Some("test-recaptcha".to_string()),
        openai: OpenAiConfig {
            api_key: None,
            model: "gpt-4".to_string(),
            base_url: "http://localhost:0".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

pub fn start_time() -> Timestamp {
    chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Knobs for [`TestApp::build`].
pub struct TestOptions {
    pub mode: ExecutionMode,
    pub captcha_ok: bool,
    pub generator: ScriptedGenerator,
    pub notifier: RecordingNotifier,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Production,
            captcha_ok: true,
            generator: ScriptedGenerator::replying("Hola amigo"),
            notifier: RecordingNotifier::new(),
        }
    }
}

/// The router plus handles on every fake behind it.
pub struct TestApp {
    pub router: Router,
    pub config: ServerConfig,
    pub db: Arc<MemoryDatabase>,
    pub clock: Arc<ManualClock>,
    pub captcha: Arc<StaticCaptcha>,
    pub generator: Arc<ScriptedGenerator>,
    pub notifier: Arc<RecordingNotifier>,
    pub posts: Arc<MemoryPostSource>,
}

impl TestApp {
    /// Production mode, passing CAPTCHA, three seeded users.
    pub fn new() -> Self {
        Self::build(TestOptions::default())
    }

    pub fn build(options: TestOptions) -> Self {
        let config = test_config(options.mode);

        let db = Arc::new(MemoryDatabase::new());
        db.add_user(ALICE, "Alice", false, 5);
        db.add_user(BOB, "Bob", false, 0);
        db.add_user(ADMIN, "Admin", true, 5);

        let clock = Arc::new(ManualClock::new(start_time()));
        let captcha = Arc::new(StaticCaptcha::new(options.captcha_ok));
        let generator = Arc::new(options.generator);
        let notifier = Arc::new(options.notifier);
        let posts_source = Arc::new(MemoryPostSource::new());

        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let comments = CommentStore::new(db.clone());
        let filter = ContentFilter::default();

        let posts = Arc::new(PostStore::new(
            posts_source.clone(),
            dyn_clock.clone(),
            config.post_cache,
        ));

        let moderation = Arc::new(ModerationPipeline::new(
            config.mode,
            captcha.clone(),
            RateLimiter::new(comments.clone(), dyn_clock.clone(), config.rate_limit),
            filter.clone(),
            comments.clone(),
            notifier.clone(),
            dyn_clock,
        ));

        let translation = Arc::new(TranslationWorkflow::new(
            comments.clone(),
            db.clone(),
            generator.clone(),
            posts.clone(),
            filter,
            Duration::from_secs(config.translation_timeout_secs),
        ));

        let state = AppState {
            config: Arc::new(config.clone()),
            posts,
            comments,
            users: db.clone(),
            moderation,
            translation,
        };

        let router = build_router(state, &config);

        Self {
            router,
            config,
            db,
            clock,
            captcha,
            generator,
            notifier,
            posts: posts_source,
        }
    }

    /// A valid bearer token for `user_id`.
    pub fn token(&self, user_id: DbId, is_admin: bool) -> String {
        generate_access_token(user_id, is_admin, &self.config.jwt)
            .expect("token generation should succeed")
    }

    /// Insert a comment directly, bypassing the pipeline.
    pub fn seed_comment(&self, user_id: DbId, slug: &str, content: &str) -> DbId {
        self.db
            .seed_comment(user_id, slug, content, self.clock.now())
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, "GET", uri, None, None).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "GET", uri, Some(token), None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, "POST", uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, "POST", uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, "PUT", uri, Some(token), Some(body)).await
}

/// POST a raw, possibly malformed, JSON body.
pub async fn post_raw(app: &Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "DELETE", uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
