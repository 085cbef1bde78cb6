use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill_api::app::build_router;
use quill_api::config::ServerConfig;
use quill_api::integrations::{OpenAiGenerator, RecaptchaVerifier};
use quill_api::notifications::NotificationRouter;
use quill_api::state::AppState;
use quill_core::clock::{Clock, SystemClock};
use quill_core::comments::CommentStore;
use quill_core::content_filter::ContentFilter;
use quill_core::moderation::ModerationPipeline;
use quill_core::ports::UserRepository;
use quill_core::posts::{FsPostSource, PostStore};
use quill_core::rate_limit::RateLimiter;
use quill_core::translation::TranslationWorkflow;
use quill_db::adapters::{PgCommentRepository, PgUserRepository};
use quill_events::{BusNotifier, EmailConfig, EmailDelivery, EventBus};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill_api=debug,quill_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        mode = ?config.mode,
        posts_dir = %config.posts_dir.display(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = quill_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    quill_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    quill_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // Admin email is a production-only concern and needs both a recipient
    // and an SMTP relay.
    let router_handle = match (
        config.mode.is_development(),
        config.admin_email.clone(),
        EmailConfig::from_env(),
    ) {
        (false, Some(admin_email), Some(email_config)) => {
            let sender = Arc::new(EmailDelivery::new(email_config));
            let router = NotificationRouter::new(admin_email, sender);
            tracing::info!("Notification router started");
            Some(tokio::spawn(router.run(event_bus.subscribe())))
        }
        _ => {
            tracing::info!("Admin notification disabled");
            None
        }
    };

    // --- Domain services ---
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let filter = ContentFilter::default();

    let posts = Arc::new(PostStore::new(
        Arc::new(FsPostSource::new(config.posts_dir.clone())),
        Arc::clone(&clock),
        config.post_cache,
    ));

    let comments = CommentStore::new(Arc::new(PgCommentRepository::new(pool.clone())));
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));

    let captcha = Arc::new(RecaptchaVerifier::new(
        config.recaptcha_secret.clone().unwrap_or_default(),
    ));
    let limiter = RateLimiter::new(comments.clone(), Arc::clone(&clock), config.rate_limit);

    let moderation = Arc::new(ModerationPipeline::new(
        config.mode,
        captcha,
        limiter,
        filter.clone(),
        comments.clone(),
        Arc::new(BusNotifier::new(Arc::clone(&event_bus))),
        Arc::clone(&clock),
    ));

    let translation = Arc::new(TranslationWorkflow::new(
        comments.clone(),
        Arc::clone(&users),
        Arc::new(OpenAiGenerator::new(config.openai.clone())),
        Arc::clone(&posts),
        filter,
        Duration::from_secs(config.translation_timeout_secs),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        posts,
        comments,
        users,
        moderation,
        translation,
    };

    let app = build_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // The app, and the notifier's handle on the bus, are gone by now.
    // Dropping the last handle closes the channel and ends the router.
    drop(event_bus);
    if let Some(handle) = router_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Notification router shut down");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
