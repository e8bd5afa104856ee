use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    analytics::{self, AnalyticsContext},
    auth,
    config::Config,
    handlers::{self, paraphrase::AppState},
    metrics,
};

/// Start the paraphrase gateway server
///
/// This function:
/// 1. Initializes metrics
/// 2. Creates the shared state and the Axum application
/// 3. Binds to the configured address
/// 4. Serves requests with graceful shutdown support
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics());

    let config = Arc::new(config);
    let http_client = reqwest::Client::new();
    let analytics_ctx = AnalyticsContext::new(config.analytics.clone(), http_client.clone());

    let app_state = AppState {
        config: config.clone(),
        http_client,
        analytics: analytics_ctx.clone(),
    };

    let app = create_router(config.clone(), app_state, analytics_ctx, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting Paraphrase Gateway on {}", addr);
    info!(
        model = %config.model.model,
        analytics_enabled = config.analytics.enabled,
        known_users = config.users.len(),
        "Configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
fn create_router(
    config: Arc<Config>,
    app_state: AppState,
    analytics_ctx: AnalyticsContext,
    metrics_handle: Arc<metrics_exporter_prometheus::PrometheusHandle>,
) -> Router {
    // Identity resolution runs first so the analytics wrapper can pick
    // the Identity extension up from the request.
    let api_routes = Router::new()
        .route(
            "/api/paraphrase",
            post(handlers::paraphrase::handle_paraphrase),
        )
        .layer(middleware::from_fn_with_state(
            analytics_ctx,
            analytics::middleware::usage_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth::identity_middleware,
        ))
        .with_state(app_state);

    let mut public = Router::new().route("/health", get(handlers::health::health_check));
    if config.metrics.enabled {
        public = public.route(
            config.metrics.endpoint.as_str(),
            get(handlers::metrics_handler::metrics),
        );
    }

    public
        .with_state(metrics_handle)
        .merge(api_routes)
        // Limit request body size to 10MB to prevent memory exhaustion
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections...");
}
