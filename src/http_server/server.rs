use crate::config::Config;
use crate::http_server::middleware::{cors_middleware, panic_response, CorsPolicy};
use crate::http_server::{assets, routes};
use crate::relay::{GoogleRelay, UrlFetcher};
use crate::utils::errors::{GatewayError, GatewayResult};
use crate::utils::shutdown::ShutdownSignal;
use axum::{
    middleware::from_fn_with_state,
    routing::{any, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

/// Immutable per-process state shared by all handlers
pub struct AppState {
    pub client_id: Option<String>,
    pub google: GoogleRelay,
    pub fetcher: UrlFetcher,
    pub assets: ServeDir,
}

impl AppState {
    pub fn from_config(config: &Config) -> GatewayResult<Self> {
        let client_id = config.google.client_id().map(str::to_string);
        if client_id.is_none() {
            if config.google.require_client_id {
                return Err(GatewayError::ConfigError(
                    "google.client_id is required but not set".to_string(),
                ));
            }
            warn!("google.client_id is not set; /api/config will return null");
        }

        if config.proxy.is_open() {
            warn!("URL proxy accepts any host with no size limit; set proxy.allowed_hosts to restrict it");
        }

        let fetcher =
            UrlFetcher::new(&config.proxy).map_err(|e| GatewayError::ConfigError(e.to_string()))?;

        Ok(Self {
            client_id,
            google: GoogleRelay::new(&config.google)?,
            fetcher,
            assets: assets::asset_service(&config.assets),
        })
    }
}

/// Build the gateway router: API routes, static fallback and the shared layers.
pub fn build_router(config: &Config) -> GatewayResult<Router> {
    let state = Arc::new(AppState::from_config(config)?);
    let cors = CorsPolicy {
        max_age_secs: config.cors.max_age_secs,
    };

    let api = Router::new()
        .route("/config", any(routes::config))
        .route(
            "/proxy",
            post(routes::proxy).fallback(routes::api_not_found),
        )
        .route(
            "/sheets/create",
            post(routes::sheets_create).fallback(routes::api_not_found),
        )
        .route(
            "/sheets/update",
            post(routes::sheets_update).fallback(routes::api_not_found),
        )
        .route(
            "/sheets/append",
            post(routes::sheets_append).fallback(routes::api_not_found),
        )
        .route(
            "/sheets/clear",
            post(routes::sheets_clear).fallback(routes::api_not_found),
        )
        .route(
            "/language/analyze",
            post(routes::language_analyze).fallback(routes::api_not_found),
        )
        .fallback(routes::api_not_found);

    Ok(Router::new()
        .nest("/api", api)
        .fallback(assets::static_fallback)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(cors, cors_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        ))
}

pub struct HttpServer {
    config: Config,
    shutdown: ShutdownSignal,
}

impl HttpServer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = build_router(&self.config)?;

        let addr = SocketAddr::from((
            self.config.server.host.parse::<std::net::IpAddr>()?,
            self.config.server.port,
        ));

        info!("Starting HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
