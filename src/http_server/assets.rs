//! Static UI bundle served for every non-API path

use crate::config::AssetsConfig;
use crate::http_server::server::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::debug;

pub fn asset_service(config: &AssetsConfig) -> ServeDir {
    ServeDir::new(&config.dir).append_index_html_on_directories(true)
}

pub async fn static_fallback(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let path = request.uri().path().to_string();

    match state.assets.clone().oneshot(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => {
            debug!(%path, "Static asset not found");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
