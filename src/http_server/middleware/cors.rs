//! Cross-origin headers
//!
//! Every response is readable from any origin. Preflights short-circuit
//! before routing so that static paths answer them too.

use axum::{
    extract::{Request, State},
    http::{
        header::{self, HeaderValue},
        Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

const PREFLIGHT_METHODS: &str = "GET, POST, OPTIONS";
const FULL_HEADERS: &str = "Content-Type, Authorization, Origin";

/// CORS policy shared by every route
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    /// How long browsers may cache a preflight result
    pub max_age_secs: u64,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            max_age_secs: 86_400,
        }
    }
}

/// Method and header allowances advertised by an API route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteAllowance {
    /// Relay routes advertise headers only
    pub methods: Option<&'static str>,
    pub headers: &'static str,
}

/// Allowances for a request path; `None` outside the API.
pub fn route_allowance(path: &str) -> Option<RouteAllowance> {
    if path == "/api/config" {
        Some(RouteAllowance {
            methods: Some("GET, OPTIONS"),
            headers: FULL_HEADERS,
        })
    } else if path == "/api/proxy" {
        Some(RouteAllowance {
            methods: Some("POST, OPTIONS"),
            headers: "Content-Type",
        })
    } else if path.starts_with("/api/sheets/") || path.starts_with("/api/language/") {
        Some(RouteAllowance {
            methods: None,
            headers: FULL_HEADERS,
        })
    } else {
        None
    }
}

pub async fn cors_middleware(
    State(policy): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response(&policy);
    }

    let allowance = route_allowance(request.uri().path());
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if let Some(allowance) = allowance {
        if let Some(methods) = allowance.methods {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(methods),
            );
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(allowance.headers),
        );
    }

    response
}

/// Empty 200 carrying the allowances and the preflight cache duration.
pub fn preflight_response(policy: &CorsPolicy) -> Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(PREFLIGHT_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(FULL_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from(policy.max_age_secs),
    );
    response
}
