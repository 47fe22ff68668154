//! Router middleware: CORS, request logging and panic recovery
use std::{panic::AssertUnwindSafe, time::Instant};

use crate::envelope::Envelope;
use axum::{
    http::{
        header::{self, HeaderValue},
        Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures::FutureExt;
use tracing::{error, info};

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, OPTIONS, DELETE";
const ALLOWED_HEADERS: &str = "Origin, Authorization, Access-Control-Allow-Origin, \
    Access-Control-Allow-Header, Accept, Content-Type, X-CSRF-Token";
const EXPOSED_HEADERS: &str = "Content-Length, Access-Control-Allow-Origin, Origin";
const MAX_AGE_SECS: &str = "300";

/// Permissive CORS: any origin, credentials allowed
///
/// With credentials a literal `*` origin is not accepted by browsers,
/// so the request origin is echoed back instead.
pub async fn cors<B>(request: Request<B>, next: Next<B>) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    let is_preflight = *request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let Some(origin) = origin else {
        return next.run(request).await;
    };

    let mut response = if is_preflight {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECS),
        );
        response
    } else {
        let mut response = next.run(request).await;
        response.headers_mut().insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSED_HEADERS),
        );
        response
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    response
}

pub async fn log_request<B>(request: Request<B>, next: Next<B>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Turn a panicking handler into a 500 instead of a dropped connection
pub async fn recover_panics<B>(request: Request<B>, next: Next<B>) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown".to_owned());
            error!(%reason, "handler panicked");
            internal_error()
        }
    }
}

pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::<()>::error("internal server error")),
    )
        .into_response()
}
