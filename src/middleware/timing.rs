use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Access-log middleware shared by both receiver listeners.
///
/// Adds `X-Response-Time-Us` (handler wall time in microseconds) to every
/// response and emits one log line per request: `debug` for successes,
/// `info` for anything else.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let us = start.elapsed().as_micros() as u64;

    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }

    let status = response.status().as_u16();
    if response.status().is_success() {
        tracing::debug!(%method, %path, status, us, "request");
    } else {
        tracing::info!(%method, %path, status, us, "request");
    }

    response
}
