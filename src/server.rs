use axum::{
    middleware as axum_mw,
    routing::{get, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::ReceiverConfig;
use crate::error::ServeError;
use crate::handlers;
use crate::middleware::timing;
use crate::store::SnapshotStore;
use crate::AppState;

const SNAPSHOT_PATH: &str = "/metrics/:job/:instance";

/// Router for the authenticated port: `PUT` only.
pub fn create_ingress_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(SNAPSHOT_PATH, put(handlers::ingress::put_snapshot))
        .with_state(state)
        .layer(axum_mw::from_fn(timing::timing_middleware))
}

/// Router for the public scrape port: `GET` only.
pub fn create_egress_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(SNAPSHOT_PATH, get(handlers::egress::get_snapshot))
        .with_state(state)
        .layer(axum_mw::from_fn(timing::timing_middleware))
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServeError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })
}

/// Binds both listeners and serves until `shutdown` is cancelled.
pub async fn run_receiver(
    config: &ReceiverConfig,
    store: Arc<SnapshotStore>,
    shutdown: CancellationToken,
) -> Result<(), ServeError> {
    let auth_listener = bind(config.auth_addr).await?;
    let public_listener = bind(config.public_addr).await?;

    let state = Arc::new(AppState::new(store, config.expected_bearer_token.clone()));
    serve_receiver(auth_listener, public_listener, state, shutdown).await
}

/// Serves both routers on already-bound listeners.
///
/// Both listeners share `state`, and so the same store. On shutdown each stops
/// accepting and drains in-flight requests. If either server fails, the other
/// is asked to stop too and the first error is returned.
pub async fn serve_receiver(
    auth_listener: TcpListener,
    public_listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> Result<(), ServeError> {
    if let Ok(addr) = auth_listener.local_addr() {
        tracing::info!(%addr, "authenticated ingress listening");
    }
    if let Ok(addr) = public_listener.local_addr() {
        tracing::info!(%addr, "public egress listening");
    }

    let auth = serve_one(
        "authenticated",
        auth_listener,
        create_ingress_router(state.clone()),
        shutdown.clone(),
    );
    let public = serve_one(
        "public",
        public_listener,
        create_egress_router(state),
        shutdown,
    );

    join_listeners(auth, public).await?;
    tracing::info!("receiver listeners stopped");
    Ok(())
}

/// Waits for both listeners to finish, then returns the first error.
///
/// A failing listener cancels the shared token; the other one is still polled
/// until its graceful shutdown completes.
async fn join_listeners<A, B>(auth: A, public: B) -> Result<(), ServeError>
where
    A: Future<Output = Result<(), ServeError>>,
    B: Future<Output = Result<(), ServeError>>,
{
    let (auth, public) = tokio::join!(auth, public);
    auth.and(public)
}

async fn serve_one(
    listener_name: &'static str,
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), ServeError> {
    let drained = shutdown.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { drained.cancelled().await })
        .await;

    result.map_err(|source| {
        tracing::error!(listener = listener_name, error = %source, "listener failed");
        shutdown.cancel();
        ServeError::Serve {
            listener: listener_name,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body, Bytes};
    use axum::http::{header, Request, StatusCode};
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt; // for `oneshot`

    use crate::store::SnapshotKey;
    use crate::PROM_CONTENT_TYPE;

    const TOKEN: &str = "s3cret";

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Arc::new(SnapshotStore::new()), TOKEN))
    }

    fn push(path: &str, auth: Option<&str>, body: &'static str) -> Request<Body> {
        let mut builder = Request::builder().method("PUT").uri(path);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn scrape(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn authenticated_put_is_stored() {
        let state = state();
        let app = create_ingress_router(state.clone());

        let resp = app
            .oneshot(push("/metrics/node/host1", Some("Bearer s3cret"), "up 1\n"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("X-Response-Time-Us"));
        let body = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        let stored = state.store.get(&SnapshotKey::new("node", "host1")).unwrap();
        assert_eq!(stored, Bytes::from_static(b"up 1\n"));
    }

    #[tokio::test]
    async fn wrong_token_is_forbidden_and_not_stored() {
        let state = state();
        let key = SnapshotKey::new("node", "host1");
        state.store.put(key.clone(), Bytes::from_static(b"old\n"));
        let app = create_ingress_router(state.clone());

        let resp = app
            .clone()
            .oneshot(push("/metrics/node/host1", Some("Bearer wrong"), "up 1\n"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = app
            .oneshot(push("/metrics/node/host1", None, "up 1\n"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"incorrect or missing bearer token");

        assert_eq!(state.store.get(&key).unwrap(), Bytes::from_static(b"old\n"));
        assert_eq!(state.store.len(), 1);
    }

    #[tokio::test]
    async fn unreadable_body_is_bad_request_and_not_stored() {
        let state = state();
        let key = SnapshotKey::new("node", "host1");
        state.store.put(key.clone(), Bytes::from_static(b"old\n"));
        let app = create_ingress_router(state.clone());

        let chunks = tokio_stream::iter(vec![
            Ok(Bytes::from_static(b"up 1\n")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ]);
        let req = Request::builder()
            .method("PUT")
            .uri("/metrics/node/host1")
            .header(header::AUTHORIZATION, "Bearer s3cret")
            .body(Body::from_stream(chunks))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"failed to read request body");

        assert_eq!(state.store.get(&key).unwrap(), Bytes::from_static(b"old\n"));
    }

    #[tokio::test]
    async fn token_is_checked_before_path_decoding() {
        let state = state();
        let app = create_ingress_router(state.clone());

        // %FF does not decode to UTF-8.
        let resp = app
            .clone()
            .oneshot(push("/metrics/%FF/i", None, "up 1\n"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = app
            .oneshot(push("/metrics/%FF/i", Some("Bearer s3cret"), "up 1\n"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn get_returns_stored_payload_with_prom_content_type() {
        let state = state();
        state.store.put(
            SnapshotKey::new("node", "host1"),
            Bytes::from_static(b"# TYPE up gauge\nup 1\n"),
        );
        let app = create_egress_router(state);

        let resp = app.oneshot(scrape("/metrics/node/host1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            PROM_CONTENT_TYPE
        );
        let body = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"# TYPE up gauge\nup 1\n");
    }

    #[tokio::test]
    async fn get_unknown_key_is_not_found() {
        let app = create_egress_router(state());

        let resp = app.oneshot(scrape("/metrics/node/nobody")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ports_do_not_cross_serve() {
        let state = state();

        // No GET on the authenticated port.
        let resp = create_ingress_router(state.clone())
            .oneshot(scrape("/metrics/node/host1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        // No PUT on the public port, even with a valid token.
        let resp = create_egress_router(state.clone())
            .oneshot(push("/metrics/node/host1", Some("Bearer s3cret"), "up 1\n"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn put_then_get_across_routers() {
        let state = state();
        let ingress = create_ingress_router(state.clone());
        let egress = create_egress_router(state);

        ingress
            .clone()
            .oneshot(push("/metrics/app/a", Some("Bearer s3cret"), "v 1\n"))
            .await
            .unwrap();
        ingress
            .oneshot(push("/metrics/app/a", Some("Bearer s3cret"), "v 2\n"))
            .await
            .unwrap();

        let resp = egress.oneshot(scrape("/metrics/app/a")).await.unwrap();
        let body = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"v 2\n");
    }

    #[tokio::test]
    async fn bind_failure_names_address() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = bind(addr).await.unwrap_err();
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn failing_listener_lets_sibling_drain() {
        let shutdown = CancellationToken::new();
        let drained = Arc::new(AtomicBool::new(false));

        let failing = {
            let shutdown = shutdown.clone();
            async move {
                shutdown.cancel();
                Err::<(), _>(ServeError::Serve {
                    listener: "authenticated",
                    source: io::Error::new(io::ErrorKind::Other, "accept failed"),
                })
            }
        };
        let draining = {
            let (shutdown, drained) = (shutdown.clone(), drained.clone());
            async move {
                shutdown.cancelled().await;
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                drained.store(true, Ordering::SeqCst);
                Ok::<(), ServeError>(())
            }
        };

        let err = join_listeners(failing, draining).await.unwrap_err();
        assert!(err.to_string().contains("authenticated"));
        assert!(drained.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancelled_receiver_returns_ok() {
        let auth = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let public = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(serve_receiver(auth, public, state(), shutdown.clone()));
        shutdown.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("receiver did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
