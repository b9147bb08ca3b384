use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C; stopping"),
        _ = terminate => tracing::info!("received SIGTERM; stopping"),
    }
}

/// Returns a token that is cancelled once a termination signal arrives.
///
/// Listeners and the scheduler loop all watch clones of the same token.
pub fn shutdown_on_signal() -> CancellationToken {
    cancel_on(wait_for_shutdown_signal())
}

/// Returns a token that is cancelled when `signal` resolves.
pub fn cancel_on<F>(signal: F) -> CancellationToken
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        signal.await;
        trigger.cancel();
    });
    token
}
