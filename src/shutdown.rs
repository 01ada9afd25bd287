use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancel `shutdown_token` on Ctrl+C or SIGTERM.
pub async fn shutdown_signal(shutdown_token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(err), _) | (_, Err(err)) => {
                    error!(error = %err, "Failed to register shutdown signal handlers");
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Shutdown signal received (SIGTERM)");
            }
            _ = sigint.recv() => {
                info!("Shutdown signal received (SIGINT/Ctrl+C)");
            }
        }

        shutdown_token.cancel();
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received (Ctrl+C)");
                shutdown_token.cancel();
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for shutdown signal");
            }
        }
    }
}

/// Spawn [`shutdown_signal`] and return the token it cancels.
pub fn install() -> CancellationToken {
    let shutdown_token = CancellationToken::new();
    let shutdown_token_clone = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(shutdown_token_clone).await;
    });
    shutdown_token
}
