use std::io;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancels `shutdown` on Ctrl-C or, on unix, SIGTERM. Handlers are installed
/// before this returns, so a signal sent afterwards is never lost.
pub fn watch(shutdown: CancellationToken) -> io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        let interrupted = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminated = async {
            terminate.recv().await;
        };
        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();

        tokio::select! {
            _ = interrupted => info!("received interrupt, shutting down"),
            _ = terminated => info!("received termination signal, shutting down"),
            _ = shutdown.cancelled() => return,
        }

        shutdown.cancel();
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{process::Command, time::Duration};

    #[tokio::test]
    async fn sigterm_cancels_the_run() {
        let shutdown = CancellationToken::new();
        let watcher = watch(shutdown.clone()).unwrap();

        let status = Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown.cancelled())
            .await
            .expect("SIGTERM did not cancel the shutdown token");
        watcher.await.unwrap();
    }

    #[tokio::test]
    async fn watcher_exits_once_the_run_is_cancelled_elsewhere() {
        let shutdown = CancellationToken::new();
        let watcher = watch(shutdown.clone()).unwrap();

        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .unwrap()
            .unwrap();
    }
}
