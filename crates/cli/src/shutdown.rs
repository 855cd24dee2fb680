use engine_core::shutdown::{ShutdownHandle, ShutdownState};
use tokio::signal;
use tracing::{error, info, warn};

/// Listens for SIGINT and SIGTERM for the lifetime of the process and turns
/// them into shutdown requests on `handle`.
pub fn register_handlers(handle: ShutdownHandle) {
    tokio::spawn(async move {
        loop {
            let Some(name) = next_signal().await else {
                return;
            };

            if handle.request() {
                info!(signal = name, "Shutdown requested, finishing the current batch");
            } else {
                match handle.state() {
                    ShutdownState::Exited => return,
                    state => warn!(signal = name, ?state, "Shutdown already in progress, ignoring signal"),
                }
            }
        }
    });
}

/// Waits for the next termination signal. `None` if no handler could be
/// installed.
async fn next_signal() -> Option<&'static str> {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        let mut terminate = match unix_signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                error!(%err, "Failed to install SIGTERM handler");
                return ctrl_c().await;
            }
        };

        tokio::select! {
            name = ctrl_c() => name,
            _ = terminate.recv() => Some("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

async fn ctrl_c() -> Option<&'static str> {
    match signal::ctrl_c().await {
        Ok(()) => Some("SIGINT"),
        Err(err) => {
            error!(%err, "Failed to install SIGINT handler");
            None
        }
    }
}
