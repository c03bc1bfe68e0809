// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process signal handling.

use tracing::{info, warn};

/// Resolves on the first SIGINT (Ctrl+C) or, on unix, SIGTERM.
///
/// A handler that cannot be installed is logged and never fires, so the run
/// is not cut short by a broken signal setup.
pub async fn signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c() => info!("received SIGINT (Ctrl+C), stopping"),
                    _ = sigterm.recv() => info!("received SIGTERM, stopping"),
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
                ctrl_c().await;
                info!("received SIGINT (Ctrl+C), stopping");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        info!("received Ctrl+C, stopping");
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
