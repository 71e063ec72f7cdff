use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Resolve on the first SIGINT/SIGTERM (Ctrl+C/Ctrl+Break elsewhere).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("shutdown: SIGTERM received"),
            _ = sigint.recv() => tracing::info!("shutdown: SIGINT received"),
        }
        Ok(())
    }

    #[cfg(windows)]
    {
        use tokio::signal::windows::{ctrl_break, ctrl_c};
        let mut c = ctrl_c()?;
        let mut br = ctrl_break()?;
        tokio::select! {
            _ = c.recv() => {},
            _ = br.recv() => {},
        }
        tracing::info!("shutdown: console signal received");
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

/// Cancel `token` once a shutdown signal arrives. Returns immediately if the
/// token is cancelled some other way first.
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        res = wait_for_shutdown() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "shutdown: failed to install signal handlers");
            }
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}
