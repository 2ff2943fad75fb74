use anyhow::Result;

/// The OS request that ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Terminate,
    Interrupt,
    /// Windows console close/logoff/shutdown.
    Console,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Console => "console event",
        })
    }
}

/// Resolves on the first termination request from the OS.
pub async fn wait_for_shutdown() -> Result<ShutdownSignal> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let which = tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Terminate,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
        };
        Ok(which)
    }

    #[cfg(windows)]
    {
        use tokio::signal::windows::{ctrl_break, ctrl_c, ctrl_close, ctrl_logoff, ctrl_shutdown};
        use tokio::time::{timeout, Duration};

        async fn arm_once() -> std::io::Result<ShutdownSignal> {
            let mut c = ctrl_c()?;
            let mut br = ctrl_break()?;
            let mut cl = ctrl_close()?;
            let mut lo = ctrl_logoff()?;
            let mut sh = ctrl_shutdown()?;

            Ok(tokio::select! {
                _ = c.recv() => ShutdownSignal::Interrupt,
                _ = br.recv() => ShutdownSignal::Interrupt,
                _ = cl.recv() => ShutdownSignal::Console,
                _ = lo.recv() => ShutdownSignal::Console,
                _ = sh.recv() => ShutdownSignal::Terminate,
            })
        }

        // A console event delivered within 50ms of arming is stale; wait for the next one.
        match timeout(Duration::from_millis(50), arm_once()).await {
            Ok(Ok(_)) => {
                tracing::warn!("shutdown: early Windows console signal detected; ignoring");
                Ok(arm_once().await?)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_elapsed) => Ok(arm_once().await?),
        }
    }
}
