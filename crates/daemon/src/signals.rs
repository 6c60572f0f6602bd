// Termination signal forwarding
use anyhow::Result;
use tracing::{info, warn};

use thermoguard_core::application::ShutdownSender;

/// Signal streams registered before the loop starts, so a SIGTERM that
/// arrives during the first tick still goes through reconciliation
pub struct TerminationSignals {
    #[cfg(unix)]
    term: tokio::signal::unix::Signal,
    #[cfg(unix)]
    int: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hup: tokio::signal::unix::Signal,
}

impl TerminationSignals {
    #[cfg(unix)]
    pub fn register() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
            hup: signal(SignalKind::hangup())?,
        })
    }

    #[cfg(not(unix))]
    pub fn register() -> Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn next(&mut self) -> &'static str {
        tokio::select! {
            _ = self.term.recv() => "SIGTERM",
            _ = self.int.recv() => "SIGINT",
            _ = self.hup.recv() => "SIGHUP",
        }
    }

    #[cfg(not(unix))]
    async fn next(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "CTRL-C"
    }

    /// Forward every received signal to the shutdown channel
    ///
    /// Repeated signals are logged and otherwise ignored; the loop
    /// reconciles once.
    pub async fn forward(mut self, shutdown: ShutdownSender) {
        loop {
            let name = self.next().await;
            if shutdown.shutdown() {
                info!(signal = name, "Termination requested, reconciling before exit");
            } else {
                warn!(signal = name, "Termination already in progress");
            }
        }
    }
}
