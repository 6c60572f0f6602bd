//! Thermal Guard - Main Entry Point
//! Samples the device temperature and throttles one process while hot

mod cli;
mod signals;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

// Import workspace crates
use thermoguard_core::application::{shutdown_channel, LifecycleController, ThermalGuard};
use thermoguard_core::port::time_provider::SystemTimeProvider;
use thermoguard_core::port::TracingReporter;
use thermoguard_infra_system::{resolve_log_destination, SignalActuator, SysinfoProcessLocator};

use cli::Cli;
use signals::TerminationSignals;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse and validate configuration (fail fast, no ticks on error)
    let cli = Cli::parse();
    let config = cli.config().context("Invalid configuration")?;

    // 2. Resolve log destination, then initialize logging
    let destination = resolve_log_destination(config.log_destination())
        .context("No writable log destination")?;
    let _log_guard = telemetry::init_logging(destination.file)?;

    info!("Thermal Guard v{} starting...", VERSION);
    if let Some((configured, reason)) = &destination.fallback_from {
        warn!(
            configured = %configured.display(),
            fallback = %destination.path.display(),
            reason = %reason,
            "Log destination unwritable, using fallback"
        );
    }
    info!(log_file = %destination.path.display(), "Logging initialized");

    // 3. Setup dependencies (DI wiring)
    let timeout = config.operation_timeout();
    let sensor = cli.sensor(timeout)?;
    let locator = Arc::new(SysinfoProcessLocator::new());
    let actuator = Arc::new(SignalActuator::new(config.low_priority(), timeout));
    let config = Arc::new(config);

    let guard = ThermalGuard::new(
        config,
        sensor,
        locator,
        actuator,
        Arc::new(TracingReporter),
        Arc::new(SystemTimeProvider),
    );
    let mut controller = LifecycleController::new(guard);

    // 4. Register termination signals before the first tick
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let signals = TerminationSignals::register().context("Failed to register signal handlers")?;
    let signal_task = tokio::spawn(signals.forward(shutdown_tx));

    info!("Press Ctrl+C to stop");

    // 5. Run until terminated; reconciliation happens inside
    let stats = controller.run(shutdown_rx).await;
    signal_task.abort();

    info!(
        ticks = stats.ticks,
        interventions = stats.interventions,
        "Shutdown complete."
    );

    Ok(())
}
