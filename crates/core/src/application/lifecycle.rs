// Lifecycle Controller - Starting → Running → Stopping → Stopped

use tokio::time::sleep;
use tracing::info;

use super::guard::{GuardStats, ThermalGuard};
use super::shutdown::ShutdownToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecyclePhase::Starting => write!(f, "STARTING"),
            LifecyclePhase::Running => write!(f, "RUNNING"),
            LifecyclePhase::Stopping => write!(f, "STOPPING"),
            LifecyclePhase::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Owns the guard for its whole life and guarantees reconciliation
/// runs exactly once before the process exits
pub struct LifecycleController {
    guard: ThermalGuard,
    phase: LifecyclePhase,
    reconciled: bool,
}

impl LifecycleController {
    /// Wrap a guard built from an already-validated configuration
    pub fn new(guard: ThermalGuard) -> Self {
        Self {
            guard,
            phase: LifecyclePhase::Starting,
            reconciled: false,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn guard(&self) -> &ThermalGuard {
        &self.guard
    }

    /// Run ticks until shutdown is requested, then reconcile
    ///
    /// The end-of-tick sleep is the only cancellation point: a request
    /// arriving while sleeping is seen immediately, one arriving while a
    /// tick is acting is seen at the tick boundary.
    pub async fn run(&mut self, mut shutdown: ShutdownToken) -> GuardStats {
        if self.phase != LifecyclePhase::Starting {
            return self.guard.stats();
        }

        let config = self.guard.config();
        info!(
            warning = config.thresholds().warning(),
            critical = config.thresholds().critical(),
            interval_secs = config.sampling_interval().as_secs_f64(),
            process = %config.target_process(),
            policy = %config.policy(),
            sensor = %self.guard.sensor_description(),
            "Thermal guard running"
        );
        let interval = config.sampling_interval();
        self.phase = LifecyclePhase::Running;

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            self.guard.tick().await;

            if shutdown.is_shutdown() {
                break;
            }

            tokio::select! {
                _ = sleep(interval) => {},
                _ = shutdown.wait() => {
                    info!("Shutdown requested during sleep");
                    break;
                }
            }
        }

        self.stop().await
    }

    /// Reconcile and stop; only the first call touches the process
    pub async fn stop(&mut self) -> GuardStats {
        if !self.reconciled {
            self.reconciled = true;
            self.phase = LifecyclePhase::Stopping;
            let outcomes = self.guard.reconcile().await;
            info!(actions = outcomes.len(), "Reconciliation complete");
        }
        self.phase = LifecyclePhase::Stopped;

        let stats = self.guard.stats();
        info!(
            ticks = stats.ticks,
            interventions = stats.interventions,
            recoveries = stats.recoveries,
            failures = stats.failures,
            "Thermal guard stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::domain::{GuardConfig, GuardSettings, Intervention, Policy};
    use crate::port::actuator::mocks::RecordingActuator;
    use crate::port::process_locator::mocks::MockProcessLocator;
    use crate::port::reporter::mocks::MemoryReporter;
    use crate::port::sensor::mocks::ScriptedSensor;
    use crate::port::time_provider::SystemTimeProvider;
    use std::sync::Arc;
    use std::time::Duration;

    fn controller(
        policy: Policy,
        readings: &[i32],
        interval: Duration,
    ) -> (LifecycleController, Arc<RecordingActuator>) {
        let config = GuardConfig::new(GuardSettings {
            policy,
            sampling_interval: interval,
            operation_timeout: Duration::from_millis(200),
            ..Default::default()
        })
        .unwrap();
        let actuator = Arc::new(RecordingActuator::new());
        let guard = ThermalGuard::new(
            Arc::new(config),
            Arc::new(ScriptedSensor::celsius(readings)),
            Arc::new(MockProcessLocator::found(4242)),
            actuator.clone(),
            Arc::new(MemoryReporter::new()),
            Arc::new(SystemTimeProvider),
        );
        (LifecycleController::new(guard), actuator)
    }

    #[tokio::test]
    async fn test_shutdown_while_sleeping_reconciles() {
        let (mut ctl, actuator) = controller(Policy::Pause, &[95], Duration::from_secs(60));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(async move {
            let stats = ctl.run(token).await;
            (ctl, stats)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.shutdown();

        let (ctl, stats) = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ctl.phase(), LifecyclePhase::Stopped);
        assert_eq!(stats.ticks, 1);
        assert_eq!(
            actuator.actions(),
            vec![Intervention::Suspend, Intervention::Resume]
        );
        assert!(!ctl.guard().process().is_intervened());
    }

    #[tokio::test]
    async fn test_shutdown_before_start_runs_no_ticks() {
        let (mut ctl, actuator) = controller(Policy::Pause, &[95], Duration::from_secs(1));
        let (tx, token) = shutdown_channel();
        tx.shutdown();

        let stats = ctl.run(token).await;

        assert_eq!(stats.ticks, 0);
        assert_eq!(actuator.call_count(), 0);
        assert_eq!(ctl.phase(), LifecyclePhase::Stopped);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (mut ctl, actuator) = controller(Policy::Nice, &[80], Duration::from_secs(60));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(async move {
            ctl.run(token).await;
            ctl
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.shutdown();
        tx.shutdown();

        let mut ctl = handle.await.unwrap();
        ctl.stop().await;
        ctl.stop().await;

        assert_eq!(
            actuator.actions(),
            vec![Intervention::LowerPriority, Intervention::RestorePriority]
        );
    }

    #[tokio::test]
    async fn test_run_after_stop_is_noop() {
        let (mut ctl, actuator) = controller(Policy::Pause, &[95], Duration::from_secs(1));
        ctl.stop().await;

        let (_tx, token) = shutdown_channel();
        let stats = ctl.run(token).await;

        assert_eq!(stats.ticks, 0);
        assert_eq!(actuator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ticks_at_interval() {
        let (mut ctl, _actuator) = controller(Policy::Warn, &[60], Duration::from_millis(20));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(async move { ctl.run(token).await });
        tokio::time::sleep(Duration::from_millis(110)).await;
        tx.shutdown();

        let stats = handle.await.unwrap();
        assert!(stats.ticks >= 2, "expected several ticks, got {}", stats.ticks);
    }
}
