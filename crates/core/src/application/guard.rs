//! Thermal State Machine
//!
//! Each tick: sample the sensor, derive the thermal state, look up the
//! managed process and apply the policy's decision table.
//!
//! | State    | Warn       | Nice                | Pause                  |
//! |----------|------------|---------------------|------------------------|
//! | Normal   | recover    | recover             | recover                |
//! | Warning  | log        | lower priority      | log                    |
//! | Critical | log        | lower priority      | suspend                |
//! | Unknown  | recover    | recover             | recover                |
//!
//! Unknown never starts an intervention but undoes active ones, like Normal.
//! Recovery is unconditional: both flags end the tick false.
//! A failed intervention leaves its flag false so the next qualifying tick
//! retries it.

use std::sync::Arc;
use tracing::debug;

use crate::domain::{
    GuardConfig, Intervention, LogEntry, ManagedProcess, Policy, ProcessId, Reading, Severity,
    ThermalState,
};
use crate::port::{
    ActuatorError, EventReporter, InterventionActuator, ProcessLocator, TemperatureSensor,
    TimeProvider,
};

/// Result of one actuator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: Intervention,
    pub pid: ProcessId,
    pub result: Result<(), ActuatorError>,
}

impl ActionOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything one tick observed and did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub reading: Reading,
    pub state: ThermalState,
    pub pid: Option<ProcessId>,
    pub actions: Vec<ActionOutcome>,
}

/// Running counters for the shutdown summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardStats {
    pub ticks: u64,
    pub interventions: u64,
    pub recoveries: u64,
    pub failures: u64,
}

/// Thermal guard state machine
///
/// Owns the managed-process flags; nothing else mutates them.
pub struct ThermalGuard {
    config: Arc<GuardConfig>,
    sensor: Arc<dyn TemperatureSensor>,
    locator: Arc<dyn ProcessLocator>,
    actuator: Arc<dyn InterventionActuator>,
    reporter: Arc<dyn EventReporter>,
    time_provider: Arc<dyn TimeProvider>,
    process: ManagedProcess,
    stats: GuardStats,
}

impl ThermalGuard {
    /// Create a guard with clean flags
    ///
    /// # Example
    /// ```ignore
    /// let guard = ThermalGuard::new(
    ///     Arc::new(config),
    ///     Arc::new(SysfsSensor::discover()),
    ///     Arc::new(SysinfoProcessLocator::new()),
    ///     Arc::new(SignalActuator::new(10, Duration::from_secs(3))),
    ///     Arc::new(TracingReporter),
    ///     Arc::new(SystemTimeProvider),
    /// );
    /// ```
    pub fn new(
        config: Arc<GuardConfig>,
        sensor: Arc<dyn TemperatureSensor>,
        locator: Arc<dyn ProcessLocator>,
        actuator: Arc<dyn InterventionActuator>,
        reporter: Arc<dyn EventReporter>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            config,
            sensor,
            locator,
            actuator,
            reporter,
            time_provider,
            process: ManagedProcess::new(),
            stats: GuardStats::default(),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn process(&self) -> &ManagedProcess {
        &self.process
    }

    pub fn stats(&self) -> GuardStats {
        self.stats
    }

    pub fn sensor_description(&self) -> String {
        self.sensor.describe()
    }

    /// Run one sample → classify → act → log iteration
    pub async fn tick(&mut self) -> TickReport {
        self.stats.ticks += 1;

        let reading = self.sample().await;
        let state = self.config.thresholds().classify(reading);
        let pid = self.locate().await;
        self.process.pid = pid;

        debug!(
            reading = %reading,
            state = %state,
            pid = ?pid,
            paused = self.process.is_paused,
            priority_lowered = self.process.is_priority_lowered,
            "Tick sampled"
        );

        let actions = match state {
            ThermalState::Unknown => {
                self.log(
                    Severity::Warn,
                    "Temperature unavailable; no intervention this tick".to_string(),
                );
                // Undo only, never a new intervention
                self.recover().await
            }
            ThermalState::Normal => {
                self.log(
                    Severity::Info,
                    format!("Temperature {} [{}]", reading, state),
                );
                if self.process.is_intervened() {
                    self.log(
                        Severity::Info,
                        "Temperature back to normal; restoring managed process".to_string(),
                    );
                }
                self.recover().await
            }
            ThermalState::Warning => {
                self.log(
                    Severity::Warn,
                    format!(
                        "Temperature {} [{}] (warning threshold {}°C)",
                        reading,
                        state,
                        self.config.thresholds().warning()
                    ),
                );
                self.intervene(state).await
            }
            ThermalState::Critical => {
                self.log(
                    Severity::Error,
                    format!(
                        "Temperature {} [{}] (critical threshold {}°C)",
                        reading,
                        state,
                        self.config.thresholds().critical()
                    ),
                );
                self.intervene(state).await
            }
        };

        TickReport {
            reading,
            state,
            pid,
            actions,
        }
    }

    /// Undo every active intervention, regardless of the current reading
    ///
    /// Used by the lifecycle controller before exit. Safe to call when
    /// nothing is active (no actuator calls are made).
    pub async fn reconcile(&mut self) -> Vec<ActionOutcome> {
        if !self.process.is_intervened() {
            return Vec::new();
        }
        self.log(
            Severity::Info,
            "Reconciling managed process before exit".to_string(),
        );
        self.recover().await
    }

    /// Decide the intervention for Warning/Critical under the policy ceiling
    fn planned_intervention(&self, state: ThermalState) -> Option<Intervention> {
        match (self.config.policy(), state) {
            (Policy::Nice, ThermalState::Warning | ThermalState::Critical) => {
                (!self.process.is_priority_lowered).then_some(Intervention::LowerPriority)
            }
            (Policy::Pause, ThermalState::Critical) => {
                (!self.process.is_paused).then_some(Intervention::Suspend)
            }
            _ => None,
        }
    }

    fn policy_acts_on(&self, state: ThermalState) -> bool {
        matches!(
            (self.config.policy(), state),
            (Policy::Nice, ThermalState::Warning | ThermalState::Critical)
                | (Policy::Pause, ThermalState::Critical)
        )
    }

    async fn intervene(&mut self, state: ThermalState) -> Vec<ActionOutcome> {
        if !self.policy_acts_on(state) {
            return Vec::new();
        }

        let Some(pid) = self.process.pid else {
            self.log(
                Severity::Warn,
                format!(
                    "Target process '{}' not found; nothing to throttle",
                    self.config.target_process()
                ),
            );
            return Vec::new();
        };

        match self.planned_intervention(state) {
            Some(action) => vec![self.apply(action, pid).await],
            None => Vec::new(),
        }
    }

    /// Restore priority then resume, clearing both flags whatever the outcome
    async fn recover(&mut self) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::new();
        let pid = self.process.recovery_pid();

        if let Some(pid) = pid {
            if self.process.is_priority_lowered {
                outcomes.push(self.apply(Intervention::RestorePriority, pid).await);
            }
            if self.process.is_paused {
                outcomes.push(self.apply(Intervention::Resume, pid).await);
            }
        }

        self.process.clear();
        outcomes
    }

    async fn apply(&mut self, action: Intervention, pid: ProcessId) -> ActionOutcome {
        let timeout = self.config.operation_timeout();
        let result = match tokio::time::timeout(timeout, self.actuator.apply(action, pid)).await {
            Ok(result) => result,
            Err(_) => Err(ActuatorError::Timeout(timeout.as_millis())),
        };

        match &result {
            Ok(()) => {
                self.process.mark(action, pid);
                if action.is_recovery() {
                    self.stats.recoveries += 1;
                    self.log(Severity::Info, format!("Applied {} to pid {}", action, pid));
                } else {
                    self.stats.interventions += 1;
                    self.log(Severity::Warn, format!("Applied {} to pid {}", action, pid));
                }
            }
            Err(e) => {
                self.stats.failures += 1;
                self.log(
                    Severity::Error,
                    format!("Failed to apply {} to pid {}: {}", action, pid, e),
                );
            }
        }

        ActionOutcome {
            action,
            pid,
            result,
        }
    }

    async fn sample(&self) -> Reading {
        let timeout = self.config.operation_timeout();
        match tokio::time::timeout(timeout, self.sensor.read_temperature()).await {
            Ok(reading) => reading,
            Err(_) => {
                debug!(timeout_ms = %timeout.as_millis(), "Sensor read timed out");
                Reading::Unavailable
            }
        }
    }

    async fn locate(&self) -> Option<ProcessId> {
        let timeout = self.config.operation_timeout();
        let filter = self.config.target_process();
        match tokio::time::timeout(timeout, self.locator.find_process(filter)).await {
            Ok(pid) => pid,
            Err(_) => {
                debug!(timeout_ms = %timeout.as_millis(), "Process lookup timed out");
                None
            }
        }
    }

    fn log(&self, severity: Severity, message: String) {
        let entry = LogEntry::new(self.time_provider.now(), severity, message);
        self.reporter.report(&entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GuardSettings;
    use crate::port::actuator::mocks::RecordingActuator;
    use crate::port::process_locator::mocks::MockProcessLocator;
    use crate::port::reporter::mocks::MemoryReporter;
    use crate::port::sensor::mocks::ScriptedSensor;
    use crate::port::time_provider::SystemTimeProvider;
    use std::time::Duration;

    struct Harness {
        guard: ThermalGuard,
        locator: Arc<MockProcessLocator>,
        actuator: Arc<RecordingActuator>,
        reporter: Arc<MemoryReporter>,
    }

    fn harness(policy: Policy, readings: &[i32], pid: Option<ProcessId>) -> Harness {
        harness_with_sensor(policy, ScriptedSensor::celsius(readings), pid)
    }

    fn harness_with_sensor(policy: Policy, sensor: ScriptedSensor, pid: Option<ProcessId>) -> Harness {
        build(
            policy,
            sensor,
            MockProcessLocator::new(pid),
            RecordingActuator::new(),
        )
    }

    fn build(
        policy: Policy,
        sensor: ScriptedSensor,
        locator: MockProcessLocator,
        actuator: RecordingActuator,
    ) -> Harness {
        let config = GuardConfig::new(GuardSettings {
            policy,
            operation_timeout: Duration::from_millis(200),
            ..Default::default()
        })
        .unwrap();
        let locator = Arc::new(locator);
        let actuator = Arc::new(actuator);
        let reporter = Arc::new(MemoryReporter::new());
        let guard = ThermalGuard::new(
            Arc::new(config),
            Arc::new(sensor),
            locator.clone(),
            actuator.clone(),
            reporter.clone(),
            Arc::new(SystemTimeProvider),
        );
        Harness {
            guard,
            locator,
            actuator,
            reporter,
        }
    }

    #[tokio::test]
    async fn test_normal_reading_no_action() {
        let mut h = harness(Policy::Pause, &[60], Some(100));

        let report = h.guard.tick().await;

        assert_eq!(report.state, ThermalState::Normal);
        assert!(report.actions.is_empty());
        assert_eq!(h.actuator.call_count(), 0);
        assert_eq!(h.reporter.max_severity(), Some(Severity::Info));
    }

    #[tokio::test]
    async fn test_nice_lowers_once_at_warning() {
        let mut h = harness(Policy::Nice, &[76, 77, 78], Some(100));

        for _ in 0..3 {
            h.guard.tick().await;
        }

        assert_eq!(h.actuator.calls(), vec![(Intervention::LowerPriority, 100)]);
        assert!(h.guard.process().is_priority_lowered);
        assert_eq!(h.guard.stats().interventions, 1);
    }

    #[tokio::test]
    async fn test_pause_does_not_act_below_critical() {
        let mut h = harness(Policy::Pause, &[80], Some(100));

        let report = h.guard.tick().await;

        assert_eq!(report.state, ThermalState::Warning);
        assert_eq!(h.actuator.call_count(), 0);
        assert_eq!(h.reporter.max_severity(), Some(Severity::Warn));
    }

    #[tokio::test]
    async fn test_pause_suspends_then_resumes() {
        let mut h = harness(Policy::Pause, &[85, 86, 70], Some(100));

        h.guard.tick().await;
        assert!(h.guard.process().is_paused);
        h.guard.tick().await;
        let report = h.guard.tick().await;

        assert_eq!(
            h.actuator.actions(),
            vec![Intervention::Suspend, Intervention::Resume]
        );
        assert_eq!(report.actions.len(), 1);
        assert!(!h.guard.process().is_intervened());
    }

    #[tokio::test]
    async fn test_pause_stays_paused_while_warning() {
        let mut h = harness(Policy::Pause, &[85, 78], Some(100));

        h.guard.tick().await;
        h.guard.tick().await;

        assert_eq!(h.actuator.actions(), vec![Intervention::Suspend]);
        assert!(h.guard.process().is_paused);
    }

    #[tokio::test]
    async fn test_warn_policy_never_acts() {
        let mut h = harness(Policy::Warn, &[70, 76, 90, 100, 60], Some(100));

        for _ in 0..5 {
            h.guard.tick().await;
        }

        assert_eq!(h.actuator.call_count(), 0);
        assert_eq!(h.reporter.max_severity(), Some(Severity::Error));
    }

    #[tokio::test]
    async fn test_failed_intervention_retried_next_tick() {
        let mut h = harness(Policy::Pause, &[90, 90, 90], Some(100));
        h.actuator.fail_on(
            Intervention::Suspend,
            ActuatorError::PermissionDenied {
                action: Intervention::Suspend,
                pid: 100,
            },
        );

        let report = h.guard.tick().await;
        assert!(!report.actions[0].succeeded());
        assert!(!h.guard.process().is_paused);
        assert!(h.reporter.contains("Failed to apply suspend to pid 100"));

        h.guard.tick().await;
        assert!(!h.guard.process().is_paused);

        h.actuator.clear_failures();
        h.guard.tick().await;
        assert!(h.guard.process().is_paused);

        assert_eq!(h.actuator.call_count(), 3);
        assert_eq!(h.guard.stats().failures, 2);
    }

    #[tokio::test]
    async fn test_recovery_clears_flags_even_on_failure() {
        let mut h = harness(Policy::Nice, &[80, 60], Some(100));
        h.actuator.fail_on(
            Intervention::RestorePriority,
            ActuatorError::CommandFailed("renice: permission denied".to_string()),
        );

        h.guard.tick().await;
        assert!(h.guard.process().is_priority_lowered);

        let report = h.guard.tick().await;
        assert!(!report.actions[0].succeeded());
        assert!(!h.guard.process().is_intervened());
        assert_eq!(h.reporter.max_severity(), Some(Severity::Error));
    }

    #[tokio::test]
    async fn test_unavailable_never_intervenes() {
        let sensor = ScriptedSensor::new([Reading::Unavailable, Reading::Unavailable]);
        let mut h = harness_with_sensor(Policy::Pause, sensor, Some(100));

        for _ in 0..2 {
            let report = h.guard.tick().await;
            assert_eq!(report.state, ThermalState::Unknown);
            assert!(report.actions.is_empty());
        }

        assert_eq!(h.actuator.call_count(), 0);
        assert_eq!(h.reporter.severities(), vec![Severity::Warn, Severity::Warn]);
    }

    #[tokio::test]
    async fn test_unavailable_resumes_paused_process() {
        let sensor = ScriptedSensor::new([Reading::Celsius(90), Reading::Unavailable]);
        let mut h = harness_with_sensor(Policy::Pause, sensor, Some(100));

        h.guard.tick().await;
        assert!(h.guard.process().is_paused);
        h.reporter.clear();

        let report = h.guard.tick().await;

        assert_eq!(report.state, ThermalState::Unknown);
        assert_eq!(report.actions.len(), 1);
        assert_eq!(report.actions[0].action, Intervention::Resume);
        assert!(!h.guard.process().is_intervened());
        assert_eq!(
            h.actuator.calls(),
            vec![(Intervention::Suspend, 100), (Intervention::Resume, 100)]
        );
        assert_eq!(h.reporter.max_severity(), Some(Severity::Warn));
    }

    #[tokio::test]
    async fn test_sensor_timeout_is_unavailable() {
        let sensor = ScriptedSensor::hanging(Duration::from_secs(5), Reading::Celsius(95));
        let mut h = harness_with_sensor(Policy::Pause, sensor, Some(100));

        let report = h.guard.tick().await;

        assert_eq!(report.reading, Reading::Unavailable);
        assert_eq!(h.actuator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_hung_actuator_times_out_and_retries() {
        let mut h = build(
            Policy::Pause,
            ScriptedSensor::celsius(&[90, 90]),
            MockProcessLocator::found(7),
            RecordingActuator::hanging(Duration::from_secs(5)),
        );

        for _ in 0..2 {
            let report = tokio::time::timeout(Duration::from_secs(2), h.guard.tick())
                .await
                .unwrap();

            assert_eq!(
                report.actions,
                vec![ActionOutcome {
                    action: Intervention::Suspend,
                    pid: 7,
                    result: Err(ActuatorError::Timeout(200)),
                }]
            );
            assert!(!h.guard.process().is_paused);
        }

        assert_eq!(h.guard.stats().failures, 2);
        assert!(h.reporter.contains("Failed to apply suspend to pid 7"));
    }

    #[tokio::test]
    async fn test_hung_locator_counts_as_not_found() {
        let mut h = build(
            Policy::Pause,
            ScriptedSensor::celsius(&[95]),
            MockProcessLocator::hanging(Duration::from_secs(5), 7),
            RecordingActuator::new(),
        );

        let report = tokio::time::timeout(Duration::from_secs(2), h.guard.tick())
            .await
            .unwrap();

        assert_eq!(report.state, ThermalState::Critical);
        assert_eq!(report.pid, None);
        assert!(report.actions.is_empty());
        assert_eq!(h.actuator.call_count(), 0);
        assert!(h.reporter.contains("not found"));
    }

    #[tokio::test]
    async fn test_missing_process_logged_not_acted() {
        let mut h = harness(Policy::Nice, &[80], None);

        let report = h.guard.tick().await;

        assert_eq!(report.pid, None);
        assert_eq!(h.actuator.call_count(), 0);
        assert!(h.reporter.contains("not found"));
        assert_eq!(h.locator.lookups(), vec!["claude".to_string()]);
    }

    #[tokio::test]
    async fn test_recovery_targets_intervened_pid() {
        let mut h = harness(Policy::Pause, &[90, 60], Some(100));

        h.guard.tick().await;
        h.locator.set_pid(None);
        h.guard.tick().await;

        assert_eq!(
            h.actuator.calls(),
            vec![(Intervention::Suspend, 100), (Intervention::Resume, 100)]
        );
    }

    #[tokio::test]
    async fn test_reconcile_is_noop_when_clean() {
        let mut h = harness(Policy::Pause, &[60], Some(100));

        h.guard.tick().await;
        let outcomes = h.guard.reconcile().await;

        assert!(outcomes.is_empty());
        assert_eq!(h.actuator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_undoes_everything() {
        let mut h = harness(Policy::Nice, &[80], Some(100));
        h.guard.tick().await;

        let outcomes = h.guard.reconcile().await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].action, Intervention::RestorePriority);
        assert!(!h.guard.process().is_intervened());
        assert!(h.reporter.contains("Reconciling"));
    }
}
