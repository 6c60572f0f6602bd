// Port Layer - Interfaces for external dependencies

pub mod actuator;
pub mod process_locator;
pub mod reporter;
pub mod sensor;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use actuator::{ActuatorError, InterventionActuator};
pub use process_locator::ProcessLocator;
pub use reporter::{EventReporter, TracingReporter, LOGGED_AT_FIELD};
pub use sensor::{normalize_raw, SensorError, TemperatureSensor};
pub use time_provider::TimeProvider;
