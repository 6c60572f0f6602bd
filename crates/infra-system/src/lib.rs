// Thermal Guard Infrastructure - System Adapters
// Implements: TemperatureSensor, ProcessLocator, InterventionActuator

pub mod log_destination;
pub mod process_control;
pub mod process_locator_impl;
pub mod sensor_impl;
pub mod subprocess_executor;

pub use log_destination::{resolve_log_destination, LogDestination};
pub use process_control::SignalActuator;
pub use process_locator_impl::SysinfoProcessLocator;
pub use sensor_impl::{CommandSensor, RawUnit, SysfsSensor};
pub use subprocess_executor::{SubprocessError, SubprocessExecutor};
