// Domain Layer - Pure guard logic and entities

pub mod config;
pub mod error;
pub mod log_entry;
pub mod policy;
pub mod process;
pub mod thermal;

// Re-exports
pub use config::{GuardConfig, GuardSettings};
pub use error::DomainError;
pub use log_entry::{LogEntry, Severity};
pub use policy::Policy;
pub use process::{Intervention, ManagedProcess, ProcessId};
pub use thermal::{Reading, ThermalState, Thresholds};
