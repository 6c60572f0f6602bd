// Application Layer - Guard state machine and lifecycle

pub mod constants;
pub mod guard;
pub mod lifecycle;
pub mod shutdown;

// Re-exports
pub use guard::{ActionOutcome, GuardStats, ThermalGuard, TickReport};
pub use lifecycle::{LifecycleController, LifecyclePhase};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
