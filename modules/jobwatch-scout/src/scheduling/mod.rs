pub mod jitter;
pub mod scheduler;
pub mod stats;

pub use jitter::JitteredInterval;
pub use scheduler::{CycleScheduler, SchedulerState};
pub use stats::CycleStats;
