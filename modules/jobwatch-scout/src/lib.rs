pub mod agent;
pub mod notify;
pub mod pipeline;
pub mod scheduling;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
