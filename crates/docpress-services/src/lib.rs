//! Docpress Services Library
//!
//! The task store & lifecycle manager, the compression service tying intake
//! to orchestration, the background cleanup sweep, and telemetry setup.

pub mod cleanup;
pub mod tasks;
pub mod telemetry;

// Re-export commonly used types
pub use cleanup::CleanupService;
pub use tasks::{CompressionService, TaskStore};
pub use telemetry::init_telemetry;
