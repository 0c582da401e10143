//! Task store & lifecycle management.

pub mod service;
pub mod store;

pub use service::CompressionService;
pub use store::TaskStore;
