pub mod service;
pub mod tracing;

pub use self::tracing::TracingService;
pub use service::*;
