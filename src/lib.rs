// Kagami image proxy library

pub mod config;
pub mod constants;
pub mod error;
pub mod image_processor;
pub mod logging;
pub mod metrics;
pub mod pipeline; // Per-request context
pub mod proxy;
pub mod router;
pub mod source;
