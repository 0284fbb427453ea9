//! Logging setup for signpost.
//!
//! - **Logging**: structured output through `tracing-subscriber`, pretty for
//!   development and JSON for production
//! - **Fields**: shared field names so log lines from every crate line up
//!
//! # Example
//!
//! ```rust,ignore
//! use signpost_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::production())?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
