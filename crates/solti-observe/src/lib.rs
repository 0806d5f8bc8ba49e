//! Process-wide logging setup for components.
//!
//! ```rust,no_run
//! use solti_observe::{LoggerConfig, init_logger};
//!
//! # fn main() -> Result<(), solti_observe::LoggerError> {
//! let cfg = LoggerConfig::from_env()?;
//! init_logger(&cfg)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```
mod logger;
pub use logger::*;
