//! # Troupe Runtime Configuration
//!
//! Configuration knobs of the actor runtime and the logging setup shared by
//! every binary and test harness that drives it.
//!
//! ## Sources
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults ([`RuntimeConfig::default`])
//! 2. an optional TOML file
//! 3. `TROUPE_`-prefixed environment variables, `__` separating nested keys
//!    (`TROUPE_INBOX_CAPACITY=16`, `TROUPE_LOGGING__LEVEL=debug`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use troupe_config::{init_tracing, RuntimeConfig};
//! use std::path::Path;
//!
//! let config = RuntimeConfig::load(Some(Path::new("troupe.toml")))?;
//! init_tracing(&config.logging)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod logging;
pub mod runtime_config;

pub use logging::{init_tracing, LoggingConfig};
pub use runtime_config::RuntimeConfig;
