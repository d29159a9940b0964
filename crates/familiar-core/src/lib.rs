//! Familiar bootstrap core.
//!
//! Pure logic for handing a host application's configuration to the embedded
//! Familiar service: binding configuration into an explicit service
//! environment, staging and consuming the owner's raw PIN, mapping host
//! preferences, and tracking the service lifecycle.
//!
//! # Architecture
//!
//! Nothing in this crate performs I/O. Randomness is drawn through the
//! [`Environment`] trait so the production crate can plug in the OS RNG and
//! tests can plug in a seeded generator.
//!
//! # Components
//!
//! - [`ServiceEnv`]: explicit configuration object replacing process-global
//!   environment mutation
//! - [`HostPreferences`]: host settings to [`ConfigMap`]
//! - [`ServiceState`]: lifecycle observed by the host
//! - [`Environment`]: entropy abstraction

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod prefs;
pub mod state;

pub use config::{BindReport, ConfigMap, ConfigValue, ServiceEnv, keys};
pub use env::Environment;
pub use error::{ConfigurationError, EntropyError};
pub use prefs::{HostPreferences, Provider};
pub use state::ServiceState;
