//! Familiar service bootstrap.
//!
//! Production glue around [`familiar_core`] and [`familiar_crypto`]: the
//! startup/handoff boundary between a host application and the embedded
//! agent + web dashboard.
//!
//! # Architecture
//!
//! ```text
//!   host ──start(data_dir, config)──▶ Bootstrap
//!                                       │ bind config   (ServiceEnv)
//!                                       │ hash PIN      (credentials)
//!                                       │ dashboard key (credentials, key_file)
//!                                       │ data root     (data_root)
//!                                       ▼
//!                          AgentFactory ──▶ DashboardRunner ──▶ serve()
//!   host ──stop()──▶ ShutdownHandle ─────────────watch─────────────┘
//! ```
//!
//! # Components
//!
//! - [`Bootstrap`]: Orchestrates the startup sequence
//! - [`ShutdownHandle`]: Fire-and-forget stop request
//! - [`KeyExchangeFile`]: Atomic `<dataDir>/.dashboard_key`
//! - [`LoopbackDashboard`]: axum dashboard bound to loopback
//! - [`SystemEnv`]: Production environment (OS cryptographic RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bootstrap;
pub mod credentials;
mod dashboard;
pub mod data_root;
mod error;
mod key_file;
mod service;
mod shutdown;
mod system_env;

pub use bootstrap::{Bootstrap, Provisioned, RunningService, provision};
pub use credentials::PinStatus;
pub use dashboard::{LoopbackDashboard, LoopbackServer};
pub use data_root::{DATA_ROOT_DIR, DataRoot};
pub use error::{BootstrapError, ExternalError};
pub use key_file::{KEY_FILE_NAME, KeyExchangeFile};
pub use service::{
    Agent, AgentFactory, DASHBOARD_PORT, DashboardConfig, DashboardRunner, DashboardServer,
    LocalAgent, ServiceContext,
};
pub use shutdown::{ShutdownHandle, ShutdownListener, shutdown_channel};
pub use system_env::SystemEnv;
