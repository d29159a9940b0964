//! Test harness for the Familiar bootstrap.
//!
//! Deterministic implementations of the bootstrap's seams so the full start
//! sequence can run in tests without OS entropy or a real socket.
//!
//! - [`SimEnv`]: seeded ChaCha20 randomness with failure injection
//! - [`Recorder`]: agent factory and dashboard doubles that log what the
//!   bootstrap gave them

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod recording;
pub mod sim_env;

pub use recording::{
    AgentBuild, DashboardBind, Recorder, RecordingAgent, RecordingAgentFactory, RecordingDashboard,
    RecordingServer,
};
pub use sim_env::SimEnv;
