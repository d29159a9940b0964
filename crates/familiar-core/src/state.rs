//! Service lifecycle as observed by the host.

use std::fmt;

/// Lifecycle of the embedded service.
///
/// Transitions: `Idle -> Starting -> Running -> Stopped`, with `Error`
/// reachable from `Starting` and `Running`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceState {
    /// Not started
    #[default]
    Idle,
    /// Bootstrap in progress
    Starting,
    /// Dashboard bound and serving
    Running {
        /// Loopback port the dashboard listens on
        port: u16,
    },
    /// Bootstrap or serving failed
    Error(String),
    /// Shut down after a stop request
    Stopped,
}

impl ServiceState {
    /// Whether a start request should be ignored in this state.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Running { .. })
    }

    /// Whether the service has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Stopped)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Running { port } => write!(f, "running on port {port}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
