//! Seams to the external agent and dashboard.
//!
//! The bootstrap never reaches into the agent or the dashboard. It builds a
//! [`ServiceContext`] (frozen service environment, data root, dashboard key)
//! and passes it by reference to the agent factory and by value to the
//! dashboard runner. No collaborator reads process-global state to learn its
//! configuration.

use std::{
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use familiar_core::{ServiceEnv, prefs};
use familiar_crypto::DashboardKey;

use crate::{data_root::DataRoot, error::ExternalError, shutdown::ShutdownListener};

/// Loopback port the dashboard listens on.
pub const DASHBOARD_PORT: u16 = 5000;

/// Everything a collaborator is allowed to know about the bootstrap.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Frozen service environment (host configuration, key, PIN hash)
    pub env: Arc<ServiceEnv>,
    /// Root for all persistent state
    pub data_root: DataRoot,
    /// Current dashboard key
    pub dashboard_key: DashboardKey,
}

/// Dashboard bind parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Diagnostic mode
    pub debug: bool,
}

impl DashboardConfig {
    /// `127.0.0.1:5000`, diagnostics off. The only configuration the
    /// bootstrap ever uses.
    pub const fn loopback() -> Self {
        Self { addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DASHBOARD_PORT), debug: false }
    }
}

/// The agent behind the dashboard.
pub trait Agent: Send + Sync + 'static {
    /// Display name.
    fn name(&self) -> &str;
}

/// Builds the agent once the data root and credentials are in place.
pub trait AgentFactory: Send + 'static {
    /// Construct the agent.
    fn build(&self, ctx: &ServiceContext) -> Result<Arc<dyn Agent>, ExternalError>;
}

impl<F> AgentFactory for F
where
    F: Fn(&ServiceContext) -> Result<Arc<dyn Agent>, ExternalError> + Send + 'static,
{
    fn build(&self, ctx: &ServiceContext) -> Result<Arc<dyn Agent>, ExternalError> {
        self(ctx)
    }
}

/// Starts the dashboard.
///
/// Binding and serving are separate so the bootstrap can report the service
/// as running only once the listener actually exists.
pub trait DashboardRunner: Send + 'static {
    /// Bound, not yet serving.
    type Server: DashboardServer;

    /// Bind the listener. Failure here aborts the bootstrap.
    fn bind(
        self,
        agent: Arc<dyn Agent>,
        ctx: ServiceContext,
        config: DashboardConfig,
    ) -> impl Future<Output = Result<Self::Server, ExternalError>> + Send;
}

/// A bound dashboard.
pub trait DashboardServer: Send + 'static {
    /// Address the listener is bound to.
    fn local_addr(&self) -> SocketAddr;

    /// Serve until `shutdown` fires, then unwind gracefully.
    fn serve(
        self,
        shutdown: ShutdownListener,
    ) -> impl Future<Output = Result<(), ExternalError>> + Send;
}

/// Stand-in agent for the standalone binary.
///
/// Takes its name from `FAMILIAR_AGENT_NAME`.
#[derive(Debug, Clone)]
pub struct LocalAgent {
    name: String,
}

impl LocalAgent {
    /// Name used when the host configured none.
    pub const DEFAULT_NAME: &'static str = "Familiar";

    /// Agent with a fixed name.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Build from the service environment.
    pub fn from_context(ctx: &ServiceContext) -> Self {
        Self::from_name(ctx.env.get(prefs::AGENT_NAME).unwrap_or(Self::DEFAULT_NAME))
    }

    /// Factory suitable for [`crate::Bootstrap`].
    pub fn factory() -> impl AgentFactory {
        |ctx: &ServiceContext| -> Result<Arc<dyn Agent>, ExternalError> {
            Ok(Arc::new(Self::from_context(ctx)))
        }
    }
}

impl Agent for LocalAgent {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use familiar_crypto::DASHBOARD_KEY_BYTES;

    use super::*;

    fn context(env: ServiceEnv, dir: &tempfile::TempDir) -> ServiceContext {
        ServiceContext {
            env: Arc::new(env),
            data_root: crate::data_root::redirect(dir.path()).unwrap(),
            dashboard_key: DashboardKey::from_entropy(&[0; DASHBOARD_KEY_BYTES]),
        }
    }

    #[test]
    fn loopback_config_is_fixed() {
        let config = DashboardConfig::loopback();
        assert_eq!(config.addr.to_string(), "127.0.0.1:5000");
        assert!(config.addr.ip().is_loopback());
        assert!(!config.debug);
    }

    #[test]
    fn local_agent_reads_name_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(ServiceEnv::inherit([(prefs::AGENT_NAME, "Jeeves")]), &dir);
        let agent = LocalAgent::factory().build(&ctx).unwrap();
        assert_eq!(agent.name(), "Jeeves");
    }

    #[test]
    fn local_agent_defaults_name() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(ServiceEnv::new(), &dir);
        assert_eq!(LocalAgent::from_context(&ctx).name(), LocalAgent::DEFAULT_NAME);
    }
}
