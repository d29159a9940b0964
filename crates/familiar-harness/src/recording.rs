//! Recording collaborators.
//!
//! Stand-ins for the agent and the dashboard that bind no socket and record
//! what the bootstrap handed them: the context each one saw, the dashboard
//! configuration, and how many shutdowns the dashboard observed.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use familiar_server::{
    Agent, AgentFactory, DashboardConfig, DashboardRunner, DashboardServer, ExternalError,
    ServiceContext, ShutdownListener,
};

/// What the agent factory saw when it ran.
#[derive(Debug, Clone)]
pub struct AgentBuild {
    /// Context passed to the factory
    pub context: ServiceContext,
    /// Whether the data root directory already existed
    pub data_root_existed: bool,
}

/// What the dashboard runner was asked to bind.
#[derive(Debug, Clone)]
pub struct DashboardBind {
    /// Name of the agent it was given
    pub agent: String,
    /// Context passed to the runner
    pub context: ServiceContext,
    /// Requested configuration
    pub config: DashboardConfig,
}

#[derive(Debug, Default)]
struct Log {
    agent_builds: Vec<AgentBuild>,
    dashboard_binds: Vec<DashboardBind>,
    serving: usize,
    shutdowns: usize,
}

/// Shared log of everything the recording collaborators observed.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Log>>,
}

impl Recorder {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Agent factory that records its context and succeeds.
    pub fn agent_factory(&self) -> RecordingAgentFactory {
        RecordingAgentFactory { recorder: self.clone(), failure: None }
    }

    /// Agent factory that records its context and fails with `reason`.
    pub fn failing_agent_factory(&self, reason: &str) -> RecordingAgentFactory {
        RecordingAgentFactory { recorder: self.clone(), failure: Some(reason.to_string()) }
    }

    /// Dashboard that records the bind and serves until shutdown.
    pub fn dashboard(&self) -> RecordingDashboard {
        RecordingDashboard { recorder: self.clone(), bind_failure: None }
    }

    /// Dashboard whose bind fails, as if the port were taken.
    pub fn failing_dashboard(&self, reason: &str) -> RecordingDashboard {
        RecordingDashboard { recorder: self.clone(), bind_failure: Some(reason.to_string()) }
    }

    /// Every agent factory invocation, in order.
    pub fn agent_builds(&self) -> Vec<AgentBuild> {
        self.log().agent_builds.clone()
    }

    /// Every dashboard bind, in order.
    pub fn dashboard_binds(&self) -> Vec<DashboardBind> {
        self.log().dashboard_binds.clone()
    }

    /// Number of dashboards currently serving.
    pub fn serving(&self) -> usize {
        self.log().serving
    }

    /// Number of shutdowns the dashboard observed.
    pub fn shutdowns(&self) -> usize {
        self.log().shutdowns
    }
}

/// [`AgentFactory`] that records the context it was given.
#[derive(Debug, Clone)]
pub struct RecordingAgentFactory {
    recorder: Recorder,
    failure: Option<String>,
}

impl AgentFactory for RecordingAgentFactory {
    fn build(&self, ctx: &ServiceContext) -> Result<Arc<dyn Agent>, ExternalError> {
        self.recorder.log().agent_builds.push(AgentBuild {
            context: ctx.clone(),
            data_root_existed: ctx.data_root.path().is_dir(),
        });

        match &self.failure {
            Some(reason) => Err(ExternalError::Agent(reason.clone())),
            None => Ok(Arc::new(RecordingAgent { name: "recorded".to_string() })),
        }
    }
}

/// Agent with a fixed name.
#[derive(Debug)]
pub struct RecordingAgent {
    name: String,
}

impl Agent for RecordingAgent {
    fn name(&self) -> &str {
        &self.name
    }
}

/// [`DashboardRunner`] that records instead of binding a socket.
#[derive(Debug, Clone)]
pub struct RecordingDashboard {
    recorder: Recorder,
    bind_failure: Option<String>,
}

/// Bound [`RecordingDashboard`].
#[derive(Debug)]
pub struct RecordingServer {
    recorder: Recorder,
    addr: SocketAddr,
}

impl DashboardRunner for RecordingDashboard {
    type Server = RecordingServer;

    async fn bind(
        self,
        agent: Arc<dyn Agent>,
        ctx: ServiceContext,
        config: DashboardConfig,
    ) -> Result<RecordingServer, ExternalError> {
        self.recorder.log().dashboard_binds.push(DashboardBind {
            agent: agent.name().to_string(),
            context: ctx,
            config,
        });

        if let Some(reason) = self.bind_failure {
            return Err(ExternalError::Bind { addr: config.addr, reason });
        }
        Ok(RecordingServer { recorder: self.recorder, addr: config.addr })
    }
}

impl DashboardServer for RecordingServer {
    fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    async fn serve(self, mut shutdown: ShutdownListener) -> Result<(), ExternalError> {
        self.recorder.log().serving += 1;
        shutdown.wait().await;

        let mut log = self.recorder.log();
        log.serving -= 1;
        log.shutdowns += 1;
        tracing::debug!(shutdowns = log.shutdowns, "Recording dashboard stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use familiar_core::ServiceEnv;
    use familiar_crypto::DashboardKey;
    use familiar_server::{data_root, shutdown_channel};

    use super::*;

    fn context(dir: &std::path::Path) -> ServiceContext {
        ServiceContext {
            env: Arc::new(ServiceEnv::new()),
            data_root: data_root::redirect(dir).unwrap(),
            dashboard_key: DashboardKey::from_entropy(&[1; 32]),
        }
    }

    #[tokio::test]
    async fn server_counts_one_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new();
        let agent = recorder.agent_factory().build(&context(dir.path())).unwrap();

        let server = recorder
            .dashboard()
            .bind(agent, context(dir.path()), DashboardConfig::loopback())
            .await
            .unwrap();
        let (handle, listener) = shutdown_channel();
        let serving = tokio::spawn(server.serve(listener));

        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), serving).await.unwrap().unwrap().unwrap();

        assert_eq!(recorder.shutdowns(), 1);
        assert_eq!(recorder.serving(), 0);
        assert_eq!(recorder.dashboard_binds().len(), 1);
        assert!(recorder.agent_builds()[0].data_root_existed);
    }

    #[tokio::test]
    async fn failing_bind_is_still_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new();
        let agent: Arc<dyn Agent> = Arc::new(RecordingAgent { name: "a".to_string() });

        let result = recorder
            .failing_dashboard("port taken")
            .bind(agent, context(dir.path()), DashboardConfig::loopback())
            .await;

        assert!(matches!(result, Err(ExternalError::Bind { .. })));
        assert_eq!(recorder.dashboard_binds().len(), 1);
    }
}
