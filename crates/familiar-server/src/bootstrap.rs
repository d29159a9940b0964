//! Bootstrap Orchestrator.
//!
//! Runs the startup sequence exactly once per start request:
//!
//! 1. bind the host configuration into the service environment
//! 2. consume the staged owner PIN and publish its hash
//! 3. generate the dashboard key, publish it, write the key exchange file
//! 4. redirect the data root
//! 5. build the agent, then bind the dashboard on `127.0.0.1:5000`
//!
//! Steps are sequential and every failure aborts the rest. The service
//! environment is frozen into an `Arc` before any collaborator sees it.
//! Steps 1 through 4 hash and fsync, so `start` runs them on the blocking
//! pool.
//!
//! Progress is published as [`ServiceState`] on a `watch` channel so the host
//! can render it without polling.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use familiar_core::{BindReport, ConfigMap, Environment, ServiceEnv, ServiceState, keys};
use tokio::sync::watch;

use crate::{
    credentials::{self, PinStatus},
    data_root,
    error::BootstrapError,
    key_file::KeyExchangeFile,
    service::{AgentFactory, DashboardConfig, DashboardRunner, DashboardServer, ServiceContext},
    shutdown::{ShutdownHandle, ShutdownListener, shutdown_channel},
    system_env::SystemEnv,
};

/// Result of steps 1 through 4: everything the collaborators need.
#[derive(Debug, Clone)]
pub struct Provisioned {
    /// Context handed to the agent and the dashboard
    pub context: ServiceContext,
    /// Where the dashboard key was written
    pub key_file: KeyExchangeFile,
    /// Keys that applied and keys that did not
    pub bind_report: BindReport,
    /// Outcome of the staged owner PIN
    pub pin: PinStatus,
}

/// Provision credentials, key file and data root.
///
/// `base` is the inherited service environment; host configuration in
/// `config` overwrites it key by key. Fails without side effects on disk if
/// `data_dir` is relative or the entropy source is down.
pub fn provision<E: Environment>(
    env: &E,
    mut base: ServiceEnv,
    data_dir: &Path,
    config: ConfigMap,
) -> Result<Provisioned, BootstrapError> {
    if !data_dir.is_absolute() {
        return Err(BootstrapError::InvalidDataDir(data_dir.to_path_buf()));
    }

    let bind_report = base.bind(config);
    tracing::debug!(
        applied = bind_report.applied.len(),
        rejected = bind_report.errors.len(),
        "Host configuration bound"
    );

    let pin = credentials::consume_raw_secret(env, &mut base)?;

    let dashboard_key = credentials::generate_dashboard_key(env)?;
    base.set(keys::DASHBOARD_KEY, dashboard_key.as_str());

    std::fs::create_dir_all(data_dir).map_err(|e| BootstrapError::filesystem(data_dir, e))?;
    let key_file = KeyExchangeFile::in_dir(data_dir);
    key_file.write(&dashboard_key)?;
    tracing::debug!(len = dashboard_key.as_str().len(), "Dashboard key provisioned");

    let data_root = data_root::redirect(data_dir)?;

    let context = ServiceContext { env: Arc::new(base), data_root, dashboard_key };
    Ok(Provisioned { context, key_file, bind_report, pin })
}

/// Bootstrap Orchestrator.
///
/// Generic over the agent factory `F`, the dashboard runner `R` and the
/// randomness source `E`. Production uses [`SystemEnv`]; tests swap in a
/// seeded environment with [`Bootstrap::with_env`].
pub struct Bootstrap<F, R, E = SystemEnv> {
    env: E,
    agents: F,
    dashboard: R,
    base_env: ServiceEnv,
    shutdown: ShutdownHandle,
    listener: ShutdownListener,
    state: watch::Sender<ServiceState>,
}

impl<F, R> Bootstrap<F, R, SystemEnv>
where
    F: AgentFactory,
    R: DashboardRunner,
{
    /// Orchestrator backed by the OS random source and an empty inherited
    /// environment.
    pub fn new(agents: F, dashboard: R) -> Self {
        let (shutdown, listener) = shutdown_channel();
        let (state, _) = watch::channel(ServiceState::Idle);
        Self {
            env: SystemEnv::new(),
            agents,
            dashboard,
            base_env: ServiceEnv::new(),
            shutdown,
            listener,
            state,
        }
    }
}

impl<F, R, E> Bootstrap<F, R, E>
where
    F: AgentFactory,
    R: DashboardRunner,
    E: Environment,
{
    /// Replace the randomness source.
    pub fn with_env<E2: Environment>(self, env: E2) -> Bootstrap<F, R, E2> {
        Bootstrap {
            env,
            agents: self.agents,
            dashboard: self.dashboard,
            base_env: self.base_env,
            shutdown: self.shutdown,
            listener: self.listener,
            state: self.state,
        }
    }

    /// Seed the service environment, e.g. from
    /// [`ServiceEnv::inherit_process`]. Host configuration still wins.
    #[must_use]
    pub fn inherit(mut self, base: ServiceEnv) -> Self {
        self.base_env = base;
        self
    }

    /// Handle that stops the service. Valid before, during and after start.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Observe the lifecycle state.
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    /// Run the startup sequence and bind the dashboard.
    ///
    /// On success the state is `Running` and the returned service is ready
    /// to [`serve`](RunningService::serve). On failure the state is `Error`
    /// and nothing is listening.
    pub async fn start(
        self,
        data_dir: &Path,
        config: ConfigMap,
    ) -> Result<RunningService<R::Server>, BootstrapError> {
        let Self { env, agents, dashboard, base_env, shutdown, listener, state } = self;

        state.send_replace(ServiceState::Starting);
        tracing::info!(data_dir = %data_dir.display(), "Bootstrap starting");

        let started = async {
            let provisioned = provision_blocking(env, base_env, data_dir, config).await?;
            let agent = agents.build(&provisioned.context)?;
            let server = dashboard
                .bind(agent, provisioned.context.clone(), DashboardConfig::loopback())
                .await?;
            Ok::<_, BootstrapError>((provisioned, server))
        }
        .await;

        match started {
            Ok((provisioned, server)) => {
                let local_addr = server.local_addr();
                state.send_replace(ServiceState::Running { port: local_addr.port() });
                tracing::info!(%local_addr, pin = ?provisioned.pin, "Familiar service running");
                Ok(RunningService { server, shutdown, listener, state, provisioned })
            },
            Err(e) => {
                tracing::error!(error = %e, "Bootstrap failed");
                state.send_replace(ServiceState::Error(e.to_string()));
                Err(e)
            },
        }
    }

    /// [`start`](Self::start), then [`serve`](RunningService::serve) until
    /// shutdown.
    pub async fn run(self, data_dir: &Path, config: ConfigMap) -> Result<(), BootstrapError> {
        self.start(data_dir, config).await?.serve().await
    }
}

/// [`provision`] on the blocking pool.
///
/// Hashing the PIN and the key file fsync would otherwise stall the runtime
/// worker driving `start`.
async fn provision_blocking<E: Environment>(
    env: E,
    base: ServiceEnv,
    data_dir: &Path,
    config: ConfigMap,
) -> Result<Provisioned, BootstrapError> {
    let dir = data_dir.to_path_buf();
    match tokio::task::spawn_blocking(move || provision(&env, base, &dir, config)).await {
        Ok(result) => result,
        Err(e) => match e.try_into_panic() {
            Ok(payload) => std::panic::resume_unwind(payload),
            Err(e) => Err(BootstrapError::filesystem(data_dir, std::io::Error::other(e.to_string()))),
        },
    }
}

/// A started service whose dashboard is bound.
pub struct RunningService<S> {
    server: S,
    shutdown: ShutdownHandle,
    listener: ShutdownListener,
    state: watch::Sender<ServiceState>,
    provisioned: Provisioned,
}

impl<S: DashboardServer> RunningService<S> {
    /// Serve the dashboard until a shutdown is requested.
    pub async fn serve(self) -> Result<(), BootstrapError> {
        let Self { server, listener, state, .. } = self;

        match server.serve(listener).await {
            Ok(()) => {
                state.send_replace(ServiceState::Stopped);
                tracing::info!("Familiar service stopped");
                Ok(())
            },
            Err(e) => {
                tracing::error!(error = %e, "Dashboard failed");
                let e = BootstrapError::from(e);
                state.send_replace(ServiceState::Error(e.to_string()));
                Err(e)
            },
        }
    }

    /// Address the dashboard is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Path of the key exchange file.
    pub fn key_file(&self) -> &KeyExchangeFile {
        &self.provisioned.key_file
    }

    /// Context the collaborators were built with.
    pub fn context(&self) -> &ServiceContext {
        &self.provisioned.context
    }

    /// Configuration keys that applied and failed.
    pub fn bind_report(&self) -> &BindReport {
        &self.provisioned.bind_report
    }

    /// Outcome of the staged owner PIN.
    pub fn pin_status(&self) -> PinStatus {
        self.provisioned.pin
    }

    /// Handle that stops the service.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Observe the lifecycle state.
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    /// Resolved data root.
    pub fn data_root(&self) -> PathBuf {
        self.provisioned.context.data_root.path().to_path_buf()
    }
}
