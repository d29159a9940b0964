//! Loopback dashboard.
//!
//! Minimal axum front for the embedded service: an unauthenticated liveness
//! probe and a status endpoint guarded by the ephemeral dashboard key. The
//! host attaches the key from the key exchange file as
//! `Authorization: Bearer <key>` (older builds send `X-API-Key: <key>`).
//!
//! Refuses to listen anywhere but a loopback interface.

use std::{net::SocketAddr, sync::Arc, time::Instant};

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use familiar_core::keys;
use familiar_crypto::DashboardKey;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::{
    error::ExternalError,
    service::{Agent, DashboardConfig, DashboardRunner, DashboardServer, ServiceContext},
    shutdown::ShutdownListener,
};

/// Header older hosts use to present the dashboard key.
const API_KEY_HEADER: &str = "x-api-key";

/// axum-backed [`DashboardRunner`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackDashboard;

/// Bound loopback dashboard.
pub struct LoopbackServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

struct DashboardState {
    key: DashboardKey,
    agent: Arc<dyn Agent>,
    pin_protected: bool,
    started: Instant,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    agent: String,
    status: &'static str,
    pin_protected: bool,
    uptime_secs: u64,
}

impl DashboardRunner for LoopbackDashboard {
    type Server = LoopbackServer;

    async fn bind(
        self,
        agent: Arc<dyn Agent>,
        ctx: ServiceContext,
        config: DashboardConfig,
    ) -> Result<LoopbackServer, ExternalError> {
        if !config.addr.ip().is_loopback() {
            return Err(ExternalError::NonLoopback(config.addr));
        }

        let listener = TcpListener::bind(config.addr)
            .await
            .map_err(|e| ExternalError::Bind { addr: config.addr, reason: e.to_string() })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ExternalError::Bind { addr: config.addr, reason: e.to_string() })?;

        let state = DashboardState {
            key: ctx.dashboard_key.clone(),
            agent,
            pin_protected: ctx.env.contains(keys::OWNER_PIN_HASH),
            started: Instant::now(),
        };

        tracing::info!(%local_addr, debug = config.debug, "Dashboard bound");
        Ok(LoopbackServer { listener, router: router(Arc::new(state)), local_addr })
    }
}

impl DashboardServer for LoopbackServer {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    async fn serve(self, mut shutdown: ShutdownListener) -> Result<(), ExternalError> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
            .map_err(|e| ExternalError::Serve(e.to_string()))?;

        tracing::info!("Dashboard stopped");
        Ok(())
    }
}

fn router(state: Arc<DashboardState>) -> Router {
    let api = Router::new()
        .route("/api/status", get(status))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), require_dashboard_key));

    Router::new().route("/health", get(|| async { "ok" })).merge(api).with_state(state)
}

async fn status(State(state): State<Arc<DashboardState>>) -> Json<StatusBody> {
    Json(StatusBody {
        agent: state.agent.name().to_string(),
        status: "running",
        pin_protected: state.pin_protected,
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

async fn require_dashboard_key(
    State(state): State<Arc<DashboardState>>,
    request: Request,
    next: Next,
) -> Response {
    match presented_key(request.headers()) {
        Some(presented) if state.key.matches(presented) => next.run(request).await,
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Bearer credential first, then `X-API-Key`. An `Authorization` header with
/// another scheme does not hide the legacy header.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    bearer.or_else(|| headers.get(API_KEY_HEADER)?.to_str().ok())
}
