// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use coachbot_core::{Clock, CoachError};
use coachbot_ledger::LedgerStore;
use coachbot_slack::{SignatureVerifier, SlackClient};

use crate::auth::slack_signature_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Ledger files under the prepared state directory.
    pub store: Arc<LedgerStore>,
    /// Time source for vote timestamps and the signature window.
    pub clock: Arc<dyn Clock>,
    /// Verifies `x-slack-signature`. `None` accepts unsigned requests.
    pub verifier: Option<SignatureVerifier>,
    /// Bot-token client for avatars, confirmations and count refreshes.
    pub slack: Option<SlackClient>,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

impl GatewayState {
    pub fn new(store: Arc<LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            verifier: None,
            slack: None,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_verifier(mut self, verifier: SignatureVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Attach a Slack client; ignored unless it carries a bot token.
    pub fn with_slack(mut self, slack: SlackClient) -> Self {
        self.slack = slack.has_bot_token().then_some(slack);
        self
    }
}

/// Gateway listen address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the router:
/// - GET /health (unauthenticated)
/// - POST /slack/actions (Slack signature checked when a verifier is set)
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let slack_routes = Router::new()
        .route("/slack/actions", post(handlers::post_slack_actions))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            slack_signature_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(slack_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), CoachError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    if state.verifier.is_none() {
        tracing::warn!(
            "slack.signing_secret is not set; incoming Slack requests will not be verified"
        );
    }

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CoachError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CoachError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway stopped");
    Ok(())
}
