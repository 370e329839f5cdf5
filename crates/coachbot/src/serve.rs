// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `coachbot serve` command implementation.
//!
//! Runs the gateway that receives Slack button clicks and writes them to
//! the ledgers in the prepared state directory. With `--socket` the clicks
//! arrive over a Slack Socket Mode connection instead of HTTP.

use tracing::{info, warn};

use coachbot_core::CoachError;
use coachbot_gateway::{start_server, GatewayState, ServerConfig, SocketModeReceiver};
use coachbot_slack::{SignatureVerifier, SlackClient};

use crate::context::RunContext;

/// Gateway state from config: signature checks when a signing secret is
/// set, bot follow-ups when a bot token is set.
pub fn gateway_state(ctx: &RunContext) -> Result<GatewayState, CoachError> {
    let slack = &ctx.config.slack;
    let mut state = GatewayState::new(ctx.store.clone(), ctx.clock.clone());

    if let Some(secret) = slack.signing_secret.as_deref().filter(|s| !s.is_empty()) {
        state = state.with_verifier(SignatureVerifier::new(secret));
    }
    let client = SlackClient::from_config(slack)?;
    if client.has_bot_token() {
        state = state.with_slack(client);
    } else {
        info!("no slack.bot_token; votes are recorded without avatar lookup or count refresh");
    }
    Ok(state)
}

pub async fn run_serve(ctx: &RunContext) -> Result<(), CoachError> {
    let server = ServerConfig {
        host: ctx.config.server.bind_address.clone(),
        port: ctx.config.server.port,
    };
    info!(
        state_dir = %ctx.store.state_dir().display(),
        "starting coachbot serve"
    );
    start_server(&server, gateway_state(ctx)?, shutdown_signal()).await
}

/// The Socket Mode receiver, which needs `slack.app_token`.
pub fn socket_receiver(ctx: &RunContext) -> Result<SocketModeReceiver, CoachError> {
    let client = SlackClient::from_config(&ctx.config.slack)?;
    SocketModeReceiver::new(gateway_state(ctx)?, client)
}

pub async fn run_socket_mode(ctx: &RunContext) -> Result<(), CoachError> {
    let receiver = socket_receiver(ctx)?;
    info!(
        state_dir = %ctx.store.state_dir().display(),
        "starting coachbot serve in socket mode"
    );
    receiver.run(shutdown_signal()).await
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
