// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Slack interactive actions.
//!
//! Slack posts button clicks to `/slack/actions`. The gateway verifies the
//! request signature, records the vote in the ledger on the blocking pool,
//! and acknowledges immediately. Slack round trips (avatar lookup,
//! confirmation, count refresh) happen afterwards on a spawned task.
//!
//! Workspaces without a public URL can receive the same clicks over Slack
//! Socket Mode instead; see [`socket::SocketModeReceiver`].

pub mod auth;
pub mod handlers;
pub mod server;
pub mod socket;

pub use server::{build_router, start_server, GatewayState, ServerConfig};
pub use socket::SocketModeReceiver;
