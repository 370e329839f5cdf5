// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack request signature middleware.
//!
//! Buffers the body (the signature covers the raw bytes), verifies it, and
//! hands an identical request to the next layer. Without a configured
//! verifier every request passes.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use coachbot_slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};

use crate::server::GatewayState;

/// Largest interactive payload accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub async fn slack_signature_middleware(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(verifier) = state.verifier.as_ref() else {
        return Ok(next.run(request).await);
    };

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

    let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
    if let Err(e) = verifier.verify(
        header(TIMESTAMP_HEADER),
        header(SIGNATURE_HEADER),
        &bytes,
        state.clock.epoch_seconds(),
    ) {
        tracing::warn!(error = %e, "rejecting Slack request");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
