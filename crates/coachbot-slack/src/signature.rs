// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack request signing (`v0` scheme).
//!
//! The signature is `v0=` followed by the hex HMAC-SHA256 of
//! `v0:{timestamp}:{raw body}` keyed with the app's signing secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use coachbot_core::CoachError;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Requests further than this from the local clock are treated as replays.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60 * 5;

const VERSION: &str = "v0";

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, CoachError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| CoachError::Internal(format!("invalid signing key: {e}")))?;
        mac.update(format!("{VERSION}:{timestamp}:").as_bytes());
        mac.update(body);
        Ok(mac)
    }

    /// The `x-slack-signature` value Slack would send for this request.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, CoachError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{VERSION}={}", hex::encode(digest)))
    }

    /// Check the timestamp window and the signature in constant time.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now_epoch: i64,
    ) -> Result<(), CoachError> {
        let timestamp =
            timestamp.ok_or_else(|| CoachError::Signature("missing request timestamp".into()))?;
        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| CoachError::Signature("malformed request timestamp".into()))?;
        if (now_epoch - sent_at).abs() > MAX_CLOCK_SKEW_SECS {
            return Err(CoachError::Signature("request timestamp outside window".into()));
        }

        let signature =
            signature.ok_or_else(|| CoachError::Signature("missing signature".into()))?;
        let expected = signature
            .strip_prefix("v0=")
            .and_then(|h| hex::decode(h).ok())
            .ok_or_else(|| CoachError::Signature("malformed signature".into()))?;

        self.mac(timestamp, body)?
            .verify_slice(&expected)
            .map_err(|_| CoachError::Signature("signature mismatch".into()))
    }
}
