//! Webhook subscription verification handler.
//!
//! The provider calls `GET /webhook` with `hub.mode`, `hub.challenge` and
//! `hub.verify_token`. When the mode is the expected one and the token matches
//! the configured secret, the challenge is echoed back as plain text.
//! Queries that cannot be decoded exactly are rejected like a bad token.

use axum::{
    extract::{rejection::QueryRejection, Query, RawQuery, State},
    Extension,
};
use subtle::ConstantTimeEq;
use tracing::instrument;

use crate::config::WebhookConfig;
use crate::error::AppError;
use crate::middleware::RequestId;
use crate::state::AppState;
use crate::webhook::{
    map_to_command, to_verification_response, HookVerificationCommand, HookVerificationRequest,
};

/// Whether `command` carries the configured mode and token.
///
/// The token is compared in constant time.
pub fn is_verified(command: &HookVerificationCommand, config: &WebhookConfig) -> bool {
    let token_matches: bool = command
        .verify_token
        .as_bytes()
        .ct_eq(config.verify_token.as_bytes())
        .into();
    command.mode == config.expected_mode && token_matches
}

/// Whether every percent-escape in `raw` decodes to valid UTF-8.
pub fn is_lossless_query(raw: Option<&str>) -> bool {
    raw.map_or(true, |raw| {
        raw.split('&')
            .all(|pair| urlencoding::decode(pair).is_ok())
    })
}

/// Subscription verification handler.
#[instrument(name = "webhook::verify", skip_all, fields(request_id = %request_id.0))]
pub async fn verify(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    RawQuery(raw): RawQuery,
    query: Result<Query<HookVerificationRequest>, QueryRejection>,
) -> Result<String, AppError> {
    let config = state
        .config
        .webhook
        .as_ref()
        .ok_or_else(|| AppError::Internal("webhook verification is not configured".to_string()))?;

    if !is_lossless_query(raw.as_deref()) {
        tracing::warn!("Webhook verification query is not valid UTF-8");
        return Err(AppError::VerificationFailed);
    }
    let Query(request) = query.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Webhook verification query rejected");
        AppError::VerificationFailed
    })?;

    let command = map_to_command(request);
    if !is_verified(&command, config) {
        tracing::warn!(mode = %command.mode, "Webhook verification rejected");
        return Err(AppError::VerificationFailed);
    }

    tracing::info!("Webhook subscription verified");
    Ok(to_verification_response(command.challenge).challenge)
}
