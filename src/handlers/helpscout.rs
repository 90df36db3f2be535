use axum::{Json, extract::State};
use tracing::{debug, info, warn};

use crate::{
    auth::verify_signature,
    error::LookupError,
    extractors::SignedWebhook,
    lookup::{CustomerQuery, enrich_order, match_customer},
    render::render_report,
    state::AppState,
    types::{MatchResult, WebhookPayload, WebhookResponse},
};

pub async fn helpscout_handler(
    State(state): State<AppState>,
    webhook: SignedWebhook,
) -> Result<Json<WebhookResponse>, LookupError> {
    if !verify_signature(
        &webhook.body,
        webhook.signature.as_deref(),
        &state.config.secret_key,
    ) {
        warn!(
            has_signature = webhook.signature.is_some(),
            "rejected webhook with invalid signature"
        );
        return Err(LookupError::AuthenticationFailure);
    }

    let payload: WebhookPayload = serde_json::from_slice(&webhook.body).map_err(|err| {
        warn!(error = %err, "signed webhook body is not a customer payload");
        LookupError::InvalidPayload
    })?;

    let query = CustomerQuery::resolve(&payload, state.config.own_email.as_deref())?;
    debug!(
        emails = query.emails.len(),
        has_name = query.name.is_some(),
        "resolved customer query"
    );

    let result = tokio::time::timeout(state.config.query_timeout, lookup(&state, &query))
        .await
        .map_err(|_| {
            warn!(
                timeout_ms = state.config.query_timeout.as_millis() as u64,
                "license lookup exceeded deadline"
            );
            LookupError::Timeout
        })??;

    info!(
        orders = result.records.len(),
        fuzzy = result.fuzzy,
        "rendered license report"
    );
    Ok(Json(WebhookResponse {
        html: render_report(&result, &state.config.render),
    }))
}

async fn lookup(state: &AppState, query: &CustomerQuery) -> Result<MatchResult, LookupError> {
    let mut result = match_customer(&state.pool, query).await?;
    if result.is_empty() {
        return Err(LookupError::NoMatchFound);
    }

    for record in &mut result.records {
        enrich_order(&state.pool, &state.gateways, record).await?;
    }

    Ok(result)
}
