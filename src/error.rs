use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{lookup::StoreError, render::escape_html, types::WebhookResponse};

/// Every way a lookup can end without a report.
///
/// The display text is what the agent sees in the sidebar. The helpdesk only
/// reads the body, so all variants are answered with `200 OK`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Invalid signature")]
    AuthenticationFailure,

    #[error("Unable to read customer data from request.")]
    InvalidPayload,

    #[error("Cannot query customer licenses.  E-mail from {own_email}")]
    SelfReferenceRejected { own_email: String },

    #[error("No license data found.")]
    NoMatchFound,

    #[error("Unable to query license data.")]
    BackendUnavailable(#[from] StoreError),

    #[error("License lookup timed out.")]
    Timeout,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        if let LookupError::BackendUnavailable(err) = &self {
            error!(error = %err, "license lookup failed");
        }

        let html = escape_html(&self.to_string());
        (StatusCode::OK, Json(WebhookResponse { html })).into_response()
    }
}
