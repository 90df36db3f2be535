use axum::{
    async_trait,
    body::{Body, Bytes},
    extract::FromRequest,
    http::Request,
};
use tracing::warn;

use crate::{auth::SIGNATURE_HEADER, error::LookupError};

/// The untouched request body together with the helpdesk signature header.
///
/// The body is kept as bytes so the signature is checked over exactly what
/// was sent; parsing happens only after verification.
pub struct SignedWebhook {
    pub body: Bytes,
    pub signature: Option<String>,
}

#[async_trait]
impl<S> FromRequest<S> for SignedWebhook
where
    S: Send + Sync,
{
    type Rejection = LookupError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let signature = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        match Bytes::from_request(req, state).await {
            Ok(body) => Ok(SignedWebhook { body, signature }),
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "could not read webhook body");
                Err(LookupError::AuthenticationFailure)
            }
        }
    }
}
