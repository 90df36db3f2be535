use serde::{Deserialize, Serialize};

/// Body posted by the helpdesk when an agent opens a customer profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub customer: CustomerInfo,
    pub fname: Option<String>,
    pub lname: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerInfo {
    pub email: Option<String>,
    pub emails: Option<Vec<String>>,
    pub fname: Option<String>,
    pub lname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub html: String,
}
