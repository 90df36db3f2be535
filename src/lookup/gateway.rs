use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

/// How a payment provider is shown to agents.
pub trait PaymentGateway: Send + Sync {
    fn label(&self) -> &str;

    /// Provider transaction reference found in a single order note, if any.
    fn transaction_id(&self, note: &str) -> Option<String>;

    fn transaction_url(&self, transaction_id: &str) -> String;
}

/// Gateway that records its transaction reference in an order note, e.g.
/// `PayPal Transaction ID: 4JX...`.
pub struct NoteReferenceGateway {
    label: String,
    pattern: Regex,
    url_prefix: String,
}

impl NoteReferenceGateway {
    /// `pattern` must capture the reference in its first group.
    pub fn new(
        label: impl Into<String>,
        pattern: &str,
        url_prefix: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            label: label.into(),
            pattern: Regex::new(pattern)?,
            url_prefix: url_prefix.into(),
        })
    }

    pub fn paypal() -> Result<Self, regex::Error> {
        Self::new(
            "PayPal",
            r"^PayPal Transaction ID: (\S+)",
            "https://www.paypal.com/cgi-bin/webscr?cmd=_view-a-trans&id=",
        )
    }

    pub fn stripe() -> Result<Self, regex::Error> {
        Self::new(
            "Stripe",
            r"^Stripe Charge ID: (\S+)",
            "https://dashboard.stripe.com/payments/",
        )
    }
}

impl PaymentGateway for NoteReferenceGateway {
    fn label(&self) -> &str {
        &self.label
    }

    fn transaction_id(&self, note: &str) -> Option<String> {
        self.pattern
            .captures(note)
            .and_then(|captures| captures.get(1))
            .map(|found| found.as_str().to_string())
    }

    fn transaction_url(&self, transaction_id: &str) -> String {
        format!("{}{}", self.url_prefix, urlencoding::encode(transaction_id))
    }
}

/// Provider name to gateway lookup. Providers without an entry are shown
/// by their raw name.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<String, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn with_defaults() -> Result<Self, regex::Error> {
        let mut registry = Self::default();
        registry.register("paypal", NoteReferenceGateway::paypal()?);
        registry.register("stripe", NoteReferenceGateway::stripe()?);
        Ok(registry)
    }

    pub fn register(&mut self, provider: &str, gateway: impl PaymentGateway + 'static) {
        self.gateways
            .insert(provider.to_ascii_lowercase(), Arc::new(gateway));
    }

    pub fn get(&self, provider: &str) -> Option<&dyn PaymentGateway> {
        self.gateways
            .get(&provider.trim().to_ascii_lowercase())
            .map(|gateway| gateway.as_ref())
    }
}
