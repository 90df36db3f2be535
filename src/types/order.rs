/// One purchased product as recorded in the payment metadata.
///
/// Cart payloads carry objects with an id and the selected price option,
/// older payloads only carry the bare product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchasedItem {
    Cart { id: i64, price_id: Option<i64> },
    Legacy(i64),
}

impl PurchasedItem {
    pub fn product_id(&self) -> i64 {
        match self {
            PurchasedItem::Cart { id, .. } | PurchasedItem::Legacy(id) => *id,
        }
    }

    pub fn price_id(&self) -> Option<i64> {
        match self {
            PurchasedItem::Cart { price_id, .. } => *price_id,
            PurchasedItem::Legacy(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethod {
    pub provider: String,
    pub label: String,
    pub transaction_id: Option<String>,
    /// Set only when a transaction reference was found in the order notes.
    pub link: Option<String>,
}

impl PaymentMethod {
    pub fn passthrough(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            label: provider.to_string(),
            transaction_id: None,
            link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemEntry {
    pub product_id: i64,
    pub title: String,
    pub licensed: bool,
    pub price_label: Option<String>,
    pub license_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: i64,
    pub status: String,
    pub created_at: String,
    pub amount: f64,
    pub gateway: String,
    pub customer_name: String,
    pub customer_email: String,
    pub purchased: Vec<PurchasedItem>,

    // Filled in by enrichment.
    pub payment: Option<PaymentMethod>,
    pub items: Vec<LineItemEntry>,
}

impl TransactionRecord {
    pub fn is_completed(&self) -> bool {
        matches!(self.status.as_str(), "publish" | "complete" | "completed")
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub records: Vec<TransactionRecord>,
    /// True when the records were found by customer name instead of email.
    pub fuzzy: bool,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
