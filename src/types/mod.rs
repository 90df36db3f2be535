pub mod order;
pub mod webhook;

pub use order::{
    LineItemEntry, MatchResult, PaymentMethod, PurchasedItem, TransactionRecord,
};
pub use webhook::{CustomerInfo, WebhookPayload, WebhookResponse};
