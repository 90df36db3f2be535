mod enrich;
mod gateway;
mod matcher;
mod store;

pub use enrich::enrich_order;
pub use gateway::{GatewayRegistry, NoteReferenceGateway, PaymentGateway};
pub use matcher::{CustomerQuery, NamePair, match_customer};
pub use store::{
    MAX_RESULTS, PaymentRow, ProductRow, StoreError, find_license_key, find_payments_by_email,
    find_payments_by_name, get_price_name, get_product, list_payment_notes, record_from_row,
};
