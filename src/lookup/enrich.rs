use sqlx::SqlitePool;

use super::{
    gateway::GatewayRegistry,
    store::{self, StoreError},
};
use crate::types::{LineItemEntry, PaymentMethod, PurchasedItem, TransactionRecord};

/// Fills in payment-method display data and the per-product line items.
pub async fn enrich_order(
    pool: &SqlitePool,
    gateways: &GatewayRegistry,
    record: &mut TransactionRecord,
) -> Result<(), StoreError> {
    record.payment = Some(describe_payment(pool, gateways, record.id, &record.gateway).await?);

    let mut items = Vec::with_capacity(record.purchased.len());
    for item in &record.purchased {
        items.push(line_item(pool, record.id, *item).await?);
    }
    record.items = items;

    Ok(())
}

async fn describe_payment(
    pool: &SqlitePool,
    gateways: &GatewayRegistry,
    payment_id: i64,
    provider: &str,
) -> Result<PaymentMethod, StoreError> {
    let Some(gateway) = gateways.get(provider) else {
        return Ok(PaymentMethod::passthrough(provider));
    };

    let notes = store::list_payment_notes(pool, payment_id).await?;
    let transaction_id = notes.iter().find_map(|note| gateway.transaction_id(note));
    let link = transaction_id
        .as_deref()
        .map(|id| gateway.transaction_url(id));

    Ok(PaymentMethod {
        provider: provider.to_string(),
        label: gateway.label().to_string(),
        transaction_id,
        link,
    })
}

async fn line_item(
    pool: &SqlitePool,
    payment_id: i64,
    item: PurchasedItem,
) -> Result<LineItemEntry, StoreError> {
    let product_id = item.product_id();
    let product = store::get_product(pool, product_id).await?;
    let licensed = product
        .as_ref()
        .is_some_and(|product| product.licensing_enabled);
    let title = product
        .map(|product| product.title)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| format!("Product #{product_id}"));

    if !licensed {
        return Ok(LineItemEntry {
            product_id,
            title,
            licensed,
            price_label: None,
            license_key: None,
        });
    }

    let price_label = match item.price_id() {
        Some(price_id) => store::get_price_name(pool, product_id, price_id).await?,
        None => None,
    };
    let license_key = store::find_license_key(pool, payment_id, product_id).await?;

    Ok(LineItemEntry {
        product_id,
        title,
        licensed,
        price_label,
        license_key,
    })
}
