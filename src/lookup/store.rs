use serde::Deserialize;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use crate::types::{PurchasedItem, TransactionRecord};

/// Most orders shown for one customer.
pub const MAX_RESULTS: i64 = 20;

/// Payments that never completed are never shown to agents.
const EXCLUDED_STATUSES: [&str; 2] = ["failed", "pending"];

const PAYMENT_COLUMNS: &str = "SELECT id, status, email, gateway, amount, created_at, meta \
    FROM payments ";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Parse(String),
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub status: String,
    pub email: String,
    pub gateway: String,
    pub amount: f64,
    pub created_at: String,
    pub meta: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub title: String,
    pub licensing_enabled: bool,
}

pub async fn find_payments_by_email(
    pool: &SqlitePool,
    emails: &[String],
) -> Result<Vec<PaymentRow>, StoreError> {
    if emails.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::new(PAYMENT_COLUMNS);
    query.push("WHERE email COLLATE NOCASE IN (");
    let mut list = query.separated(", ");
    for email in emails {
        list.push_bind(email.as_str());
    }
    list.push_unseparated(")");
    push_visible_orders(&mut query);

    let rows: Vec<PaymentRow> = query.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

/// Payments whose serialized metadata contains both name fragments.
pub async fn find_payments_by_name(
    pool: &SqlitePool,
    first_name: &str,
    last_name: &str,
) -> Result<Vec<PaymentRow>, StoreError> {
    let mut query = QueryBuilder::new(PAYMENT_COLUMNS);
    query.push("WHERE meta LIKE ");
    query.push_bind(contains_pattern(first_name));
    query.push(" ESCAPE '\\' AND meta LIKE ");
    query.push_bind(contains_pattern(last_name));
    query.push(" ESCAPE '\\'");
    push_visible_orders(&mut query);

    let rows: Vec<PaymentRow> = query.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn list_payment_notes(
    pool: &SqlitePool,
    payment_id: i64,
) -> Result<Vec<String>, StoreError> {
    let notes = sqlx::query_scalar::<_, String>(
        r"
        SELECT content
        FROM payment_notes
        WHERE payment_id = ?
        ORDER BY id ASC
        ",
    )
    .bind(payment_id)
    .fetch_all(pool)
    .await?;

    Ok(notes)
}

pub async fn get_product(
    pool: &SqlitePool,
    product_id: i64,
) -> Result<Option<ProductRow>, StoreError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, title, licensing_enabled FROM products WHERE id = ?",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn get_price_name(
    pool: &SqlitePool,
    product_id: i64,
    price_id: i64,
) -> Result<Option<String>, StoreError> {
    let name = sqlx::query_scalar::<_, String>(
        "SELECT name FROM product_prices WHERE product_id = ? AND price_id = ?",
    )
    .bind(product_id)
    .bind(price_id)
    .fetch_optional(pool)
    .await?;

    Ok(name)
}

pub async fn find_license_key(
    pool: &SqlitePool,
    payment_id: i64,
    product_id: i64,
) -> Result<Option<String>, StoreError> {
    let key = sqlx::query_scalar::<_, String>(
        r"
        SELECT license_key
        FROM licenses
        WHERE payment_id = ? AND product_id = ?
        ORDER BY id ASC
        LIMIT 1
        ",
    )
    .bind(payment_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(key)
}

fn push_visible_orders(query: &mut QueryBuilder<'_, Sqlite>) {
    query.push(" AND status NOT IN (");
    let mut statuses = query.separated(", ");
    for status in EXCLUDED_STATUSES {
        statuses.push_bind(status);
    }
    statuses.push_unseparated(")");
    query.push(" ORDER BY id DESC LIMIT ");
    query.push_bind(MAX_RESULTS);
}

fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Default, Deserialize)]
struct PurchaseMeta {
    #[serde(default)]
    user_info: Value,
    #[serde(default)]
    downloads: Value,
}

#[derive(Debug, Default, Deserialize)]
struct UserInfo {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

pub fn record_from_row(row: PaymentRow) -> Result<TransactionRecord, StoreError> {
    let meta: PurchaseMeta = serde_json::from_str(&row.meta).map_err(|err| {
        StoreError::Parse(format!("invalid purchase meta for payment {}: {err}", row.id))
    })?;

    let purchased = download_entries(&meta.downloads)
        .and_then(|entries| {
            entries
                .into_iter()
                .map(parse_purchased_item)
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(|message| {
            StoreError::Parse(format!("invalid download in payment {}: {message}", row.id))
        })?;

    let user = parse_user_info(meta.user_info).map_err(|message| {
        StoreError::Parse(format!("invalid user info in payment {}: {message}", row.id))
    })?;
    let customer_name = [user.first_name, user.last_name]
        .into_iter()
        .flatten()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let customer_email = user
        .email
        .filter(|email| !email.trim().is_empty())
        .unwrap_or_else(|| row.email.clone());

    Ok(TransactionRecord {
        id: row.id,
        status: row.status,
        created_at: row.created_at,
        amount: row.amount,
        gateway: row.gateway,
        customer_name,
        customer_email,
        purchased,
        payment: None,
        items: Vec::new(),
    })
}

/// The shop sometimes stores `user_info` serialized a second time, as a
/// string holding the object.
fn parse_user_info(value: Value) -> Result<UserInfo, String> {
    match value {
        Value::Null => Ok(UserInfo::default()),
        Value::String(text) if text.trim().is_empty() => Ok(UserInfo::default()),
        Value::String(text) => serde_json::from_str(&text).map_err(|err| err.to_string()),
        other => serde_json::from_value(other).map_err(|err| err.to_string()),
    }
}

/// Download entries in order. Sparse arrays arrive as objects keyed by
/// index and are read in numeric key order.
fn download_entries(value: &Value) -> Result<Vec<&Value>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(entries) => Ok(entries.iter().collect()),
        Value::Object(entries) => {
            let mut keyed = entries
                .iter()
                .map(|(key, entry)| {
                    key.trim()
                        .parse::<u64>()
                        .map(|index| (index, entry))
                        .map_err(|_| format!("non-numeric download key {key:?}"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            keyed.sort_by_key(|(index, _)| *index);
            Ok(keyed.into_iter().map(|(_, entry)| entry).collect())
        }
        other => Err(format!("downloads is not a list: {other}")),
    }
}

fn parse_purchased_item(value: &Value) -> Result<PurchasedItem, String> {
    match value {
        Value::Object(fields) => {
            let id = fields
                .get("id")
                .and_then(parse_id)
                .ok_or_else(|| format!("cart item without a product id: {value}"))?;
            let price_id = fields
                .get("options")
                .and_then(|options| options.get("price_id"))
                .and_then(parse_id);
            Ok(PurchasedItem::Cart { id, price_id })
        }
        other => parse_id(other)
            .map(PurchasedItem::Legacy)
            .ok_or_else(|| format!("unrecognised download entry: {other}")),
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
