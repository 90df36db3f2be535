#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::fs;

use serde_json::{Value, json};
use sqlx::{
    Connection, SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tempfile::NamedTempFile;

pub struct TestDb {
    pub pool: SqlitePool,
    _db_file: NamedTempFile,
}

pub async fn setup_db() -> TestDb {
    let db_file = NamedTempFile::new().expect("create temp sqlite file");
    let options = SqliteConnectOptions::new()
        .filename(db_file.path())
        .create_if_missing(true)
        .busy_timeout(std::time::Duration::from_millis(500));

    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .expect("connect sqlite for migrations");
    run_migrations(&mut conn).await.expect("run migrations");
    conn.close().await.expect("close migration conn");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("connect sqlite");

    TestDb {
        pool,
        _db_file: db_file,
    }
}

async fn run_migrations(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let mut entries: Vec<_> = fs::read_dir("migrations")
        .map_err(sqlx::Error::Io)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("sql"))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let contents = fs::read_to_string(entry.path()).map_err(sqlx::Error::Io)?;
        for stmt in contents.split(';') {
            let stmt = stmt.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&mut *conn).await?;
            }
        }
    }
    Ok(())
}

/// Serialized purchase metadata as the shop stores it.
pub fn purchase_meta(first_name: &str, last_name: &str, email: &str, downloads: Value) -> String {
    json!({
        "user_info": {
            "first_name": first_name,
            "last_name": last_name,
            "email": email,
        },
        "downloads": downloads,
        "cart_details": [],
    })
    .to_string()
}

pub struct PaymentSeed<'a> {
    pub id: i64,
    pub status: &'a str,
    pub email: &'a str,
    pub gateway: &'a str,
    pub amount: f64,
    pub meta: String,
}

impl<'a> PaymentSeed<'a> {
    pub fn completed(id: i64, email: &'a str) -> Self {
        Self {
            id,
            status: "publish",
            email,
            gateway: "manual",
            amount: 49.0,
            meta: purchase_meta("Sam", "Buyer", email, json!([])),
        }
    }
}

pub async fn seed_payment(pool: &SqlitePool, seed: PaymentSeed<'_>) {
    sqlx::query(
        r#"
        INSERT INTO payments (id, status, email, gateway, amount, created_at, meta)
        VALUES (?, ?, ?, ?, ?, '2024-03-05 14:07:00', ?)
        "#,
    )
    .bind(seed.id)
    .bind(seed.status)
    .bind(seed.email)
    .bind(seed.gateway)
    .bind(seed.amount)
    .bind(&seed.meta)
    .execute(pool)
    .await
    .expect("insert payment");
}

pub async fn seed_note(pool: &SqlitePool, payment_id: i64, content: &str) {
    sqlx::query("INSERT INTO payment_notes (payment_id, content) VALUES (?, ?)")
        .bind(payment_id)
        .bind(content)
        .execute(pool)
        .await
        .expect("insert note");
}

pub async fn seed_product(pool: &SqlitePool, id: i64, title: &str, licensing_enabled: bool) {
    sqlx::query("INSERT INTO products (id, title, licensing_enabled) VALUES (?, ?, ?)")
        .bind(id)
        .bind(title)
        .bind(licensing_enabled)
        .execute(pool)
        .await
        .expect("insert product");
}

pub async fn seed_price(pool: &SqlitePool, product_id: i64, price_id: i64, name: &str) {
    sqlx::query("INSERT INTO product_prices (product_id, price_id, name) VALUES (?, ?, ?)")
        .bind(product_id)
        .bind(price_id)
        .bind(name)
        .execute(pool)
        .await
        .expect("insert price");
}

pub async fn seed_license(pool: &SqlitePool, payment_id: i64, product_id: i64, key: &str) {
    sqlx::query("INSERT INTO licenses (payment_id, product_id, license_key) VALUES (?, ?, ?)")
        .bind(payment_id)
        .bind(product_id)
        .bind(key)
        .execute(pool)
        .await
        .expect("insert license");
}
