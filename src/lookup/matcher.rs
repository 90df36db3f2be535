use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::store::{self, PaymentRow};
use crate::{
    error::LookupError,
    types::{MatchResult, TransactionRecord, WebhookPayload},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePair {
    pub first: String,
    pub last: String,
}

/// Who to look up: candidate billing emails, plus an optional name used only
/// when no email matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    pub emails: Vec<String>,
    pub name: Option<NamePair>,
}

impl CustomerQuery {
    /// Collects candidates from the payload and drops the support mailbox.
    ///
    /// Fails with `SelfReferenceRejected` when the mailbox was the only
    /// candidate, before anything is queried.
    pub fn resolve(payload: &WebhookPayload, own_email: Option<&str>) -> Result<Self, LookupError> {
        let customer = &payload.customer;
        let raw = match &customer.emails {
            Some(emails) if !emails.is_empty() => emails.clone(),
            _ => customer.email.iter().cloned().collect(),
        };

        let mut emails: Vec<String> = Vec::with_capacity(raw.len());
        for email in raw {
            let email = email.trim();
            if !email.is_empty() && !emails.iter().any(|seen| seen.eq_ignore_ascii_case(email)) {
                emails.push(email.to_string());
            }
        }

        if let Some(own) = own_email.map(str::trim).filter(|own| !own.is_empty()) {
            let had_candidates = !emails.is_empty();
            emails.retain(|email| !email.eq_ignore_ascii_case(own));
            if had_candidates && emails.is_empty() {
                return Err(LookupError::SelfReferenceRejected {
                    own_email: own.to_string(),
                });
            }
        }

        let first = non_empty(customer.fname.as_deref().or(payload.fname.as_deref()));
        let last = non_empty(customer.lname.as_deref().or(payload.lname.as_deref()));
        let name = match (first, last) {
            (Some(first), Some(last)) => Some(NamePair { first, last }),
            _ => None,
        };

        Ok(Self { emails, name })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Exact email match first; name match only when that finds no payments.
///
/// An empty result is not an error here. Rows whose metadata cannot be read
/// are logged and left out.
pub async fn match_customer(
    pool: &SqlitePool,
    query: &CustomerQuery,
) -> Result<MatchResult, LookupError> {
    let exact = store::find_payments_by_email(pool, &query.emails).await?;
    if !exact.is_empty() {
        debug!(rows = exact.len(), "matched payments by email");
        return Ok(MatchResult {
            records: records_from_rows(exact),
            fuzzy: false,
        });
    }

    let Some(name) = &query.name else {
        return Ok(MatchResult::default());
    };

    let fuzzy = store::find_payments_by_name(pool, &name.first, &name.last).await?;
    if fuzzy.is_empty() {
        return Ok(MatchResult::default());
    }

    debug!(rows = fuzzy.len(), "matched payments by customer name");
    Ok(MatchResult {
        records: records_from_rows(fuzzy),
        fuzzy: true,
    })
}

fn records_from_rows(rows: Vec<PaymentRow>) -> Vec<TransactionRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let payment_id = row.id;
        match store::record_from_row(row) {
            Ok(record) => records.push(record),
            Err(err) => warn!(payment_id, error = %err, "skipping unreadable payment"),
        }
    }
    records
}
