use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::config::SecretKey;

pub const SIGNATURE_HEADER: &str = "x-helpscout-signature";

type HmacSha1 = Hmac<Sha1>;

/// Base64 HMAC-SHA1 of the raw body, or `None` for an empty body.
pub fn compute_signature(body: &[u8], secret: &SecretKey) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Checks the helpdesk signature header against the unparsed request body.
///
/// Missing or empty values on either side never verify.
pub fn verify_signature(body: &[u8], supplied: Option<&str>, secret: &SecretKey) -> bool {
    let Some(supplied) = supplied.map(str::trim).filter(|value| !value.is_empty()) else {
        return false;
    };
    let Some(expected) = compute_signature(body, secret) else {
        return false;
    };

    constant_time_eq(expected.as_bytes(), supplied.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
