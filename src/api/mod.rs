use std::path::Path;

use crate::env;
use crate::error::{ServiceError, ServiceResult};

pub mod accounts;
pub mod auth;
pub mod dashboard;
pub mod files;
pub mod invoices;
pub mod loan_applications;
pub mod members;
pub mod membership_applications;
pub mod payment_references;
pub mod payments;
pub mod transactions;

pub const SUPPORTED_IMAGE_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/svg",
];

/// Per-file upload size cap.
pub const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

pub fn password_hash_create(password: &str) -> Vec<u8> {
    argon2rs::argon2i_simple(password, env::PASSWORD_SALT.as_str()).to_vec()
}

pub fn password_hash_verify(hash: &[u8], password: &str) -> ServiceResult<bool> {
    Ok(hash == password_hash_create(password).as_slice())
}

/// Lenient numeric coercion for optional review fields.
///
/// Contract carried over from the portals: `null`, empty strings and
/// non-numeric strings all coerce to `None`. Malformed input never produces
/// an error and never stores `NaN`.
pub fn coerce_f64(value: &serde_json::Value) -> Option<f64> {
    let result = match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                text.parse::<f64>().ok()
            }
        }
        _ => None,
    };

    result.filter(|v| v.is_finite())
}

pub fn coerce_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        serde_json::Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
            }
        }
        _ => None,
    }
}

/// Currency values arrive as units (e.g. "50000.50") and are stored as cents.
pub fn coerce_amount_cents(value: &serde_json::Value) -> Option<i64> {
    coerce_f64(value).map(|v| (v * 100.0).round() as i64)
}

pub fn coerce_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        _ => None,
    }
}

fn extension_for_mimetype(mimetype: &str) -> &'static str {
    match mimetype {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/svg" => "svg",
        _ => "bin",
    }
}

/// Write an uploaded file below `UPLOAD_STORAGE` and return its relative path.
pub async fn store_upload(subdir: &str, mimetype: &str, data: &[u8]) -> ServiceResult<String> {
    if !SUPPORTED_IMAGE_TYPES.iter().any(|t| *t == mimetype) {
        return Err(ServiceError::BadRequest(format!(
            "Unsupported file type '{mimetype}'"
        )));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ServiceError::BadRequest(
            "Uploaded file exceeds the maximum allowed size".to_string(),
        ));
    }

    let name = rand::random::<[u8; 16]>()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>();
    let relative = format!("{subdir}/{name}.{}", extension_for_mimetype(mimetype));

    let target = Path::new(env::UPLOAD_STORAGE.as_str()).join(&relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, data).await?;

    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_f64_handles_malformed_input() {
        assert_eq!(coerce_f64(&json!(12.5)), Some(12.5));
        assert_eq!(coerce_f64(&json!("12.5")), Some(12.5));
        assert_eq!(coerce_f64(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!("banana")), None);
        assert_eq!(coerce_f64(&serde_json::Value::Null), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!([1, 2])), None);
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
    }

    #[test]
    fn coerce_i64_truncates_floats() {
        assert_eq!(coerce_i64(&json!(24)), Some(24));
        assert_eq!(coerce_i64(&json!(24.9)), Some(24));
        assert_eq!(coerce_i64(&json!("24")), Some(24));
        assert_eq!(coerce_i64(&json!("24.9")), Some(24));
        assert_eq!(coerce_i64(&json!("")), None);
        assert_eq!(coerce_i64(&json!("twenty")), None);
        assert_eq!(coerce_i64(&serde_json::Value::Null), None);
    }

    #[test]
    fn coerce_amount_converts_units_to_cents() {
        assert_eq!(coerce_amount_cents(&json!(50000)), Some(5_000_000));
        assert_eq!(coerce_amount_cents(&json!("1000.00")), Some(100_000));
        assert_eq!(coerce_amount_cents(&json!("10.005")), Some(1001));
        assert_eq!(coerce_amount_cents(&json!("")), None);
    }

    #[test]
    fn coerce_string_drops_empty_values() {
        assert_eq!(coerce_string(&json!("renovation")), Some("renovation".to_string()));
        assert_eq!(coerce_string(&json!("  ")), None);
        assert_eq!(coerce_string(&json!(42)), None);
        assert_eq!(coerce_string(&serde_json::Value::Null), None);
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = password_hash_create("secret");
        assert!(password_hash_verify(&hash, "secret").unwrap());
        assert!(!password_hash_verify(&hash, "other").unwrap());
    }
}
