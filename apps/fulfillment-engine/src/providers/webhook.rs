//! Webhook signature primitives.
//!
//! Carriers sign webhook bodies with HMAC-SHA256 over canonical JSON
//! (object keys sorted). Verification is constant-time; an invalid
//! signature is rejected before any state is read.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use super::ProviderError;

type HmacSha256 = Hmac<Sha256>;

/// Canonicalize a JSON payload: parse and re-serialize with sorted keys.
///
/// `serde_json` maps are ordered, so serializing a parsed value yields a
/// stable byte string regardless of the sender's key order.
///
/// # Errors
///
/// Returns `Parse` when the payload is not JSON.
pub fn canonical_json(payload: &[u8]) -> Result<Vec<u8>, ProviderError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| ProviderError::Parse(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| ProviderError::Parse(e.to_string()))
}

/// Sign a payload: hex-encoded HMAC-SHA256 over its canonical form.
///
/// # Errors
///
/// Returns `Parse` when the payload is not JSON.
pub fn sign(secret: &str, payload: &[u8]) -> Result<String, ProviderError> {
    let canonical = canonical_json(payload)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ProviderError::Parse(format!("hmac key error: {e}")))?;
    mac.update(&canonical);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex signature against a payload. Constant-time comparison.
///
/// # Errors
///
/// `InvalidSignature` on mismatch or malformed signature; `Parse` when the
/// payload is not JSON.
pub fn verify(secret: &str, payload: &[u8], signature: &str) -> Result<(), ProviderError> {
    let canonical = canonical_json(payload)?;
    let expected = hex::decode(signature).map_err(|_| ProviderError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ProviderError::Parse(format!("hmac key error: {e}")))?;
    mac.update(&canonical);
    mac.verify_slice(&expected)
        .map_err(|_| ProviderError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "whsec-test";

    #[test]
    fn sign_then_verify() {
        let payload = br#"{"label_id":"LBL123","status_id":4}"#;
        let sig = sign(SECRET, payload).unwrap();
        verify(SECRET, payload, &sig).unwrap();
    }

    #[test]
    fn verify_is_key_order_independent() {
        let a = br#"{"label_id":"LBL123","status_id":4}"#;
        let b = br#"{"status_id":4,"label_id":"LBL123"}"#;
        let sig = sign(SECRET, a).unwrap();
        verify(SECRET, b, &sig).unwrap();
    }

    #[test]
    fn modified_field_invalidates_signature() {
        let payload = br#"{"label_id":"LBL123","status_id":4}"#;
        let sig = sign(SECRET, payload).unwrap();
        let tampered = br#"{"label_id":"LBL123","status_id":3}"#;
        assert!(matches!(
            verify(SECRET, tampered, &sig),
            Err(ProviderError::InvalidSignature)
        ));
    }

    #[test]
    fn wrong_secret_fails() {
        let payload = br#"{"a":1}"#;
        let sig = sign("other-secret", payload).unwrap();
        assert!(verify(SECRET, payload, &sig).is_err());
    }

    #[test]
    fn non_hex_signature_fails_cleanly() {
        let payload = br#"{"a":1}"#;
        assert!(matches!(
            verify(SECRET, payload, "zz-not-hex"),
            Err(ProviderError::InvalidSignature)
        ));
    }

    #[test]
    fn non_json_payload_is_a_parse_error() {
        assert!(matches!(
            verify(SECRET, b"not json", "00"),
            Err(ProviderError::Parse(_))
        ));
    }

    proptest! {
        #[test]
        fn any_valid_payload_round_trips(label in "[a-zA-Z0-9]{1,16}", status in 0i64..10) {
            let payload = serde_json::to_vec(&serde_json::json!({
                "label_id": label,
                "status_id": status,
            })).unwrap();
            let sig = sign(SECRET, &payload).unwrap();
            prop_assert!(verify(SECRET, &payload, &sig).is_ok());
        }

        #[test]
        fn foreign_signature_never_verifies(label in "[a-zA-Z0-9]{1,16}", sig in "[0-9a-f]{64}") {
            let payload = serde_json::to_vec(&serde_json::json!({
                "label_id": label,
            })).unwrap();
            let genuine = sign(SECRET, &payload).unwrap();
            prop_assume!(sig != genuine);
            prop_assert!(verify(SECRET, &payload, &sig).is_err());
        }
    }
}
