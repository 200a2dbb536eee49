//! Verification of provider webhook payload digests (`x-payload-digest`).

// crates.io
use hmac::Mac;
// self
use crate::auth::{SharedSecret, signature::new_mac};

/// Header the provider uses to carry the webhook body digest.
pub const HEADER_PAYLOAD_DIGEST: &str = "x-payload-digest";

/// Computes the lowercase hex HMAC-SHA256 digest of a raw webhook body.
pub fn payload_digest(secret: &SharedSecret, payload: &[u8]) -> String {
	let mut mac = new_mac(secret);

	mac.update(payload);

	hex::encode(mac.finalize().into_bytes())
}

/// Checks `digest_hex` against the raw webhook body in constant time.
///
/// Malformed hex is treated as a mismatch.
pub fn verify_payload_digest(secret: &SharedSecret, payload: &[u8], digest_hex: &str) -> bool {
	let Ok(expected) = hex::decode(digest_hex.trim()) else {
		return false;
	};
	let mut mac = new_mac(secret);

	mac.update(payload);

	mac.verify_slice(&expected).is_ok()
}
