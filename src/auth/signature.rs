//! HMAC-SHA256 request signing for the verification provider.
//!
//! The provider recomputes the signature over the literal bytes it receives, so the
//! signed string is built from exactly the same path and body the transport sends:
//! `timestamp + METHOD + path_with_query + body`, concatenated without separators.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::SharedSecret, error::ConfigError};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the app-token identifier.
pub const HEADER_APP_TOKEN: &str = "X-App-Token";
/// Header carrying the lowercase hex HMAC signature.
pub const HEADER_SIGNATURE: &str = "X-App-Access-Sig";
/// Header carrying the decimal Unix timestamp used inside the signature.
pub const HEADER_TIMESTAMP: &str = "X-App-Access-Ts";

/// HTTP verbs the provider API accepts for signed calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// Read-only calls.
	Get,
	/// Mutations and token issuance.
	Post,
	/// Partial updates.
	Patch,
}
impl Method {
	/// Returns the upper-cased verb exactly as it appears in the signed string.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Patch => "PATCH",
		}
	}

	/// Returns `true` for verbs that may carry a body.
	pub const fn carries_body(self) -> bool {
		!matches!(self, Method::Get)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Computes the lowercase hex HMAC-SHA256 signature for one request attempt.
///
/// `body` must be the exact serialized text that will be transmitted; `None` signs as the
/// empty string.
pub fn sign(
	secret: &SharedSecret,
	method: Method,
	path: &str,
	timestamp: i64,
	body: Option<&str>,
) -> String {
	let mut mac = new_mac(secret);

	mac.update(timestamp.to_string().as_bytes());
	mac.update(method.as_str().as_bytes());
	mac.update(path.as_bytes());
	mac.update(body.unwrap_or_default().as_bytes());

	hex::encode(mac.finalize().into_bytes())
}

pub(crate) fn new_mac(secret: &SharedSecret) -> HmacSha256 {
	// HMAC accepts keys of any length, including empty ones.
	match HmacSha256::new_from_slice(secret.expose()) {
		Ok(mac) => mac,
		Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
	}
}

/// Unsigned description of a provider call.
///
/// `path` is provider-relative and already contains the query string; it is sent and signed
/// verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path plus query string, exactly as transmitted.
	pub path: String,
	/// Compact JSON body, if any.
	pub body: Option<String>,
}
impl ProviderRequest {
	/// Describes a `GET` call.
	pub fn get(path: impl Into<String>) -> Self {
		Self { method: Method::Get, path: path.into(), body: None }
	}

	/// Describes a body-less `POST` call.
	pub fn post(path: impl Into<String>) -> Self {
		Self { method: Method::Post, path: path.into(), body: None }
	}

	/// Describes a body-less `PATCH` call.
	pub fn patch(path: impl Into<String>) -> Self {
		Self { method: Method::Patch, path: path.into(), body: None }
	}

	/// Attaches a body serialized as compact JSON.
	pub fn with_json_body<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_string(body).map_err(ConfigError::RequestBody)?);

		Ok(self)
	}

	/// Stamps the request with `timestamp` and signs it.
	pub fn sign(self, secret: &SharedSecret, timestamp: i64) -> SignedRequest {
		let signature = sign(secret, self.method, &self.path, timestamp, self.body.as_deref());

		SignedRequest {
			method: self.method,
			path: self.path,
			body: self.body,
			timestamp,
			signature,
		}
	}
}

/// A request stamped for a single attempt; never reused across retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path plus query string, exactly as transmitted.
	pub path: String,
	/// Compact JSON body, if any.
	pub body: Option<String>,
	/// Unix seconds used inside the signature and sent in [`HEADER_TIMESTAMP`].
	pub timestamp: i64,
	/// Lowercase hex signature sent in [`HEADER_SIGNATURE`].
	pub signature: String,
}
impl SignedRequest {
	/// Returns the authentication headers for this attempt.
	pub fn auth_headers(&self, app_token: &str) -> [(&'static str, String); 3] {
		[
			(HEADER_APP_TOKEN, app_token.to_owned()),
			(HEADER_SIGNATURE, self.signature.clone()),
			(HEADER_TIMESTAMP, self.timestamp.to_string()),
		]
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const FIXTURE_SIGNATURE: &str =
		"26c45f99e1e3b8b26608781faefb433eed548707af874981156d90d44eec5dde";

	fn secret() -> SharedSecret {
		SharedSecret::new("s3cr3t")
	}

	#[test]
	fn signature_matches_pinned_fixture() {
		let signature =
			sign(&secret(), Method::Get, "/resources/applicants/abc123/one", 1_700_000_000, None);

		assert_eq!(signature, FIXTURE_SIGNATURE);
	}

	#[test]
	fn empty_body_signs_like_absent_body() {
		let path = "/resources/applicants/abc123/one";

		assert_eq!(
			sign(&secret(), Method::Get, path, 1_700_000_000, Some("")),
			sign(&secret(), Method::Get, path, 1_700_000_000, None),
		);
	}

	#[test]
	fn query_string_is_part_of_the_signed_payload() {
		let with_query = sign(
			&secret(),
			Method::Get,
			"/resources/applicants/abc123/one?x=1",
			1_700_000_000,
			None,
		);

		assert_eq!(
			with_query,
			"fd1962636ac27c5b7c97ab5320f9d440470747967eabebf18ea9dea7848d7cac"
		);

		let reordered_a = sign(&secret(), Method::Post, "/p?a=1&b=2", 1, None);
		let reordered_b = sign(&secret(), Method::Post, "/p?b=2&a=1", 1, None);

		assert_ne!(reordered_a, reordered_b);
	}

	#[test]
	fn every_input_changes_the_signature() {
		let base = sign(&secret(), Method::Post, "/p", 10, Some("{}"));

		assert_ne!(base, sign(&secret(), Method::Patch, "/p", 10, Some("{}")));
		assert_ne!(base, sign(&secret(), Method::Post, "/p/", 10, Some("{}")));
		assert_ne!(base, sign(&secret(), Method::Post, "/p", 11, Some("{}")));
		assert_ne!(base, sign(&secret(), Method::Post, "/p", 10, Some("{ }")));
		assert_ne!(base, sign(&SharedSecret::new("other"), Method::Post, "/p", 10, Some("{}")));
		assert_eq!(base, sign(&secret(), Method::Post, "/p", 10, Some("{}")));
		assert_eq!(base.len(), 64);
		assert!(base.chars().all(|ch| ch.is_ascii_digit() || ch.is_ascii_lowercase()));
	}

	#[test]
	fn signed_request_uses_compact_json_and_stamps_headers() {
		#[derive(Serialize)]
		#[serde(rename_all = "camelCase")]
		struct Reset<'a> {
			questionnaire_id: &'a str,
		}

		let signed = ProviderRequest::post("/resources/applicants/abc123/resetStep/QUESTIONNAIRE")
			.with_json_body(&Reset { questionnaire_id: "kyb-onboarding-completo" })
			.expect("Reset body should serialize.")
			.sign(&secret(), 1_700_000_000);

		assert_eq!(signed.body.as_deref(), Some("{\"questionnaireId\":\"kyb-onboarding-completo\"}"));
		assert_eq!(
			signed.signature,
			"c9cc9897dfc281c2fb51eb77d7e9bd5492fd1864ad4092e19627e85392ef6f3f"
		);

		let headers = signed.auth_headers("app-token");

		assert_eq!(headers[0], (HEADER_APP_TOKEN, "app-token".to_owned()));
		assert_eq!(headers[1].1, signed.signature);
		assert_eq!(headers[2], (HEADER_TIMESTAMP, "1700000000".to_owned()));
	}
}
