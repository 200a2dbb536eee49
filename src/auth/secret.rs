//! Credential wrappers that keep provider secrets out of logs.

// self
use crate::_prelude::*;

/// Shared HMAC secret issued by the provider alongside the app token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedSecret(String);
impl SharedSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the secret bytes used as the HMAC key. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		self.0.as_bytes()
	}

	/// Returns `true` when the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl Debug for SharedSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SharedSecret").field(&"<redacted>").finish()
	}
}
impl Display for SharedSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// App-token identifier sent in the `X-App-Token` header.
///
/// The value is not itself a signing key, but it still grants access when paired with the
/// secret, so formatters only reveal a short prefix.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppToken(String);
impl AppToken {
	const VISIBLE_PREFIX: usize = 6;

	/// Wraps a new app token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the header value.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the token is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	fn masked(&self) -> String {
		let prefix: String = self.0.chars().take(Self::VISIBLE_PREFIX).collect();

		format!("{prefix}…")
	}
}
impl Debug for AppToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AppToken").field(&self.masked()).finish()
	}
}
impl Display for AppToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.masked())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = SharedSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "SharedSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), b"super-secret");
	}

	#[test]
	fn app_token_shows_prefix_only() {
		let token = AppToken::new("prd:abcdefghijklmnop");

		assert_eq!(format!("{token}"), "prd:ab…");
		assert!(!format!("{token:?}").contains("ghij"));
		assert!(AppToken::new("  ").is_blank());
	}
}
