//! Provider strategy hooks that classify failed responses.
//!
//! Implementations work on crate-owned context values so downstream crates never depend on
//! reqwest-specific structures.

// self
use crate::{_prelude::*, auth::Method};

/// Strategy hook that classifies non-2xx provider responses.
///
/// Implementors are required to be `Send + Sync`. The default implementation keys off the
/// HTTP status; custom strategies can additionally inspect the provider's error body.
pub trait ProviderStrategy: Send + Sync {
	/// Maps a failed response into the crate taxonomy.
	fn classify_response(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Signature, timestamp, or app token rejected.
	AuthenticationRejected,
	/// Unknown applicant, inspection, or image.
	NotFound,
	/// Failure is temporary and should be retried by the caller.
	Transient,
	/// Any other permanent refusal.
	Rejected,
}

/// Structured fields of a provider error body (`{"description", "code", "correlationId",
/// "errorCode", "errorName"}`); every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderErrorBody {
	/// Human-readable description.
	pub description: Option<String>,
	/// Provider correlation id for support tickets.
	pub correlation_id: Option<String>,
	/// Numeric provider error code.
	pub error_code: Option<i64>,
	/// Symbolic provider error name (e.g. `app-token-invalid`).
	pub error_name: Option<String>,
}
impl ProviderErrorBody {
	/// Parses the body when it is a JSON object; anything else yields `None`.
	pub fn parse(body: &str) -> Option<Self> {
		serde_json::from_str(body).ok()
	}
}

/// Context passed to provider strategies when classifying a failed response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Method of the failing request.
	pub method: Method,
	/// Path (with query) of the failing request.
	pub path: String,
	/// HTTP status code returned by the provider.
	pub http_status: u16,
	/// Parsed provider error fields, when the body was JSON.
	pub error: Option<ProviderErrorBody>,
	/// Preview of the response body.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context for a failed call.
	pub fn new(method: Method, path: impl Into<String>, http_status: u16) -> Self {
		Self { method, path: path.into(), http_status, error: None, body_preview: None }
	}

	/// Attaches the raw body; JSON error fields are parsed and a truncated preview is kept.
	pub fn with_body(mut self, body: &str) -> Self {
		self.error = ProviderErrorBody::parse(body);
		self.body_preview = Some(truncate_preview(body));

		self
	}

	/// Returns the provider correlation id, if the body carried one.
	pub fn correlation_id(&self) -> Option<&str> {
		self.error.as_ref().and_then(|error| error.correlation_id.as_deref())
	}
}

/// Default strategy: status code first, provider error names as a tie-breaker for
/// ambiguous 4xx statuses.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_response(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if let Some(kind) = classify_status(ctx.http_status) {
			return kind;
		}

		ctx.error
			.as_ref()
			.and_then(|error| error.error_name.as_deref())
			.and_then(classify_error_name)
			.unwrap_or(ProviderErrorKind::Rejected)
	}
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf: String = body.chars().take(ProviderErrorContext::BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}

fn classify_status(status: u16) -> Option<ProviderErrorKind> {
	match status {
		401 | 403 => Some(ProviderErrorKind::AuthenticationRejected),
		404 => Some(ProviderErrorKind::NotFound),
		408 | 429 => Some(ProviderErrorKind::Transient),
		code if code >= 500 => Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_error_name(name: &str) -> Option<ProviderErrorKind> {
	let lowered = name.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("signature") || text.contains("app-token") =>
			Some(ProviderErrorKind::AuthenticationRejected),
		text if text.contains("not-found") => Some(ProviderErrorKind::NotFound),
		_ => None,
	}
}
