//! Crate-level error types shared by the signed client, notifier, and stores.

// self
use crate::{_prelude::*, auth::Method, id::IdentifierError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Provider rejected the request signature or app token (HTTP 401/403).
	#[error("Provider rejected the signed {method} {path} (ts={timestamp}) with status {status}: {body}")]
	AuthenticationRejected {
		/// HTTP status code (401 or 403).
		status: u16,
		/// Method that was signed.
		method: Method,
		/// Signed path, including the query string.
		path: String,
		/// Timestamp used inside the signature.
		timestamp: i64,
		/// Raw response text.
		body: String,
	},
	/// Provider does not know the requested applicant, inspection, or image.
	#[error("Provider resource {path} was not found: {body}")]
	NotFound {
		/// Requested path, including the query string.
		path: String,
		/// Raw response text.
		body: String,
	},
	/// Provider refused the request for a permanent reason (other 4xx statuses).
	#[error("Provider rejected {path} with status {status}: {body}")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Requested path, including the query string.
		path: String,
		/// Raw response text.
		body: String,
	},
}
impl Error {
	/// Returns the coarse classification callers use to pick retry vs. permanent handling.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Storage(_) => ErrorKind::Storage,
			Self::Config(_) => ErrorKind::Configuration,
			Self::Transient(_) | Self::Transport(_) => ErrorKind::TransientTransport,
			Self::AuthenticationRejected { .. } => ErrorKind::AuthenticationRejected,
			Self::NotFound { .. } => ErrorKind::NotFound,
			Self::Rejected { .. } => ErrorKind::Rejected,
		}
	}

	/// Returns `true` when a caller-driven retry (with pacing) may succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self.kind(), ErrorKind::TransientTransport)
	}

	/// HTTP status reported by the provider, when the failure carried one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::AuthenticationRejected { status, .. } | Self::Rejected { status, .. } =>
				Some(*status),
			Self::NotFound { .. } => Some(404),
			Self::Transient(TransientError::Upstream { status, .. }) => Some(*status),
			Self::Transient(TransientError::ResponseParse { status, .. }) => Some(*status),
			_ => None,
		}
	}

	/// Raw provider response text, when the failure carried one.
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::AuthenticationRejected { body, .. }
			| Self::NotFound { body, .. }
			| Self::Rejected { body, .. }
			| Self::Transient(TransientError::Upstream { body, .. }) => Some(body),
			_ => None,
		}
	}
}

/// Coarse error categories surfaced to HTTP-facing callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Signature, timestamp skew, or app token rejected upstream.
	AuthenticationRejected,
	/// Identifier unknown to the provider.
	NotFound,
	/// Timeout, connection failure, 5xx, or 429.
	TransientTransport,
	/// Any other permanent provider refusal.
	Rejected,
	/// Missing or invalid local configuration.
	Configuration,
	/// Delivery store failure.
	Storage,
}
impl ErrorKind {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AuthenticationRejected => "authentication_rejected",
			Self::NotFound => "not_found",
			Self::TransientTransport => "transient_transport",
			Self::Rejected => "rejected",
			Self::Configuration => "configuration",
			Self::Storage => "storage",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required credential or setting is absent or blank.
	#[error("Required setting `{key}` is missing.")]
	Missing {
		/// Setting name (environment variable or builder field).
		key: &'static str,
	},
	/// A numeric setting could not be parsed.
	#[error("Setting `{key}` has an invalid value: {value}.")]
	InvalidValue {
		/// Setting name.
		key: &'static str,
		/// Offending raw value.
		value: String,
	},
	/// Base or webhook URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Raw URL value.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// URL uses a scheme other than http or https.
	#[error("URL `{url}` must use http or https.")]
	UnsupportedScheme {
		/// Offending URL.
		url: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Identifier failed validation before it could be placed in a signed path.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[source] serde_json::Error),
	/// Notification payload could not be serialized.
	#[error("Notification payload could not be serialized.")]
	NotificationPayload(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider answered with 5xx, 408, or 429.
	#[error("Provider returned status {status} for {path}: {body}")]
	Upstream {
		/// Requested path, including the query string.
		path: String,
		/// HTTP status code.
		status: u16,
		/// Raw response text.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The request exceeded the caller-supplied timeout.
	#[error("Request to {path} timed out.")]
	Timeout {
		/// Requested path, including the query string.
		path: String,
	},
	/// Provider responded with JSON that could not be decoded into the expected shape.
	#[error("Provider returned malformed JSON for {path}.")]
	ResponseParse {
		/// Requested path, including the query string.
		path: String,
		/// HTTP status code.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {path}.")]
	Network {
		/// Requested path or URL.
		path: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		path: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { path: path.into(), source: Box::new(src) }
	}
}
