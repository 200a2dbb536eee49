//! Transport primitives for signed provider calls and webhook deliveries.
//!
//! The crate depends on an HTTP stack only through [`ProviderHttpClient`], which works on
//! crate-owned [`HttpRequest`]/[`HttpResponse`] values. The reqwest implementation lives
//! behind the `reqwest` feature; tests and downstream crates can supply their own.

#[cfg(feature = "reqwest")] use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::Method};

/// Boxed future returned by [`ProviderHttpClient::execute`].
pub type TransportFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports.
///
/// Implementations must send the URL byte-for-byte as given: the path and query string are
/// part of the signed payload, so re-encoding or normalizing them invalidates the signature.
/// Non-2xx statuses are responses, not errors; only failures to obtain a response at all
/// (DNS, TCP, TLS, timeout) belong in [`Self::TransportError`].
pub trait ProviderHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and buffers the full response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Executes `request` and enforces its timeout even when the transport ignores it.
///
/// Returns `None` when the timeout elapsed before a response arrived.
pub(crate) async fn execute_bounded<C>(
	client: &C,
	request: HttpRequest,
) -> Option<Result<HttpResponse, C::TransportError>>
where
	C: ?Sized + ProviderHttpClient,
{
	match request.timeout.filter(|timeout| !timeout.is_zero()) {
		Some(timeout) => tokio::time::timeout(timeout, client.execute(request)).await.ok(),
		None => Some(client.execute(request).await),
	}
}

/// Fully materialized outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute URL, already containing the exact signed path and query.
	pub url: String,
	/// Header pairs in insertion order.
	pub headers: Vec<(String, String)>,
	/// Raw body bytes.
	pub body: Option<Vec<u8>>,
	/// Per-request timeout.
	pub timeout: Option<StdDuration>,
}
impl HttpRequest {
	/// Creates a request with no headers, body, or timeout.
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self { method, url: url.into(), headers: Vec::new(), body: None, timeout: None }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the body bytes.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Sets the timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Returns the first header value matching `name` case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Buffered response returned by a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header value, if present.
	pub content_type: Option<String>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the content type denotes JSON (`application/json`, `+json`).
	pub fn is_json(&self) -> bool {
		self.content_type
			.as_deref()
			.map(|value| {
				let essence =
					value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

				essence == "application/json" || essence.ends_with("+json")
			})
			.unwrap_or(false)
	}

	/// Returns the body as text, replacing invalid UTF-8 sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Configure any custom [`ReqwestClient`] to disable redirect following: a redirect would
/// replay the signed headers against a path they were not computed for.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that never follows redirects.
	pub fn without_redirects() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ProviderHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Patch => reqwest::Method::PATCH,
			};
			let mut builder = client.request(method, request.url.as_str());

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}
			if let Some(timeout) = request.timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response.headers().to_owned();
			let content_type = headers
				.get(CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(ToOwned::to_owned);
			let retry_after = parse_retry_after(&headers);
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, content_type, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return i64::try_from(secs).ok().map(Duration::seconds);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(content_type: Option<&str>) -> HttpResponse {
		HttpResponse {
			status: 200,
			content_type: content_type.map(ToOwned::to_owned),
			..Default::default()
		}
	}

	#[test]
	fn json_detection_ignores_parameters_and_case() {
		assert!(response(Some("application/json")).is_json());
		assert!(response(Some("Application/JSON; charset=utf-8")).is_json());
		assert!(response(Some("application/problem+json")).is_json());
		assert!(!response(Some("application/pdf")).is_json());
		assert!(!response(Some("image/jpeg")).is_json());
		assert!(!response(None).is_json());
	}

	#[test]
	fn request_headers_are_case_insensitive() {
		let request = HttpRequest::new(Method::Get, "https://api.sumsub.com/x")
			.with_header("X-App-Token", "token");

		assert_eq!(request.header("x-app-token"), Some("token"));
		assert_eq!(request.header("x-app-access-ts"), None);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, reqwest::header::HeaderValue::from_static("12"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(12)));
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_beyond_i64_is_ignored() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, reqwest::header::HeaderValue::from_static("18446744073709551615"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, reqwest::header::HeaderValue::from_static("9223372036854775807"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(i64::MAX)));
	}
}
