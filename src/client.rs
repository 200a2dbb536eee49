//! The signed request client: one owner for signing, dispatch, and failure classification.
//!
//! Every provider call funnels through [`SignedRequestClient::dispatch`], so header names,
//! timestamp capture, and body serialization cannot drift between call sites. Endpoint helpers
//! live in [`crate::resources`] as further `impl` blocks on the same type.

pub mod mapper;
pub mod response;

pub use mapper::*;
pub use response::*;

// self
use crate::{
	_prelude::*,
	auth::{Clock, ProviderRequest, SignedRequest, SystemClock},
	config::ProviderConfig,
	error::TransientError,
	http::{self, HttpRequest, HttpResponse, ProviderHttpClient},
	obs::{self, OperationKind},
	provider::{DefaultProviderStrategy, ProviderErrorContext, ProviderErrorKind, ProviderStrategy},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestSignedClient = SignedRequestClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Signs, sends, and interprets provider calls.
///
/// The client holds no per-call state: each dispatch reads the clock once, signs, sends, and
/// classifies the answer. Retries belong to callers and always produce a fresh timestamp.
#[derive(Clone)]
pub struct SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Credentials and tuning shared by every call.
	pub config: Arc<ProviderConfig>,
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Classifier for non-2xx responses.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Source of signing timestamps.
	pub clock: Arc<dyn Clock>,
}
impl<C, M> SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: ProviderConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			config: Arc::new(config),
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			strategy: Arc::new(DefaultProviderStrategy),
			clock: Arc::new(SystemClock),
		}
	}

	/// Replaces the timestamp source.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the failure classifier.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Signs and sends `request` with the configured timeout.
	pub async fn dispatch(&self, request: ProviderRequest) -> Result<SignedResponse> {
		obs::observe(
			OperationKind::Dispatch,
			"dispatch",
			self.send(request, self.config.request_timeout),
		)
		.await
	}

	/// Signs and sends `request`, overriding the configured timeout.
	pub async fn dispatch_with_timeout(
		&self,
		request: ProviderRequest,
		timeout: StdDuration,
	) -> Result<SignedResponse> {
		obs::observe(OperationKind::Dispatch, "dispatch_with_timeout", self.send(request, timeout))
			.await
	}

	/// Signs `request` with the current clock reading without sending it.
	///
	/// The path is first normalized to its transmitted form (see
	/// [`ProviderConfig::wire_path`]), so the signature always covers the bytes on the wire.
	pub fn sign_request(&self, mut request: ProviderRequest) -> Result<SignedRequest> {
		request.path = self.config.wire_path(&request.path)?;

		Ok(request.sign(&self.config.secret, self.clock.now_unix()))
	}

	pub(crate) async fn send(
		&self,
		request: ProviderRequest,
		timeout: StdDuration,
	) -> Result<SignedResponse> {
		let signed = self.sign_request(request)?;

		obs::record_request(signed.method, &signed.path);

		let http_request = self.build_http_request(&signed, timeout);
		let Some(outcome) = http::execute_bounded(self.http_client.as_ref(), http_request).await
		else {
			return Err(TransientError::Timeout { path: signed.path }.into());
		};
		let response =
			outcome.map_err(|e| self.transport_mapper.map_transport_error(&signed.path, e))?;

		if response.is_success() {
			return SignedResponse::from_http(&signed.path, response);
		}

		Err(self.classify_failure(signed, response))
	}

	fn build_http_request(&self, signed: &SignedRequest, timeout: StdDuration) -> HttpRequest {
		let mut request = HttpRequest::new(signed.method, self.config.endpoint(&signed.path));

		for (name, value) in signed.auth_headers(self.config.app_token.expose()) {
			request = request.with_header(name, value);
		}
		if let Some(body) = &signed.body {
			request = request.with_header("Content-Type", "application/json").with_body(body.as_bytes());
		}
		if !timeout.is_zero() {
			request = request.with_timeout(timeout);
		}

		request
	}

	fn classify_failure(&self, signed: SignedRequest, response: HttpResponse) -> Error {
		let body = response.text();
		let ctx = ProviderErrorContext::new(signed.method, signed.path.as_str(), response.status)
			.with_body(&body);
		let kind = self.strategy.classify_response(&ctx);

		#[cfg(feature = "tracing")]
		tracing::warn!(
			method = %signed.method,
			path = %signed.path,
			status = response.status,
			correlation_id = ctx.correlation_id().unwrap_or_default(),
			?kind,
			"Provider call failed."
		);

		let SignedRequest { method, path, timestamp, .. } = signed;

		match kind {
			ProviderErrorKind::AuthenticationRejected =>
				Error::AuthenticationRejected { status: response.status, method, path, timestamp, body },
			ProviderErrorKind::NotFound => Error::NotFound { path, body },
			ProviderErrorKind::Transient => TransientError::Upstream {
				path,
				status: response.status,
				body,
				retry_after: response.retry_after,
			}
			.into(),
			ProviderErrorKind::Rejected => Error::Rejected { status: response.status, path, body },
		}
	}
}
#[cfg(feature = "reqwest")]
impl SignedRequestClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client with its own reqwest transport that never follows redirects.
	pub fn new(config: ProviderConfig) -> Result<Self> {
		Ok(Self::with_http_client(
			config,
			ReqwestHttpClient::without_redirects()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}

	/// Creates a client from `SUMSUB_*` environment variables.
	pub fn from_env() -> Result<Self> {
		Self::new(ProviderConfig::from_env()?)
	}
}
impl<C, M> Debug for SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedRequestClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("app_token", &self.config.app_token)
			.field("request_timeout", &self.config.request_timeout)
			.finish()
	}
}
