//! Provider credentials and client tuning, validated once at startup.
//!
//! [`ProviderConfig`] is read-only after construction. Missing credentials surface as
//! [`ConfigError::Missing`] so a process refuses to start instead of signing with an empty
//! secret.

// crates.io
use url::Position;
// self
use crate::{
	_prelude::*,
	auth::{AppToken, SharedSecret},
	error::ConfigError,
};

/// Environment variable holding the app-token identifier.
pub const ENV_APP_TOKEN: &str = "SUMSUB_APP_TOKEN";
/// Environment variable holding the shared HMAC secret.
pub const ENV_SECRET_KEY: &str = "SUMSUB_SECRET_KEY";
/// Environment variable overriding the provider base URL.
pub const ENV_BASE_URL: &str = "SUMSUB_BASE_URL";
/// Environment variable overriding the per-request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "SUMSUB_TIMEOUT_SECS";
/// Environment variable overriding the delay between bulk document calls, in milliseconds.
pub const ENV_DOCUMENT_PACING_MS: &str = "SUMSUB_PACING_MS";
/// Environment variable holding the notification webhook URL.
pub const ENV_WEBHOOK_URL: &str = "WHATSAPP_WEBHOOK_URL";
/// Environment variable overriding the delay between notification retries, in milliseconds.
pub const ENV_NOTIFICATION_PACING_MS: &str = "NOTIFY_PACING_MS";
/// Environment variable overriding the per-delivery timeout, in seconds.
pub const ENV_NOTIFICATION_TIMEOUT_SECS: &str = "NOTIFY_TIMEOUT_SECS";

/// Immutable provider configuration shared by every signed call.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
	/// App-token identifier sent with every call.
	pub app_token: AppToken,
	/// Shared HMAC secret.
	pub secret: SharedSecret,
	/// Provider origin; request paths are appended verbatim.
	pub base_url: Url,
	/// Timeout applied to each dispatch.
	pub request_timeout: StdDuration,
	/// Delay between sequential document calls in bulk operations.
	pub document_pacing: StdDuration,
}
impl ProviderConfig {
	/// Production API origin.
	pub const DEFAULT_BASE_URL: &'static str = "https://api.sumsub.com";
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);
	/// Default delay between document downloads.
	pub const DEFAULT_DOCUMENT_PACING: StdDuration = StdDuration::from_millis(200);

	/// Creates a new builder.
	pub fn builder() -> ProviderConfigBuilder {
		ProviderConfigBuilder::default()
	}

	/// Loads configuration from process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads configuration through an arbitrary key lookup.
	///
	/// The base URL falls back to [`Self::DEFAULT_BASE_URL`]; the app token and secret are
	/// required.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let mut builder = Self::builder()
			.base_url(read(ENV_BASE_URL).unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_owned()));

		if let Some(token) = read(ENV_APP_TOKEN) {
			builder = builder.app_token(token);
		}
		if let Some(secret) = read(ENV_SECRET_KEY) {
			builder = builder.secret(secret);
		}
		if let Some(raw) = read(ENV_TIMEOUT_SECS) {
			builder = builder.request_timeout(StdDuration::from_secs(parse_u64(ENV_TIMEOUT_SECS, &raw)?));
		}
		if let Some(raw) = read(ENV_DOCUMENT_PACING_MS) {
			builder = builder
				.document_pacing(StdDuration::from_millis(parse_u64(ENV_DOCUMENT_PACING_MS, &raw)?));
		}
		builder.build()
	}

	/// Joins the base URL with a provider-relative path without re-encoding it.
	pub fn endpoint(&self, path: &str) -> String {
		let base = self.base_url.as_str().trim_end_matches('/');

		format!("{base}{path}")
	}

	/// Returns `path` (with its query) exactly as a URL-parsing transport puts it on the wire.
	///
	/// Characters the URL parser would percent-encode (`'` in queries, spaces, quotes, ...)
	/// come back encoded, so signing this string signs the transmitted bytes.
	pub fn wire_path(&self, path: &str) -> Result<String, ConfigError> {
		let endpoint = self.endpoint(path);
		let url = Url::parse(&endpoint)
			.map_err(|source| ConfigError::InvalidUrl { url: endpoint.clone(), source })?;
		let wire = &url[Position::BeforePath..Position::AfterQuery];
		let prefix = self.base_url.path().trim_end_matches('/');

		Ok(wire.strip_prefix(prefix).unwrap_or(wire).to_owned())
	}
}

/// Builder for [`ProviderConfig`] values.
#[derive(Debug, Default)]
pub struct ProviderConfigBuilder {
	app_token: Option<String>,
	secret: Option<String>,
	base_url: Option<String>,
	request_timeout: Option<StdDuration>,
	document_pacing: Option<StdDuration>,
}
impl ProviderConfigBuilder {
	/// Sets the app-token identifier.
	pub fn app_token(mut self, value: impl Into<String>) -> Self {
		self.app_token = Some(value.into());

		self
	}

	/// Sets the shared HMAC secret.
	pub fn secret(mut self, value: impl Into<String>) -> Self {
		self.secret = Some(value.into());

		self
	}

	/// Sets the provider origin.
	pub fn base_url(mut self, value: impl Into<String>) -> Self {
		self.base_url = Some(value.into());

		self
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, value: StdDuration) -> Self {
		self.request_timeout = Some(value);

		self
	}

	/// Overrides the delay between bulk document calls.
	pub fn document_pacing(mut self, value: StdDuration) -> Self {
		self.document_pacing = Some(value);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ConfigError> {
		let app_token = self
			.app_token
			.map(AppToken::new)
			.filter(|token| !token.is_blank())
			.ok_or(ConfigError::Missing { key: ENV_APP_TOKEN })?;
		let secret = self
			.secret
			.map(SharedSecret::new)
			.filter(|secret| !secret.is_blank())
			.ok_or(ConfigError::Missing { key: ENV_SECRET_KEY })?;
		let raw_url = self
			.base_url
			.filter(|url| !url.trim().is_empty())
			.ok_or(ConfigError::Missing { key: ENV_BASE_URL })?;
		let base_url = parse_http_url(&raw_url)?;

		Ok(ProviderConfig {
			app_token,
			secret,
			base_url,
			request_timeout: self.request_timeout.unwrap_or(ProviderConfig::DEFAULT_TIMEOUT),
			document_pacing: self.document_pacing.unwrap_or(ProviderConfig::DEFAULT_DOCUMENT_PACING),
		})
	}
}

/// Webhook notifier settings.
///
/// Unlike the provider credentials, nothing here is mandatory: without a webhook URL the
/// notifier records deliveries as skipped instead of failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotifierConfig {
	/// Destination of onboarding notifications.
	pub webhook_url: Option<Url>,
	/// Re-sends after the first failed attempt of a delivery.
	pub max_retries: u32,
	/// Base backoff; retry `n` waits `backoff * n`.
	pub backoff: StdDuration,
	/// Delay between records in a retry sweep.
	pub pacing: StdDuration,
	/// Timeout applied to each webhook call.
	pub timeout: StdDuration,
}
impl NotifierConfig {
	/// Default number of in-call retries.
	pub const DEFAULT_MAX_RETRIES: u32 = 3;
	/// Default base backoff.
	pub const DEFAULT_BACKOFF: StdDuration = StdDuration::from_secs(1);
	/// Default delay between sweep re-sends.
	pub const DEFAULT_PACING: StdDuration = StdDuration::from_millis(500);
	/// Default per-call timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Creates a configuration for `webhook_url` with default tuning.
	pub fn new(webhook_url: Option<Url>) -> Self {
		Self {
			webhook_url,
			max_retries: Self::DEFAULT_MAX_RETRIES,
			backoff: Self::DEFAULT_BACKOFF,
			pacing: Self::DEFAULT_PACING,
			timeout: Self::DEFAULT_TIMEOUT,
		}
	}

	/// Loads settings from process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads settings through an arbitrary key lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let webhook_url = read(ENV_WEBHOOK_URL).map(|raw| parse_http_url(&raw)).transpose()?;
		let mut config = Self::new(webhook_url);

		if let Some(raw) = read(ENV_NOTIFICATION_PACING_MS) {
			config.pacing = StdDuration::from_millis(parse_u64(ENV_NOTIFICATION_PACING_MS, &raw)?);
		}
		if let Some(raw) = read(ENV_NOTIFICATION_TIMEOUT_SECS) {
			config.timeout =
				StdDuration::from_secs(parse_u64(ENV_NOTIFICATION_TIMEOUT_SECS, &raw)?);
		}

		Ok(config)
	}
}
impl Default for NotifierConfig {
	fn default() -> Self {
		Self::new(None)
	}
}

/// Parses a URL and rejects anything but http(s).
pub(crate) fn parse_http_url(raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw.trim())
		.map_err(|source| ConfigError::InvalidUrl { url: raw.to_owned(), source })?;

	match url.scheme() {
		"http" | "https" => Ok(url),
		_ => Err(ConfigError::UnsupportedScheme { url: url.to_string() }),
	}
}

fn parse_u64(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
	raw.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: raw.to_owned() })
}
