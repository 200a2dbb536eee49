//! SDK access tokens that start a client-side verification session.

// self
use crate::{
	_prelude::*,
	auth::ProviderRequest,
	client::{SignedRequestClient, TransportErrorMapper},
	error::ConfigError,
	http::ProviderHttpClient,
	obs::{self, OperationKind},
	resources::encode_query_component,
};

/// Parameters for `POST /resources/accessTokens`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessTokenRequest {
	/// External user id the session is bound to (any text; encoded into the query).
	pub user_id: String,
	/// Verification level name configured on the provider side.
	pub level_name: String,
	/// Token lifetime in seconds.
	pub ttl_secs: u64,
}
impl AccessTokenRequest {
	/// Lifetime used when the caller does not pick one.
	pub const DEFAULT_TTL_SECS: u64 = 600;

	/// Creates a request with the default lifetime.
	pub fn new(user_id: impl Into<String>, level_name: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			level_name: level_name.into(),
			ttl_secs: Self::DEFAULT_TTL_SECS,
		}
	}

	/// Overrides the token lifetime.
	pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
		self.ttl_secs = ttl_secs;

		self
	}

	/// Builds the signed path: `userId`, then `ttlInSecs`, then `levelName`.
	pub fn path(&self) -> Result<String, ConfigError> {
		if self.user_id.trim().is_empty() {
			return Err(ConfigError::InvalidValue { key: "userId", value: self.user_id.clone() });
		}
		if self.level_name.trim().is_empty() {
			return Err(ConfigError::InvalidValue {
				key: "levelName",
				value: self.level_name.clone(),
			});
		}

		Ok(format!(
			"/resources/accessTokens?userId={}&ttlInSecs={}&levelName={}",
			encode_query_component(&self.user_id),
			self.ttl_secs,
			encode_query_component(&self.level_name),
		))
	}
}

/// Token issued by the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
	/// Opaque session token handed to the frontend SDK.
	pub token: String,
	/// External user id echoed back by the provider.
	pub user_id: String,
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &"<redacted>")
			.field("user_id", &self.user_id)
			.finish()
	}
}

impl<C, M> SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Issues an SDK access token for `request.user_id`.
	pub async fn access_token(&self, request: &AccessTokenRequest) -> Result<AccessToken> {
		obs::observe(OperationKind::AccessToken, "access_token", async move {
			let path = request.path()?;
			let response =
				self.send(ProviderRequest::post(path), self.config.request_timeout).await?;

			response.decode()
		})
		.await
	}
}
