//! Signed verification-provider client for KYB/KYC onboarding backends.
//!
//! [`client::SignedRequestClient`] signs and dispatches every provider call,
//! [`resources`] turns the provider's loosely shaped answers into stable types, and
//! [`notify::WebhookNotifier`] delivers onboarding notifications with a replayable log.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod id;
pub mod notify;
pub mod obs;
pub mod pacing;
pub mod provider;
pub mod resources;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{Clock, FixedClock},
		client::{ReqwestTransportErrorMapper, SignedRequestClient},
		config::{NotifierConfig, ProviderConfig},
		http::ReqwestHttpClient,
		notify::WebhookNotifier,
		store::{DeliveryStore, MemoryStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = SignedRequestClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;
	/// Notifier type alias used by reqwest-backed integration tests.
	pub type ReqwestTestNotifier = WebhookNotifier<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Unix timestamp pinned by [`build_reqwest_test_client`].
	pub const TEST_TIMESTAMP: i64 = 1_700_000_000;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a provider configuration pointing at `base_url` with zero pacing.
	pub fn test_config(base_url: &str, app_token: &str, secret: &str) -> ProviderConfig {
		ProviderConfig::builder()
			.app_token(app_token)
			.secret(secret)
			.base_url(base_url)
			.request_timeout(StdDuration::from_secs(5))
			.document_pacing(StdDuration::ZERO)
			.build()
			.expect("Failed to build provider configuration for tests.")
	}

	/// Constructs a [`SignedRequestClient`] backed by the reqwest transport and a clock frozen
	/// at [`TEST_TIMESTAMP`].
	pub fn build_reqwest_test_client(
		base_url: &str,
		app_token: &str,
		secret: &str,
	) -> ReqwestTestClient {
		let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(TEST_TIMESTAMP));

		SignedRequestClient::with_http_client(
			test_config(base_url, app_token, secret),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_clock(clock)
	}

	/// Constructs a [`WebhookNotifier`] with an in-memory delivery store and no backoff delay.
	pub fn build_reqwest_test_notifier(
		webhook_url: Option<&str>,
	) -> (ReqwestTestNotifier, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn DeliveryStore> = store_backend.clone();
		let webhook_url = webhook_url
			.map(|value| Url::parse(value).expect("Failed to parse webhook URL for tests."));
		let notifier = WebhookNotifier::with_http_client(
			store,
			NotifierConfig::new(webhook_url),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_backoff(StdDuration::ZERO)
		.with_pacing(StdDuration::ZERO);

		(notifier, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};
