//! Webhook delivery with in-call retries, a delivery log, and a replay sweep.

// self
use crate::{
	_prelude::*,
	auth::Method,
	client::TransportErrorMapper,
	config::NotifierConfig,
	error::{ConfigError, TransientError},
	http::{self, HttpRequest, ProviderHttpClient},
	id::DeliveryId,
	notify::OnboardingNotification,
	obs::{self, OperationKind},
	pacing::Pacer,
	store::{DeliveryOutcome, DeliveryRecord, DeliveryStore, RetryFilter},
};
#[cfg(feature = "reqwest")]
use crate::{client::ReqwestTransportErrorMapper, http::ReqwestHttpClient};

/// Error recorded when no webhook URL is configured.
pub const WEBHOOK_NOT_CONFIGURED: &str = "Webhook URL not configured";

#[cfg(feature = "reqwest")]
/// Notifier specialized for the crate's default reqwest transport stack.
pub type ReqwestWebhookNotifier = WebhookNotifier<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Result of one [`WebhookNotifier::notify`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReport {
	/// Id of the delivery record.
	pub delivery_id: DeliveryId,
	/// Whether the webhook accepted the payload.
	pub success: bool,
	/// HTTP attempts made; zero when delivery was skipped.
	pub attempts: u32,
	/// Last HTTP status observed.
	pub status_code: Option<u16>,
	/// Last error message.
	pub error: Option<String>,
	/// `false` when the delivery log could not be written.
	pub recorded: bool,
}
impl DeliveryReport {
	/// Returns `true` when no webhook URL was configured.
	pub fn skipped(&self) -> bool {
		self.attempts == 0 && self.error.as_deref() == Some(WEBHOOK_NOT_CONFIGURED)
	}
}

/// Per-record result of a retry sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryDetail {
	/// Replayed record.
	pub delivery_id: DeliveryId,
	/// Applicant id read from the stored payload, when it parses.
	pub applicant_id: Option<String>,
	/// Event label of the record.
	pub event: String,
	/// Whether the replay succeeded.
	pub success: bool,
	/// Failure message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// Aggregate result of a retry sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySummary {
	/// Records selected.
	pub total: usize,
	/// Replays accepted by the webhook.
	pub succeeded: usize,
	/// Replays that failed again.
	pub failed: usize,
	/// One entry per selected record, in replay order.
	pub details: Vec<RetryDetail>,
}

/// Posts onboarding notifications to a webhook and keeps a replayable delivery log.
///
/// Payloads are serialized once; the exact text sent is what the log stores and what a replay
/// re-sends.
#[derive(Clone)]
pub struct WebhookNotifier<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Destination and retry tuning.
	pub config: Arc<NotifierConfig>,
	/// HTTP client used for webhook calls.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors.
	pub transport_mapper: Arc<M>,
	/// Delivery log.
	pub store: Arc<dyn DeliveryStore>,
	sweep_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> WebhookNotifier<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a notifier that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn DeliveryStore>,
		config: NotifierConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			config: Arc::new(config),
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			sweep_guard: Arc::new(AsyncMutex::new(())),
		}
	}

	/// Overrides the base backoff between in-call retries.
	pub fn with_backoff(mut self, backoff: StdDuration) -> Self {
		Arc::make_mut(&mut self.config).backoff = backoff;

		self
	}

	/// Overrides the delay between records in a retry sweep.
	pub fn with_pacing(mut self, pacing: StdDuration) -> Self {
		Arc::make_mut(&mut self.config).pacing = pacing;

		self
	}

	/// Overrides the number of in-call retries.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		Arc::make_mut(&mut self.config).max_retries = max_retries;

		self
	}

	/// Overrides the per-call timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		Arc::make_mut(&mut self.config).timeout = timeout;

		self
	}

	/// Sends `notification` and records the delivery.
	///
	/// Webhook failures are reported in the returned [`DeliveryReport`], not as errors; only an
	/// unserializable payload fails the call. A store failure is logged and flagged through
	/// [`DeliveryReport::recorded`].
	pub async fn notify(&self, notification: &OnboardingNotification) -> Result<DeliveryReport> {
		obs::observe(OperationKind::Notification, "notify", self.send_and_record(notification))
			.await
	}

	/// Replays failed deliveries selected by `filter`, one at a time with pacing.
	///
	/// Concurrent sweeps are serialized so a record is never replayed twice at once.
	pub async fn retry_failed(&self, filter: RetryFilter) -> Result<RetrySummary> {
		obs::observe(OperationKind::RetrySweep, "retry_failed", self.sweep(filter)).await
	}

	/// Replays a single stored delivery regardless of its current state.
	pub async fn retry_delivery(&self, delivery_id: &DeliveryId) -> Result<Option<RetryDetail>> {
		obs::observe(OperationKind::RetrySweep, "retry_delivery", self.replay_one(delivery_id))
			.await
	}

	async fn send_and_record(
		&self,
		notification: &OnboardingNotification,
	) -> Result<DeliveryReport> {
		obs::record_event(notification.event.as_str());

		let payload =
			serde_json::to_string(notification).map_err(ConfigError::NotificationPayload)?;
		let outcome = self.deliver(&payload).await;
		let target = self.config.webhook_url.as_ref().map(Url::to_string).unwrap_or_default();
		let record =
			DeliveryRecord::new(notification.event.as_str(), target, payload, outcome.clone());
		let delivery_id = record.id.clone();
		let recorded = match self.store.insert(record).await {
			Ok(()) => true,
			Err(e) => {
				obs::warn_swallowed("notify.record", &e);

				false
			},
		};

		Ok(DeliveryReport {
			delivery_id,
			success: outcome.success,
			attempts: outcome.attempts,
			status_code: outcome.status_code,
			error: outcome.error,
			recorded,
		})
	}

	async fn sweep(&self, filter: RetryFilter) -> Result<RetrySummary> {
		let _guard = self.sweep_guard.lock().await;
		let records = self.store.failed(&filter).await?;
		let mut pacer = Pacer::new(self.config.pacing);
		let mut summary = RetrySummary { total: records.len(), ..Default::default() };

		for record in records {
			pacer.pace().await;

			let detail = self.replay(record).await;

			if detail.success {
				summary.succeeded += 1;
			} else {
				summary.failed += 1;
			}

			summary.details.push(detail);
		}

		Ok(summary)
	}

	async fn replay_one(&self, delivery_id: &DeliveryId) -> Result<Option<RetryDetail>> {
		let _guard = self.sweep_guard.lock().await;
		let Some(record) = self.store.get(delivery_id).await? else {
			return Ok(None);
		};

		obs::record_event(&record.event);

		Ok(Some(self.replay(record).await))
	}

	async fn replay(&self, record: DeliveryRecord) -> RetryDetail {
		let outcome = self.deliver(&record.payload).await;
		let applicant_id = serde_json::from_str::<JsonValue>(&record.payload)
			.ok()
			.and_then(|payload| payload.pointer("/applicant/id")?.as_str().map(ToOwned::to_owned));
		let detail = RetryDetail {
			delivery_id: record.id.clone(),
			applicant_id,
			event: record.event,
			success: outcome.success,
			error: outcome.error.clone(),
		};

		if let Err(e) = self.store.record_retry(&record.id, outcome).await {
			obs::warn_swallowed("retry.record", &e);
		}

		detail
	}

	/// Posts `payload` with up to `max_retries` re-sends; retry `n` waits `backoff * n`.
	async fn deliver(&self, payload: &str) -> DeliveryOutcome {
		let Some(url) = self.config.webhook_url.as_ref() else {
			obs::debug_skip("notify.deliver", WEBHOOK_NOT_CONFIGURED);

			return DeliveryOutcome {
				success: false,
				attempts: 0,
				status_code: None,
				error: Some(WEBHOOK_NOT_CONFIGURED.into()),
				finished_at: OffsetDateTime::now_utc(),
			};
		};
		let mut attempts = 0;
		let mut status_code = None;
		let mut error = None;

		for retry in 0..=self.config.max_retries {
			if retry > 0 {
				let delay = self.config.backoff.saturating_mul(retry);

				#[cfg(feature = "tracing")]
				tracing::debug!(
					retry,
					max_retries = self.config.max_retries,
					"Retrying webhook delivery."
				);

				if !delay.is_zero() {
					tokio::time::sleep(delay).await;
				}
			}

			attempts += 1;

			match self.post(url, payload).await {
				Ok((status, _)) if (200..300).contains(&status) => {
					return DeliveryOutcome {
						success: true,
						attempts,
						status_code: Some(status),
						error: None,
						finished_at: OffsetDateTime::now_utc(),
					};
				},
				Ok((status, body)) => {
					status_code = Some(status);
					error = Some(format!("Webhook returned {status}: {body}"));
				},
				Err(e) => {
					status_code = None;
					error = Some(e.to_string());
				},
			}
		}

		#[cfg(feature = "tracing")]
		tracing::warn!(
			attempts,
			?status_code,
			error = error.as_deref().unwrap_or_default(),
			"Webhook delivery failed."
		);

		DeliveryOutcome {
			success: false,
			attempts,
			status_code,
			error,
			finished_at: OffsetDateTime::now_utc(),
		}
	}

	async fn post(&self, url: &Url, payload: &str) -> Result<(u16, String)> {
		let mut request = HttpRequest::new(Method::Post, url.as_str())
			.with_header("Content-Type", "application/json")
			.with_body(payload.as_bytes());

		if !self.config.timeout.is_zero() {
			request = request.with_timeout(self.config.timeout);
		}

		let Some(outcome) = http::execute_bounded(self.http_client.as_ref(), request).await else {
			return Err(TransientError::Timeout { path: url.to_string() }.into());
		};
		let response =
			outcome.map_err(|e| self.transport_mapper.map_transport_error(url.as_str(), e))?;

		Ok((response.status, response.text()))
	}
}
#[cfg(feature = "reqwest")]
impl WebhookNotifier<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a notifier with its own reqwest transport.
	pub fn new(store: Arc<dyn DeliveryStore>, config: NotifierConfig) -> Result<Self> {
		Ok(Self::with_http_client(
			store,
			config,
			ReqwestHttpClient::without_redirects()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}

	/// Creates a notifier from environment variables.
	pub fn from_env(store: Arc<dyn DeliveryStore>) -> Result<Self> {
		Self::new(store, NotifierConfig::from_env()?)
	}
}
impl<C, M> Debug for WebhookNotifier<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebhookNotifier")
			.field("webhook_url", &self.config.webhook_url.as_ref().map(Url::as_str))
			.field("max_retries", &self.config.max_retries)
			.finish()
	}
}
