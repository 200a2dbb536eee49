//! Storage contracts and built-in store implementations for notification delivery records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, id::DeliveryId};

/// Boxed future returned by [`DeliveryStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the delivery log.
///
/// Payloads are stored as the exact serialized text that was sent so a retry can replay them
/// byte-for-byte.
pub trait DeliveryStore
where
	Self: Send + Sync,
{
	/// Persists a new record.
	fn insert(&self, record: DeliveryRecord) -> StoreFuture<'_, ()>;

	/// Fetches a record by id.
	fn get<'a>(&'a self, id: &'a DeliveryId) -> StoreFuture<'a, Option<DeliveryRecord>>;

	/// Returns failed records matching `filter`, oldest first, at most `filter.limit`.
	fn failed<'a>(&'a self, filter: &'a RetryFilter) -> StoreFuture<'a, Vec<DeliveryRecord>>;

	/// Applies the outcome of a replay and returns the updated record.
	fn record_retry<'a>(
		&'a self,
		id: &'a DeliveryId,
		outcome: DeliveryOutcome,
	) -> StoreFuture<'a, Option<DeliveryRecord>>;
}

/// Error type produced by [`DeliveryStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Result of one delivery (initial send or replay).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
	/// Whether the webhook accepted the payload.
	pub success: bool,
	/// HTTP attempts made.
	pub attempts: u32,
	/// Last HTTP status observed.
	pub status_code: Option<u16>,
	/// Last error message.
	pub error: Option<String>,
	/// When the delivery finished.
	pub finished_at: OffsetDateTime,
}

/// One logged notification delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
	/// Record id.
	pub id: DeliveryId,
	/// Event label (`applicant_reviewed`, ...).
	pub event: String,
	/// Webhook URL the payload was sent to.
	pub target: String,
	/// Exact serialized payload that was sent.
	pub payload: String,
	/// Whether the latest delivery succeeded.
	pub success: bool,
	/// Total HTTP attempts across the initial send and replays.
	pub attempts: u32,
	/// Number of replays performed.
	pub retry_count: u32,
	/// Last HTTP status observed.
	pub status_code: Option<u16>,
	/// Last error message.
	pub error: Option<String>,
	/// When the notification was first sent.
	pub created_at: OffsetDateTime,
	/// When the record last changed.
	pub updated_at: OffsetDateTime,
}
impl DeliveryRecord {
	/// Creates a record from the initial delivery outcome.
	pub fn new(
		event: impl Into<String>,
		target: impl Into<String>,
		payload: impl Into<String>,
		outcome: DeliveryOutcome,
	) -> Self {
		Self {
			id: DeliveryId::generate(),
			event: event.into(),
			target: target.into(),
			payload: payload.into(),
			success: outcome.success,
			attempts: outcome.attempts,
			retry_count: 0,
			status_code: outcome.status_code,
			error: outcome.error,
			created_at: outcome.finished_at,
			updated_at: outcome.finished_at,
		}
	}

	/// Folds a replay outcome into the record.
	pub fn apply_retry(&mut self, outcome: DeliveryOutcome) {
		self.success = outcome.success;
		self.attempts = self.attempts.saturating_add(outcome.attempts);
		self.retry_count = self.retry_count.saturating_add(1);
		self.status_code = outcome.status_code;
		self.error = outcome.error;
		self.updated_at = outcome.finished_at;
	}
}

/// Selection of failed records for a retry sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryFilter {
	/// Only records created at or after this instant.
	pub since: Option<OffsetDateTime>,
	/// Only records with this event label.
	pub event: Option<String>,
	/// Maximum number of records.
	pub limit: usize,
}
impl RetryFilter {
	/// Limit used when none is given.
	pub const DEFAULT_LIMIT: usize = 50;

	/// Restricts the sweep to records created at or after `since`.
	pub fn since(mut self, since: OffsetDateTime) -> Self {
		self.since = Some(since);

		self
	}

	/// Restricts the sweep to one event label.
	pub fn event(mut self, event: impl Into<String>) -> Self {
		self.event = Some(event.into());

		self
	}

	/// Overrides the record limit.
	pub fn limit(mut self, limit: usize) -> Self {
		self.limit = limit;

		self
	}

	/// Returns `true` when `record` is a failed delivery inside the filter.
	pub fn matches(&self, record: &DeliveryRecord) -> bool {
		!record.success
			&& self.since.is_none_or(|since| record.created_at >= since)
			&& self.event.as_deref().is_none_or(|event| record.event == event)
	}

	/// Applies the filter, ordering, and limit to an arbitrary record set.
	pub fn select<'a, I>(&self, records: I) -> Vec<DeliveryRecord>
	where
		I: IntoIterator<Item = &'a DeliveryRecord>,
	{
		let mut selected: Vec<_> =
			records.into_iter().filter(|record| self.matches(record)).cloned().collect();

		selected.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
		selected.truncate(self.limit);

		selected
	}
}
impl Default for RetryFilter {
	fn default() -> Self {
		Self { since: None, event: None, limit: Self::DEFAULT_LIMIT }
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn record(event: &str, success: bool, created_at: OffsetDateTime) -> DeliveryRecord {
		DeliveryRecord::new(event, "https://hooks.example/notify", "{}", DeliveryOutcome {
			success,
			attempts: 3,
			status_code: Some(if success { 200 } else { 502 }),
			error: None,
			finished_at: created_at,
		})
	}

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk full"));

		let source = std::error::Error::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn filter_selects_failed_records_oldest_first() {
		let records = [
			record("applicant_reviewed", false, datetime!(2025-01-03 00:00 UTC)),
			record("applicant_reviewed", true, datetime!(2025-01-01 00:00 UTC)),
			record("applicant_created", false, datetime!(2025-01-02 00:00 UTC)),
			record("applicant_reviewed", false, datetime!(2024-12-31 00:00 UTC)),
		];
		let all = RetryFilter::default().select(&records);

		assert_eq!(all.len(), 3);
		assert!(all.windows(2).all(|pair| pair[0].created_at <= pair[1].created_at));

		let reviewed = RetryFilter::default()
			.event("applicant_reviewed")
			.since(datetime!(2025-01-01 00:00 UTC))
			.select(&records);

		assert_eq!(reviewed.len(), 1);
		assert_eq!(reviewed[0].created_at, datetime!(2025-01-03 00:00 UTC));
		assert_eq!(RetryFilter::default().limit(1).select(&records).len(), 1);
	}

	#[test]
	fn retries_accumulate_attempts() {
		let mut record = record("applicant_created", false, datetime!(2025-01-01 00:00 UTC));

		record.apply_retry(DeliveryOutcome {
			success: true,
			attempts: 1,
			status_code: Some(200),
			error: None,
			finished_at: datetime!(2025-01-02 00:00 UTC),
		});

		assert!(record.success);
		assert_eq!(record.attempts, 4);
		assert_eq!(record.retry_count, 1);
		assert_eq!(record.created_at, datetime!(2025-01-01 00:00 UTC));
		assert_eq!(record.updated_at, datetime!(2025-01-02 00:00 UTC));
	}
}
