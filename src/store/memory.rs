//! Thread-safe in-memory [`DeliveryStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	id::DeliveryId,
	store::{DeliveryOutcome, DeliveryRecord, DeliveryStore, RetryFilter, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<DeliveryId, DeliveryRecord>>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns every stored record, oldest first.
	pub fn snapshot(&self) -> Vec<DeliveryRecord> {
		let mut records: Vec<_> = self.0.read().values().cloned().collect();

		records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

		records
	}

	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing has been stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn insert_now(map: StoreMap, record: DeliveryRecord) -> Result<(), StoreError> {
		let mut guard = map.write();

		if guard.contains_key(&record.id) {
			return Err(StoreError::Backend {
				message: format!("Delivery {} already exists", record.id),
			});
		}

		guard.insert(record.id.clone(), record);

		Ok(())
	}

	fn retry_now(map: StoreMap, id: DeliveryId, outcome: DeliveryOutcome) -> Option<DeliveryRecord> {
		let mut guard = map.write();
		let record = guard.get_mut(&id)?;

		record.apply_retry(outcome);

		Some(record.clone())
	}
}
impl DeliveryStore for MemoryStore {
	fn insert(&self, record: DeliveryRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::insert_now(map, record) })
	}

	fn get<'a>(&'a self, id: &'a DeliveryId) -> StoreFuture<'a, Option<DeliveryRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(id).cloned()) })
	}

	fn failed<'a>(&'a self, filter: &'a RetryFilter) -> StoreFuture<'a, Vec<DeliveryRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(filter.select(map.read().values())) })
	}

	fn record_retry<'a>(
		&'a self,
		id: &'a DeliveryId,
		outcome: DeliveryOutcome,
	) -> StoreFuture<'a, Option<DeliveryRecord>> {
		let map = self.0.clone();
		let id = id.to_owned();

		Box::pin(async move { Ok(Self::retry_now(map, id, outcome)) })
	}
}
