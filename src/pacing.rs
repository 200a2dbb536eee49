//! Fixed delays between sequential provider calls in bulk operations.
//!
//! Pacing keeps document resyncs and notification sweeps under the provider's rate limits.
//! The first call of a batch never waits; every later call waits the configured delay.

// self
use crate::_prelude::*;

/// Sequential pacer; a zero delay disables waiting entirely.
#[derive(Clone, Debug)]
pub struct Pacer {
	delay: StdDuration,
	started: bool,
}
impl Pacer {
	/// Creates a pacer that waits `delay` between consecutive calls.
	pub fn new(delay: StdDuration) -> Self {
		Self { delay, started: false }
	}

	/// Returns the configured delay.
	pub fn delay(&self) -> StdDuration {
		self.delay
	}

	/// Waits before the next call unless this is the first one.
	pub async fn pace(&mut self) {
		if !self.started {
			self.started = true;

			return;
		}
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
	}
}
