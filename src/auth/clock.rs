//! Epoch-second clocks used to stamp signed requests.

// std
use std::sync::atomic::{AtomicI64, Ordering};
// self
use crate::_prelude::*;

/// Source of whole seconds since the Unix epoch.
///
/// The client reads the clock once per dispatch attempt, so a retry always signs a fresh
/// timestamp.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current Unix time in whole seconds.
	fn now_unix(&self) -> i64;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now_unix(&self) -> i64 {
		OffsetDateTime::now_utc().unix_timestamp()
	}
}

/// Manually driven clock for tests and replay tooling.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);
impl FixedClock {
	/// Creates a clock frozen at `unix` seconds.
	pub fn new(unix: i64) -> Self {
		Self(AtomicI64::new(unix))
	}

	/// Moves the clock to `unix` seconds.
	pub fn set(&self, unix: i64) {
		self.0.store(unix, Ordering::SeqCst);
	}

	/// Advances the clock by `secs` seconds.
	pub fn advance(&self, secs: i64) {
		self.0.fetch_add(secs, Ordering::SeqCst);
	}
}
impl Clock for FixedClock {
	fn now_unix(&self) -> i64 {
		self.0.load(Ordering::SeqCst)
	}
}
