//! Optional observability helpers for provider calls and webhook deliveries.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `kyb_broker.call` with the `operation`
//!   and `stage` (call site) fields. Provider calls also fill in `method` and `path` (the signed
//!   path with query); notifications fill in `event`.
//! - Enable `metrics` to increment the `kyb_broker_call_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, auth::Method};

/// Operations observed by the client and notifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Raw signed dispatch issued by a caller.
	Dispatch,
	/// SDK access-token issuance.
	AccessToken,
	/// Applicant profile lookup.
	ApplicantProfile,
	/// Document listing (nested or flat).
	DocumentListing,
	/// Single document download.
	DocumentDownload,
	/// Summary report download.
	SummaryReport,
	/// Questionnaire step reset.
	QuestionnaireReset,
	/// Company plus beneficial-owner document resync.
	CompanyResync,
	/// Webhook notification delivery.
	Notification,
	/// Failed-delivery retry sweep.
	RetrySweep,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Dispatch => "dispatch",
			OperationKind::AccessToken => "access_token",
			OperationKind::ApplicantProfile => "applicant_profile",
			OperationKind::DocumentListing => "document_listing",
			OperationKind::DocumentDownload => "document_download",
			OperationKind::SummaryReport => "summary_report",
			OperationKind::QuestionnaireReset => "questionnaire_reset",
			OperationKind::CompanyResync => "company_resync",
			OperationKind::Notification => "notification",
			OperationKind::RetrySweep => "retry_sweep",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}

	/// Picks [`Self::Success`] or [`Self::Failure`] from a result.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { CallOutcome::Success } else { CallOutcome::Failure }
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a `kyb_broker.call` span and records attempt plus final outcome.
pub(crate) async fn observe<T, Fut>(kind: OperationKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = CallSpan::new(kind, stage);

	record_call_outcome(kind, CallOutcome::Attempt);

	let result = span.instrument(fut).await;

	record_call_outcome(kind, CallOutcome::of(&result));

	result
}

/// Tags the enclosing `kyb_broker.call` span with the signed request line.
pub(crate) fn record_request(method: Method, path: &str) {
	#[cfg(feature = "tracing")]
	{
		let span = ::tracing::Span::current();

		span.record("method", method.as_str());
		span.record("path", path);
	}
	#[cfg(not(feature = "tracing"))]
	let _ = (method, path);
}

/// Tags the enclosing `kyb_broker.call` span with the notification event.
pub(crate) fn record_event(event: &str) {
	#[cfg(feature = "tracing")]
	::tracing::Span::current().record("event", event);
	#[cfg(not(feature = "tracing"))]
	let _ = event;
}

/// Emits a warning for failures that are intentionally swallowed.
pub(crate) fn warn_swallowed(context: &'static str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(context, error = %error, "Ignoring non-fatal failure.");
	#[cfg(not(feature = "tracing"))]
	let _ = (context, error);
}

/// Emits a debug event for skipped work.
pub(crate) fn debug_skip(context: &'static str, detail: &str) {
	#[cfg(feature = "tracing")]
	::tracing::debug!(context, detail, "Skipping.");
	#[cfg(not(feature = "tracing"))]
	let _ = (context, detail);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(OperationKind::DocumentDownload.to_string(), "document_download");
		assert_eq!(OperationKind::RetrySweep.as_str(), "retry_sweep");
		assert_eq!(CallOutcome::of::<(), ()>(&Ok(())), CallOutcome::Success);
		assert_eq!(CallOutcome::of::<(), ()>(&Err(())), CallOutcome::Failure);
	}

	#[tokio::test]
	async fn observe_passes_results_through() {
		let value = observe(OperationKind::Dispatch, "test", async { Ok(7) })
			.await
			.expect("Observed future should succeed.");

		assert_eq!(value, 7);
	}
}
