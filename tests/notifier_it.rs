// crates.io
use httpmock::prelude::*;
// self
use kyb_broker::{
	_preludet::*,
	notify::{NotifiedApplicant, OnboardingNotification, ReviewAnswer},
	resources::ApplicantType,
	store::{DeliveryStore, RetryFilter},
};

fn reviewed() -> OnboardingNotification {
	let applicant = NotifiedApplicant::new("user-42", ApplicantType::Individual)
		.with_name("José Conceição")
		.with_email("jose@example.com");

	OnboardingNotification::applicant_reviewed(
		applicant,
		ReviewAnswer::Green,
		Some("https://app.example/contrato/user-42".into()),
	)
}

#[tokio::test]
async fn failed_delivery_is_replayed_byte_for_byte() {
	let server = MockServer::start_async().await;
	let (notifier, store) = build_reqwest_test_notifier(Some(&server.url("/webhook")));
	let mut failing = server
		.mock_async(|when, then| {
			when.method(POST).path("/webhook").header("content-type", "application/json");
			then.status(502).body("bad gateway");
		})
		.await;
	let report = notifier.notify(&reviewed()).await.expect("Notify should not error.");

	assert!(!report.success);
	assert_eq!(report.attempts, 4);
	assert_eq!(report.status_code, Some(502));

	failing.assert_calls_async(4).await;
	failing.delete_async().await;

	let record = store
		.get(&report.delivery_id)
		.await
		.expect("Delivery lookup should succeed.")
		.expect("Failed delivery should be recorded.");

	assert!(record.payload.contains("José Conceição"));

	let replay = server
		.mock_async(|when, then| {
			when.method(POST).path("/webhook").body(record.payload.as_str());
			then.status(200);
		})
		.await;
	let summary = notifier
		.retry_failed(RetryFilter::default().event("applicant_reviewed"))
		.await
		.expect("Retry sweep should succeed.");

	replay.assert_calls_async(1).await;

	assert_eq!(summary.total, 1);
	assert_eq!(summary.succeeded, 1);
	assert_eq!(summary.failed, 0);
	assert_eq!(summary.details[0].applicant_id.as_deref(), Some("user-42"));

	let updated = store
		.get(&report.delivery_id)
		.await
		.expect("Delivery lookup should succeed.")
		.expect("Delivery should still exist.");

	assert!(updated.success);
	assert_eq!(updated.payload, record.payload);
	assert_eq!(updated.retry_count, 1);
	assert_eq!(updated.status_code, Some(200));
}

#[tokio::test]
async fn sweep_respects_event_filter_and_limit() {
	let server = MockServer::start_async().await;
	let (notifier, store) = build_reqwest_test_notifier(Some(&server.url("/webhook")));
	let failing = server
		.mock_async(|when, then| {
			when.method(POST).path("/webhook");
			then.status(500);
		})
		.await;
	let notifier = notifier.with_max_retries(0);

	for notification in [
		OnboardingNotification::applicant_created("a-1", ApplicantType::Company),
		OnboardingNotification::applicant_created("a-2", ApplicantType::Company),
		reviewed(),
	] {
		notifier.notify(&notification).await.expect("Notify should not error.");
	}

	failing.assert_calls_async(3).await;

	let summary = notifier
		.retry_failed(RetryFilter::default().event("applicant_created").limit(1))
		.await
		.expect("Retry sweep should succeed.");

	assert_eq!(summary.total, 1);
	assert_eq!(summary.failed, 1);
	assert!(summary.details[0].error.as_deref().is_some_and(|error| error.contains("500")));
	assert_eq!(store.len(), 3);
	assert_eq!(store.snapshot().iter().filter(|record| record.retry_count == 1).count(), 1);
}

#[tokio::test]
async fn missing_webhook_url_records_a_skipped_delivery() {
	let (notifier, store) = build_reqwest_test_notifier(None);
	let report = notifier
		.notify(&OnboardingNotification::applicant_pending(NotifiedApplicant::new(
			"user-7",
			ApplicantType::Individual,
		)))
		.await
		.expect("Notify without URL should not error.");

	assert!(report.skipped());
	assert!(report.recorded);

	let summary =
		notifier.retry_failed(RetryFilter::default()).await.expect("Retry sweep should succeed.");

	assert_eq!(summary.total, 1);
	assert_eq!(summary.failed, 1);
	assert_eq!(store.snapshot()[0].attempts, 0);
}
