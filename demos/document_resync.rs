//! Resyncs an applicant's documents: lists them from the metadata endpoint, downloads each
//! one with pacing, then posts a notification and replays it from the delivery log.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use kyb_broker::{
	client::SignedRequestClient,
	config::{NotifierConfig, ProviderConfig},
	id::ApplicantId,
	notify::{NotifiedApplicant, OnboardingNotification, WebhookNotifier},
	store::{DeliveryStore, MemoryStore, RetryFilter},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/resources/applicants/demo-applicant/one");
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":\"demo-applicant\",\"externalUserId\":\"empresa-1\",\"inspectionId\":\"insp-demo\",\"type\":\"company\",\"info\":{\"companyInfo\":{\"companyName\":\"Demo Ltda\"}}}",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/resources/applicants/demo-applicant/metadata/resources");
			then.status(200).header("content-type", "application/json").body(
				"{\"items\":[{\"id\":\"1001\",\"idDocType\":\"INCORPORATION_CERT\"},{\"id\":\"1002\",\"idDocType\":\"PROOF_OF_ADDRESS\"}],\"totalItems\":2}",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path_matches("^/resources/inspections/insp-demo/resources/.+$");
			then.status(200).header("content-type", "application/pdf").body("%PDF-1.7");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/webhook");
			then.status(200);
		})
		.await;

	let config = ProviderConfig::builder()
		.app_token("demo-app-token")
		.secret("demo-secret")
		.base_url(server.base_url())
		.document_pacing(Duration::from_millis(100))
		.build()?;
	let client = SignedRequestClient::new(config)?;
	let applicant_id = ApplicantId::new("demo-applicant")?;
	let data = client.applicant_data(&applicant_id).await?;
	let bulk = client.download_all_documents(&applicant_id).await?;

	println!("{data}");
	println!("Downloaded {}/{} documents.", bulk.downloaded.len(), bulk.total());

	for document in &bulk.downloaded {
		println!(
			"  {} {} ({} bytes, {})",
			document.document.doc_type,
			document.document.image_id,
			document.payload.len(),
			document.payload.content_type
		);
	}

	let store = Arc::new(MemoryStore::default());
	let notifier = WebhookNotifier::new(
		store.clone() as Arc<dyn DeliveryStore>,
		NotifierConfig::new(Some(Url::parse(&server.url("/webhook"))?)),
	)?
	.with_pacing(Duration::ZERO);
	let applicant = NotifiedApplicant::new(
		data.external_user_id.clone().unwrap_or_default(),
		data.applicant_type,
	)
	.with_name(data.company_name.clone().unwrap_or_default());
	let report = notifier.notify(&OnboardingNotification::applicant_pending(applicant)).await?;
	let summary = notifier.retry_failed(RetryFilter::default()).await?;

	println!(
		"Notification {} delivered: {} after {} attempt(s); {} failed deliveries left to replay.",
		report.delivery_id, report.success, report.attempts, summary.total
	);
	println!("Delivery log holds {} record(s).", store.len());

	Ok(())
}
