//! Document listings and downloads.
//!
//! Profiles carry documents as `requiredIdDocs.docSets[].types[].imageIds[]`; metadata
//! endpoints return flat lists whose envelope depends on the API version. Both are reduced to
//! [`DocumentRef`] values without ever failing on a missing or unexpected level.

// self
use crate::{
	_prelude::*,
	auth::ProviderRequest,
	client::{BinaryPayload, SignedRequestClient, TransportErrorMapper},
	error::ConfigError,
	http::ProviderHttpClient,
	id::{ApplicantId, ImageId, InspectionId},
	obs::{self, OperationKind},
	pacing::Pacer,
	resources::{ApplicantProfile, json_scalar, json_str},
};

/// Document-set type used when a flat item does not name one.
pub const DEFAULT_DOC_SET_TYPE: &str = "DOCUMENT";
/// Document type used when a flat item does not name one.
pub const DEFAULT_DOC_TYPE: &str = "UNKNOWN";

/// Review state of a single document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
	/// Not reviewed yet, or the answer is unknown.
	#[default]
	Pending,
	/// Review answer `GREEN`.
	Approved,
	/// Review answer `RED`.
	Rejected,
}
impl DocumentStatus {
	/// Maps a provider review answer.
	pub fn from_review_answer(answer: Option<&str>) -> Self {
		match answer {
			Some("GREEN") => DocumentStatus::Approved,
			Some("RED") => DocumentStatus::Rejected,
			_ => DocumentStatus::Pending,
		}
	}
}

/// One downloadable document image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
	/// Document-set type (`IDENTITY`, `COMPANY`, ...).
	pub doc_set_type: String,
	/// Document type (`ID_CARD`, `PASSPORT`, ...).
	pub doc_type: String,
	/// Provider image id.
	pub image_id: String,
	/// Inspection the image belongs to.
	pub inspection_id: Option<String>,
	/// Review state.
	pub status: DocumentStatus,
	/// Raw review answer.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub review_answer: Option<String>,
	/// Moderator comment.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub review_comment: Option<String>,
	/// Original file name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file_name: Option<String>,
	/// Original file type.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file_type: Option<String>,
	/// Upload timestamp as reported.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub added_date: Option<String>,
	/// Upload channel as reported.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	/// Issuing country.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
}

/// Known envelopes of a flat listing, tried in [`ListingShape::ORDER`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingShape {
	/// The root is the array.
	BareArray,
	/// `{"list": {"items": [...]}}`.
	ListItems,
	/// `{"items": [...]}`.
	Items,
	/// `{"documents": [...]}`.
	Documents,
}
impl ListingShape {
	/// Priority order of the matchers.
	pub const ORDER: [ListingShape; 4] =
		[ListingShape::BareArray, ListingShape::ListItems, ListingShape::Items, ListingShape::Documents];

	/// Returns the item array if `root` has this shape.
	pub fn items(self, root: &JsonValue) -> Option<&Vec<JsonValue>> {
		match self {
			ListingShape::BareArray => root.as_array(),
			ListingShape::ListItems => root.pointer("/list/items")?.as_array(),
			ListingShape::Items => root.get("items")?.as_array(),
			ListingShape::Documents => root.get("documents")?.as_array(),
		}
	}

	/// Returns the first matching shape and its items.
	pub fn detect(root: &JsonValue) -> Option<(ListingShape, &Vec<JsonValue>)> {
		Self::ORDER.into_iter().find_map(|shape| shape.items(root).map(|items| (shape, items)))
	}
}

/// Flattens `requiredIdDocs.docSets[].types[].imageIds[]` into one record per image.
pub fn extract_nested_documents(profile: &JsonValue) -> Vec<DocumentRef> {
	let inspection_id = json_str(profile, "/inspectionId").map(ToOwned::to_owned);
	let Some(doc_sets) = profile.pointer("/requiredIdDocs/docSets").and_then(JsonValue::as_array)
	else {
		return Vec::new();
	};
	let mut documents = Vec::new();

	for doc_set in doc_sets {
		let doc_set_type = json_str(doc_set, "/idDocSetType").unwrap_or(DEFAULT_DOC_SET_TYPE);

		for doc_type in doc_set.get("types").and_then(JsonValue::as_array).into_iter().flatten() {
			let type_name = json_str(doc_type, "/idDocType").unwrap_or(DEFAULT_DOC_TYPE);
			let answer = json_str(doc_type, "/reviewResult/reviewAnswer");
			let comment = json_str(doc_type, "/reviewResult/moderationComment");
			let image_ids = doc_type.get("imageIds").and_then(JsonValue::as_array);

			for image_id in image_ids.into_iter().flatten().filter_map(json_scalar) {
				documents.push(DocumentRef {
					doc_set_type: doc_set_type.to_owned(),
					doc_type: type_name.to_owned(),
					image_id,
					inspection_id: inspection_id.clone(),
					status: DocumentStatus::from_review_answer(answer),
					review_answer: answer.map(ToOwned::to_owned),
					review_comment: comment.map(ToOwned::to_owned),
					country: json_str(doc_type, "/country").map(ToOwned::to_owned),
					..Default::default()
				});
			}
		}
	}

	documents
}

/// Extracts documents from a flat listing in any known envelope.
///
/// Deactivated items and items without an image id are skipped; an unknown envelope yields
/// an empty list.
pub fn extract_flat_documents(root: &JsonValue, inspection_id: Option<&str>) -> Vec<DocumentRef> {
	let Some((_, items)) = ListingShape::detect(root) else {
		obs::debug_skip("document_listing", "response matched no known listing shape");

		return Vec::new();
	};

	items.iter().filter_map(|item| flat_document(item, inspection_id)).collect()
}

fn flat_document(item: &JsonValue, inspection_id: Option<&str>) -> Option<DocumentRef> {
	if item.get("deactivated").and_then(JsonValue::as_bool).unwrap_or(false) {
		obs::debug_skip("document_listing", "deactivated document");

		return None;
	}

	let image_id = item
		.get("imageId")
		.and_then(json_scalar)
		.or_else(|| item.get("id").and_then(json_scalar))?;
	let answer = json_str(item, "/reviewResult/reviewAnswer");
	let field = |pointer: &str| json_str(item, pointer).map(ToOwned::to_owned);

	Some(DocumentRef {
		doc_set_type: field("/idDocDef/idDocSubType")
			.or_else(|| field("/idDocSetType"))
			.unwrap_or_else(|| DEFAULT_DOC_SET_TYPE.to_owned()),
		doc_type: field("/idDocDef/idDocType")
			.or_else(|| field("/idDocType"))
			.unwrap_or_else(|| DEFAULT_DOC_TYPE.to_owned()),
		image_id,
		inspection_id: field("/inspectionId").or_else(|| inspection_id.map(ToOwned::to_owned)),
		status: DocumentStatus::from_review_answer(answer),
		review_answer: answer.map(ToOwned::to_owned),
		review_comment: field("/reviewResult/moderationComment"),
		file_name: field("/fileMetadata/fileName"),
		file_type: field("/fileMetadata/fileType"),
		added_date: field("/addedDate"),
		source: field("/source"),
		country: field("/idDocDef/country").or_else(|| field("/country")),
	})
}

/// A document together with its downloaded bytes.
#[derive(Clone, Debug)]
pub struct DownloadedDocument {
	/// Listing entry.
	pub document: DocumentRef,
	/// Downloaded content.
	pub payload: BinaryPayload,
}

/// A document whose download failed.
#[derive(Debug)]
pub struct FailedDownload {
	/// Listing entry.
	pub document: DocumentRef,
	/// Why the download failed.
	pub error: Error,
}

/// Outcome of [`SignedRequestClient::download_all_documents`].
#[derive(Debug, Default)]
pub struct BulkDownload {
	/// Successful downloads in listing order.
	pub downloaded: Vec<DownloadedDocument>,
	/// Failed downloads in listing order.
	pub failed: Vec<FailedDownload>,
}
impl BulkDownload {
	/// Number of listed documents.
	pub fn total(&self) -> usize {
		self.downloaded.len() + self.failed.len()
	}
}

impl<C, M> SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists documents referenced by the applicant profile (nested shape).
	pub async fn profile_documents(&self, applicant_id: &ApplicantId) -> Result<Vec<DocumentRef>> {
		obs::observe(OperationKind::DocumentListing, "profile_documents", async move {
			let profile = self.fetch_profile(applicant_id).await?;

			Ok(extract_nested_documents(&profile.0))
		})
		.await
	}

	/// Returns the raw document metadata listing.
	pub async fn document_metadata(&self, applicant_id: &ApplicantId) -> Result<JsonValue> {
		obs::observe(OperationKind::DocumentListing, "document_metadata", async move {
			let request = ProviderRequest::get(format!(
				"/resources/applicants/{applicant_id}/metadata/resources"
			));

			self.send(request, self.config.request_timeout).await?.into_json()
		})
		.await
	}

	/// Lists active documents from the metadata endpoint, stamped with the profile's
	/// inspection id.
	pub async fn applicant_documents(&self, applicant_id: &ApplicantId) -> Result<Vec<DocumentRef>> {
		obs::observe(OperationKind::DocumentListing, "applicant_documents", async move {
			let profile = self.fetch_profile(applicant_id).await?;

			self.list_documents(applicant_id, &profile).await
		})
		.await
	}

	/// Downloads one document image; the bytes are returned untouched.
	pub async fn download_document(
		&self,
		inspection_id: &InspectionId,
		image_id: &ImageId,
	) -> Result<BinaryPayload> {
		obs::observe(OperationKind::DocumentDownload, "download_document", async move {
			let request = ProviderRequest::get(format!(
				"/resources/inspections/{inspection_id}/resources/{image_id}"
			));

			Ok(self.send(request, self.config.request_timeout).await?.into_binary())
		})
		.await
	}

	/// Downloads every active document of the applicant, one at a time with
	/// [`ProviderConfig::document_pacing`](crate::config::ProviderConfig) between calls.
	///
	/// Listing failures abort; per-document failures are collected in
	/// [`BulkDownload::failed`].
	pub async fn download_all_documents(&self, applicant_id: &ApplicantId) -> Result<BulkDownload> {
		let documents = self.applicant_documents(applicant_id).await?;
		let mut pacer = Pacer::new(self.config.document_pacing);
		let outcome = self.download_listed_all(documents, &mut pacer).await;

		#[cfg(feature = "tracing")]
		tracing::info!(
			applicant_id = %applicant_id,
			downloaded = outcome.downloaded.len(),
			total = outcome.total(),
			"Bulk document download finished."
		);

		Ok(outcome)
	}

	/// Flat listing of `applicant_id`, stamped with the inspection id of its `profile`.
	pub(crate) async fn list_documents(
		&self,
		applicant_id: &ApplicantId,
		profile: &ApplicantProfile,
	) -> Result<Vec<DocumentRef>> {
		let request =
			ProviderRequest::get(format!("/resources/applicants/{applicant_id}/metadata/resources"));
		let listing = self.send(request, self.config.request_timeout).await?.into_json()?;

		Ok(extract_flat_documents(&listing, profile.inspection_id()))
	}

	/// Downloads `documents` in order; `pacer` may be shared with other applicants' downloads.
	pub(crate) async fn download_listed_all(
		&self,
		documents: Vec<DocumentRef>,
		pacer: &mut Pacer,
	) -> BulkDownload {
		let mut outcome = BulkDownload::default();

		for document in documents {
			pacer.pace().await;

			match self.download_listed(&document).await {
				Ok(payload) => outcome.downloaded.push(DownloadedDocument { document, payload }),
				Err(error) => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						image_id = %document.image_id,
						error = %error,
						"Document download failed."
					);

					outcome.failed.push(FailedDownload { document, error });
				},
			}
		}

		outcome
	}

	async fn download_listed(&self, document: &DocumentRef) -> Result<BinaryPayload> {
		let inspection_id =
			InspectionId::new(document.inspection_id.as_deref().unwrap_or_default())
				.map_err(ConfigError::from)?;
		let image_id = ImageId::new(&document.image_id).map_err(ConfigError::from)?;

		self.download_document(&inspection_id, &image_id).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn nested_sets_flatten_per_image() {
		let profile = serde_json::json!({
			"inspectionId": "insp-1",
			"requiredIdDocs": { "docSets": [
				{ "idDocSetType": "IDENTITY", "types": [{
					"idDocType": "ID_CARD",
					"imageIds": [111, "222"],
					"reviewResult": { "reviewAnswer": "RED", "moderationComment": "Blurry" }
				}] },
				{ "idDocSetType": "SELFIE", "types": [] }
			] }
		});
		let documents = extract_nested_documents(&profile);

		assert_eq!(documents.len(), 2);
		assert!(documents.iter().all(|doc| doc.inspection_id.as_deref() == Some("insp-1")));
		assert_eq!(documents[0].image_id, "111");
		assert_eq!(documents[1].image_id, "222");
		assert_eq!(documents[0].doc_set_type, "IDENTITY");
		assert_eq!(documents[0].doc_type, "ID_CARD");
		assert_eq!(documents[0].status, DocumentStatus::Rejected);
		assert_eq!(documents[0].review_comment.as_deref(), Some("Blurry"));
	}

	#[test]
	fn nested_gaps_contribute_nothing() {
		let profile = serde_json::json!({
			"inspectionId": "insp-1",
			"requiredIdDocs": { "docSets": [
				{ "idDocSetType": "IDENTITY" },
				{ "idDocSetType": "COMPANY", "types": [{ "idDocType": "INCORPORATION_CERT" }] },
				{ "idDocSetType": "PROOF", "types": [{ "idDocType": "UTILITY_BILL", "imageIds": null }] },
				"garbage"
			] }
		});

		assert!(extract_nested_documents(&profile).is_empty());
		assert!(extract_nested_documents(&serde_json::json!({ "id": "x" })).is_empty());
		assert!(extract_nested_documents(&JsonValue::Null).is_empty());

		let unreviewed = extract_nested_documents(&serde_json::json!({
			"requiredIdDocs": { "docSets": [{ "types": [{ "imageIds": [1] }] }] }
		}));

		assert_eq!(unreviewed[0].status, DocumentStatus::Pending);
		assert_eq!(unreviewed[0].inspection_id, None);
	}

	#[test]
	fn every_known_shape_is_recognized() {
		let item = serde_json::json!({ "idDocType": "PASSPORT", "imageId": "img-1" });
		let shapes = [
			(serde_json::json!([item.clone()]), ListingShape::BareArray),
			(serde_json::json!({ "list": { "items": [item.clone()] } }), ListingShape::ListItems),
			(serde_json::json!({ "items": [item.clone()], "totalItems": 1 }), ListingShape::Items),
			(serde_json::json!({ "documents": [item.clone()] }), ListingShape::Documents),
		];

		for (root, expected) in shapes {
			let (shape, _) = ListingShape::detect(&root).expect("Shape should be detected.");
			let documents = extract_flat_documents(&root, Some("insp-1"));

			assert_eq!(shape, expected);
			assert_eq!(documents.len(), 1);
			assert_eq!(documents[0].image_id, "img-1");
			assert_eq!(documents[0].doc_type, "PASSPORT");
			assert_eq!(documents[0].inspection_id.as_deref(), Some("insp-1"));
		}
	}

	#[test]
	fn bare_arrays_keep_every_element() {
		let root = serde_json::json!([
			{ "idDocType": "ID_CARD", "imageId": 1 },
			{ "idDocType": "SELFIE", "imageId": 2 },
			{ "idDocType": "ID_CARD", "imageId": 3 }
		]);
		let ids: Vec<_> =
			extract_flat_documents(&root, None).into_iter().map(|doc| doc.image_id).collect();

		assert_eq!(ids, ["1", "2", "3"]);
	}

	#[test]
	fn unknown_shapes_yield_empty_lists() {
		for root in [
			serde_json::json!({ "files": [] }),
			serde_json::json!({ "items": "nope" }),
			serde_json::json!({ "list": [] }),
			serde_json::json!("text"),
			JsonValue::Null,
		] {
			assert!(extract_flat_documents(&root, None).is_empty());
		}
	}

	#[test]
	fn metadata_items_are_normalized() {
		let root = serde_json::json!({
			"items": [
				{
					"id": "img-a",
					"addedDate": "2024-05-01 10:00:00",
					"source": "fileupload",
					"idDocDef": { "idDocSubType": "FRONT_SIDE", "idDocType": "ID_CARD", "country": "BRA" },
					"reviewResult": { "reviewAnswer": "GREEN" },
					"fileMetadata": { "fileName": "front.jpg", "fileType": "jpeg" }
				},
				{ "id": "img-b", "deactivated": true },
				{ "id": "img-c", "reviewResult": { "reviewAnswer": "RED", "moderationComment": "Expired" } },
				{ "note": "no id" }
			],
			"totalItems": 4
		});
		let documents = extract_flat_documents(&root, Some("insp-9"));

		assert_eq!(documents.len(), 2);
		assert_eq!(documents[0].doc_set_type, "FRONT_SIDE");
		assert_eq!(documents[0].doc_type, "ID_CARD");
		assert_eq!(documents[0].status, DocumentStatus::Approved);
		assert_eq!(documents[0].file_name.as_deref(), Some("front.jpg"));
		assert_eq!(documents[0].country.as_deref(), Some("BRA"));
		assert_eq!(documents[1].image_id, "img-c");
		assert_eq!(documents[1].doc_set_type, DEFAULT_DOC_SET_TYPE);
		assert_eq!(documents[1].doc_type, DEFAULT_DOC_TYPE);
		assert_eq!(documents[1].status, DocumentStatus::Rejected);
		assert_eq!(documents[1].review_comment.as_deref(), Some("Expired"));
	}
}
