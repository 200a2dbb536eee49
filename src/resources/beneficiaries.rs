//! Beneficial owners (UBOs) of company applicants and the company-wide document resync.
//!
//! Company profiles list their owners under `fixedInfo.companyInfo.beneficiaries[]` (older
//! levels use `info.companyInfo.beneficiaries[]`). Every owner is a separate individual
//! applicant with its own review and documents.

// self
use crate::{
	_prelude::*,
	client::{SignedRequestClient, TransportErrorMapper},
	error::ConfigError,
	http::ProviderHttpClient,
	id::ApplicantId,
	obs::{self, OperationKind},
	pacing::Pacer,
	resources::{ApplicantData, ApplicantProfile, BulkDownload, applicant::owned, json_scalar},
};

/// Verification state of a beneficial owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryStatus {
	/// The owner has no review yet, or its profile could not be read.
	#[default]
	NotSubmitted,
	/// Review answer `YELLOW`, or review status `init`/`pending`.
	Pending,
	/// Review answer `GREEN`.
	Approved,
	/// Review answer `RED`.
	Rejected,
}
impl BeneficiaryStatus {
	/// Returns the stored label.
	pub const fn as_str(self) -> &'static str {
		match self {
			BeneficiaryStatus::NotSubmitted => "not_submitted",
			BeneficiaryStatus::Pending => "pending",
			BeneficiaryStatus::Approved => "approved",
			BeneficiaryStatus::Rejected => "rejected",
		}
	}
}
impl Display for BeneficiaryStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One beneficial owner listed on a company profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
	/// Applicant id of the owner's own (individual) profile.
	pub applicant_id: String,
	/// Given name.
	pub first_name: Option<String>,
	/// Middle names.
	pub middle_name: Option<String>,
	/// Family name.
	pub last_name: Option<String>,
	/// Contact email.
	pub email: Option<String>,
	/// Ownership share in percent.
	pub share_size: Option<f64>,
	/// Roles (`ubo`, `shareholder`, `director`, ...).
	pub types: Vec<String>,
	/// Whether the owner has submitted their own verification.
	pub submitted: bool,
}
impl Beneficiary {
	/// Present name parts joined by spaces.
	pub fn name(&self) -> Option<String> {
		let parts = [&self.first_name, &self.middle_name, &self.last_name]
			.into_iter()
			.flatten()
			.map(String::as_str)
			.collect::<Vec<_>>();

		if parts.is_empty() { None } else { Some(parts.join(" ")) }
	}

	/// Replaces the listed name with the one verified on the owner's own profile.
	///
	/// A full name in `info.firstName` (as read from the identity document) wins: the first
	/// word is the given name, the last word the family name, anything between the middle
	/// name. Otherwise the `fixedInfo` name parts override the listed ones individually.
	pub fn apply_verified_name(&mut self, profile: &ApplicantProfile) {
		let root = &profile.0;

		if let Some(full) = owned(root, "/info/firstName") {
			let words = full.split_whitespace().collect::<Vec<_>>();

			if let [first, middle @ .., last] = words.as_slice() {
				self.first_name = Some((*first).to_owned());
				self.middle_name = (!middle.is_empty()).then(|| middle.join(" "));
				self.last_name = Some((*last).to_owned());

				return;
			}
		}

		let first = owned(root, "/fixedInfo/firstName");
		let last = owned(root, "/fixedInfo/lastName");

		if first.is_some() || last.is_some() {
			self.first_name = first.or(self.first_name.take());
			self.middle_name = owned(root, "/fixedInfo/middleName").or(self.middle_name.take());
			self.last_name = last.or(self.last_name.take());
		}
	}
}

impl ApplicantProfile {
	/// Beneficial owners listed on a company profile; entries without an applicant id are
	/// skipped.
	pub fn beneficiaries(&self) -> Vec<Beneficiary> {
		let root = &self.0;
		let Some(entries) = root
			.pointer("/fixedInfo/companyInfo/beneficiaries")
			.and_then(JsonValue::as_array)
			.or_else(|| root.pointer("/info/companyInfo/beneficiaries")?.as_array())
		else {
			return Vec::new();
		};

		entries.iter().filter_map(beneficiary).collect()
	}

	/// Verification state of this profile read as a beneficial owner.
	pub fn beneficiary_status(&self) -> BeneficiaryStatus {
		let Some(review) = self.0.get("review").filter(|review| review.is_object()) else {
			return BeneficiaryStatus::NotSubmitted;
		};

		match review.pointer("/reviewResult/reviewAnswer").and_then(JsonValue::as_str) {
			Some("GREEN") => BeneficiaryStatus::Approved,
			Some("RED") => BeneficiaryStatus::Rejected,
			Some("YELLOW") => BeneficiaryStatus::Pending,
			_ => match review.get("reviewStatus").and_then(JsonValue::as_str) {
				Some("init" | "pending") => BeneficiaryStatus::Pending,
				_ => BeneficiaryStatus::NotSubmitted,
			},
		}
	}
}

fn beneficiary(entry: &JsonValue) -> Option<Beneficiary> {
	let Some(applicant_id) = entry.get("applicantId").and_then(json_scalar) else {
		obs::debug_skip("beneficiaries", "beneficiary without applicant id");

		return None;
	};
	let info = entry.get("beneficiaryInfo").unwrap_or(&JsonValue::Null);
	let types = entry
		.get("types")
		.and_then(JsonValue::as_array)
		.into_iter()
		.flatten()
		.filter_map(|ty| ty.as_str().map(ToOwned::to_owned))
		.collect();

	Some(Beneficiary {
		applicant_id,
		first_name: owned(info, "/firstName"),
		middle_name: owned(info, "/middleName"),
		last_name: owned(info, "/lastName"),
		email: owned(info, "/email"),
		share_size: share(entry.get("shareSize")).or_else(|| share(info.get("shareSize"))),
		types,
		submitted: entry.get("submitted").and_then(JsonValue::as_bool).unwrap_or(false),
	})
}

/// Shares arrive as numbers or numeric strings.
fn share(value: Option<&JsonValue>) -> Option<f64> {
	match value? {
		JsonValue::Number(number) => number.as_f64(),
		JsonValue::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}

/// Resync outcome for one beneficial owner.
#[derive(Debug)]
pub struct BeneficiaryResync {
	/// Listed owner, with the verified name applied when the profile was read.
	pub beneficiary: Beneficiary,
	/// Verification state from the owner's profile.
	pub status: BeneficiaryStatus,
	/// The owner's documents.
	pub documents: BulkDownload,
	/// Why the owner's profile or listing could not be read.
	pub error: Option<Error>,
}

/// Outcome of [`SignedRequestClient::company_document_resync`].
#[derive(Debug)]
pub struct CompanyResync {
	/// Normalized company profile.
	pub company: ApplicantData,
	/// The company's own documents.
	pub documents: BulkDownload,
	/// One entry per listed beneficial owner, in listing order.
	pub beneficiaries: Vec<BeneficiaryResync>,
}
impl CompanyResync {
	/// Documents downloaded for the company and all of its owners.
	pub fn downloaded(&self) -> usize {
		self.documents.downloaded.len()
			+ self.beneficiaries.iter().map(|owner| owner.documents.downloaded.len()).sum::<usize>()
	}

	/// Documents listed for the company and all of its owners.
	pub fn total(&self) -> usize {
		self.documents.total()
			+ self.beneficiaries.iter().map(|owner| owner.documents.total()).sum::<usize>()
	}
}

impl<C, M> SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Downloads the documents of a company applicant and of every beneficial owner it lists.
	///
	/// All downloads share one [`Pacer`], so consecutive downloads are spaced by
	/// [`ProviderConfig::document_pacing`](crate::config::ProviderConfig) even across
	/// applicants. A failure to read the company profile or listing aborts; an owner whose
	/// profile or listing fails is reported in [`BeneficiaryResync::error`] and the resync
	/// moves on.
	pub async fn company_document_resync(&self, company_id: &ApplicantId) -> Result<CompanyResync> {
		obs::observe(
			OperationKind::CompanyResync,
			"company_document_resync",
			self.resync_company(company_id),
		)
		.await
	}

	async fn resync_company(&self, company_id: &ApplicantId) -> Result<CompanyResync> {
		let profile = self.fetch_profile(company_id).await?;
		let listing = self.list_documents(company_id, &profile).await?;
		let mut pacer = Pacer::new(self.config.document_pacing);
		let documents = self.download_listed_all(listing, &mut pacer).await;
		let mut beneficiaries = Vec::new();

		for mut beneficiary in profile.beneficiaries() {
			let resync = match self.resync_beneficiary(&mut beneficiary, &mut pacer).await {
				Ok((status, documents)) =>
					BeneficiaryResync { beneficiary, status, documents, error: None },
				Err(error) => {
					obs::warn_swallowed("company_resync.beneficiary", &error);

					BeneficiaryResync {
						beneficiary,
						status: BeneficiaryStatus::NotSubmitted,
						documents: BulkDownload::default(),
						error: Some(error),
					}
				},
			};

			beneficiaries.push(resync);
		}

		let outcome = CompanyResync { company: profile.data(), documents, beneficiaries };

		#[cfg(feature = "tracing")]
		tracing::info!(
			applicant_id = %company_id,
			beneficiaries = outcome.beneficiaries.len(),
			downloaded = outcome.downloaded(),
			total = outcome.total(),
			"Company document resync finished."
		);

		Ok(outcome)
	}

	async fn resync_beneficiary(
		&self,
		beneficiary: &mut Beneficiary,
		pacer: &mut Pacer,
	) -> Result<(BeneficiaryStatus, BulkDownload)> {
		let applicant_id = ApplicantId::new(&beneficiary.applicant_id).map_err(ConfigError::from)?;
		let profile = self.fetch_profile(&applicant_id).await?;

		beneficiary.apply_verified_name(&profile);

		let listing = self.list_documents(&applicant_id, &profile).await?;

		Ok((profile.beneficiary_status(), self.download_listed_all(listing, pacer).await))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn company() -> ApplicantProfile {
		ApplicantProfile(serde_json::json!({
			"id": "cmp-1",
			"type": "company",
			"info": { "companyInfo": {
				"companyName": "Acme Ltda",
				"beneficiaries": [{ "applicantId": "stale", "beneficiaryInfo": {} }]
			} },
			"fixedInfo": { "companyInfo": { "beneficiaries": [
				{
					"applicantId": "ubo-1",
					"shareSize": 60,
					"types": ["ubo", "director"],
					"submitted": true,
					"beneficiaryInfo": {
						"firstName": "Joana",
						"lastName": "Lima",
						"email": "joana@acme.example"
					}
				},
				{ "beneficiaryInfo": { "firstName": "No Id" } },
				{ "applicantId": "ubo-2", "beneficiaryInfo": { "lastName": "Souza", "shareSize": "40.5" } }
			] } }
		}))
	}

	#[test]
	fn beneficiaries_prefer_fixed_info() {
		let owners = company().beneficiaries();

		assert_eq!(owners.len(), 2);
		assert_eq!(owners[0].applicant_id, "ubo-1");
		assert_eq!(owners[0].name().as_deref(), Some("Joana Lima"));
		assert_eq!(owners[0].email.as_deref(), Some("joana@acme.example"));
		assert_eq!(owners[0].share_size, Some(60.0));
		assert_eq!(owners[0].types, ["ubo", "director"]);
		assert!(owners[0].submitted);
		assert_eq!(owners[1].applicant_id, "ubo-2");
		assert_eq!(owners[1].share_size, Some(40.5));
		assert!(!owners[1].submitted);
	}

	#[test]
	fn beneficiaries_fall_back_to_info() {
		let profile = ApplicantProfile(serde_json::json!({
			"info": { "companyInfo": { "beneficiaries": [
				{ "applicantId": 42, "beneficiaryInfo": { "firstName": "Rui" } }
			] } }
		}));
		let owners = profile.beneficiaries();

		assert_eq!(owners.len(), 1);
		assert_eq!(owners[0].applicant_id, "42");
		assert!(ApplicantProfile(JsonValue::Null).beneficiaries().is_empty());
	}

	#[test]
	fn status_follows_review_answer_then_status() {
		let status = |review: JsonValue| {
			ApplicantProfile(serde_json::json!({ "review": review })).beneficiary_status()
		};

		let answer =
			|value: &str| status(serde_json::json!({ "reviewResult": { "reviewAnswer": value } }));

		assert_eq!(answer("GREEN"), BeneficiaryStatus::Approved);
		assert_eq!(answer("RED"), BeneficiaryStatus::Rejected);
		assert_eq!(answer("YELLOW"), BeneficiaryStatus::Pending);
		assert_eq!(status(serde_json::json!({ "reviewStatus": "init" })), BeneficiaryStatus::Pending);
		assert_eq!(status(serde_json::json!({ "reviewStatus": "pending" })), BeneficiaryStatus::Pending);
		assert_eq!(
			status(serde_json::json!({ "reviewStatus": "completed" })),
			BeneficiaryStatus::NotSubmitted
		);
		assert_eq!(
			ApplicantProfile(serde_json::json!({ "id": "x" })).beneficiary_status(),
			BeneficiaryStatus::NotSubmitted
		);
		assert_eq!(BeneficiaryStatus::NotSubmitted.to_string(), "not_submitted");
	}

	#[test]
	fn verified_names_override_listed_ones() {
		let listed = || Beneficiary {
			applicant_id: "ubo-1".into(),
			first_name: Some("Thiago".into()),
			last_name: Some("Lara".into()),
			..Default::default()
		};
		let mut owner = listed();

		owner.apply_verified_name(&ApplicantProfile(serde_json::json!({
			"info": { "firstName": "THIAGO MACHADO DE LARA" }
		})));

		assert_eq!(owner.first_name.as_deref(), Some("THIAGO"));
		assert_eq!(owner.middle_name.as_deref(), Some("MACHADO DE"));
		assert_eq!(owner.last_name.as_deref(), Some("LARA"));

		let mut owner = listed();

		owner.apply_verified_name(&ApplicantProfile(serde_json::json!({
			"info": { "firstName": "Thiago" },
			"fixedInfo": { "lastName": "Machado Lara" }
		})));

		assert_eq!(owner.name().as_deref(), Some("Thiago Machado Lara"));

		let mut owner = listed();

		owner.apply_verified_name(&ApplicantProfile(JsonValue::Null));

		assert_eq!(owner, listed());
	}
}
