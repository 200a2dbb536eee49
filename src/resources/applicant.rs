//! Applicant profiles and their normalized summary.

// self
use crate::{
	_prelude::*,
	auth::ProviderRequest,
	client::{SignedRequestClient, TransportErrorMapper},
	http::ProviderHttpClient,
	id::ApplicantId,
	obs::{self, OperationKind},
	resources::json_str,
};

/// Individual person or legal entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantType {
	/// Natural person (KYC).
	#[default]
	Individual,
	/// Company (KYB).
	Company,
}
impl ApplicantType {
	/// Returns the provider label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ApplicantType::Individual => "individual",
			ApplicantType::Company => "company",
		}
	}
}
impl Display for ApplicantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Raw applicant profile as returned by `GET /resources/applicants/{id}/one`.
///
/// The provider's profile shape varies between levels and API versions, so the document is
/// kept as JSON and read through tolerant accessors.
#[derive(Clone, Debug, PartialEq)]
pub struct ApplicantProfile(pub JsonValue);
impl ApplicantProfile {
	/// Wraps a profile response, unwrapping the `{"list": {"items": [profile]}}` envelope some
	/// API versions answer with.
	pub fn from_response(response: JsonValue) -> Self {
		match response.pointer("/list/items/0") {
			Some(profile) if profile.is_object() => Self(profile.clone()),
			_ => Self(response),
		}
	}

	/// Provider applicant id.
	pub fn id(&self) -> Option<&str> {
		json_str(&self.0, "/id")
	}

	/// External user id chosen by the onboarding backend.
	pub fn external_user_id(&self) -> Option<&str> {
		json_str(&self.0, "/externalUserId")
	}

	/// Inspection id shared by every document of the applicant.
	pub fn inspection_id(&self) -> Option<&str> {
		json_str(&self.0, "/inspectionId")
	}

	/// Applicant type; anything but `company` counts as an individual.
	pub fn applicant_type(&self) -> ApplicantType {
		match json_str(&self.0, "/type") {
			Some("company") => ApplicantType::Company,
			_ => ApplicantType::Individual,
		}
	}

	/// Reduces the profile to the fields the onboarding backend stores.
	pub fn data(&self) -> ApplicantData {
		let root = &self.0;
		let applicant_type = self.applicant_type();
		let mut data = ApplicantData {
			id: self.id().unwrap_or_default().to_owned(),
			external_user_id: self.external_user_id().map(ToOwned::to_owned),
			applicant_type,
			review_status: owned(root, "/review/reviewStatus"),
			review_answer: owned(root, "/review/reviewResult/reviewAnswer")
				.or_else(|| owned(root, "/review/reviewAnswer")),
			..Default::default()
		};

		match applicant_type {
			ApplicantType::Individual => {
				data.first_name = owned(root, "/info/firstName");
				data.last_name = owned(root, "/info/lastName");
				data.full_name = match (&data.first_name, &data.last_name) {
					(Some(first), Some(last)) => Some(format!("{first} {last}")),
					(first, last) => first.clone().or_else(|| last.clone()),
				};
				data.dob = owned(root, "/info/dob");
				data.country = owned(root, "/info/country");
				data.email = owned(root, "/info/email");
				data.phone = owned(root, "/info/phone");
				data.id_doc_number = identity_document_number(root);
			},
			ApplicantType::Company => {
				data.company_name = owned(root, "/info/companyInfo/companyName");
				data.registration_number = owned(root, "/info/companyInfo/registrationNumber");
				data.country = owned(root, "/info/companyInfo/country");
				data.email =
					owned(root, "/info/email").or_else(|| owned(root, "/info/companyInfo/email"));
				data.phone =
					owned(root, "/info/phone").or_else(|| owned(root, "/info/companyInfo/phone"));
			},
		}

		data
	}
}

/// Normalized applicant summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantData {
	/// Provider applicant id.
	pub id: String,
	/// External user id.
	pub external_user_id: Option<String>,
	/// Individual or company.
	#[serde(rename = "type")]
	pub applicant_type: ApplicantType,
	/// Given name (individuals).
	pub first_name: Option<String>,
	/// Family name (individuals).
	pub last_name: Option<String>,
	/// `first last`, or whichever part exists.
	pub full_name: Option<String>,
	/// Date of birth as reported (individuals).
	pub dob: Option<String>,
	/// Legal name (companies).
	pub company_name: Option<String>,
	/// Registration number, e.g. CNPJ (companies).
	pub registration_number: Option<String>,
	/// Contact email.
	pub email: Option<String>,
	/// Contact phone.
	pub phone: Option<String>,
	/// Country code.
	pub country: Option<String>,
	/// Identity document number, e.g. CPF (individuals).
	pub id_doc_number: Option<String>,
	/// Review status (`init`, `pending`, `completed`, ...).
	pub review_status: Option<String>,
	/// Review answer (`GREEN` or `RED`).
	pub review_answer: Option<String>,
}
impl Display for ApplicantData {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		fn or_na(value: &Option<String>) -> &str {
			value.as_deref().unwrap_or("N/A")
		}

		match self.applicant_type {
			ApplicantType::Individual => write!(
				f,
				"Nome: {}\nCPF: {}\nEmail: {}\nTelefone: {}",
				or_na(&self.full_name),
				or_na(&self.id_doc_number),
				or_na(&self.email),
				or_na(&self.phone),
			),
			ApplicantType::Company => write!(
				f,
				"Empresa: {}\nCNPJ: {}\nEmail: {}\nTelefone: {}",
				or_na(&self.company_name),
				or_na(&self.registration_number),
				or_na(&self.email),
				or_na(&self.phone),
			),
		}
	}
}

impl<C, M> SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches the full applicant profile.
	pub async fn applicant_profile(&self, applicant_id: &ApplicantId) -> Result<ApplicantProfile> {
		obs::observe(
			OperationKind::ApplicantProfile,
			"applicant_profile",
			self.fetch_profile(applicant_id),
		)
		.await
	}

	/// Fetches the profile and reduces it to [`ApplicantData`].
	pub async fn applicant_data(&self, applicant_id: &ApplicantId) -> Result<ApplicantData> {
		Ok(self.applicant_profile(applicant_id).await?.data())
	}

	pub(crate) async fn fetch_profile(&self, applicant_id: &ApplicantId) -> Result<ApplicantProfile> {
		let request = ProviderRequest::get(format!("/resources/applicants/{applicant_id}/one"));
		let response = self.send(request, self.config.request_timeout).await?;

		Ok(ApplicantProfile::from_response(response.into_json()?))
	}
}

pub(crate) fn owned(root: &JsonValue, pointer: &str) -> Option<String> {
	json_str(root, pointer).map(ToOwned::to_owned)
}

/// Number field of the first `ID_CARD`/`DRIVERS` type in an `IDENTITY` doc set; later
/// identity sets win.
fn identity_document_number(root: &JsonValue) -> Option<String> {
	let doc_sets = root.pointer("/requiredIdDocs/docSets")?.as_array()?;
	let mut number = None;

	for doc_set in doc_sets.iter().filter(|set| set["idDocSetType"] == "IDENTITY") {
		let Some(types) = doc_set["types"].as_array() else {
			continue;
		};
		let Some(id_doc) =
			types.iter().find(|ty| ty["idDocType"] == "ID_CARD" || ty["idDocType"] == "DRIVERS")
		else {
			continue;
		};

		if let Some(fields) = id_doc["fields"].as_array() {
			number = fields
				.iter()
				.find(|field| field["name"] == "number")
				.and_then(|field| field["value"].as_str())
				.map(ToOwned::to_owned);
		}
	}

	number
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn individual_profiles_collect_identity_fields() {
		let profile = ApplicantProfile(serde_json::json!({
			"id": "abc123",
			"externalUserId": "user-1",
			"inspectionId": "insp-1",
			"type": "individual",
			"info": {
				"firstName": "Maria",
				"lastName": "Silva",
				"dob": "1990-01-31",
				"country": "BRA",
				"email": "maria@example.com",
				"phone": "+5511999999999"
			},
			"review": { "reviewStatus": "completed", "reviewAnswer": "GREEN" },
			"requiredIdDocs": { "docSets": [
				{ "idDocSetType": "SELFIE", "types": [{ "idDocType": "SELFIE" }] },
				{ "idDocSetType": "IDENTITY", "types": [
					{ "idDocType": "PASSPORT", "fields": [{ "name": "number", "value": "X1" }] },
					{ "idDocType": "ID_CARD", "fields": [
						{ "name": "issuedDate", "value": "2015-01-01" },
						{ "name": "number", "value": "123.456.789-09" }
					] }
				] }
			] }
		}));
		let data = profile.data();

		assert_eq!(profile.inspection_id(), Some("insp-1"));
		assert_eq!(data.applicant_type, ApplicantType::Individual);
		assert_eq!(data.full_name.as_deref(), Some("Maria Silva"));
		assert_eq!(data.id_doc_number.as_deref(), Some("123.456.789-09"));
		assert_eq!(data.review_answer.as_deref(), Some("GREEN"));
		assert_eq!(data.company_name, None);
		assert_eq!(
			data.to_string(),
			"Nome: Maria Silva\nCPF: 123.456.789-09\nEmail: maria@example.com\nTelefone: +5511999999999"
		);
	}

	#[test]
	fn company_profiles_fall_back_to_company_contacts() {
		let profile = ApplicantProfile(serde_json::json!({
			"id": "cmp-1",
			"type": "company",
			"info": {
				"companyInfo": {
					"companyName": "Acme Ltda",
					"registrationNumber": "12.345.678/0001-90",
					"country": "BRA",
					"email": "ops@acme.example",
					"phone": "+551130000000"
				}
			}
		}));
		let data = profile.data();

		assert_eq!(data.applicant_type, ApplicantType::Company);
		assert_eq!(data.company_name.as_deref(), Some("Acme Ltda"));
		assert_eq!(data.registration_number.as_deref(), Some("12.345.678/0001-90"));
		assert_eq!(data.email.as_deref(), Some("ops@acme.example"));
		assert_eq!(data.full_name, None);
		assert!(data.to_string().starts_with("Empresa: Acme Ltda\nCNPJ: 12.345.678/0001-90"));
	}

	#[test]
	fn sparse_profiles_do_not_fail() {
		let data = ApplicantProfile(serde_json::json!({ "id": "x", "info": { "lastName": "Souza" } }))
			.data();

		assert_eq!(data.full_name.as_deref(), Some("Souza"));
		assert_eq!(data.id_doc_number, None);
		assert_eq!(data.to_string(), "Nome: Souza\nCPF: N/A\nEmail: N/A\nTelefone: N/A");

		let empty = ApplicantProfile(JsonValue::Null).data();

		assert_eq!(empty.id, "");
		assert_eq!(empty.applicant_type, ApplicantType::Individual);
	}

	#[test]
	fn list_envelopes_are_unwrapped() {
		let profile = ApplicantProfile::from_response(serde_json::json!({
			"list": { "items": [{
				"id": "ubo-1",
				"review": { "reviewStatus": "completed", "reviewResult": { "reviewAnswer": "RED" } }
			}], "totalItems": 1 }
		}));

		assert_eq!(profile.id(), Some("ubo-1"));
		assert_eq!(profile.data().review_answer.as_deref(), Some("RED"));

		let bare = ApplicantProfile::from_response(serde_json::json!({ "id": "abc", "list": [] }));

		assert_eq!(bare.id(), Some("abc"));

		let empty_list =
			ApplicantProfile::from_response(serde_json::json!({ "list": { "items": [] } }));

		assert_eq!(empty_list.id(), None);
	}
}
