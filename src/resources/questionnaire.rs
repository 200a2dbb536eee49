//! Questionnaire step resets.

// self
use crate::{
	_prelude::*,
	auth::ProviderRequest,
	client::{SignedRequestClient, TransportErrorMapper},
	http::ProviderHttpClient,
	id::{ApplicantId, QuestionnaireId},
	obs::{self, OperationKind},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetQuestionnaireBody<'a> {
	questionnaire_id: &'a str,
}

/// Builds the reset request; the body is compact JSON and is signed byte-for-byte.
pub fn reset_questionnaire_request(
	applicant_id: &ApplicantId,
	questionnaire_id: &QuestionnaireId,
) -> Result<ProviderRequest> {
	ProviderRequest::post(format!("/resources/applicants/{applicant_id}/resetStep/QUESTIONNAIRE"))
		.with_json_body(&ResetQuestionnaireBody { questionnaire_id })
}

impl<C, M> SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Resets the applicant's questionnaire step so it can be filled in again.
	///
	/// Returns the provider's JSON answer (`null` for an empty body).
	pub async fn reset_questionnaire(
		&self,
		applicant_id: &ApplicantId,
		questionnaire_id: &QuestionnaireId,
	) -> Result<JsonValue> {
		obs::observe(OperationKind::QuestionnaireReset, "reset_questionnaire", async move {
			let request = reset_questionnaire_request(applicant_id, questionnaire_id)?;

			self.send(request, self.config.request_timeout).await?.into_json()
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{Method, SharedSecret};

	#[test]
	fn reset_request_is_signed_over_compact_body() {
		let applicant = ApplicantId::new("abc123").expect("Applicant id fixture should be valid.");
		let questionnaire = QuestionnaireId::new("kyb-onboarding-completo")
			.expect("Questionnaire id fixture should be valid.");
		let request = reset_questionnaire_request(&applicant, &questionnaire)
			.expect("Reset request should build.");

		assert_eq!(request.method, Method::Post);
		assert_eq!(request.body.as_deref(), Some(r#"{"questionnaireId":"kyb-onboarding-completo"}"#));

		let signed = request.sign(&SharedSecret::new("s3cr3t"), 1_700_000_000);

		assert_eq!(
			signed.signature,
			"c9cc9897dfc281c2fb51eb77d7e9bd5492fd1864ad4092e19627e85392ef6f3f"
		);
	}
}
