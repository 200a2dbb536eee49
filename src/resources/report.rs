//! Summary report (PDF) downloads.

// self
use crate::{
	_prelude::*,
	auth::ProviderRequest,
	client::{BinaryPayload, SignedRequestClient, TransportErrorMapper},
	http::ProviderHttpClient,
	id::ApplicantId,
	obs::{self, OperationKind},
	resources::{ApplicantType, encode_query_component},
};

/// Report flavor requested from the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
	/// Individual applicant report.
	#[serde(rename = "applicantReport")]
	Applicant,
	/// Company report.
	#[serde(rename = "companyReport")]
	Company,
}
impl ReportKind {
	/// Returns the `report` query value.
	pub const fn as_str(self) -> &'static str {
		match self {
			ReportKind::Applicant => "applicantReport",
			ReportKind::Company => "companyReport",
		}
	}
}
impl From<ApplicantType> for ReportKind {
	fn from(value: ApplicantType) -> Self {
		match value {
			ApplicantType::Individual => ReportKind::Applicant,
			ApplicantType::Company => ReportKind::Company,
		}
	}
}
impl Display for ReportKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Language used when the caller does not pick one.
pub const DEFAULT_REPORT_LANG: &str = "pt";

/// Builds `/resources/applicants/{id}/summary/report?report=..&lang=..`.
pub fn summary_report_path(applicant_id: &ApplicantId, kind: ReportKind, lang: &str) -> String {
	format!(
		"/resources/applicants/{applicant_id}/summary/report?report={kind}&lang={}",
		encode_query_component(lang)
	)
}

impl<C, M> SignedRequestClient<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Downloads the summary report; the PDF bytes are returned untouched.
	pub async fn summary_report(
		&self,
		applicant_id: &ApplicantId,
		kind: ReportKind,
		lang: Option<&str>,
	) -> Result<BinaryPayload> {
		obs::observe(OperationKind::SummaryReport, "summary_report", async move {
			let path = summary_report_path(applicant_id, kind, lang.unwrap_or(DEFAULT_REPORT_LANG));

			let response = self.send(ProviderRequest::get(path), self.config.request_timeout).await?;

			Ok(response.into_binary())
		})
		.await
	}
}
