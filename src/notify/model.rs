//! Notification payload model.

// crates.io
use time::{UtcOffset, macros::format_description};
// self
use crate::{_prelude::*, resources::ApplicantType};

/// Onboarding lifecycle events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
	/// Applicant record created.
	ApplicantCreated,
	/// Documents submitted for review.
	ApplicantPending,
	/// Review finished.
	ApplicantReviewed,
	/// Review paused; action required.
	ApplicantOnHold,
	/// Contract signed.
	ContractSigned,
	/// Payout wallet registered.
	WalletRegistered,
}
impl NotificationEvent {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			NotificationEvent::ApplicantCreated => "applicant_created",
			NotificationEvent::ApplicantPending => "applicant_pending",
			NotificationEvent::ApplicantReviewed => "applicant_reviewed",
			NotificationEvent::ApplicantOnHold => "applicant_on_hold",
			NotificationEvent::ContractSigned => "contract_signed",
			NotificationEvent::WalletRegistered => "wallet_registered",
		}
	}
}
impl Display for NotificationEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Onboarding status carried by a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
	/// Just created.
	Created,
	/// Waiting for compliance.
	Pending,
	/// Approved.
	Approved,
	/// Rejected.
	Rejected,
	/// Paused.
	OnHold,
	/// Still being reviewed.
	UnderReview,
}

/// Provider review answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewAnswer {
	/// Approved.
	Green,
	/// Rejected.
	Red,
	/// Needs attention.
	Yellow,
}
impl ReviewAnswer {
	/// Status a review with this answer lands in.
	pub const fn status(self) -> NotificationStatus {
		match self {
			ReviewAnswer::Green => NotificationStatus::Approved,
			ReviewAnswer::Red => NotificationStatus::Rejected,
			ReviewAnswer::Yellow => NotificationStatus::UnderReview,
		}
	}
}
impl FromStr for ReviewAnswer {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"GREEN" => Ok(ReviewAnswer::Green),
			"RED" => Ok(ReviewAnswer::Red),
			"YELLOW" => Ok(ReviewAnswer::Yellow),
			other => Err(format!("Unknown review answer `{other}`.")),
		}
	}
}

/// Applicant fields included in a notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedApplicant {
	/// External user id.
	pub id: String,
	/// Individual or company.
	#[serde(rename = "type")]
	pub applicant_type: ApplicantType,
	/// Person or company name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Contact email.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// CPF or CNPJ.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub document: Option<String>,
}
impl NotifiedApplicant {
	/// Creates an applicant with only the mandatory fields.
	pub fn new(id: impl Into<String>, applicant_type: ApplicantType) -> Self {
		Self { id: id.into(), applicant_type, ..Default::default() }
	}

	/// Sets the display name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Sets the contact email.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());

		self
	}

	/// Sets the CPF/CNPJ.
	pub fn with_document(mut self, document: impl Into<String>) -> Self {
		self.document = Some(document.into());

		self
	}
}

/// Notification posted to the onboarding webhook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingNotification {
	/// Lifecycle event.
	pub event: NotificationEvent,
	/// ISO-8601 UTC timestamp with millisecond precision.
	pub timestamp: String,
	/// Applicant the event is about.
	pub applicant: NotifiedApplicant,
	/// Resulting status.
	pub status: NotificationStatus,
	/// Review answer for review events.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub review_answer: Option<ReviewAnswer>,
	/// Short human-readable summary.
	pub message: String,
	/// Signing link for approved applicants, or the wallet link after signing.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contract_link: Option<String>,
	/// Registered wallet address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub wallet_address: Option<String>,
	/// Free-form extras.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<BTreeMap<String, JsonValue>>,
}
impl OnboardingNotification {
	fn base(
		event: NotificationEvent,
		applicant: NotifiedApplicant,
		status: NotificationStatus,
		message: impl Into<String>,
	) -> Self {
		Self {
			event,
			timestamp: iso_timestamp(OffsetDateTime::now_utc()),
			applicant,
			status,
			review_answer: None,
			message: message.into(),
			contract_link: None,
			wallet_address: None,
			metadata: None,
		}
	}

	/// A new onboarding was started.
	pub fn applicant_created(external_user_id: impl Into<String>, applicant_type: ApplicantType) -> Self {
		Self::base(
			NotificationEvent::ApplicantCreated,
			NotifiedApplicant::new(external_user_id, applicant_type),
			NotificationStatus::Created,
			"Novo onboarding iniciado",
		)
	}

	/// Documents were submitted.
	pub fn applicant_pending(applicant: NotifiedApplicant) -> Self {
		Self::base(
			NotificationEvent::ApplicantPending,
			applicant,
			NotificationStatus::Pending,
			"Documentos enviados para análise",
		)
	}

	/// Review finished with `answer`; `contract_link` is attached for approvals.
	pub fn applicant_reviewed(
		applicant: NotifiedApplicant,
		answer: ReviewAnswer,
		contract_link: Option<String>,
	) -> Self {
		let status = answer.status();
		let message = match status {
			NotificationStatus::Approved => "Onboarding aprovado",
			NotificationStatus::Rejected => "Onboarding rejeitado",
			_ => "Onboarding em revisão",
		};
		let mut notification =
			Self::base(NotificationEvent::ApplicantReviewed, applicant, status, message);

		notification.review_answer = Some(answer);
		notification.contract_link = contract_link;

		notification
	}

	/// Review paused.
	pub fn applicant_on_hold(applicant: NotifiedApplicant) -> Self {
		Self::base(
			NotificationEvent::ApplicantOnHold,
			applicant,
			NotificationStatus::OnHold,
			"Onboarding em espera - ação necessária",
		)
	}

	/// Contract signed; the wallet registration link travels in `contractLink`.
	pub fn contract_signed(applicant: NotifiedApplicant, wallet_link: Option<String>) -> Self {
		let mut notification = Self::base(
			NotificationEvent::ContractSigned,
			applicant,
			NotificationStatus::Approved,
			"Contrato assinado com sucesso",
		);

		notification.contract_link = wallet_link;

		notification
	}

	/// Wallet registered.
	pub fn wallet_registered(applicant: NotifiedApplicant, wallet_address: impl Into<String>) -> Self {
		let mut notification = Self::base(
			NotificationEvent::WalletRegistered,
			applicant,
			NotificationStatus::Approved,
			"Wallet cadastrada com sucesso",
		);

		notification.wallet_address = Some(wallet_address.into());

		notification
	}

	/// Overrides the timestamp.
	pub fn at(mut self, instant: OffsetDateTime) -> Self {
		self.timestamp = iso_timestamp(instant);

		self
	}

	/// Adds a metadata entry.
	pub fn with_metadata(mut self, key: impl Into<String>, value: JsonValue) -> Self {
		self.metadata.get_or_insert_with(BTreeMap::new).insert(key.into(), value);

		self
	}
}

/// Formats `instant` like JavaScript's `Date.prototype.toISOString`.
pub fn iso_timestamp(instant: OffsetDateTime) -> String {
	let utc = instant.to_offset(UtcOffset::UTC);

	utc.format(format_description!(
		"[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
	))
	.unwrap_or_else(|_| utc.unix_timestamp().to_string())
}
