//! Strongly typed identifiers that are safe to splice into signed provider paths.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const PATH_RESERVED: [char; 11] = ['/', '\\', '?', '#', '%', '"', '<', '>', '`', '{', '}'];

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (applicant, inspection, image, ...).
		kind: &'static str,
	},
	/// The identifier contains whitespace or control characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier.
		kind: &'static str,
	},
	/// The identifier contains a character that would change the request path.
	#[error("{kind} identifier contains the reserved character `{found}`.")]
	ReservedCharacter {
		/// Kind of identifier.
		kind: &'static str,
		/// Offending character.
		found: char,
	},
	/// The identifier is `.` or `..`, which URL parsers collapse out of the path.
	#[error("{kind} identifier cannot be a dot segment.")]
	DotSegment {
		/// Kind of identifier.
		kind: &'static str,
	},
	/// The identifier exceeded the allowed byte count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

def_id! { ApplicantId, "Provider identifier of an applicant (individual, company, or beneficial owner).", "Applicant" }
def_id! { InspectionId, "Provider identifier of the inspection that owns uploaded images.", "Inspection" }
def_id! { ImageId, "Provider identifier of a single uploaded document image or file.", "Image" }
def_id! { QuestionnaireId, "Identifier of a questionnaire configured on the provider.", "Questionnaire" }
def_id! { DeliveryId, "Identifier of a recorded notification delivery.", "Delivery" }
impl DeliveryId {
	/// Generates a random 128-bit hex identifier.
	pub fn generate() -> Self {
		let bytes: [u8; 16] = rand::random();

		Self(hex::encode(bytes))
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	// Anything a URL parser would escape or rewrite would leave the signed path behind.
	if let Some(found) = view.chars().find(|ch| !ch.is_ascii() || PATH_RESERVED.contains(ch)) {
		return Err(IdentifierError::ReservedCharacter { kind, found });
	}
	if view == "." || view == ".." {
		return Err(IdentifierError::DotSegment { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_path_breakers() {
		assert!(ApplicantId::new(" 5f1c").is_err(), "Leading whitespace must be rejected.");
		assert!(ApplicantId::new("").is_err());
		assert_eq!(
			ImageId::new("123/../456"),
			Err(IdentifierError::ReservedCharacter { kind: "Image", found: '/' })
		);
		assert!(InspectionId::new("abc?x=1").is_err());
		assert!(ApplicantId::new("abc%2F").is_err());

		for rejected in ["a\\b", "a\"b", "a<b>", "a`b", "a{b}", "joão"] {
			assert!(
				matches!(ApplicantId::new(rejected), Err(IdentifierError::ReservedCharacter { .. })),
				"`{rejected}` would be rewritten by URL parsing."
			);
		}

		assert_eq!(ImageId::new(".."), Err(IdentifierError::DotSegment { kind: "Image" }));
		assert_eq!(ImageId::new("."), Err(IdentifierError::DotSegment { kind: "Image" }));
		ImageId::new("scan.v2..pdf").expect("Dots inside an identifier are allowed.");

		let applicant =
			ApplicantId::new("63e0b1c2d4").expect("Applicant fixture should be considered valid.");

		assert_eq!(applicant.as_ref(), "63e0b1c2d4");
		assert_eq!(format!("{applicant:?}"), "Applicant(63e0b1c2d4)");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let image: ImageId =
			serde_json::from_str("\"1203948\"").expect("Image id should deserialize successfully.");

		assert_eq!(image.as_ref(), "1203948");
		assert!(serde_json::from_str::<ImageId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<ImageId>("\"a/b\"").is_err());
	}

	#[test]
	fn length_limit_is_inclusive() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		QuestionnaireId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(QuestionnaireId::new(&too_long).is_err());
	}

	#[test]
	fn generated_delivery_ids_are_unique_and_valid() {
		let first = DeliveryId::generate();
		let second = DeliveryId::generate();

		assert_ne!(first, second);
		assert_eq!(first.len(), 32);
		DeliveryId::new(first.as_ref()).expect("Generated id must pass validation.");
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<ApplicantId, u8> = HashMap::from_iter([(
			ApplicantId::new("applicant-123").expect("Applicant used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("applicant-123"), Some(&7));
	}
}
