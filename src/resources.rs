//! Endpoint helpers built on [`SignedRequestClient::dispatch`](crate::client::SignedRequestClient).
//!
//! Each submodule adds an `impl` block to the client for one provider resource and owns the
//! normalization of that resource's responses.

pub mod access_token;
pub mod applicant;
pub mod beneficiaries;
pub mod documents;
pub mod questionnaire;
pub mod report;

pub use access_token::*;
pub use applicant::*;
pub use beneficiaries::*;
pub use documents::*;
pub use questionnaire::*;
pub use report::*;

// self
use crate::_prelude::*;

/// Percent-encodes `value` for use inside a query string.
///
/// Leaves `A-Z a-z 0-9 - _ . ! ~ * ( )` untouched and encodes every other UTF-8 byte as
/// `%XX` (uppercase hex). `'` is encoded too: URL parsers escape it inside query strings,
/// and the signed text must match what is transmitted.
pub fn encode_query_component(value: &str) -> String {
	const HEX: &[u8; 16] = b"0123456789ABCDEF";

	let mut out = String::with_capacity(value.len());

	for byte in value.bytes() {
		match byte {
			b'A'..=b'Z'
			| b'a'..=b'z'
			| b'0'..=b'9'
			| b'-'
			| b'_'
			| b'.'
			| b'!'
			| b'~'
			| b'*'
			| b'('
			| b')' => out.push(byte as char),
			_ => {
				out.push('%');
				out.push(HEX[(byte >> 4) as usize] as char);
				out.push(HEX[(byte & 0x0f) as usize] as char);
			},
		}
	}

	out
}

pub(crate) fn json_str<'a>(value: &'a JsonValue, pointer: &str) -> Option<&'a str> {
	value.pointer(pointer).and_then(JsonValue::as_str).filter(|text| !text.is_empty())
}

/// Renders string or numeric JSON scalars; provider ids arrive as either.
pub(crate) fn json_scalar(value: &JsonValue) -> Option<String> {
	match value {
		JsonValue::String(text) if !text.is_empty() => Some(text.clone()),
		JsonValue::Number(number) => Some(number.to_string()),
		_ => None,
	}
}
