//! Successful dispatch outcomes: parsed JSON or binary passthrough.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::TransientError, http::HttpResponse};

/// Content type assumed for binary payloads that arrive without one.
pub const DEFAULT_BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw bytes plus their content type (document images, PDF reports).
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryPayload {
	/// Reported content type, or [`DEFAULT_BINARY_CONTENT_TYPE`].
	pub content_type: String,
	/// Body bytes exactly as received.
	pub bytes: Vec<u8>,
}
impl BinaryPayload {
	/// Number of bytes in the payload.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Returns `true` when the payload is empty.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
}
impl Debug for BinaryPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BinaryPayload")
			.field("content_type", &self.content_type)
			.field("len", &self.bytes.len())
			.finish()
	}
}

/// Body of a successful dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponsePayload {
	/// JSON content type; an empty body parses as `null`.
	Json {
		/// Parsed body.
		value: JsonValue,
		/// Body bytes and content type exactly as received.
		raw: BinaryPayload,
	},
	/// Anything else, passed through untouched.
	Binary(BinaryPayload),
}

/// Successful (2xx) outcome of a dispatch, built fresh for every call.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedResponse {
	/// Path (with query) that produced the response.
	pub path: String,
	/// HTTP status code.
	pub status: u16,
	/// Parsed or raw body.
	pub payload: ResponsePayload,
}
impl SignedResponse {
	pub(crate) fn from_http(path: &str, response: HttpResponse) -> Result<Self> {
		let payload = if response.is_json() {
			let value = if response.body.iter().all(u8::is_ascii_whitespace) {
				JsonValue::Null
			} else {
				parse_slice(path, response.status, &response.body)?
			};
			let raw = BinaryPayload {
				content_type: response.content_type.unwrap_or_else(|| "application/json".into()),
				bytes: response.body,
			};

			ResponsePayload::Json { value, raw }
		} else {
			ResponsePayload::Binary(BinaryPayload {
				content_type: response
					.content_type
					.unwrap_or_else(|| DEFAULT_BINARY_CONTENT_TYPE.to_owned()),
				bytes: response.body,
			})
		};

		Ok(Self { path: path.to_owned(), status: response.status, payload })
	}

	/// Returns the JSON body; a binary body is parsed as JSON when it is valid JSON text.
	pub fn into_json(self) -> Result<JsonValue> {
		match self.payload {
			ResponsePayload::Json { value, .. } => Ok(value),
			ResponsePayload::Binary(payload) => parse_slice(&self.path, self.status, &payload.bytes),
		}
	}

	/// Decodes the body into `T`, reporting the failing JSON path on mismatch.
	pub fn decode<T>(self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let (path, status) = (self.path.clone(), self.status);
		let value = self.into_json()?;

		serde_path_to_error::deserialize(value)
			.map_err(|source| TransientError::ResponseParse { path, status, source }.into())
	}

	/// Returns the body bytes as received, JSON bodies included.
	pub fn into_binary(self) -> BinaryPayload {
		match self.payload {
			ResponsePayload::Binary(payload) | ResponsePayload::Json { raw: payload, .. } => payload,
		}
	}
}

fn parse_slice<T>(path: &str, status: u16, bytes: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut de).map_err(|source| {
		TransientError::ResponseParse { path: path.to_owned(), status, source }.into()
	})
}
