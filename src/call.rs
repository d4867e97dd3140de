//! Call descriptions, success payloads, and server detail extraction.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::CodecError};

const DETAIL_PREVIEW_LIMIT: usize = 512;

/// HTTP methods exposed through the caller-facing contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PATCH`
	Patch,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Patch => "PATCH",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One logical request issued by a caller.
///
/// The replay flag is private: only the client marks a call as a replay, and it does so by
/// consuming the original through [`Call::into_replay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the client's base URL (query string allowed).
	pub path: String,
	/// JSON-encoded body, if any.
	pub body: Option<Vec<u8>>,
	replay: bool,
}
impl Call {
	/// Creates a fresh (non-replay) call.
	pub fn new(method: Method, path: impl Into<String>, body: Option<Vec<u8>>) -> Self {
		Self { method, path: path.into(), body, replay: false }
	}

	/// Creates a fresh call whose body is `body` encoded as JSON.
	pub fn with_json<B>(method: Method, path: impl Into<String>, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let encoded = serde_json::to_vec(body).map_err(CodecError::Encode)?;

		Ok(Self::new(method, path, Some(encoded)))
	}

	/// Whether the client issued this call as a replay after a renewal.
	pub fn is_replay(&self) -> bool {
		self.replay
	}

	pub(crate) fn into_replay(mut self) -> Self {
		self.replay = true;

		self
	}
}

/// Success payload returned to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
	/// HTTP status code (2xx).
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl Payload {
	/// Decodes the body as JSON, treating an empty body as `null`.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let bytes: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| CodecError::Decode { source, status: self.status }.into())
	}

	/// Returns the body as UTF-8 text.
	pub fn text(&self) -> Result<&str> {
		std::str::from_utf8(&self.body)
			.map_err(|source| CodecError::Utf8 { source, status: self.status }.into())
	}

	/// Whether the response carried no body.
	pub fn is_empty(&self) -> bool {
		self.body.is_empty()
	}
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	detail: Option<serde_json::Value>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error: Option<String>,
}

/// Extracts the server-supplied detail message from a failure body.
///
/// Prefers a JSON `detail` field (string, or compact JSON when structured), then `message`,
/// then `error`, then the trimmed text body, and finally falls back to `HTTP <status>`.
pub fn extract_detail(status: u16, body: &[u8]) -> String {
	if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
		let detail = match parsed.detail {
			Some(serde_json::Value::String(text)) => Some(text),
			Some(serde_json::Value::Null) | None => None,
			Some(other) => Some(other.to_string()),
		};

		if let Some(text) = detail.or(parsed.message).or(parsed.error) {
			return text;
		}
	}

	match std::str::from_utf8(body).map(str::trim) {
		Ok(text) if !text.is_empty() => text.chars().take(DETAIL_PREVIEW_LIMIT).collect(),
		_ => format!("HTTP {status}"),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, PartialEq, Deserialize)]
	struct Booking {
		id: u32,
		room: String,
	}

	#[test]
	fn detail_prefers_json_fields_in_order() {
		assert_eq!(extract_detail(404, br#"{"detail":"Booking not found"}"#), "Booking not found");
		assert_eq!(
			extract_detail(422, br#"{"detail":[{"loc":["body","room"],"msg":"missing"}]}"#),
			r#"[{"loc":["body","room"],"msg":"missing"}]"#,
		);
		assert_eq!(extract_detail(500, br#"{"message":"boom","error":"x"}"#), "boom");
		assert_eq!(extract_detail(400, br#"{"error":"bad_request"}"#), "bad_request");
	}

	#[test]
	fn detail_falls_back_to_text_then_status() {
		assert_eq!(extract_detail(502, b"  upstream down \n"), "upstream down");
		assert_eq!(extract_detail(503, b""), "HTTP 503");
		assert_eq!(extract_detail(500, br#"{"unrelated":true}"#), r#"{"unrelated":true}"#);

		let long = "x".repeat(2_000);

		assert_eq!(extract_detail(500, long.as_bytes()).len(), DETAIL_PREVIEW_LIMIT);
	}

	#[test]
	fn payload_decodes_json_and_reports_paths() {
		let payload = Payload { status: 200, body: br#"{"id":7,"room":"A1"}"#.to_vec() };

		assert_eq!(
			payload.json::<Booking>().expect("Booking payload should decode."),
			Booking { id: 7, room: "A1".into() },
		);

		let broken = Payload { status: 200, body: br#"{"id":"seven","room":"A1"}"#.to_vec() };
		let err = broken.json::<Booking>().expect_err("Mistyped id should fail to decode.");

		match err {
			Error::Codec(CodecError::Decode { source, status }) => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "id");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn empty_payload_decodes_as_null() {
		let payload = Payload { status: 204, body: Vec::new() };

		assert!(payload.is_empty());
		assert_eq!(payload.json::<Option<Booking>>().expect("Empty body should decode."), None);
		assert_eq!(payload.text().expect("Empty body is valid UTF-8."), "");
	}

	#[test]
	fn replay_flag_is_only_set_by_conversion() {
		let call = Call::with_json(Method::Post, "/bookings", &serde_json::json!({ "room": "A1" }))
			.expect("JSON body should encode.");

		assert!(!call.is_replay());
		assert_eq!(call.body.as_deref(), Some(br#"{"room":"A1"}"#.as_slice()));

		let replay = call.clone().into_replay();

		assert!(replay.is_replay());
		assert_eq!(replay.body, call.body);
		assert_eq!(replay.path, call.path);
	}
}
