//! Client-level error types shared across the transport, renewal, and request layers.

// self
use crate::{_prelude::*, renewal::RenewalFailure};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Request body or response payload could not be converted.
	#[error(transparent)]
	Codec(#[from] CodecError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Session renewal failed; every call waiting on that renewal receives the same failure.
	#[error(transparent)]
	Renewal(#[from] RenewalFailure),

	/// Remote service answered with a non-success status other than 401.
	#[error("Remote service responded with status {status}: {detail}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Server-supplied detail message.
		detail: String,
	},
	/// Remote service rejected the session and no further renewal is allowed for this call.
	#[error("Remote service rejected the session: {detail}.")]
	Unauthorized {
		/// Server-supplied detail message.
		detail: String,
	},
}
impl Error {
	/// Returns the HTTP status attached to the failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } => Some(*status),
			Self::Unauthorized { .. } => Some(crate::client::UNAUTHORIZED),
			Self::Renewal(failure) => failure.status(),
			_ => None,
		}
	}

	/// Returns the server-supplied detail message, when one exists.
	pub fn detail(&self) -> Option<&str> {
		match self {
			Self::Api { detail, .. } | Self::Unauthorized { detail } => Some(detail),
			Self::Renewal(failure) => failure.detail(),
			_ => None,
		}
	}

	/// Whether the failure means the caller no longer holds a usable session.
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::Unauthorized { .. } | Self::Renewal(_))
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL is not usable for resolving request paths.
	#[error("Base URL `{url}` must be an http(s) URL that can serve as a base.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` does not resolve to a valid URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Renewal path must be absolute.
	#[error("Renewal path `{path}` must start with `/`.")]
	InvalidRenewalPath {
		/// Offending path.
		path: String,
	},
	/// Configured timeout is zero or negative.
	#[error("The {field} timeout must be positive.")]
	NonPositiveTimeout {
		/// Which timeout failed validation.
		field: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Serialization failures for request bodies and response payloads.
#[derive(Debug, ThisError)]
pub enum CodecError {
	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	Encode(#[source] serde_json::Error),
	/// Response body is not valid JSON for the requested type.
	#[error("Response body with status {status} could not be decoded.")]
	Decode {
		/// Structured parsing failure, including the JSON path that failed.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
	/// Response body is not valid UTF-8.
	#[error("Response body with status {status} is not valid UTF-8.")]
	Utf8 {
		/// Underlying UTF-8 failure.
		#[source]
		source: std::str::Utf8Error,
		/// HTTP status code of the response.
		status: u16,
	},
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Call did not complete within its bounded wait.
	#[error("Call did not complete within {after}.")]
	Timeout {
		/// Configured bound that elapsed.
		after: Duration,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
