//! Transport primitives for session-credentialed calls.
//!
//! The module exposes [`HttpTransport`] alongside [`TransportRequest`] and
//! [`TransportResponse`] so downstream crates can integrate custom HTTP clients. A transport
//! performs exactly one outbound call per [`HttpTransport::send`] and knows nothing about
//! authorization: a 401 is just another status code at this layer. Renewal and replay live in
//! [`crate::renewal`] and [`crate::client`].

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	cookie::Jar,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::{_prelude::*, call::Method, error::TransportError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing one credentialed call.
///
/// Implementations must attach whatever ambient session artifacts the environment maintains
/// (cookies, cached bearer tokens) to every outbound request, including the renewal call, and
/// must let the renewal response re-establish the session as a side effect. They must be
/// `Send + Sync + 'static` so a single transport can be shared by every clone of a client, and
/// the returned futures must be `Send` so calls can hop executor threads.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Performs exactly one outbound call.
	///
	/// Connectivity, IO, and timeout failures are reported as [`TransportError`]; any response
	/// that arrives, whatever its status, is reported as a [`TransportResponse`].
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Fully resolved outbound request handed to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL resolved from the client's base URL.
	pub url: Url,
	/// JSON-encoded request body, if any.
	pub body: Option<Vec<u8>>,
	/// Marks a replay issued after a successful renewal.
	pub replay: bool,
	/// Bounded wait for this call, if any.
	///
	/// Transports should honor it and report [`TransportError::Timeout`] when it elapses. The
	/// renewal coordinator also enforces it on its own, so a transport that ignores it cannot
	/// stall a renewal.
	pub timeout: Option<Duration>,
}

/// Status and raw body returned by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Creates a response from a status code and body bytes.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Whether the status code lies in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] whose cookie store acts as the ambient session.
///
/// Every request (the renewal call included) carries the cookies held by the client, and
/// `Set-Cookie` headers on the renewal response rotate them in place. Configure any custom
/// [`ReqwestClient`] passed to [`ReqwestTransport::with_client`] with a cookie store, otherwise
/// renewals cannot re-establish the session.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport backed by a fresh cookie store.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().cookie_store(true).build()?;

		Ok(Self(client))
	}

	/// Builds a transport that reads and writes session cookies through `jar`.
	pub fn with_cookie_jar(jar: Arc<Jar>) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().cookie_provider(jar).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let TransportRequest { method, url, body, timeout, .. } = request;
			let mut builder =
				client.request(method.into(), url).header(ACCEPT, "application/json");

			if let Some(body) = body {
				builder = builder.header(CONTENT_TYPE, "application/json").body(body);
			}
			if let Some(bound) = timeout {
				builder = builder.timeout(bound.unsigned_abs());
			}

			let response =
				builder.send().await.map_err(|err| map_reqwest_error(err, timeout))?;
			let status = response.status().as_u16();
			let body =
				response.bytes().await.map_err(|err| map_reqwest_error(err, timeout))?.to_vec();

			Ok(TransportResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Patch => reqwest::Method::PATCH,
			Method::Put => reqwest::Method::PUT,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError, timeout: Option<Duration>) -> TransportError {
	match timeout {
		Some(after) if err.is_timeout() => TransportError::Timeout { after },
		_ => TransportError::network(err),
	}
}
