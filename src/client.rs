//! Session-aware request client with renew-on-401 and replay-once recovery.
//!
//! [`SessionClient::call`] dispatches a [`Call`] through the configured [`HttpTransport`]. A 401
//! on a fresh call asks the shared [`RenewalCoordinator`] for a renewal; when the session comes
//! back the original call is replayed exactly once, marked as a replay, and that second result
//! is final. A replay never renews again, so the lifecycle of one call is bounded by one
//! renewal and one replay. Every other status is surfaced unchanged.

// self
use crate::{
	_prelude::*,
	call::{Call, Method, Payload, extract_detail},
	config::ClientConfig,
	ext::SessionListener,
	http::{HttpTransport, TransportRequest, TransportResponse},
	obs::{self, FlowKind, FlowScope},
	renewal::{RenewalCoordinator, RenewalMetrics, RenewalOutcome},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Status that marks an authorization failure.
pub const UNAUTHORIZED: u16 = 401;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestTransport>;

/// Issues credentialed calls and transparently recovers from expired sessions.
///
/// Clones share the transport, configuration, and renewal coordinator, so however many clones
/// observe an expiry at once, only one renewal call is made.
pub struct SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound call.
	pub transport: Arc<T>,
	/// Validated client configuration.
	pub config: Arc<ClientConfig>,
	coordinator: Arc<RenewalCoordinator<T>>,
}
impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// `config` is validated again, so hand-assembled configurations get the same checks as
	/// built ones.
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Result<Self> {
		config.validate()?;

		let transport = transport.into();
		let endpoint = config.resolve(&config.renewal_path)?;
		let coordinator =
			RenewalCoordinator::new(transport.clone(), endpoint, config.renewal_timeout);

		Ok(Self { transport, config: Arc::new(config), coordinator: Arc::new(coordinator) })
	}

	/// Installs the listener notified once per settled renewal.
	///
	/// The listener is shared by every clone of this client.
	pub fn with_session_listener(self, listener: Arc<dyn SessionListener>) -> Self {
		self.coordinator.set_listener(listener);

		self
	}

	/// Renewal coordinator shared by every clone of this client.
	pub fn coordinator(&self) -> &RenewalCoordinator<T> {
		&self.coordinator
	}

	/// Shared renewal counters.
	pub fn renewal_metrics(&self) -> Arc<RenewalMetrics> {
		self.coordinator.metrics()
	}

	/// Issues `GET path`.
	pub async fn get(&self, path: &str) -> Result<Payload> {
		self.call(Call::new(Method::Get, path, None)).await
	}

	/// Issues `POST path` with `body` encoded as JSON.
	pub async fn post<B>(&self, path: &str, body: &B) -> Result<Payload>
	where
		B: ?Sized + Serialize,
	{
		self.call(Call::with_json(Method::Post, path, body)?).await
	}

	/// Issues `PATCH path` with `body` encoded as JSON.
	pub async fn patch<B>(&self, path: &str, body: &B) -> Result<Payload>
	where
		B: ?Sized + Serialize,
	{
		self.call(Call::with_json(Method::Patch, path, body)?).await
	}

	/// Issues `PUT path` with `body` encoded as JSON.
	pub async fn put<B>(&self, path: &str, body: &B) -> Result<Payload>
	where
		B: ?Sized + Serialize,
	{
		self.call(Call::with_json(Method::Put, path, body)?).await
	}

	/// Issues `DELETE path`.
	pub async fn delete(&self, path: &str) -> Result<Payload> {
		self.call(Call::new(Method::Delete, path, None)).await
	}

	/// Dispatches `call`, renewing the session and replaying once on a 401.
	pub async fn call(&self, call: Call) -> Result<Payload> {
		FlowScope::start(FlowKind::Request, "call")
			.run(async move {
				let response = self.dispatch(&call).await?;

				if response.status != UNAUTHORIZED
					|| call.is_replay()
					|| self.config.is_renewal_exempt(&call.path)
				{
					return settle(response);
				}

				match self.coordinator.renew().await {
					RenewalOutcome::Renewed => self.replay(call.into_replay()).await,
					RenewalOutcome::Failed(failure) => Err(failure.into()),
				}
			})
			.await
	}

	async fn replay(&self, call: Call) -> Result<Payload> {
		FlowScope::start(FlowKind::Replay, "replay")
			.run(async { settle(self.dispatch(&call).await?) })
			.await
	}

	async fn dispatch(&self, call: &Call) -> Result<TransportResponse> {
		let request = TransportRequest {
			method: call.method,
			url: self.config.resolve(&call.path)?,
			body: call.body.clone(),
			replay: call.is_replay(),
			timeout: self.config.request_timeout,
		};
		let result = self.transport.send(request).await;

		obs::trace_dispatch(
			call.method.as_str(),
			&call.path,
			result.as_ref().ok().map(|response| response.status),
		);

		result.map_err(Error::from)
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestTransport> {
	/// Creates a client backed by a reqwest transport with its own cookie store.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::with_transport(config, ReqwestTransport::new()?)
	}
}
impl<T> Clone for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("coordinator", &self.coordinator)
			.finish()
	}
}

fn settle(response: TransportResponse) -> Result<Payload> {
	if response.is_success() {
		return Ok(Payload { status: response.status, body: response.body });
	}

	let detail = extract_detail(response.status, &response.body);

	if response.status == UNAUTHORIZED {
		Err(Error::Unauthorized { detail })
	} else {
		Err(Error::Api { status: response.status, detail })
	}
}
