//! Single-flight session renewal.
//!
//! [`RenewalCoordinator::renew`] either starts a renewal call or attaches the caller to the one
//! already in flight. The in-flight renewal is a shared [`OnceCell`]: every attached caller awaits
//! the same cell, so all of them observe the identical [`RenewalOutcome`]. The coordinator clears
//! its reference to the cell as soon as the renewal call settles and before the cell is filled,
//! which lets a later, unrelated expiry start a brand-new renewal instead of reusing a stale one.
//! The renewal call itself is never retried here; retry policy belongs to the request client.
//! It is always bounded: the coordinator enforces the renewal timeout on its own, whether or not
//! the transport honors [`TransportRequest::timeout`].

mod metrics;

pub use metrics::RenewalMetrics;

// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	call::{Method, extract_detail},
	error::TransportError,
	ext::SessionListener,
	http::{HttpTransport, TransportRequest},
	obs::{self, FlowKind, FlowOutcome, FlowResult, FlowScope},
};

type PendingRenewal = Arc<OnceCell<RenewalOutcome>>;

/// Settled result of one renewal, shared by every caller attached to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenewalOutcome {
	/// The renewal endpoint re-established the session.
	Renewed,
	/// The session could not be renewed.
	Failed(RenewalFailure),
}
impl RenewalOutcome {
	/// Whether the session was re-established.
	pub fn is_renewed(&self) -> bool {
		matches!(self, Self::Renewed)
	}

	/// Converts the outcome into a `Result`.
	pub fn into_result(self) -> Result<(), RenewalFailure> {
		match self {
			Self::Renewed => Ok(()),
			Self::Failed(failure) => Err(failure),
		}
	}
}
impl FlowResult for RenewalOutcome {
	fn flow_outcome(&self) -> FlowOutcome {
		if self.is_renewed() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}

/// Reasons a renewal can fail.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RenewalFailure {
	/// Renewal endpoint answered with a non-success status.
	#[error("Session renewal was rejected with status {status}: {detail}.")]
	Rejected {
		/// HTTP status code returned by the renewal endpoint.
		status: u16,
		/// Server-supplied detail message.
		detail: String,
	},
	/// Renewal call exceeded its bounded wait.
	#[error("Session renewal did not complete within {after}.")]
	TimedOut {
		/// Bound that elapsed.
		after: Duration,
	},
	/// Renewal call failed before any response arrived.
	#[error("Session renewal failed before a response arrived: {message}.")]
	Transport {
		/// Rendered transport error chain.
		message: String,
	},
}
impl RenewalFailure {
	/// Returns the HTTP status for rejected renewals.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns the server-supplied detail for rejected renewals.
	pub fn detail(&self) -> Option<&str> {
		match self {
			Self::Rejected { detail, .. } => Some(detail),
			_ => None,
		}
	}
}

/// Owns at most one in-flight renewal per client and fans its outcome out to every waiter.
pub struct RenewalCoordinator<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	endpoint: Url,
	timeout: Duration,
	pending: Mutex<Option<PendingRenewal>>,
	listener: RwLock<Option<Arc<dyn SessionListener>>>,
	metrics: Arc<RenewalMetrics>,
}
impl<T> RenewalCoordinator<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a coordinator that POSTs to `endpoint` with a bounded wait of `timeout`.
	pub fn new(transport: impl Into<Arc<T>>, endpoint: Url, timeout: Duration) -> Self {
		Self {
			transport: transport.into(),
			endpoint,
			timeout,
			pending: Default::default(),
			listener: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Installs (or replaces) the listener notified after each settled renewal.
	pub fn set_listener(&self, listener: Arc<dyn SessionListener>) {
		*self.listener.write() = Some(listener);
	}

	/// Shared renewal counters.
	pub fn metrics(&self) -> Arc<RenewalMetrics> {
		self.metrics.clone()
	}

	/// Whether a renewal is currently in flight.
	pub fn is_renewing(&self) -> bool {
		self.pending.lock().is_some()
	}

	/// Starts a renewal, or joins the one already in flight, and returns its shared outcome.
	///
	/// If the task driving the renewal is dropped before it settles, one of the attached callers
	/// takes over driving the same pending renewal, so waiters never hang on an abandoned call.
	pub async fn renew(&self) -> RenewalOutcome {
		let pending = self.attach();

		pending.get_or_init(|| self.settle(&pending)).await.clone()
	}

	fn attach(&self) -> PendingRenewal {
		let mut slot = self.pending.lock();

		match slot.as_ref() {
			Some(pending) => {
				self.metrics.record_join();

				pending.clone()
			},
			None => {
				let pending = PendingRenewal::default();

				*slot = Some(pending.clone());

				pending
			},
		}
	}

	fn release(&self, pending: &PendingRenewal) {
		let mut slot = self.pending.lock();

		if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, pending)) {
			*slot = None;
		}
	}

	async fn settle(&self, pending: &PendingRenewal) -> RenewalOutcome {
		self.metrics.record_start();

		let outcome =
			FlowScope::start(FlowKind::Renewal, "renew").run(self.call_endpoint()).await;

		// Cleared before the cell is filled so waiters wake up to an idle coordinator.
		self.release(pending);

		let listener = self.listener.read().clone();

		match &outcome {
			RenewalOutcome::Renewed => {
				self.metrics.record_renewed();

				if let Some(listener) = listener {
					listener.session_renewed();
				}
			},
			RenewalOutcome::Failed(failure) => {
				self.metrics.record_failed();

				if let Some(listener) = listener {
					listener.session_expired(failure);
				}
			},
		}

		outcome
	}

	async fn call_endpoint(&self) -> RenewalOutcome {
		let request = TransportRequest {
			method: Method::Post,
			url: self.endpoint.clone(),
			body: None,
			replay: false,
			timeout: Some(self.timeout),
		};
		let exchange = self.transport.send(request);
		let result = match tokio::time::timeout(self.timeout.unsigned_abs(), exchange).await {
			Ok(result) => result,
			Err(_) => Err(TransportError::Timeout { after: self.timeout }),
		};

		obs::trace_dispatch(
			Method::Post.as_str(),
			self.endpoint.path(),
			result.as_ref().ok().map(|response| response.status),
		);

		let failure = match result {
			Ok(response) if response.is_success() => return RenewalOutcome::Renewed,
			Ok(response) => RenewalFailure::Rejected {
				status: response.status,
				detail: extract_detail(response.status, &response.body),
			},
			Err(TransportError::Timeout { after }) => RenewalFailure::TimedOut { after },
			Err(err) => RenewalFailure::Transport { message: render_error_chain(&err) },
		};

		RenewalOutcome::Failed(failure)
	}
}
impl<T> Debug for RenewalCoordinator<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RenewalCoordinator")
			.field("endpoint", &self.endpoint.as_str())
			.field("timeout", &self.timeout)
			.field("renewing", &self.is_renewing())
			.finish()
	}
}

fn render_error_chain(err: &dyn StdError) -> String {
	let mut message = err.to_string();
	let mut source = err.source();

	while let Some(cause) = source {
		message.push_str(": ");
		message.push_str(&cause.to_string());

		source = cause.source();
	}

	message
}
