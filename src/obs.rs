//! Optional observability for request, replay, and renewal flows.
//!
//! Every flow runs inside a [`FlowScope`]. The scope counts the attempt when it starts, runs the
//! flow inside its span, and counts the settled outcome afterwards.
//!
//! # Feature Flags
//!
//! - `tracing`: spans named `session_broker.flow` carrying `flow` and `stage` fields, plus a
//!   debug event per dispatch and per settled flow.
//! - `metrics`: the `session_broker_flow_total` counter labeled by `flow` and `outcome`.

mod metrics;
mod tracing;

pub(crate) use self::tracing::trace_dispatch;

// self
use crate::_prelude::*;
use self::{metrics::count_flow, tracing::FlowTrace};

/// Flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Original dispatch of a caller's call.
	Request,
	/// Single re-dispatch issued after a successful renewal.
	Replay,
	/// Call to the designated renewal endpoint.
	Renewal,
}
impl FlowKind {
	/// Label used for the `flow` span field and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Request => "request",
			Self::Replay => "replay",
			Self::Renewal => "renewal",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Lifecycle points counted for each flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// The flow started.
	Attempt,
	/// The flow settled successfully.
	Success,
	/// The flow settled with a failure handed back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Label used for the `outcome` metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Success => "success",
			Self::Failure => "failure",
		}
	}
}

/// Flow results that can report whether they settled successfully.
pub trait FlowResult {
	/// Outcome to record once the flow has settled.
	fn flow_outcome(&self) -> FlowOutcome;
}
impl<T, E> FlowResult for Result<T, E> {
	fn flow_outcome(&self) -> FlowOutcome {
		if self.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}

/// One observed flow: a span plus the attempt/outcome counters.
#[derive(Debug)]
pub struct FlowScope {
	kind: FlowKind,
	trace: FlowTrace,
}
impl FlowScope {
	/// Opens the span for `kind` at `stage` and counts the attempt.
	pub fn start(kind: FlowKind, stage: &'static str) -> Self {
		count_flow(kind, FlowOutcome::Attempt);

		Self { kind, trace: FlowTrace::open(kind, stage) }
	}

	/// Drives `flow` inside the span and counts how it settled.
	pub async fn run<F>(self, flow: F) -> F::Output
	where
		F: Future,
		F::Output: FlowResult,
	{
		let output = self.trace.within(flow).await;
		let outcome = output.flow_outcome();

		count_flow(self.kind, outcome);
		self.trace.settled(outcome);

		output
	}
}
