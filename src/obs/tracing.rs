// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Span carried by a [`crate::obs::FlowScope`]; empty without the `tracing` feature.
#[derive(Debug)]
pub(crate) struct FlowTrace {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowTrace {
	pub(crate) fn open(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("session_broker.flow", flow = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	// Instrumented rather than entered: the flow suspends across awaits.
	pub(crate) async fn within<F>(&self, flow: F) -> F::Output
	where
		F: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			flow.instrument(self.span.clone()).await
		}
		#[cfg(not(feature = "tracing"))]
		{
			flow.await
		}
	}

	pub(crate) fn settled(&self, outcome: FlowOutcome) {
		#[cfg(feature = "tracing")]
		{
			tracing::debug!(parent: &self.span, outcome = outcome.as_str(), "flow settled");
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}
}

/// Emits a debug event describing a settled dispatch inside the current span.
pub(crate) fn trace_dispatch(method: &str, path: &str, status: Option<u16>) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(method, path, status, "dispatch settled");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (method, path, status);
	}
}
