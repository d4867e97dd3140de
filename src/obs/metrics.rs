// self
use crate::obs::{FlowKind, FlowOutcome};

#[cfg(feature = "metrics")]
const FLOW_COUNTER: &str = "session_broker_flow_total";

/// Bumps the flow counter through the global recorder, if any is installed.
pub(crate) fn count_flow(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
