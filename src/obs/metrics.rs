// self
use crate::obs::{FlowKind, FlowOutcome};

const FLOW_TOTAL: &str = "wallet_session_flow_total";
const REFRESH_JOINED_TOTAL: &str = "wallet_session_refresh_joined_total";

/// Counts one `outcome` of a `kind` flow on `wallet_session_flow_total` (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome, FLOW_TOTAL);
	}
}

/// Counts a caller that joined an in-flight refresh instead of sending its own.
pub fn record_refresh_joined() {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(REFRESH_JOINED_TOTAL).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = REFRESH_JOINED_TOTAL;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const KINDS: [FlowKind; 5] =
		[FlowKind::Discovery, FlowKind::Login, FlowKind::Refresh, FlowKind::Logout, FlowKind::Fetch];
	const OUTCOMES: [FlowOutcome; 3] =
		[FlowOutcome::Attempt, FlowOutcome::Success, FlowOutcome::Failure];

	#[test]
	fn every_flow_label_is_distinct() {
		let labels = KINDS.map(FlowKind::as_str);

		for (i, label) in labels.iter().enumerate() {
			assert!(!labels[i + 1..].contains(label), "Flow label {label} is reused.");
		}
	}

	#[test]
	fn recording_accepts_every_flow_and_outcome() {
		for kind in KINDS {
			for outcome in OUTCOMES {
				record_flow_outcome(kind, outcome);
			}
		}

		record_refresh_joined();
	}
}
