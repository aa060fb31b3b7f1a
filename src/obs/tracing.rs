// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by session flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("wallet_session.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Notes that the host refused the provider discovery broadcast.
pub fn discovery_broadcast_rejected(err: &dyn StdError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %err, "Provider request broadcast failed; continuing without announcements.");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

/// Notes that a refresh failure was absorbed by a 401 retry and the original response returned.
pub fn refresh_absorbed(err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::debug!(error = %err, "Refresh after 401 failed; returning the original response.");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

/// Notes that a caller joined a refresh that another caller started.
pub fn refresh_joined() {
	#[cfg(feature = "tracing")]
	tracing::trace!("Joined the in-flight refresh.");
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn event_helpers_noop_without_tracing() {
		discovery_broadcast_rejected(&std::io::Error::other("blocked"));
		refresh_absorbed(&Error::NoAccount);
		refresh_joined();
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
