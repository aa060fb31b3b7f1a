//! Access-token refresh with a single in-flight request per session.
//!
//! [`Session::refresh_access_token`] reads-and-sets the session's refresh slot under a lock: the
//! first caller installs a [`RefreshFlight`] and spawns the one network request onto the Tokio
//! runtime, later callers join it. The spawned task clears the slot and publishes the settled
//! result; every caller, including the one that started it, waits on the flight's cell and
//! receives a clone of that same result, success or failure. Dropping a caller never cancels or
//! restarts the request. The next call after settlement starts a fresh request.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	flows::{AuthOptions, Session, common, extract},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const REFRESH: &str = "refresh";

/// Result of a successful refresh.
#[derive(Clone, Debug)]
pub struct RefreshedToken {
	/// Newly issued access token.
	pub token: TokenSecret,
	/// Raw refresh response payload.
	pub response: Value,
}

/// One outstanding refresh shared by every caller that joined it.
#[derive(Debug, Default)]
pub(crate) struct RefreshFlight {
	outcome: AsyncOnceCell<Result<RefreshedToken>>,
}

impl Session {
	/// Exchanges the ambient refresh credential (cookie) for a new access token.
	///
	/// Concurrent calls share one request and resolve identically. On success the token is
	/// written to the token store before any caller observes it. The request runs as a Tokio
	/// task, so this must be called from within a Tokio runtime.
	pub async fn refresh_access_token(&self, options: &AuthOptions) -> Result<RefreshedToken> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.join_refresh(options)).await;

		obs::record_flow_result(KIND, &result);

		result
	}

	async fn join_refresh(&self, options: &AuthOptions) -> Result<RefreshedToken> {
		let flight = {
			let mut slot = self.refresh_slot.lock();

			match slot.as_ref() {
				Some(flight) => {
					self.refresh_metrics.record_joined();
					obs::refresh_joined();
					obs::record_refresh_joined();

					flight.clone()
				},
				None => {
					let flight = Arc::new(RefreshFlight::default());

					*slot = Some(flight.clone());

					self.spawn_refresh(flight.clone(), options.clone());

					flight
				},
			}
		};

		flight.outcome.wait().await.clone()
	}

	fn spawn_refresh(&self, flight: Arc<RefreshFlight>, options: AuthOptions) {
		let session = self.clone();

		tokio::spawn(async move {
			let result = session.send_refresh(&options).await;

			session.settle(&flight);

			// The cell is only ever set here, once per flight.
			let _ = flight.outcome.set(result).await;
		});
	}

	async fn send_refresh(&self, options: &AuthOptions) -> Result<RefreshedToken> {
		self.refresh_metrics.record_attempt();

		let result = async {
			let response = common::post_auth(
				self.executor_for(options),
				REFRESH,
				&options.endpoints.refresh_url(),
				None,
				options.credentials,
			)
			.await?;
			let payload = common::parse_json(REFRESH, &response)?;
			let token = extract::extract_token(&payload)
				.ok_or(Error::MissingField { operation: REFRESH, field: "token" })?;

			self.tokens.set(Some(TokenRecord::refresh(token.as_str())), &options.storage)?;

			Ok(RefreshedToken { token: token.into(), response: payload })
		}
		.await;

		match &result {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(_) => self.refresh_metrics.record_failure(),
		}

		result
	}

	// Only the flight that is still installed may clear the slot.
	fn settle(&self, flight: &Arc<RefreshFlight>) {
		let mut slot = self.refresh_slot.lock();

		if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, flight)) {
			*slot = None;
		}
	}
}
