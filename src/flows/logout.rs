//! Server-side logout.

// self
use crate::{
	_prelude::*,
	flows::{AuthOptions, Session, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const LOGOUT: &str = "logout";

/// Result of a successful logout.
#[derive(Clone, Debug, PartialEq)]
pub struct LogoutOutcome {
	/// Parsed response payload; [`Value::Null`] when the body is empty or not JSON.
	pub response: Value,
}

impl Session {
	/// Ends the server session, then drops the cached token and its mirror slot.
	///
	/// A non-2xx answer fails the call and leaves the token in place.
	pub async fn logout(&self, options: &AuthOptions) -> Result<LogoutOutcome> {
		const KIND: FlowKind = FlowKind::Logout;

		let span = FlowSpan::new(KIND, "logout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response = common::post_auth(
					self.executor_for(options),
					LOGOUT,
					&options.endpoints.logout_url(),
					None,
					options.credentials,
				)
				.await?;
				let payload = serde_json::from_slice(response.body()).unwrap_or(Value::Null);

				self.tokens.clear(&options.storage)?;

				Ok(LogoutOutcome { response: payload })
			})
			.await;

		obs::record_flow_result(KIND, &result);

		result
	}
}
