//! Bearer-injecting requests with one refresh-and-retry on 401.

// crates.io
use ::http::{
	HeaderMap, Method, StatusCode, Uri, Version,
	header::{AUTHORIZATION, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	flows::{AuthOptions, Session},
	http::{HttpExecutor, HttpRequest, HttpResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Per-call settings for [`Session::auth_fetch`].
#[derive(Clone, Debug)]
pub struct FetchOptions {
	/// Transport, credential, storage, and refresh-endpoint settings.
	pub auth: AuthOptions,
	/// Refresh and reissue once when the first answer is 401.
	pub retry_on_unauthorized: bool,
	/// Token to use instead of the cached one.
	pub access_token: Option<String>,
}
impl FetchOptions {
	/// Overrides the auth settings.
	pub fn with_auth(mut self, auth: AuthOptions) -> Self {
		self.auth = auth;

		self
	}

	/// Toggles the refresh-and-retry on 401 (enabled by default).
	pub fn with_retry_on_unauthorized(mut self, retry: bool) -> Self {
		self.retry_on_unauthorized = retry;

		self
	}

	/// Uses `token` instead of the cached token.
	pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(token.into());

		self
	}
}
impl Default for FetchOptions {
	fn default() -> Self {
		Self { auth: AuthOptions::default(), retry_on_unauthorized: true, access_token: None }
	}
}

impl Session {
	/// Sends `request` with `Authorization: Bearer <token>` unless it already carries one.
	///
	/// The token is the explicit [`FetchOptions::access_token`], else the cached token; empty
	/// tokens are not sent. A 401 with retries enabled triggers one shared refresh and one
	/// reissue with the new token. If that refresh or reissue fails, the original 401 is
	/// returned. Every other answer is returned as-is.
	pub async fn auth_fetch(
		&self,
		request: HttpRequest,
		options: &FetchOptions,
	) -> Result<HttpResponse> {
		const KIND: FlowKind = FlowKind::Fetch;

		let span = FlowSpan::new(KIND, "auth_fetch");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result =
			span.instrument(self.auth_fetch_inner(Replayable::new(request), options)).await;

		obs::record_flow_result(KIND, &result);

		result
	}

	async fn auth_fetch_inner(
		&self,
		request: Replayable,
		options: &FetchOptions,
	) -> Result<HttpResponse> {
		let executor = self.executor_for(&options.auth);
		let initial = self.send_with_token(executor, &request, options, None).await?;

		if initial.status() != StatusCode::UNAUTHORIZED || !options.retry_on_unauthorized {
			return Ok(initial);
		}

		let retried = async {
			let refreshed = self.refresh_access_token(&options.auth).await?;

			self.send_with_token(executor, &request, options, Some(&refreshed.token)).await
		}
		.await;

		match retried {
			Ok(response) => Ok(response),
			Err(e) => {
				obs::refresh_absorbed(&e);

				Ok(initial)
			},
		}
	}

	async fn send_with_token(
		&self,
		executor: &dyn HttpExecutor,
		request: &Replayable,
		options: &FetchOptions,
		token_override: Option<&TokenSecret>,
	) -> Result<HttpResponse> {
		let explicit = token_override
			.cloned()
			.or_else(|| options.access_token.as_deref().map(TokenSecret::from));
		let token = match explicit {
			Some(token) => Some(token),
			None => self.tokens.get(&options.auth.storage)?.map(|record| record.token),
		};

		executor.execute(request.build(token.as_ref())?, options.auth.credentials).await
	}
}

// Buffered request that can be rebuilt for the retry.
struct Replayable {
	method: Method,
	uri: Uri,
	version: Version,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl Replayable {
	fn new(request: HttpRequest) -> Self {
		let (parts, body) = request.into_parts();

		Self {
			method: parts.method,
			uri: parts.uri,
			version: parts.version,
			headers: parts.headers,
			body,
		}
	}

	fn build(&self, token: Option<&TokenSecret>) -> Result<HttpRequest> {
		let mut request = HttpRequest::new(self.body.clone());

		*request.method_mut() = self.method.clone();
		*request.uri_mut() = self.uri.clone();
		*request.version_mut() = self.version;
		*request.headers_mut() = self.headers.clone();

		let token = token
			.filter(|token| !token.is_empty())
			.filter(|_| !request.headers().contains_key(AUTHORIZATION));

		if let Some(token) = token {
			let value = HeaderValue::from_str(&token.bearer())
				.map_err(|e| ConfigError::InvalidRequest { message: e.to_string() })?;

			request.headers_mut().insert(AUTHORIZATION, value);
		}

		Ok(request)
	}
}
