//! Shared helpers for flow implementations (endpoint config, URL joining, auth POSTs).

// crates.io
use ::http::{
	Method, Request,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{self, CredentialsPolicy, HttpExecutor, HttpResponse},
	store::StoreOptions,
};

/// Base URL used when callers do not override it.
pub const DEFAULT_BASE_URL: &str = "/api/v1/public/auth";

const JSON: &str = "application/json";

/// Endpoint paths relative to [`AuthEndpoints::base_url`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthPaths {
	/// Challenge issuance path.
	pub challenge: String,
	/// Signature verification path.
	pub verify: String,
	/// Access-token refresh path.
	pub refresh: String,
	/// Server-side logout path.
	pub logout: String,
}
impl Default for AuthPaths {
	fn default() -> Self {
		Self {
			challenge: "challenge".into(),
			verify: "verify".into(),
			refresh: "refresh".into(),
			logout: "logout".into(),
		}
	}
}

/// Where the auth endpoints live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
	/// Absolute URL or origin-relative path of the auth API.
	pub base_url: String,
	/// Per-operation paths under `base_url`.
	pub paths: AuthPaths,
}
impl AuthEndpoints {
	/// Creates endpoints rooted at `base_url` with default paths.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self { base_url: base_url.into(), paths: AuthPaths::default() }
	}

	/// Challenge endpoint URL.
	pub fn challenge_url(&self) -> String {
		join_url(&self.base_url, &self.paths.challenge)
	}

	/// Verify endpoint URL.
	pub fn verify_url(&self) -> String {
		join_url(&self.base_url, &self.paths.verify)
	}

	/// Refresh endpoint URL.
	pub fn refresh_url(&self) -> String {
		join_url(&self.base_url, &self.paths.refresh)
	}

	/// Logout endpoint URL.
	pub fn logout_url(&self) -> String {
		join_url(&self.base_url, &self.paths.logout)
	}
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self::new(DEFAULT_BASE_URL)
	}
}

/// Per-call settings shared by login, refresh, logout, and fetch.
#[derive(Clone, Default)]
pub struct AuthOptions {
	/// Auth API location.
	pub endpoints: AuthEndpoints,
	/// Token mirror settings.
	pub storage: StoreOptions,
	/// Ambient credential policy for every request of the call.
	pub credentials: CredentialsPolicy,
	/// Overrides the session's executor for this call.
	pub executor: Option<Arc<dyn HttpExecutor>>,
}
impl AuthOptions {
	/// Overrides the base URL, keeping the configured paths.
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.endpoints.base_url = base_url.into();

		self
	}

	/// Overrides every endpoint path.
	pub fn with_paths(mut self, paths: AuthPaths) -> Self {
		self.endpoints.paths = paths;

		self
	}

	/// Replaces the endpoint configuration.
	pub fn with_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the token mirror settings.
	pub fn with_storage(mut self, storage: StoreOptions) -> Self {
		self.storage = storage;

		self
	}

	/// Overrides the credential policy (defaults to [`CredentialsPolicy::Include`]).
	pub fn with_credentials(mut self, credentials: CredentialsPolicy) -> Self {
		self.credentials = credentials;

		self
	}

	/// Routes this call through `executor` instead of the session default.
	pub fn with_executor(mut self, executor: Arc<dyn HttpExecutor>) -> Self {
		self.executor = Some(executor);

		self
	}
}
impl Debug for AuthOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthOptions")
			.field("endpoints", &self.endpoints)
			.field("storage", &self.storage)
			.field("credentials", &self.credentials)
			.field("executor_set", &self.executor.is_some())
			.finish()
	}
}

/// Joins `base` and `path` with exactly one slash.
///
/// Trailing slashes are stripped from `base` and leading slashes from `path`, so any slash
/// variation of the same pair yields the same URL.
pub fn join_url(base: &str, path: &str) -> String {
	format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Sends a POST to an auth endpoint and rejects non-2xx answers.
///
/// A `Some` body is sent as JSON with a matching `Content-Type`; every call asks for JSON back.
pub(crate) async fn post_auth(
	executor: &dyn HttpExecutor,
	operation: &'static str,
	url: &str,
	body: Option<&Value>,
	credentials: CredentialsPolicy,
) -> Result<HttpResponse> {
	let mut builder = Request::builder().method(Method::POST).uri(url).header(ACCEPT, JSON);
	let payload = match body {
		Some(body) => {
			builder = builder.header(CONTENT_TYPE, JSON);

			serde_json::to_vec(body)
				.map_err(|e| ConfigError::InvalidRequest { message: e.to_string() })?
		},
		None => Vec::new(),
	};
	let request = builder.body(payload).map_err(ConfigError::from)?;
	let response = executor.execute(request, credentials).await?;
	let status = response.status();

	if !status.is_success() {
		return Err(Error::HttpFailure {
			operation,
			status: status.as_u16(),
			body: http::body_text(&response),
		});
	}

	Ok(response)
}

/// Parses a 2xx auth response body as JSON.
pub(crate) fn parse_json(operation: &'static str, response: &HttpResponse) -> Result<Value> {
	serde_json::from_slice(response.body())
		.map_err(|e| Error::Decode { operation, message: e.to_string() })
}
