//! Transport primitives for auth endpoints and authenticated calls.
//!
//! [`HttpExecutor`] is the session's only dependency on an HTTP stack. Requests and responses
//! are fully buffered [`http`](::http) values so flows can replay a request after a refresh and
//! read error bodies without streaming concerns. The default [`ReqwestHttpClient`] maps
//! [`CredentialsPolicy`] onto a cookie-bearing and a cookie-less reqwest client.

// crates.io
use ::http::{Request, Response};
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")]
use crate::error::{ConfigError, TransportError};

/// Buffered request handed to an [`HttpExecutor`].
pub type HttpRequest = Request<Vec<u8>>;
/// Buffered response returned by an [`HttpExecutor`].
pub type HttpResponse = Response<Vec<u8>>;
/// Boxed future returned by [`HttpExecutor::execute`].
pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + 'a + Send>>;

/// Whether ambient credentials (cookies) accompany a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsPolicy {
	/// Always send ambient credentials.
	#[default]
	Include,
	/// Send ambient credentials only to the executor's own origin.
	SameOrigin,
	/// Never send ambient credentials.
	Omit,
}

/// Abstraction over HTTP transports used by every session flow.
///
/// Implementations must be `Send + Sync + 'static` so one executor can be shared across
/// sessions, and the returned future must be `Send` so flows can hop executors. Executors
/// return non-2xx responses as `Ok`; only failures to obtain a response are errors.
pub trait HttpExecutor
where
	Self: 'static + Send + Sync,
{
	/// Sends `request`, honoring `credentials` for ambient cookies.
	fn execute(&self, request: HttpRequest, credentials: CredentialsPolicy) -> HttpFuture<'_>;
}

/// Returns the response body as text, replacing invalid UTF-8.
pub fn body_text(response: &HttpResponse) -> String {
	String::from_utf8_lossy(response.body()).into_owned()
}

/// Reqwest-backed [`HttpExecutor`].
///
/// `include` and matching `same-origin` requests go through a client with a cookie store, so
/// session cookies set by the auth endpoints (for example the refresh cookie) ride along on
/// later calls. Relative targets such as `/api/v1/public/auth/refresh` resolve against the
/// configured origin.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	anonymous: ReqwestClient,
	origin: Option<Url>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds the cookie-bearing and cookie-less clients with reqwest defaults.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.build()
			.map_err(ConfigError::http_client_build)?;
		let anonymous = ReqwestClient::builder().build().map_err(ConfigError::http_client_build)?;

		Ok(Self::with_clients(client, anonymous))
	}

	/// Wraps caller-configured clients; `anonymous` serves [`CredentialsPolicy::Omit`].
	pub fn with_clients(client: ReqwestClient, anonymous: ReqwestClient) -> Self {
		Self { client, anonymous, origin: None }
	}

	/// Sets the origin used to resolve relative targets and to decide `same-origin`.
	pub fn with_origin(mut self, origin: Url) -> Self {
		self.origin = Some(origin);

		self
	}

	/// Returns the configured origin, if any.
	pub fn origin(&self) -> Option<&Url> {
		self.origin.as_ref()
	}

	pub(crate) fn resolve(&self, target: &::http::Uri) -> Result<Url> {
		let raw = target.to_string();

		if target.scheme().is_some() {
			return Url::parse(&raw)
				.map_err(|source| ConfigError::InvalidTarget { target: raw, source }.into());
		}

		let Some(origin) = &self.origin else {
			return Err(ConfigError::RelativeTarget { target: raw }.into());
		};

		origin.join(&raw).map_err(|source| ConfigError::InvalidTarget { target: raw, source }.into())
	}

	pub(crate) fn sends_credentials(&self, url: &Url, credentials: CredentialsPolicy) -> bool {
		match credentials {
			CredentialsPolicy::Include => true,
			CredentialsPolicy::SameOrigin =>
				self.origin.as_ref().is_some_and(|origin| origin.origin() == url.origin()),
			CredentialsPolicy::Omit => false,
		}
	}
}
#[cfg(feature = "reqwest")]
impl HttpExecutor for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest, credentials: CredentialsPolicy) -> HttpFuture<'_> {
		Box::pin(async move {
			let (parts, body) = request.into_parts();
			let url = self.resolve(&parts.uri)?;
			let client =
				if self.sends_credentials(&url, credentials) { &self.client } else { &self.anonymous };
			let response = client
				.request(parts.method, url.clone())
				.headers(parts.headers)
				.body(body)
				.send()
				.await
				.map_err(|e| TransportError::network(url.as_str(), e))?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let bytes = response.bytes().await.map_err(|e| TransportError::network(url.as_str(), e))?;
			let mut response_new = HttpResponse::new(bytes.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
