//! Session flows: challenge/response login, refresh, logout, and bearer-injecting fetch.

pub mod common;
pub mod extract;
pub mod fetch;
pub mod login;
pub mod logout;
pub mod refresh;

pub use common::*;
pub use extract::*;
pub use fetch::*;
pub use login::*;
pub use logout::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	flows::refresh::RefreshFlight,
	http::HttpExecutor,
	provider::{DiscoveryOptions, ProviderCandidate, ProviderRegistry},
	store::{StoreOptions, TokenMirror, TokenStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Auth session owned by the application.
///
/// The session holds the request executor, the two-tier token cache, an optional provider
/// registry, and the in-flight refresh slot. Clones share all of them, so a clone handed to a
/// background task observes the same token and joins the same refresh.
#[derive(Clone)]
pub struct Session {
	/// Default executor for auth endpoints and authenticated requests.
	pub executor: Arc<dyn HttpExecutor>,
	/// Token cache shared by every flow of this session.
	pub tokens: Arc<TokenStore>,
	/// Registry consulted when a flow needs a provider and the caller supplied none.
	pub registry: Option<ProviderRegistry>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_slot: Arc<Mutex<Option<Arc<RefreshFlight>>>>,
}
impl Session {
	/// Creates a session that sends every request through `executor`.
	pub fn with_executor(executor: Arc<dyn HttpExecutor>) -> Self {
		Self {
			executor,
			tokens: Default::default(),
			registry: None,
			refresh_metrics: Default::default(),
			refresh_slot: Default::default(),
		}
	}

	/// Backs the token cache with `mirror`, replacing the current cache.
	pub fn with_mirror(mut self, mirror: Arc<dyn TokenMirror>) -> Self {
		self.tokens = Arc::new(TokenStore::with_mirror(mirror));

		self
	}

	/// Attaches the registry used to discover providers on demand.
	pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
		self.registry = Some(registry);

		self
	}

	/// Runs discovery against the attached registry; absent without one.
	pub async fn discover_provider(&self, options: DiscoveryOptions) -> Option<ProviderCandidate> {
		match &self.registry {
			Some(registry) => registry.discover(options).await,
			None => None,
		}
	}

	/// Like [`discover_provider`](Self::discover_provider) but fails with [`Error::NoProvider`].
	pub async fn require_provider(&self, options: DiscoveryOptions) -> Result<ProviderCandidate> {
		self.discover_provider(options).await.ok_or(Error::NoProvider)
	}

	/// Returns the current access token, consulting the mirror when `options.persist` holds.
	pub fn access_token(&self, options: &StoreOptions) -> Result<Option<TokenSecret>> {
		Ok(self.tokens.get(options)?.map(|record| record.token))
	}

	/// Replaces the current access token; `None` or an empty token clears it.
	pub fn set_access_token(&self, token: Option<&str>, options: &StoreOptions) -> Result<()> {
		let record = token.filter(|token| !token.is_empty()).map(TokenRecord::provided);

		Ok(self.tokens.set(record, options)?)
	}

	/// Drops the cached token and removes the mirror slot named by `options.key`.
	pub fn clear_access_token(&self, options: &StoreOptions) -> Result<()> {
		Ok(self.tokens.clear(options)?)
	}

	fn executor_for<'a>(&'a self, options: &'a AuthOptions) -> &'a dyn HttpExecutor {
		options.executor.as_deref().unwrap_or(self.executor.as_ref())
	}
}
#[cfg(feature = "reqwest")]
impl Session {
	/// Creates a session over the default reqwest transport.
	///
	/// Auth endpoints default to a relative base URL; use
	/// [`ReqwestHttpClient::with_origin`] with [`Session::with_executor`] or pass absolute
	/// endpoints when the session does not run behind the API's origin.
	pub fn new() -> Result<Self> {
		Ok(Self::with_executor(Arc::new(ReqwestHttpClient::new()?)))
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("tokens", &self.tokens)
			.field("registry_set", &self.registry.is_some())
			.field("refresh_in_flight", &self.refresh_slot.lock().is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		http::{HttpFuture, HttpRequest},
		store::{DEFAULT_TOKEN_KEY, MemoryMirror},
	};

	struct Unreachable;
	impl HttpExecutor for Unreachable {
		fn execute(
			&self,
			_request: HttpRequest,
			_credentials: crate::http::CredentialsPolicy,
		) -> HttpFuture<'_> {
			Box::pin(async { Err(Error::NoProvider) })
		}
	}

	#[test]
	fn token_accessors_follow_store_semantics() {
		let mirror = Arc::new(MemoryMirror::default());
		let session = Session::with_executor(Arc::new(Unreachable)).with_mirror(mirror.clone());
		let options = StoreOptions::default();

		session.set_access_token(Some("abc"), &options).expect("Set should succeed.");

		assert_eq!(
			session
				.access_token(&options)
				.expect("Read should succeed.")
				.map(|token| token.expose().to_owned()),
			Some("abc".into())
		);
		assert!(mirror.read(DEFAULT_TOKEN_KEY).expect("Mirror read should succeed.").is_some());

		session.set_access_token(Some(""), &options).expect("Empty set should clear.");

		assert!(session.access_token(&options).expect("Read should succeed.").is_none());
		assert!(mirror.read(DEFAULT_TOKEN_KEY).expect("Mirror read should succeed.").is_none());
	}

	#[tokio::test]
	async fn provider_is_required_without_registry() {
		let session = Session::with_executor(Arc::new(Unreachable));

		assert!(session.discover_provider(DiscoveryOptions::default()).await.is_none());
		assert!(matches!(
			session.require_provider(DiscoveryOptions::default()).await,
			Err(Error::NoProvider)
		));
	}
}
