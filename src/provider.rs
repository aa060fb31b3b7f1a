//! Wallet providers: the signing capability, its discovery, and account helpers.
//!
//! `host` models the environment that announces providers, `discovery` turns those
//! announcements into a single selected [`ProviderCandidate`], and `accounts` wraps the
//! account/chain/balance requests every flow needs.

pub mod accounts;
pub mod discovery;
pub mod host;

pub use accounts::*;
pub use discovery::*;
pub use host::*;

// self
use crate::_prelude::*;

/// Reverse-domain identifier announced by the preferred wallet.
pub const PREFERRED_RDNS: &str = "io.github.yeying";
/// Lowercase display-name fragment that marks the preferred wallet.
pub const PREFERRED_NAME_FRAGMENT: &str = "yeying";

/// Boxed future returned by [`WalletProvider::request`].
pub type ProviderFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Value, ProviderError>> + 'a + Send>>;

/// Callback registered for provider events; receives the raw event payload.
pub type ProviderEventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Request/response capability exposed by an injected wallet.
///
/// Only [`request`](WalletProvider::request) is mandatory. Event subscription is optional; the
/// default implementations report it as unsupported and make removal a no-op.
pub trait WalletProvider
where
	Self: Send + Sync,
{
	/// Performs a JSON-RPC style request such as `eth_accounts` or `personal_sign`.
	fn request(&self, request: ProviderRequest) -> ProviderFuture<'_>;

	/// Explicit flag a provider sets to identify itself as the preferred wallet.
	fn is_preferred(&self) -> bool {
		false
	}

	/// Registers `handler` for `event`, returning a listener id when subscriptions are supported.
	fn on(&self, event: ProviderEvent, handler: ProviderEventHandler) -> Option<ListenerId> {
		let _ = (event, handler);

		None
	}

	/// Removes a listener previously registered with [`on`](WalletProvider::on).
	fn remove_listener(&self, event: ProviderEvent, id: ListenerId) {
		let _ = (event, id);
	}
}

/// Method + params pair sent to a [`WalletProvider`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
	/// RPC method name.
	pub method: String,
	/// Positional params, omitted for parameterless methods.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}
impl ProviderRequest {
	/// Creates a parameterless request.
	pub fn new(method: impl Into<String>) -> Self {
		Self { method: method.into(), params: None }
	}

	/// Attaches positional params.
	pub fn with_params(mut self, params: impl IntoIterator<Item = Value>) -> Self {
		self.params = Some(Value::Array(params.into_iter().collect()));

		self
	}
}

/// Failure reported by a wallet provider (rejected prompt, unsupported method, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Wallet provider returned error {code}: {message}.")]
pub struct ProviderError {
	/// Provider error code (4001 for a user rejection).
	pub code: i64,
	/// Provider-supplied message.
	pub message: String,
}
impl ProviderError {
	/// Creates a new provider error.
	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self { code, message: message.into() }
	}
}

/// Events a provider may emit to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderEvent {
	/// The exposed account list changed.
	AccountsChanged,
	/// The active chain changed.
	ChainChanged,
}
impl ProviderEvent {
	/// Returns the wire name of the event.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccountsChanged => "accountsChanged",
			Self::ChainChanged => "chainChanged",
		}
	}
}

/// Opaque handle identifying one registered provider listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Self-description a provider announces during discovery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
	/// Human-readable wallet name.
	pub name: String,
	/// Reverse-domain identifier, e.g. `io.github.yeying`.
	pub rdns: String,
}
impl ProviderInfo {
	/// Creates a new info block.
	pub fn new(name: impl Into<String>, rdns: impl Into<String>) -> Self {
		Self { name: name.into(), rdns: rdns.into() }
	}
}

/// Provider handle paired with its announced info.
#[derive(Clone)]
pub struct ProviderCandidate {
	/// Signing capability.
	pub provider: Arc<dyn WalletProvider>,
	/// Announced self-description; empty for the legacy injected slot.
	pub info: ProviderInfo,
}
impl ProviderCandidate {
	/// Pairs a provider with its announced info.
	pub fn new(provider: Arc<dyn WalletProvider>, info: ProviderInfo) -> Self {
		Self { provider, info }
	}

	/// Wraps the legacy injected provider, which carries no announced info.
	pub fn legacy(provider: Arc<dyn WalletProvider>) -> Self {
		Self { provider, info: ProviderInfo::default() }
	}

	/// Returns `true` when this candidate is the preferred wallet.
	pub fn is_preferred(&self) -> bool {
		is_preferred_provider(self.provider.as_ref(), &self.info)
	}
}
impl Debug for ProviderCandidate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderCandidate")
			.field("info", &self.info)
			.field("flagged_preferred", &self.provider.is_preferred())
			.finish()
	}
}

/// Checks the explicit flag, then the reverse-domain id and display name, case-insensitively.
pub fn is_preferred_provider(provider: &dyn WalletProvider, info: &ProviderInfo) -> bool {
	provider.is_preferred()
		|| info.rdns.eq_ignore_ascii_case(PREFERRED_RDNS)
		|| info.name.to_lowercase().contains(PREFERRED_NAME_FRAGMENT)
}
