//! Account, chain, and balance helpers layered over [`WalletProvider::request`].

// self
use crate::{
	_prelude::*,
	provider::{ListenerId, ProviderEvent, ProviderEventHandler, ProviderRequest, WalletProvider},
};

/// Block tag used by [`get_balance`] when callers do not pass one.
pub const DEFAULT_BLOCK_TAG: &str = "latest";

/// Prompts the wallet for account access (`eth_requestAccounts`).
pub async fn request_accounts(provider: &dyn WalletProvider) -> Result<Vec<String>> {
	let value = provider.request(ProviderRequest::new("eth_requestAccounts")).await?;

	Ok(account_list(value))
}

/// Lists accounts already exposed to the caller (`eth_accounts`), without prompting.
pub async fn get_accounts(provider: &dyn WalletProvider) -> Result<Vec<String>> {
	let value = provider.request(ProviderRequest::new("eth_accounts")).await?;

	Ok(account_list(value))
}

/// Picks the signing address: `preferred`, else the first exposed account, else a prompt.
pub async fn resolve_address(
	provider: &dyn WalletProvider,
	preferred: Option<&str>,
) -> Result<String> {
	if let Some(address) = preferred.filter(|address| !address.is_empty()) {
		return Ok(address.to_owned());
	}
	if let Some(first) = get_accounts(provider).await?.into_iter().next() {
		return Ok(first);
	}

	request_accounts(provider).await?.into_iter().next().ok_or(Error::NoAccount)
}

/// Returns the active chain id (`eth_chainId`); non-string answers read as absent.
pub async fn get_chain_id(provider: &dyn WalletProvider) -> Result<Option<String>> {
	let value = provider.request(ProviderRequest::new("eth_chainId")).await?;

	Ok(match value {
		Value::String(chain_id) => Some(chain_id),
		_ => None,
	})
}

/// Returns the balance of `address` (or the first exposed account) at `block_tag` as a hex string.
///
/// Never prompts for account access; fails with [`Error::NoAccount`] when no address is supplied
/// and the wallet exposes none.
pub async fn get_balance(
	provider: &dyn WalletProvider,
	address: Option<&str>,
	block_tag: Option<&str>,
) -> Result<String> {
	let target = match address.filter(|address| !address.is_empty()) {
		Some(address) => address.to_owned(),
		None => get_accounts(provider).await?.into_iter().next().ok_or(Error::NoAccount)?,
	};
	let request = ProviderRequest::new("eth_getBalance").with_params([
		Value::String(target),
		Value::from(block_tag.unwrap_or(DEFAULT_BLOCK_TAG)),
	]);

	match provider.request(request).await? {
		Value::String(balance) => Ok(balance),
		_ => Err(Error::InvalidBalance),
	}
}

/// Subscribes to `accountsChanged`; the handler receives the new account list.
pub fn on_accounts_changed<F>(provider: Arc<dyn WalletProvider>, handler: F) -> ProviderSubscription
where
	F: 'static + Fn(Vec<String>) + Send + Sync,
{
	let handler: ProviderEventHandler =
		Arc::new(move |payload: &Value| handler(account_list(payload.clone())));

	ProviderSubscription::attach(provider, ProviderEvent::AccountsChanged, handler)
}

/// Subscribes to `chainChanged`; the handler receives the new chain id.
pub fn on_chain_changed<F>(provider: Arc<dyn WalletProvider>, handler: F) -> ProviderSubscription
where
	F: 'static + Fn(String) + Send + Sync,
{
	let handler: ProviderEventHandler = Arc::new(move |payload: &Value| {
		if let Some(chain_id) = payload.as_str() {
			handler(chain_id.to_owned());
		}
	});

	ProviderSubscription::attach(provider, ProviderEvent::ChainChanged, handler)
}

/// Listener registered on a provider; dropping it (or calling [`unsubscribe`]) removes it.
///
/// Providers without event support yield an inert subscription.
///
/// [`unsubscribe`]: ProviderSubscription::unsubscribe
#[must_use = "dropping the subscription removes the listener"]
pub struct ProviderSubscription {
	provider: Arc<dyn WalletProvider>,
	event: ProviderEvent,
	id: Option<ListenerId>,
}
impl ProviderSubscription {
	fn attach(
		provider: Arc<dyn WalletProvider>,
		event: ProviderEvent,
		handler: ProviderEventHandler,
	) -> Self {
		let id = provider.on(event, handler);

		Self { provider, event, id }
	}

	/// Returns `true` when the provider accepted the listener.
	pub fn is_active(&self) -> bool {
		self.id.is_some()
	}

	/// Removes the listener now.
	pub fn unsubscribe(mut self) {
		self.detach();
	}

	fn detach(&mut self) {
		if let Some(id) = self.id.take() {
			self.provider.remove_listener(self.event, id);
		}
	}
}
impl Drop for ProviderSubscription {
	fn drop(&mut self) {
		self.detach();
	}
}
impl Debug for ProviderSubscription {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderSubscription")
			.field("event", &self.event)
			.field("id", &self.id)
			.finish()
	}
}

fn account_list(value: Value) -> Vec<String> {
	match value {
		Value::Array(items) => items
			.into_iter()
			.filter_map(|item| match item {
				Value::String(account) => Some(account),
				_ => None,
			})
			.collect(),
		_ => Vec::new(),
	}
}
