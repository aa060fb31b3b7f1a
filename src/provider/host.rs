//! Host environments that expose and announce wallet providers.
//!
//! A host offers three things: a legacy single-provider slot, a broadcast asking providers to
//! announce themselves, and an event stream carrying those announcements plus a one-shot
//! "initialized" signal. [`LocalHost`] implements the contract in-process for desktop shells,
//! embedded webviews bridging into Rust, and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
// self
use crate::{
	_prelude::*,
	provider::{ProviderCandidate, WalletProvider},
};

/// Event delivered to discovery listeners.
#[derive(Clone, Debug)]
pub enum HostEvent {
	/// A provider answered the discovery broadcast.
	Announce(ProviderCandidate),
	/// The host finished injecting its legacy provider.
	Initialized,
}

/// Failure raised while dispatching the discovery broadcast.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Host rejected the provider request broadcast: {reason}.")]
pub struct HostError {
	/// Host-supplied reason.
	pub reason: String,
}

/// Environment that exposes wallet providers to the session.
pub trait DiscoveryHost
where
	Self: Send + Sync,
{
	/// Returns the legacy single injected provider, if the host exposes one right now.
	fn legacy_provider(&self) -> Option<Arc<dyn WalletProvider>>;

	/// Attaches a listener; dropping the returned subscription detaches it.
	fn subscribe(&self) -> HostSubscription;

	/// Broadcasts the request asking providers to announce themselves.
	fn request_providers(&self) -> Result<(), HostError>;
}

/// Listener attached to a [`DiscoveryHost`]; detached when dropped.
#[derive(Debug)]
pub struct HostSubscription(UnboundedReceiver<HostEvent>);
impl HostSubscription {
	/// Creates a linked sender/subscription pair for host implementations.
	pub fn channel() -> (UnboundedSender<HostEvent>, Self) {
		let (tx, rx) = mpsc::unbounded_channel();

		(tx, Self(rx))
	}

	/// Waits for the next event; `None` once the host drops its sender.
	pub async fn recv(&mut self) -> Option<HostEvent> {
		self.0.recv().await
	}
}

/// In-process [`DiscoveryHost`]; clones share the same state.
#[derive(Clone, Default)]
pub struct LocalHost(Arc<LocalHostState>);
#[derive(Default)]
struct LocalHostState {
	legacy: RwLock<Option<Arc<dyn WalletProvider>>>,
	listeners: Mutex<Vec<UnboundedSender<HostEvent>>>,
	responders: Mutex<Vec<ProviderCandidate>>,
	rejection: Mutex<Option<String>>,
	broadcasts: AtomicU64,
}
impl LocalHost {
	/// Places `provider` in the legacy slot without signalling.
	pub fn set_legacy_provider(&self, provider: Option<Arc<dyn WalletProvider>>) {
		*self.0.legacy.write() = provider;
	}

	/// Registers a provider that announces itself whenever the broadcast is dispatched.
	pub fn register(&self, candidate: ProviderCandidate) {
		self.0.responders.lock().push(candidate);
	}

	/// Announces `candidate` to every attached listener, returning how many received it.
	pub fn announce(&self, candidate: ProviderCandidate) -> usize {
		self.emit(HostEvent::Announce(candidate))
	}

	/// Fills the legacy slot and fires the initialized signal.
	pub fn initialize(&self, provider: Arc<dyn WalletProvider>) -> usize {
		self.set_legacy_provider(Some(provider));

		self.emit(HostEvent::Initialized)
	}

	/// Makes subsequent broadcasts fail with `reason`.
	pub fn reject_broadcasts(&self, reason: impl Into<String>) {
		*self.0.rejection.lock() = Some(reason.into());
	}

	/// Number of listeners still attached.
	pub fn listener_count(&self) -> usize {
		let mut listeners = self.0.listeners.lock();

		listeners.retain(|tx| !tx.is_closed());

		listeners.len()
	}

	/// Number of broadcasts dispatched so far, including rejected ones.
	pub fn broadcast_count(&self) -> u64 {
		self.0.broadcasts.load(Ordering::Relaxed)
	}

	fn emit(&self, event: HostEvent) -> usize {
		let mut listeners = self.0.listeners.lock();

		listeners.retain(|tx| tx.send(event.clone()).is_ok());

		listeners.len()
	}
}
impl DiscoveryHost for LocalHost {
	fn legacy_provider(&self) -> Option<Arc<dyn WalletProvider>> {
		self.0.legacy.read().clone()
	}

	fn subscribe(&self) -> HostSubscription {
		let (tx, subscription) = HostSubscription::channel();

		self.0.listeners.lock().push(tx);

		subscription
	}

	fn request_providers(&self) -> Result<(), HostError> {
		self.0.broadcasts.fetch_add(1, Ordering::Relaxed);

		if let Some(reason) = self.0.rejection.lock().clone() {
			return Err(HostError { reason });
		}

		let responders = self.0.responders.lock().clone();

		for candidate in responders {
			self.announce(candidate);
		}

		Ok(())
	}
}
impl Debug for LocalHost {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LocalHost")
			.field("legacy_set", &self.0.legacy.read().is_some())
			.field("responders", &self.0.responders.lock().len())
			.field("broadcasts", &self.broadcast_count())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::{ProviderFuture, ProviderInfo, ProviderRequest};

	struct Silent;
	impl WalletProvider for Silent {
		fn request(&self, _request: ProviderRequest) -> ProviderFuture<'_> {
			Box::pin(async { Ok(Value::Null) })
		}
	}

	#[tokio::test]
	async fn dropped_subscriptions_detach() {
		let host = LocalHost::default();
		let mut subscription = host.subscribe();

		assert_eq!(host.listener_count(), 1);
		assert_eq!(
			host.announce(ProviderCandidate::new(Arc::new(Silent), ProviderInfo::new("A", "a"))),
			1
		);
		assert!(matches!(subscription.recv().await, Some(HostEvent::Announce(_))));

		drop(subscription);

		assert_eq!(host.listener_count(), 0);
		assert_eq!(
			host.announce(ProviderCandidate::new(Arc::new(Silent), ProviderInfo::new("B", "b"))),
			0
		);
	}

	#[test]
	fn rejected_broadcasts_are_counted() {
		let host = LocalHost::default();

		host.reject_broadcasts("sandboxed");

		assert_eq!(
			host.request_providers(),
			Err(HostError { reason: "sandboxed".into() })
		);
		assert_eq!(host.broadcast_count(), 1);
	}
}
