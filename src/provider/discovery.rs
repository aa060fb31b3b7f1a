//! Provider discovery: one resolution per call, raced against a timeout.
//!
//! [`ProviderRegistry::discover`] drives a small state machine ([`Discovery`]) with host events.
//! The machine starts `Waiting`, collects announced candidates, and moves to `Resolved` on the
//! first qualifying event or when the timer fires. Every resolution attempt checks the state
//! first, so late events are ignored; teardown is dropping the subscription and the timer, which
//! happens exactly once whichever branch wins.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{
		ProviderCandidate, WalletProvider,
		host::{DiscoveryHost, HostEvent},
	},
};

/// Per-call discovery settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoveryOptions {
	/// Resolve early on the preferred wallet instead of taking the first provider seen.
	pub prefer_named: bool,
	/// Upper bound on how long announcements are awaited.
	pub timeout: StdDuration,
}
impl DiscoveryOptions {
	const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_millis(1_000);

	/// Overrides the preference flag.
	pub fn with_prefer_named(mut self, prefer_named: bool) -> Self {
		self.prefer_named = prefer_named;

		self
	}

	/// Overrides the announcement window (defaults to one second).
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}
}
impl Default for DiscoveryOptions {
	fn default() -> Self {
		Self { prefer_named: true, timeout: Self::DEFAULT_TIMEOUT }
	}
}

/// Resolves wallet providers exposed by a [`DiscoveryHost`].
#[derive(Clone)]
pub struct ProviderRegistry {
	host: Arc<dyn DiscoveryHost>,
}
impl ProviderRegistry {
	/// Creates a registry over `host`.
	pub fn new(host: Arc<dyn DiscoveryHost>) -> Self {
		Self { host }
	}

	/// Resolves at most one provider candidate.
	pub async fn discover(&self, options: DiscoveryOptions) -> Option<ProviderCandidate> {
		const KIND: FlowKind = FlowKind::Discovery;

		let span = FlowSpan::new(KIND, "discover");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let found = span.instrument(self.discover_inner(options)).await;

		obs::record_flow_outcome(
			KIND,
			if found.is_some() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		found
	}

	/// Like [`discover`](Self::discover) but fails with [`Error::NoProvider`] on absence.
	pub async fn require(&self, options: DiscoveryOptions) -> Result<ProviderCandidate> {
		self.discover(options).await.ok_or(Error::NoProvider)
	}

	async fn discover_inner(&self, options: DiscoveryOptions) -> Option<ProviderCandidate> {
		let legacy = self.host.legacy_provider().map(ProviderCandidate::legacy);

		if let Some(preferred) = legacy.as_ref().filter(|c| options.prefer_named && c.is_preferred())
		{
			return Some(preferred.clone());
		}

		let mut subscription = self.host.subscribe();
		let mut discovery = Discovery::new(options.prefer_named, legacy);

		if let Err(e) = self.host.request_providers() {
			obs::discovery_broadcast_rejected(&e);
		}
		if let Transition::Resolve(found) = discovery.on_broadcast_sent() {
			return found;
		}

		let deadline = tokio::time::sleep(options.timeout);

		tokio::pin!(deadline);

		loop {
			let transition = tokio::select! {
				biased;
				event = subscription.recv() => match event {
					Some(event) => discovery.on_event(event, || self.host.legacy_provider()),
					None => {
						(&mut deadline).await;

						discovery.on_timeout(self.host.legacy_provider())
					},
				},
				_ = &mut deadline => discovery.on_timeout(self.host.legacy_provider()),
			};

			if let Transition::Resolve(found) = transition {
				return found;
			}
		}
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRegistry").finish_non_exhaustive()
	}
}

/// Result of feeding one input into [`Discovery`].
#[derive(Debug)]
pub enum Transition {
	/// Keep waiting.
	Stay,
	/// Discovery settled with this result.
	Resolve(Option<ProviderCandidate>),
}

#[derive(Debug)]
enum DiscoveryState {
	Waiting { candidates: Vec<ProviderCandidate>, initialized: bool },
	Resolved,
}

/// Discovery state machine with guarded transitions.
#[derive(Debug)]
pub struct Discovery {
	state: DiscoveryState,
	prefer_named: bool,
	legacy_at_start: Option<ProviderCandidate>,
}
impl Discovery {
	/// Starts a machine in the waiting state.
	pub fn new(prefer_named: bool, legacy_at_start: Option<ProviderCandidate>) -> Self {
		Self {
			state: DiscoveryState::Waiting { candidates: Vec::new(), initialized: false },
			prefer_named,
			legacy_at_start,
		}
	}

	/// Returns `true` once a result has been produced.
	pub fn is_resolved(&self) -> bool {
		matches!(self.state, DiscoveryState::Resolved)
	}

	/// Called right after the broadcast: without a preference, an existing legacy provider wins.
	pub fn on_broadcast_sent(&mut self) -> Transition {
		match (&self.legacy_at_start, self.prefer_named) {
			(Some(legacy), false) => {
				let legacy = legacy.clone();

				self.resolve(Some(legacy))
			},
			_ => Transition::Stay,
		}
	}

	/// Feeds one host event; `legacy_now` is consulted only for the initialized signal.
	pub fn on_event<F>(&mut self, event: HostEvent, legacy_now: F) -> Transition
	where
		F: FnOnce() -> Option<Arc<dyn WalletProvider>>,
	{
		let prefer_named = self.prefer_named;
		let DiscoveryState::Waiting { candidates, initialized } = &mut self.state else {
			return Transition::Stay;
		};

		match event {
			HostEvent::Announce(candidate) => {
				let hit = (prefer_named && candidate.is_preferred()).then(|| candidate.clone());

				candidates.push(candidate);

				match hit {
					Some(hit) => self.resolve(Some(hit)),
					None => Transition::Stay,
				}
			},
			HostEvent::Initialized => {
				if *initialized {
					return Transition::Stay;
				}

				*initialized = true;

				match legacy_now().map(ProviderCandidate::legacy) {
					Some(injected) if prefer_named && injected.is_preferred() =>
						self.resolve(Some(injected)),
					_ => Transition::Stay,
				}
			},
		}
	}

	/// Timer fired: pick the best candidate seen, then fall back to the legacy slot.
	pub fn on_timeout(&mut self, legacy_now: Option<Arc<dyn WalletProvider>>) -> Transition {
		let DiscoveryState::Waiting { candidates, .. } = &self.state else {
			return Transition::Stay;
		};
		let best = select_best(candidates, self.prefer_named)
			.or_else(|| self.legacy_at_start.clone())
			.or_else(|| legacy_now.map(ProviderCandidate::legacy));

		self.resolve(best)
	}

	fn resolve(&mut self, found: Option<ProviderCandidate>) -> Transition {
		if self.is_resolved() {
			return Transition::Stay;
		}

		self.state = DiscoveryState::Resolved;

		Transition::Resolve(found)
	}
}

/// First preferred candidate when `prefer_named`, otherwise (or failing that) the first seen.
pub fn select_best(candidates: &[ProviderCandidate], prefer_named: bool) -> Option<ProviderCandidate> {
	candidates
		.iter()
		.find(|c| prefer_named && c.is_preferred())
		.or_else(|| candidates.first())
		.cloned()
}
