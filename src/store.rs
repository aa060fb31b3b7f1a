//! Token cache and the durable mirror contract behind it.
//!
//! [`TokenStore`] keeps the session's access token in memory and, when a call enables
//! persistence, mirrors it into a [`TokenMirror`] slot. Reads prefer memory; a miss falls back to
//! the mirror and warms memory as a side effect.

pub mod file;
pub mod memory;

pub use file::FileMirror;
pub use memory::MemoryMirror;

// self
use crate::{_prelude::*, auth::TokenRecord};

/// Key used for the mirror slot when callers do not override it.
pub const DEFAULT_TOKEN_KEY: &str = "authToken";

/// String key-value slot used as a secondary token cache.
pub trait TokenMirror
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if any.
	fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores `value` under `key`, replacing any previous value.
	fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes the value stored under `key`. Missing keys are not an error.
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`TokenMirror`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Per-call mirror settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
	/// Mirror slot key.
	pub key: String,
	/// Whether this call reads from and writes to the mirror.
	pub persist: bool,
}
impl StoreOptions {
	/// Overrides the mirror slot key.
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();

		self
	}

	/// Toggles mirror persistence for calls using these options.
	pub fn with_persist(mut self, persist: bool) -> Self {
		self.persist = persist;

		self
	}

	/// Memory-only settings.
	pub fn ephemeral() -> Self {
		Self::default().with_persist(false)
	}
}
impl Default for StoreOptions {
	fn default() -> Self {
		Self { key: DEFAULT_TOKEN_KEY.into(), persist: true }
	}
}

/// Two-tier access-token cache owned by one session.
#[derive(Default)]
pub struct TokenStore {
	cached: RwLock<Option<TokenRecord>>,
	mirror: Option<Arc<dyn TokenMirror>>,
}
impl TokenStore {
	/// Creates a store backed by `mirror`.
	pub fn with_mirror(mirror: Arc<dyn TokenMirror>) -> Self {
		Self { cached: RwLock::new(None), mirror: Some(mirror) }
	}

	/// Returns the current record, consulting the mirror on a memory miss.
	pub fn get(&self, options: &StoreOptions) -> Result<Option<TokenRecord>, StoreError> {
		if let Some(record) = self.cached.read().clone() {
			return Ok(Some(record));
		}

		let Some(mirror) = self.mirror.as_ref().filter(|_| options.persist) else {
			return Ok(None);
		};
		let restored =
			mirror.read(&options.key)?.as_deref().and_then(TokenRecord::from_mirror_value);
		let Some(record) = restored else {
			return Ok(None);
		};
		let mut cached = self.cached.write();

		// A concurrent `set` wins over the mirror value.
		Ok(Some(cached.get_or_insert(record).clone()))
	}

	/// Replaces the current record; `None` empties the cache.
	///
	/// Memory is always updated first. The mirror is only touched when `options.persist` holds.
	pub fn set(
		&self,
		record: Option<TokenRecord>,
		options: &StoreOptions,
	) -> Result<(), StoreError> {
		*self.cached.write() = record.clone();

		let Some(mirror) = self.mirror.as_ref().filter(|_| options.persist) else {
			return Ok(());
		};

		match record {
			Some(record) => {
				let encoded = record.to_mirror_value().map_err(|e| StoreError::Serialization {
					message: format!("Failed to encode token record: {e}"),
				})?;

				mirror.write(&options.key, &encoded)
			},
			None => mirror.remove(&options.key),
		}
	}

	/// Empties memory and removes the mirror slot regardless of the persistence flag.
	pub fn clear(&self, options: &StoreOptions) -> Result<(), StoreError> {
		*self.cached.write() = None;

		match &self.mirror {
			Some(mirror) => mirror.remove(&options.key),
			None => Ok(()),
		}
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore")
			.field("cached", &self.cached.read().as_ref().map(|record| record.issued_via))
			.field("mirror_set", &self.mirror.is_some())
			.finish()
	}
}
