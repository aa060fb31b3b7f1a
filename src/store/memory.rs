//! Thread-safe in-memory [`TokenMirror`] for tests and hosts without durable storage.

// self
use crate::{
	_prelude::*,
	store::{StoreError, TokenMirror},
};

type SlotMap = Arc<RwLock<HashMap<String, String>>>;

/// Mirror that keeps slots in-process; clones share the same slots.
#[derive(Clone, Debug, Default)]
pub struct MemoryMirror(SlotMap);
impl MemoryMirror {
	/// Returns the number of occupied slots.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no slot is occupied.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenMirror for MemoryMirror {
	fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), value.to_owned());

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}
