//! Thread-safe in-memory [`SharedCache`] for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	store::{SharedCache, StoreError},
};

/// Entry count at which expired entries are first swept out on insert.
pub const SWEEP_THRESHOLD: usize = 1_024;

#[derive(Clone, Copy, Debug)]
struct Entry {
	value: u64,
	// `None` when the TTL runs past the representable range.
	expires_at: Option<OffsetDateTime>,
}
impl Entry {
	fn is_live(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|at| now < at)
	}
}

#[derive(Debug)]
struct EntryTable {
	entries: HashMap<String, Entry>,
	sweep_at: usize,
}
impl EntryTable {
	fn sweep(&mut self, now: OffsetDateTime) {
		self.entries.retain(|_, e| e.is_live(now));
		self.sweep_at = self.entries.len().saturating_mul(2).max(SWEEP_THRESHOLD);
	}
}
impl Default for EntryTable {
	fn default() -> Self {
		Self { entries: HashMap::new(), sweep_at: SWEEP_THRESHOLD }
	}
}

/// In-process cache with per-entry TTLs.
///
/// Expired entries read as absent. A read that finds one drops it, and inserts sweep the whole
/// table once it doubles past its last live size.
#[derive(Clone, Debug)]
pub struct MemoryCache {
	table: Arc<RwLock<EntryTable>>,
	clock: Arc<dyn Clock>,
}
impl MemoryCache {
	/// Creates a cache that reads time from `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { table: Default::default(), clock }
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		let now = self.clock.now();

		self.table.read().entries.values().filter(|e| e.is_live(now)).count()
	}

	/// Whether no live entries remain.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops expired entries.
	pub fn purge_expired(&self) {
		let now = self.clock.now();

		self.table.write().sweep(now);
	}

	/// Removes every entry.
	pub fn clear(&self) {
		*self.table.write() = EntryTable::default();
	}
}
impl Default for MemoryCache {
	fn default() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}
}
impl SharedCache for MemoryCache {
	fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
		let now = self.clock.now();
		let found = self.table.read().entries.get(key).copied();

		match found {
			Some(entry) if entry.is_live(now) => Ok(Some(entry.value)),
			Some(_) => {
				let mut table = self.table.write();

				// Another writer may have replaced it since the read.
				if table.entries.get(key).is_some_and(|e| !e.is_live(now)) {
					table.entries.remove(key);
				}

				Ok(None)
			},
			None => Ok(None),
		}
	}

	fn add(&self, key: &str, value: u64, ttl: Duration) -> Result<bool, StoreError> {
		let now = self.clock.now();
		let mut table = self.table.write();

		if table.entries.get(key).is_some_and(|e| e.is_live(now)) {
			return Ok(false);
		}
		if table.entries.len() >= table.sweep_at {
			table.sweep(now);
		}

		table.entries.insert(key.to_owned(), Entry { value, expires_at: now.checked_add(ttl) });

		Ok(true)
	}
}
