//! Shared cache contract, named cache registry, and the ban store built on top of them.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Key-value cache with TTLs shared by every worker.
///
/// Only two primitives are needed: reading a key and an atomic add-if-absent. Implementations
/// must make [`add`](Self::add) atomic across every process that shares the cache; guards add
/// no locking of their own.
pub trait SharedCache
where
	Self: Send + Sync,
{
	/// Returns the live value under `key`, if any.
	fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;

	/// Stores `value` under `key` for `ttl` unless a live entry exists; returns whether it was
	/// stored.
	fn add(&self, key: &str, value: u64, ttl: Duration) -> Result<bool, StoreError>;
}

/// Error type produced by [`SharedCache`] implementations and cache lookups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Settings name a cache that was never registered.
	#[error("Cache `{name}` is not configured.")]
	UnknownCache {
		/// Requested cache name.
		name: String,
	},
	/// Backend-level failure for the cache engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Named cache instances available to a limiter.
#[derive(Clone, Default)]
pub struct CacheRegistry(HashMap<String, Arc<dyn SharedCache>>);
impl CacheRegistry {
	/// Registers `cache` under `name`.
	pub fn with_cache(mut self, name: impl Into<String>, cache: Arc<dyn SharedCache>) -> Self {
		self.0.insert(name.into(), cache);

		self
	}

	/// Looks up a cache, failing loudly when it is missing.
	pub fn get(&self, name: &str) -> Result<Arc<dyn SharedCache>, StoreError> {
		self.0.get(name).cloned().ok_or_else(|| StoreError::UnknownCache { name: name.to_owned() })
	}
}
impl Debug for CacheRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut names = self.0.keys().collect::<Vec<_>>();

		names.sort();

		f.debug_tuple("CacheRegistry").field(&names).finish()
	}
}

/// Ban records over a [`SharedCache`].
///
/// A record's value is its ban duration and only its presence matters. Records are created once
/// per violation window and left to expire; they are never extended, overwritten, or deleted.
#[derive(Clone)]
pub struct BanStore {
	cache: Arc<dyn SharedCache>,
	expiration_fudge: u64,
}
impl BanStore {
	/// Wraps `cache`, padding every ban TTL by `expiration_fudge` seconds.
	pub fn new(cache: Arc<dyn SharedCache>, expiration_fudge: u64) -> Self {
		Self { cache, expiration_fudge }
	}

	/// Whether a ban record currently exists under `key`.
	pub fn is_banned(&self, key: &str) -> Result<bool, StoreError> {
		Ok(self.cache.get(key)?.is_some())
	}

	/// Installs a ban lasting `ban_seconds` (plus fudge) unless one is already live; returns
	/// whether this call created it.
	pub fn install_ban(&self, key: &str, ban_seconds: u64) -> Result<bool, StoreError> {
		self.cache.add(key, ban_seconds, self.ttl(ban_seconds))
	}

	/// TTL applied to a ban of `ban_seconds`.
	pub fn ttl(&self, ban_seconds: u64) -> Duration {
		let seconds = ban_seconds.saturating_add(self.expiration_fudge);

		Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX))
	}
}
impl Debug for BanStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BanStore").field("expiration_fudge", &self.expiration_fudge).finish()
	}
}
