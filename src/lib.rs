//! Rate-limit guards with a punitive ban: once a caller exceeds its allowed rate it is denied
//! for a fixed cool-down, coordinated across workers through a shared TTL cache.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod ban_key;
pub mod clock;
pub mod error;
pub mod guard;
pub mod key;
pub mod obs;
pub mod oracle;
pub mod request;
pub mod rule;
pub mod settings;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use time::macros;
	// self
	use crate::{
		clock::{Clock, ManualClock},
		guard::Banlimiter,
		oracle::{MemoryRateOracle, RateOracle},
		settings::Settings,
		store::{CacheRegistry, MemoryCache, SharedCache},
	};

	/// Fixed starting instant for test clocks; aligned to a whole day so every window starts
	/// fresh.
	pub const TEST_EPOCH: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);

	/// Handles returned alongside a test limiter so tests can drive time and inspect state.
	#[derive(Clone, Debug)]
	pub struct TestHarness {
		/// Clock shared by the cache and the oracle.
		pub clock: ManualClock,
		/// Cache registered under the `default` name.
		pub cache: Arc<MemoryCache>,
		/// Oracle wired into the limiter.
		pub oracle: Arc<MemoryRateOracle>,
	}

	/// Builds a [`Banlimiter`] backed by in-memory components that share a [`ManualClock`].
	pub fn build_test_limiter(settings: Settings) -> (Banlimiter, TestHarness) {
		let clock = ManualClock::new(TEST_EPOCH);
		let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
		let cache = Arc::new(MemoryCache::with_clock(shared_clock.clone()));
		let oracle = Arc::new(MemoryRateOracle::with_clock(shared_clock));
		let caches = CacheRegistry::default()
			.with_cache("default", cache.clone() as Arc<dyn SharedCache>);
		let limiter =
			Banlimiter::new(settings, caches, oracle.clone() as Arc<dyn RateOracle>);

		(limiter, TestHarness { clock, cache, oracle })
	}
}

mod _prelude {
	pub use std::{
		borrow::Cow,
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
