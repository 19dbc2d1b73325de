//! Guards: rate evaluation plus ban enforcement around a protected operation.
//!
//! Each call walks a fixed sequence. Disabled settings pass straight through, and so does a
//! rate that resolves to "never limit". Otherwise the guard resolves the ban duration, group,
//! identity, and ban key, then consults the ban store. A live ban denies a blocking guard
//! before the oracle is asked. When the oracle reports a violation the guard installs a ban
//! (add-if-absent, so concurrent violations cannot extend it), flags the request as limited,
//! and either denies or lets the call continue in annotate-only mode.
//!
//! Guards keep no in-process state between calls; all coordination goes through the shared
//! cache.

mod metrics;

pub use metrics::GuardMetrics;

// std
use std::any;
// self
use crate::{
	_prelude::*,
	ban_key,
	error::BlockedError,
	key::KeyRegistry,
	obs::{self, GuardOutcome, GuardSpan},
	oracle::{RateCheck, RateOracle},
	request::Request,
	rule::Rule,
	settings::Settings,
	store::{BanStore, CacheRegistry, StoreError},
};

/// Operation protected by a guard.
///
/// Implemented for every `Fn(&mut Request) -> Result<T, E>` and for [`Guarded`], so guards
/// stack by wrapping one another.
pub trait Operation {
	/// Successful result.
	type Output;
	/// Failure type; guards convert their own [`Error`] into it.
	type Error;

	/// Runs the operation.
	fn call(&self, request: &mut Request) -> Result<Self::Output, Self::Error>;

	/// Fully qualified name used to derive a default group.
	///
	/// Types implementing this trait by hand are named `<type path>::call`; plain functions
	/// are named by their own path.
	fn name(&self) -> Cow<'static, str> {
		Cow::Owned(format!("{}::call", any::type_name::<Self>()))
	}
}
impl<F, T, E> Operation for F
where
	F: Fn(&mut Request) -> Result<T, E>,
{
	type Error = E;
	type Output = T;

	fn call(&self, request: &mut Request) -> Result<T, E> {
		self(request)
	}

	fn name(&self) -> Cow<'static, str> {
		Cow::Borrowed(any::type_name::<F>())
	}
}

/// Process-wide wiring shared by every guard: settings, caches, oracle, and key functions.
#[derive(Clone)]
pub struct Banlimiter {
	/// Settings loaded at startup.
	pub settings: Arc<Settings>,
	/// Named caches; `settings.use_cache` selects the ban store.
	pub caches: Arc<CacheRegistry>,
	/// Counting side consulted on every non-banned call.
	pub oracle: Arc<dyn RateOracle>,
	/// Functions addressable by dotted key paths.
	pub keys: Arc<KeyRegistry>,
	/// Counters shared by every guard built from this limiter.
	pub metrics: Arc<GuardMetrics>,
}
impl Banlimiter {
	/// Creates a limiter with an empty key registry.
	pub fn new(settings: Settings, caches: CacheRegistry, oracle: Arc<dyn RateOracle>) -> Self {
		Self {
			settings: Arc::new(settings),
			caches: Arc::new(caches),
			oracle,
			keys: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Replaces the key registry.
	pub fn with_keys(mut self, keys: KeyRegistry) -> Self {
		self.keys = Arc::new(keys);

		self
	}

	/// Binds `rule` to this limiter.
	pub fn guard(&self, rule: Rule) -> Guard {
		Guard { limiter: self.clone(), rule }
	}

	/// Ban store over the cache named in the settings.
	pub fn ban_store(&self) -> Result<BanStore, StoreError> {
		let cache = self.caches.get(&self.settings.use_cache)?;

		Ok(BanStore::new(cache, self.settings.expiration_fudge))
	}
}
impl Debug for Banlimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Banlimiter")
			.field("settings", &self.settings)
			.field("caches", &self.caches)
			.field("keys", &self.keys)
			.finish()
	}
}

/// A [`Rule`] bound to a [`Banlimiter`].
#[derive(Clone, Debug)]
pub struct Guard {
	limiter: Banlimiter,
	rule: Rule,
}
impl Guard {
	/// The rule this guard enforces.
	pub fn rule(&self) -> &Rule {
		&self.rule
	}

	/// Wraps `operation`, fixing the group once from the rule or the operation's name.
	pub fn wrap<O>(self, operation: O) -> Guarded<O>
	where
		O: Operation,
	{
		let group = self.rule.group_for(&operation.name());

		Guarded { guard: self, group, operation }
	}

	/// Guards a one-off call; the default group comes from the closure's type path.
	pub fn run<F, T, E>(&self, request: &mut Request, operation: F) -> Result<T, E>
	where
		F: FnOnce(&mut Request) -> Result<T, E>,
		E: From<Error>,
	{
		let group = self.rule.group_for(any::type_name::<F>());

		self.check(&group, request)?;

		operation(request)
	}

	/// Decides whether the caller of `request` may proceed under `group`.
	///
	/// Returns the proceeding outcome, [`Error::Blocked`] when the call is denied, or the
	/// configuration/storage failure that prevented a decision.
	pub fn check(&self, group: &str, request: &mut Request) -> Result<GuardOutcome> {
		let _span = GuardSpan::new(group, "check").entered();

		let (outcome, result) = match self.decide(group, request) {
			Ok(Decision::Proceed(outcome)) => (outcome, Ok(outcome)),
			Ok(Decision::Deny(outcome, blocked)) => {
				obs::trace_blocked(
					&blocked.identity,
					blocked.ban_seconds,
					outcome == GuardOutcome::BlockedByBan,
				);

				(outcome, Err(blocked.into()))
			},
			Err(e) => (GuardOutcome::Failed, Err(e)),
		};

		obs::record_guard_outcome(outcome);
		self.limiter.metrics.record(outcome);

		result
	}

	fn decide(&self, group: &str, request: &mut Request) -> Result<Decision> {
		if !self.limiter.settings.enable {
			request.reset_limited();

			return Ok(Decision::Proceed(GuardOutcome::Disabled));
		}

		let Some(rate) = self.rule.rate.resolve(group, request)? else {
			return Ok(Decision::Proceed(GuardOutcome::Unlimited));
		};
		let ban_seconds = self.rule.ban.resolve(group, request)?;
		let identity = self.limiter.keys.resolve(&self.rule.key, group, request)?;
		let key = ban_key::build(group, &rate, &identity, &self.rule.method, ban_seconds);
		let store = self.limiter.ban_store()?;
		let banned = store.is_banned(&key)?;

		if banned && self.rule.block {
			return Ok(Decision::Deny(
				GuardOutcome::BlockedByBan,
				self.blocked(identity, ban_seconds),
			));
		}

		let check = RateCheck {
			group,
			key: &self.rule.key,
			identity: &identity,
			rate,
			method: &self.rule.method,
			request: &*request,
			increment: true,
		};

		if !self.limiter.oracle.evaluate(&check)? {
			return Ok(Decision::Proceed(GuardOutcome::Allowed));
		}

		let created = store.install_ban(&key, ban_seconds)?;

		if created {
			self.limiter.metrics.record_ban_installed();
		}

		obs::trace_ban_installed(&identity, ban_seconds, created);
		request.mark_limited();

		if self.rule.block {
			Ok(Decision::Deny(GuardOutcome::BlockedByViolation, self.blocked(identity, ban_seconds)))
		} else {
			Ok(Decision::Proceed(GuardOutcome::Annotated))
		}
	}

	fn blocked(&self, identity: String, ban_seconds: u64) -> BlockedError {
		BlockedError { key: self.rule.key.label().to_owned(), identity, ban_seconds }
	}
}

enum Decision {
	Proceed(GuardOutcome),
	Deny(GuardOutcome, BlockedError),
}

/// An operation wrapped by a guard; itself an [`Operation`], so guards stack.
#[derive(Clone, Debug)]
pub struct Guarded<O> {
	guard: Guard,
	group: String,
	operation: O,
}
impl<O> Guarded<O> {
	/// Group this guard counts under.
	pub fn group(&self) -> &str {
		&self.group
	}

	/// The guard's rule.
	pub fn rule(&self) -> &Rule {
		self.guard.rule()
	}
}
impl<O> Operation for Guarded<O>
where
	O: Operation,
	O::Error: From<Error>,
{
	type Error = O::Error;
	type Output = O::Output;

	fn call(&self, request: &mut Request) -> Result<Self::Output, Self::Error> {
		self.guard.check(&self.group, request)?;

		self.operation.call(request)
	}

	fn name(&self) -> Cow<'static, str> {
		self.operation.name()
	}
}
