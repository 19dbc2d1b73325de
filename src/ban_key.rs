//! Deterministic ban keys.
//!
//! One ban record exists per (group, rate, identity, ban duration, methods) tuple. The parts are
//! concatenated without separators, hashed with SHA-256 to keep keys short, and prefixed with
//! [`BAN_KEY_PREFIX`]. Rates are normalized to `<count>/<seconds>s` and method filters to their
//! canonical form first, so equivalent rules always collide on the same record.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::rule::{MethodFilter, Rate};

/// Namespace prefix of every ban key.
pub const BAN_KEY_PREFIX: &str = "BAN_KEY";

/// Builds the cache key marking `identity` as banned under one rule.
pub fn build(
	group: &str,
	rate: &Rate,
	identity: &str,
	methods: &MethodFilter,
	ban_seconds: u64,
) -> String {
	let mut hasher = Sha256::new();

	hasher.update(group.as_bytes());
	hasher.update(rate.to_string().as_bytes());
	hasher.update(identity.as_bytes());
	hasher.update(ban_seconds.to_string().as_bytes());
	hasher.update(methods.canonical().as_bytes());

	format!("{BAN_KEY_PREFIX}{:x}", hasher.finalize())
}
