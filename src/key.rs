//! Caller identity resolution.
//!
//! A [`KeySpec`] is resolved in a fixed order: a direct key function, then one of the simple keys
//! (`ip`, `user`, `user_or_ip`), then an `accessor:field` pair (`get`, `post`, `header`), then a
//! dotted path looked up in the [`KeyRegistry`]. Anything else is a configuration error.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	request::Request,
	rule::{KeyFn, KeySpec},
};

/// Names accepted as simple keys.
pub const SIMPLE_KEYS: [&str; 3] = ["ip", "user", "user_or_ip"];
/// Names accepted before the colon of an `accessor:field` key.
pub const ACCESSORS: [&str; 3] = ["get", "post", "header"];

/// Named key functions addressable by dotted paths such as `"app.keys.api_token"`.
///
/// Populate it at startup; lookups never load code at runtime.
#[derive(Clone, Default)]
pub struct KeyRegistry(HashMap<String, KeyFn>);
impl KeyRegistry {
	/// Registers `f` under `path`, replacing any previous entry.
	pub fn register<F>(&mut self, path: impl Into<String>, f: F)
	where
		F: 'static + Fn(&str, &Request) -> String + Send + Sync,
	{
		self.0.insert(path.into(), Arc::new(f));
	}

	/// Builder-style [`register`](Self::register).
	pub fn with_function<F>(mut self, path: impl Into<String>, f: F) -> Self
	where
		F: 'static + Fn(&str, &Request) -> String + Send + Sync,
	{
		self.register(path, f);

		self
	}

	/// Looks up a registered function.
	pub fn get(&self, path: &str) -> Option<&KeyFn> {
		self.0.get(path)
	}

	/// Resolves the identity of the caller of `request` under `key`.
	pub fn resolve(
		&self,
		key: &KeySpec,
		group: &str,
		request: &Request,
	) -> Result<String, ConfigError> {
		let name = match key {
			KeySpec::Func(f) => return Ok(f(group, request)),
			KeySpec::Named(name) => name.as_str(),
		};

		if name.is_empty() {
			return Err(ConfigError::MissingKey);
		}
		if let Some(value) = simple_key(name, request) {
			return value;
		}
		if let Some((accessor, field)) = name.split_once(':') {
			return access(accessor, field, request).ok_or_else(|| ConfigError::UnknownAccessor {
				accessor: accessor.to_owned(),
				key: name.to_owned(),
			});
		}
		if name.contains('.') {
			let f = self
				.get(name)
				.ok_or_else(|| ConfigError::UnknownKeyFunction { path: name.to_owned() })?;

			return Ok(f(group, request));
		}

		Err(ConfigError::UnrecognizedKey { key: name.to_owned() })
	}
}
impl Debug for KeyRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut paths = self.0.keys().collect::<Vec<_>>();

		paths.sort();

		f.debug_tuple("KeyRegistry").field(&paths).finish()
	}
}

fn simple_key(name: &str, request: &Request) -> Option<Result<String, ConfigError>> {
	let ip = || {
		request
			.remote_addr
			.map(|addr| addr.to_string())
			.ok_or_else(|| ConfigError::MissingRemoteAddr { key: name.to_owned() })
	};

	match name {
		"ip" => Some(ip()),
		"user" => Some(Ok(request.user.as_ref().map(|u| u.id.clone()).unwrap_or_default())),
		"user_or_ip" => Some(match request.authenticated_user() {
			Some(id) => Ok(id.to_owned()),
			None => ip(),
		}),
		_ => None,
	}
}

fn access(accessor: &str, field: &str, request: &Request) -> Option<String> {
	let value = match accessor {
		"get" => request.query(field),
		"post" => request.form_field(field).map(str::to_owned),
		"header" => request.header(field).map(str::to_owned),
		_ => return None,
	};

	Some(value.unwrap_or_default())
}
