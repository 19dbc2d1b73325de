//! Request-like context handed to guards, key functions, and protected operations.

// std
use std::net::IpAddr;
// self
use crate::_prelude::*;

/// Authenticated (or anonymous) principal attached to a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestUser {
	/// Stable user identifier.
	pub id: String,
	/// Whether the user passed authentication.
	pub authenticated: bool,
}
impl RequestUser {
	/// Creates an authenticated user.
	pub fn authenticated(id: impl Into<String>) -> Self {
		Self { id: id.into(), authenticated: true }
	}

	/// Creates an anonymous user.
	pub fn anonymous(id: impl Into<String>) -> Self {
		Self { id: id.into(), authenticated: false }
	}
}

/// Framework-neutral view of an incoming request.
///
/// Header names are stored lowercased and the HTTP method uppercased so lookups are
/// case-insensitive. The `limited` annotation is sticky: guards can raise it but never lower it.
#[derive(Clone, Debug)]
pub struct Request {
	/// Uppercased HTTP method.
	pub method: String,
	/// Request URL; its query string backs the `get:` accessor.
	pub url: Url,
	/// Lowercased header names to values.
	pub headers: HashMap<String, String>,
	/// Decoded form body fields backing the `post:` accessor.
	pub form: BTreeMap<String, String>,
	/// Peer address backing the `ip` key.
	pub remote_addr: Option<IpAddr>,
	/// Optional user backing the `user` key.
	pub user: Option<RequestUser>,
	limited: bool,
}
impl Request {
	/// Creates a request for the given method and URL.
	pub fn new(method: impl AsRef<str>, url: Url) -> Self {
		Self {
			method: method.as_ref().to_ascii_uppercase(),
			url,
			headers: HashMap::new(),
			form: BTreeMap::new(),
			remote_addr: None,
			user: None,
			limited: false,
		}
	}

	/// Sets the peer address.
	pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
		self.remote_addr = Some(addr);

		self
	}

	/// Adds a header; the name is matched case-insensitively later.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Adds a form body field.
	pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.form.insert(name.into(), value.into());

		self
	}

	/// Attaches a user.
	pub fn with_user(mut self, user: RequestUser) -> Self {
		self.user = Some(user);

		self
	}

	/// First query-string value for `field`.
	pub fn query(&self, field: &str) -> Option<String> {
		self.url.query_pairs().find(|(k, _)| k == field).map(|(_, v)| v.into_owned())
	}

	/// Form body value for `field`.
	pub fn form_field(&self, field: &str) -> Option<&str> {
		self.form.get(field).map(String::as_str)
	}

	/// Header value, matched case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Authenticated user id, if any.
	pub fn authenticated_user(&self) -> Option<&str> {
		self.user.as_ref().filter(|u| u.authenticated).map(|u| u.id.as_str())
	}

	/// Whether any guard has flagged this request as over its rate.
	pub fn is_limited(&self) -> bool {
		self.limited
	}

	/// Flags the request as over its rate. There is no way to unflag it short of
	/// [`reset_limited`](Self::reset_limited).
	pub fn mark_limited(&mut self) {
		self.limited = true;
	}

	/// Clears the annotation so the same value can be replayed as a fresh request.
	pub fn reset_limited(&mut self) {
		self.limited = false;
	}
}
