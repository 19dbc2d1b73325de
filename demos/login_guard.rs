//! Demonstrates guarding a login handler so a caller that keeps guessing passwords is locked out
//! for ten minutes, even after the per-minute budget resets.

// std
use std::{
	net::{IpAddr, Ipv4Addr},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
// self
use banlimit::{
	error::Error,
	guard::{Banlimiter, Operation},
	oracle::{MemoryRateOracle, RateOracle},
	request::Request,
	rule::{MethodFilter, Rule},
	settings::Settings,
	store::{CacheRegistry, MemoryCache, SharedCache},
	url::Url,
};

fn login(request: &mut Request) -> Result<String, Error> {
	let user = request.form_field("username").unwrap_or_default();

	Ok(format!("Wrong password for {user}."))
}

fn main() -> Result<()> {
	color_eyre::install()?;

	let settings = Settings::from_json_str(r#"{ "use_cache": "bans", "expiration_fudge": 5 }"#)?;
	let caches = CacheRegistry::default()
		.with_cache("bans", Arc::new(MemoryCache::default()) as Arc<dyn SharedCache>);
	let oracle: Arc<dyn RateOracle> = Arc::new(MemoryRateOracle::default());
	let limiter = Banlimiter::new(settings, caches, oracle);
	let view = limiter
		.guard(Rule::new("post:username", "3/m", "10m").with_method(MethodFilter::Unsafe))
		.wrap(login);

	println!("Guarding `{}` as group `{}`.", view.name(), view.group());

	for attempt in 1..=5 {
		let mut request = Request::new("POST", Url::parse("https://example.com/login")?)
			.with_remote_addr(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 23)))
			.with_form_field("username", "alice");

		match view.call(&mut request) {
			Ok(message) => println!("#{attempt}: {message}"),
			Err(Error::Blocked(blocked)) => println!("#{attempt}: {blocked}"),
			Err(e) => return Err(e.into()),
		}
	}

	println!(
		"{} checks, {} bans installed, {} calls denied.",
		limiter.metrics.checks(),
		limiter.metrics.bans_installed(),
		limiter.metrics.denied()
	);

	Ok(())
}
