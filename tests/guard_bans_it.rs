// std
use std::{
	net::{IpAddr, Ipv4Addr},
	sync::atomic::{AtomicUsize, Ordering},
	thread,
};
// self
use banlimit::{
	_preludet::*,
	ban_key,
	guard::{Banlimiter, Operation},
	obs::GuardOutcome,
	oracle::{RateCheck, RateOracle},
	request::Request,
	rule::{MethodFilter, Rate, Rule},
	settings::Settings,
	store::{CacheRegistry, SharedCache},
};

struct CountingOracle {
	inner: Arc<dyn RateOracle>,
	calls: AtomicUsize,
}
impl RateOracle for CountingOracle {
	fn evaluate(&self, check: &RateCheck<'_>) -> Result<bool> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		self.inner.evaluate(check)
	}
}

fn request_from(addr: [u8; 4]) -> Request {
	let [a, b, c, d] = addr;

	Request::new("POST", Url::parse("https://testserver/login").expect("Test URL should parse."))
		.with_remote_addr(IpAddr::V4(Ipv4Addr::new(a, b, c, d)))
}

fn login(request: &mut Request) -> Result<&'static str> {
	Ok(if request.is_limited() { "flagged" } else { "ok" })
}

fn counting_limiter(settings: Settings) -> (Banlimiter, TestHarness, Arc<CountingOracle>) {
	let (_, harness) = build_test_limiter(settings.clone());
	let oracle = Arc::new(CountingOracle {
		inner: harness.oracle.clone() as Arc<dyn RateOracle>,
		calls: AtomicUsize::new(0),
	});
	let caches =
		CacheRegistry::default().with_cache("default", harness.cache.clone() as Arc<dyn SharedCache>);
	let limiter = Banlimiter::new(settings, caches, oracle.clone() as Arc<dyn RateOracle>);

	(limiter, harness, oracle)
}

#[test]
fn banned_caller_is_denied_without_consulting_the_oracle() {
	let (limiter, _, oracle) = counting_limiter(Settings::default());
	let view = limiter.guard(Rule::new("ip", "1/m", "60s")).wrap(login);
	let mut req = request_from([1, 2, 3, 4]);

	assert_eq!(view.call(&mut req).expect("First call should proceed."), "ok");

	let err = view.call(&mut req).expect_err("Second call should violate the rate.");
	let blocked = err.as_blocked().expect("Violation should surface as a block.");

	assert_eq!(blocked.key, "ip");
	assert_eq!(blocked.identity, "1.2.3.4");
	assert_eq!(blocked.ban_seconds, 60);
	assert_eq!(blocked.to_string(), "Request blocked for 60s (ip=1.2.3.4).");
	assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);

	let err = view.call(&mut req).expect_err("Ban should block the third call.");

	assert_eq!(err.as_blocked().map(|b| b.ban_seconds), Some(60));
	assert_eq!(oracle.calls.load(Ordering::SeqCst), 2, "Ban must pre-empt the oracle.");
	assert_eq!(limiter.metrics.bans_installed(), 1);
	assert_eq!(limiter.metrics.denied(), 2);
	assert_eq!(limiter.metrics.outcome(GuardOutcome::BlockedByBan), 1);
}

#[test]
fn ban_outlives_the_rate_window_and_then_lifts() {
	let (limiter, harness) = build_test_limiter(Settings::default());
	let view = limiter.guard(Rule::new("ip", "2/1s", "2s")).wrap(login);
	let mut req = request_from([127, 0, 0, 1]);

	assert_eq!(view.call(&mut req).expect("First call should proceed."), "ok");
	assert_eq!(view.call(&mut req).expect("Second call should proceed."), "ok");
	assert!(view.call(&mut req).is_err(), "Third call in the window should be blocked.");

	harness.clock.advance(Duration::seconds(1));

	let mut fresh = request_from([127, 0, 0, 1]);

	assert!(view.call(&mut fresh).is_err(), "Ban should outlast the one second window.");

	harness.clock.advance(Duration::seconds(10));

	assert_eq!(view.call(&mut fresh).expect("Ban should have expired."), "ok");
}

#[test]
fn ban_ttl_is_padded_and_never_extended() {
	let (limiter, harness) = build_test_limiter(Settings::default());
	let rule = Rule::new("ip", "1/m", "60s").with_group("login").with_block(false);
	let view = limiter.guard(rule).wrap(login);
	let mut req = request_from([10, 0, 0, 1]);
	let rate = "1/m".parse::<Rate>().expect("Rate should parse.");
	let key = ban_key::build("login", &rate, "10.0.0.1", &MethodFilter::All, 60);

	assert_eq!(view.call(&mut req).expect("First call should proceed."), "ok");
	assert_eq!(view.call(&mut req).expect("Annotate mode should proceed."), "flagged");
	assert_eq!(harness.cache.get(&key).expect("Cache read should succeed."), Some(60));

	harness.clock.advance(Duration::seconds(30));

	assert_eq!(view.call(&mut req).expect("Annotate mode should proceed."), "flagged");

	harness.clock.advance(Duration::seconds(34));

	assert!(harness.cache.get(&key).expect("Cache read should succeed.").is_some());

	harness.clock.advance(Duration::seconds(1));

	assert_eq!(harness.cache.get(&key).expect("Cache read should succeed."), None);
	assert_eq!(limiter.metrics.bans_installed(), 1);
}

#[test]
fn expiration_fudge_is_configurable() {
	let (limiter, harness) = build_test_limiter(Settings::default().with_expiration_fudge(0));
	let view = limiter.guard(Rule::new("ip", "1/m", "60s")).wrap(login);
	let mut req = request_from([10, 0, 0, 2]);

	assert!(view.call(&mut req).is_ok());
	assert!(view.call(&mut req).is_err());

	harness.clock.advance(Duration::seconds(59));

	assert!(view.call(&mut request_from([10, 0, 0, 2])).is_err(), "Ban should hold until 60s.");

	harness.clock.advance(Duration::seconds(1));

	let mut fresh = request_from([10, 0, 0, 2]);

	assert_eq!(view.call(&mut fresh).expect("Ban should end exactly on time."), "ok");
	assert!(!fresh.is_limited());
}

#[test]
fn ban_applies_to_methods_outside_the_filter() {
	let (limiter, _, oracle) = counting_limiter(Settings::default());
	let view = limiter.guard(Rule::new("ip", "1/m", "60s").with_method("POST")).wrap(login);
	let mut post = request_from([198, 51, 100, 9]);

	assert!(view.call(&mut post).is_ok());
	assert!(view.call(&mut post).is_err());

	let mut get = Request::new("GET", post.url.clone())
		.with_remote_addr(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 9)));
	let err = view.call(&mut get).expect_err("A live ban blocks every method.");

	assert_eq!(err.as_blocked().map(|b| b.identity.as_str()), Some("198.51.100.9"));
	assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn method_filters_give_independent_bans() {
	let (limiter, _) = build_test_limiter(Settings::default());
	let on_post = limiter.guard(Rule::new("ip", "1/m", "60s").with_method("POST").with_group("auth"));
	let on_get = limiter.guard(Rule::new("ip", "1/m", "60s").with_method("GET").with_group("auth"));
	let mut post = request_from([192, 168, 0, 1]);
	let mut get = Request::new("GET", post.url.clone())
		.with_remote_addr(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1)));

	assert!(on_post.check("auth", &mut post).is_ok());
	assert!(on_post.check("auth", &mut post).is_err());
	assert_eq!(on_get.check("auth", &mut get).expect("GET ban is separate."), GuardOutcome::Allowed);
	assert!(on_post.check("auth", &mut post).is_err(), "POST ban still holds.");
}

#[test]
fn banned_caller_in_annotate_mode_is_still_counted() {
	let (limiter, _, oracle) = counting_limiter(Settings::default());
	let guard = limiter.guard(Rule::new("ip", "1/m", "60s").with_block(false));
	let mut req = request_from([172, 16, 0, 1]);

	assert_eq!(guard.check("g", &mut req).expect("Call should proceed."), GuardOutcome::Allowed);
	assert_eq!(guard.check("g", &mut req).expect("Call should proceed."), GuardOutcome::Annotated);
	assert_eq!(guard.check("g", &mut req).expect("Call should proceed."), GuardOutcome::Annotated);
	assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn concurrent_violations_install_at_most_one_ban() {
	let (limiter, harness) = build_test_limiter(Settings::default());
	let guard = limiter.guard(Rule::new("ip", "0/m", "60s").with_group("burst"));
	let denied = AtomicUsize::new(0);

	thread::scope(|s| {
		for _ in 0..16 {
			s.spawn(|| {
				let mut req = request_from([203, 0, 113, 7]);

				if guard.check("burst", &mut req).is_err() {
					denied.fetch_add(1, Ordering::SeqCst);
				}
			});
		}
	});

	assert_eq!(denied.load(Ordering::SeqCst), 16);
	assert_eq!(limiter.metrics.bans_installed(), 1);
	assert_eq!(harness.cache.len(), 1);
}
