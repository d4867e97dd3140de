#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use session_broker::{
	client::{ReqwestSessionClient, SessionClient},
	config::ClientConfig,
	error::Error,
	http::ReqwestTransport,
	renewal::RenewalFailure,
	reqwest::{Client, cookie::Jar},
	url::Url,
};

const RENEWAL_PATH: &str = "/auth/refresh";

fn build_client(server: &MockServer, session_cookie: &str) -> ReqwestSessionClient {
	build_client_with_timeout(server, session_cookie, ClientConfig::DEFAULT_RENEWAL_TIMEOUT)
}

fn build_client_with_timeout(
	server: &MockServer,
	session_cookie: &str,
	renewal_timeout: Duration,
) -> ReqwestSessionClient {
	let base = Url::parse(&server.base_url()).expect("Mock server base URL should parse.");
	let jar = Arc::new(Jar::default());

	jar.add_cookie_str(session_cookie, &base);

	// The mock server terminates TLS with a self-signed certificate.
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.cookie_provider(jar)
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Cookie-backed test client should build."),
	);
	let config = ClientConfig::builder(base)
		.renewal_path(RENEWAL_PATH)
		.renewal_timeout(renewal_timeout)
		.build()
		.expect("Client config should build for the mock server.");

	SessionClient::with_transport(config, transport).expect("Session client should build.")
}

#[tokio::test]
async fn concurrent_expiries_share_one_renewal_and_both_replays_succeed() {
	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings").header("cookie", "session=stale");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"detail\":\"Token expired\"}");
		})
		.await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path(RENEWAL_PATH).header("cookie", "session=stale");
			then.status(204)
				.header("set-cookie", "session=fresh; Path=/")
				.delay(std::time::Duration::from_millis(300));
		})
		.await;
	let renewed = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings").header("cookie", "session=fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"room\":\"A1\"}]");
		})
		.await;
	let client = build_client(&server, "session=stale");
	let (first, second) = tokio::join!(client.get("/bookings"), client.get("/bookings"));
	let first = first.expect("First call should succeed after renewal.");
	let second = second.expect("Second call should succeed after renewal.");
	let bookings: serde_json::Value =
		first.json().expect("Replayed bookings payload should decode.");

	assert_eq!(bookings[0]["room"], "A1");
	assert_eq!(first.body, second.body);

	renewal.assert_calls_async(1).await;
	expired.assert_calls_async(2).await;
	renewed.assert_calls_async(2).await;

	assert_eq!(client.renewal_metrics().started(), 1);
	assert_eq!(client.renewal_metrics().joined(), 1);
}

#[tokio::test]
async fn unauthorized_replay_surfaces_without_a_second_renewal() {
	let server = MockServer::start_async().await;
	let protected = server
		.mock_async(|when, then| {
			when.method(GET).path("/messages");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"detail\":\"Account suspended\"}");
		})
		.await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path(RENEWAL_PATH);
			then.status(204).header("set-cookie", "session=fresh; Path=/");
		})
		.await;
	let client = build_client(&server, "session=stale");
	let err = client.get("/messages").await.expect_err("Replay 401 should surface.");

	assert!(matches!(err, Error::Unauthorized { ref detail } if detail == "Account suspended"));
	assert!(err.is_authentication());

	protected.assert_calls_async(2).await;
	renewal.assert_calls_async(1).await;
}

#[tokio::test]
async fn later_expiry_triggers_an_independent_renewal() {
	let server = MockServer::start_async().await;
	let first_renewal = server
		.mock_async(|when, then| {
			when.method(POST).path(RENEWAL_PATH).header("cookie", "session=stale");
			then.status(204).header("set-cookie", "session=fresh; Path=/");
		})
		.await;
	let second_renewal = server
		.mock_async(|when, then| {
			when.method(POST).path(RENEWAL_PATH).header("cookie", "session=fresh");
			then.status(204).header("set-cookie", "session=rotated; Path=/");
		})
		.await;
	let bookings_expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings").header("cookie", "session=stale");
			then.status(401).body("{\"detail\":\"Token expired\"}");
		})
		.await;
	let bookings_ok = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings").header("cookie", "session=fresh");
			then.status(200).body("[]");
		})
		.await;
	let notifications_expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/notifications").header("cookie", "session=fresh");
			then.status(401).body("{\"detail\":\"Token expired\"}");
		})
		.await;
	let notifications_ok = server
		.mock_async(|when, then| {
			when.method(GET).path("/notifications").header("cookie", "session=rotated");
			then.status(200).body("{\"unread\":3}");
		})
		.await;
	let client = build_client(&server, "session=stale");

	client.get("/bookings").await.expect("First expiry should recover.");

	let unread: serde_json::Value = client
		.get("/notifications")
		.await
		.expect("Second expiry should recover.")
		.json()
		.expect("Notification payload should decode.");

	assert_eq!(unread["unread"], 3);

	first_renewal.assert_calls_async(1).await;
	second_renewal.assert_calls_async(1).await;
	bookings_expired.assert_calls_async(1).await;
	bookings_ok.assert_calls_async(1).await;
	notifications_expired.assert_calls_async(1).await;
	notifications_ok.assert_calls_async(1).await;

	assert_eq!(client.renewal_metrics().started(), 2);
}

#[tokio::test]
async fn non_authorization_failures_pass_through_without_renewal() {
	let server = MockServer::start_async().await;
	let missing = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/bookings/42");
			then.status(404)
				.header("content-type", "application/json")
				.body("{\"detail\":\"Booking not found\"}");
		})
		.await;
	let broken = server
		.mock_async(|when, then| {
			when.method(PATCH).path("/profile").json_body(serde_json::json!({ "name": "Ada" }));
			then.status(500).body("upstream exploded");
		})
		.await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path(RENEWAL_PATH);
			then.status(204);
		})
		.await;
	let client = build_client(&server, "session=stale");
	let err = client.delete("/bookings/42").await.expect_err("404 should surface.");

	assert!(
		matches!(err, Error::Api { status: 404, ref detail } if detail == "Booking not found")
	);

	let err = client
		.patch("/profile", &serde_json::json!({ "name": "Ada" }))
		.await
		.expect_err("500 should surface.");

	assert_eq!(err.status(), Some(500));
	assert_eq!(err.detail(), Some("upstream exploded"));

	missing.assert_calls_async(1).await;
	broken.assert_calls_async(1).await;
	renewal.assert_calls_async(0).await;
}

#[tokio::test]
async fn transport_failures_surface_without_renewal() {
	let base = Url::parse("http://127.0.0.1:9").expect("Closed-port URL should parse.");
	let config = ClientConfig::builder(base).build().expect("Client config should build.");
	let client = SessionClient::new(config).expect("Default reqwest client should build.");
	let err = client.get("/bookings").await.expect_err("Connection refusal should surface.");

	assert!(matches!(err, Error::Transport(_)));
	assert!(!err.is_authentication());
	assert_eq!(client.renewal_metrics().started(), 0);
}

#[tokio::test]
async fn slow_renewal_endpoint_times_out_for_the_caller() {
	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings");
			then.status(401).body("{\"detail\":\"Token expired\"}");
		})
		.await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path(RENEWAL_PATH);
			then.status(204)
				.header("set-cookie", "session=fresh; Path=/")
				.delay(std::time::Duration::from_secs(3));
		})
		.await;
	let client = build_client_with_timeout(&server, "session=stale", Duration::milliseconds(200));
	let err = client.get("/bookings").await.expect_err("Slow renewal should time out.");

	assert!(matches!(err, Error::Renewal(RenewalFailure::TimedOut { .. })));
	assert!(err.is_authentication());

	expired.assert_calls_async(1).await;
	renewal.assert_calls_async(1).await;

	assert_eq!(client.renewal_metrics().failed(), 1);
}
