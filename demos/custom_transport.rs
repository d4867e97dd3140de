//! Demonstrates plugging a non-reqwest transport into the session client.
//!
//! 1. Implement [`HttpTransport`] so every call carries the ambient session (here an in-memory
//!    session generation) and the renewal response re-establishes it.
//! 2. Hand the transport to [`SessionClient::with_transport`].
//! 3. Fire a burst of calls against an expired session and observe that they share a single
//!    renewal before each one is replayed exactly once.

// std
use std::sync::{
	Arc,
	atomic::{AtomicBool, AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
use time::Duration;
use url::Url;
// self
use session_broker::{
	client::SessionClient,
	config::ClientConfig,
	ext::SessionListener,
	http::{HttpTransport, TransportFuture, TransportRequest, TransportResponse},
	renewal::RenewalFailure,
};

const RENEWAL_PATH: &str = "/session/renew";

/// Toy backend that keeps the session flag in process memory.
#[derive(Default)]
struct InMemoryBackend {
	session_valid: AtomicBool,
	renewals: AtomicUsize,
	calls: AtomicUsize,
}
impl HttpTransport for InMemoryBackend {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if request.url.path() == RENEWAL_PATH {
				// Give the rest of the burst time to pile up behind the pending renewal.
				tokio::time::sleep(std::time::Duration::from_millis(50)).await;

				self.renewals.fetch_add(1, Ordering::SeqCst);
				self.session_valid.store(true, Ordering::SeqCst);

				return Ok(TransportResponse::new(204, Vec::new()));
			}
			if !self.session_valid.load(Ordering::SeqCst) {
				return Ok(TransportResponse::new(401, r#"{"detail":"Session expired"}"#));
			}

			let body = serde_json::json!({
				"path": request.url.path(),
				"replayed": request.replay,
			});

			Ok(TransportResponse::new(200, body.to_string()))
		})
	}
}

struct PrintingListener;
impl SessionListener for PrintingListener {
	fn session_renewed(&self) {
		println!("session renewed");
	}

	fn session_expired(&self, failure: &RenewalFailure) {
		println!("session expired for good: {failure}");
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let backend = Arc::new(InMemoryBackend::default());
	let config = ClientConfig::builder(Url::parse("https://api.example.com")?)
		.renewal_path(RENEWAL_PATH)
		.renewal_timeout(Duration::seconds(5))
		.build()?;
	let client = SessionClient::<InMemoryBackend>::with_transport(config, backend.clone())?
		.with_session_listener(Arc::new(PrintingListener));
	let paths = ["/bookings", "/messages", "/notifications", "/profile"];
	let mut tasks = tokio::task::JoinSet::new();

	for path in paths {
		let client = client.clone();

		tasks.spawn(async move { client.get(path).await });
	}
	while let Some(joined) = tasks.join_next().await {
		let payload = joined??;
		let echo: serde_json::Value = payload.json()?;

		println!("{} -> {echo}", payload.status);
	}

	let metrics = client.renewal_metrics();

	println!(
		"renewals sent: {} (backend saw {}), callers joined: {}, outbound calls: {}",
		metrics.started(),
		backend.renewals.load(Ordering::SeqCst),
		metrics.joined(),
		backend.calls.load(Ordering::SeqCst),
	);

	Ok(())
}
