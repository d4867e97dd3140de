// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for session renewals.
#[derive(Debug, Default)]
pub struct RenewalMetrics {
	started: AtomicU64,
	joined: AtomicU64,
	renewed: AtomicU64,
	failed: AtomicU64,
}
impl RenewalMetrics {
	/// Returns the number of renewal calls actually sent to the renewal endpoint.
	pub fn started(&self) -> u64 {
		self.started.load(Ordering::Relaxed)
	}

	/// Returns the number of callers that attached to an already pending renewal.
	pub fn joined(&self) -> u64 {
		self.joined.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals that re-established the session.
	pub fn renewed(&self) -> u64 {
		self.renewed.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals that failed.
	pub fn failed(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	pub(crate) fn record_start(&self) {
		self.started.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joined.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewed(&self) {
		self.renewed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failed(&self) {
		self.failed.fetch_add(1, Ordering::Relaxed);
	}
}
