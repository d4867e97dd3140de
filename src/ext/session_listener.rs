//! Session lifecycle notifications emitted by the renewal coordinator.

// self
use crate::renewal::RenewalFailure;

/// Observer notified once per settled renewal, regardless of how many calls were waiting on it.
///
/// Notifications run synchronously on the task that drove the renewal, after the in-flight
/// renewal has been cleared and before any waiting call resumes. Implementations should return
/// quickly and must not issue calls through the same client from inside the callback.
pub trait SessionListener
where
	Self: Send + Sync,
{
	/// The renewal endpoint accepted the session; waiting calls are about to replay.
	fn session_renewed(&self) {}

	/// The session could not be renewed; every waiting call is about to fail with `failure`.
	///
	/// Typical implementations route the user back to sign-in.
	fn session_expired(&self, failure: &RenewalFailure) {
		let _ = failure;
	}
}
