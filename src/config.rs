//! Client configuration and its validating builder.

// std
use std::{collections::BTreeSet, iter::IntoIterator};
// self
use crate::{_prelude::*, error::ConfigError};

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL every request path is appended to.
	pub base_url: Url,
	/// Path of the designated renewal endpoint.
	pub renewal_path: String,
	/// Bounded wait applied to each renewal call.
	pub renewal_timeout: Duration,
	/// Optional bounded wait applied to ordinary calls and replays.
	pub request_timeout: Option<Duration>,
	/// Paths whose 401 responses are surfaced without attempting a renewal.
	pub exempt_paths: BTreeSet<String>,
}
impl ClientConfig {
	/// Default renewal endpoint path.
	pub const DEFAULT_RENEWAL_PATH: &'static str = "/auth/refresh";
	/// Default bounded wait for renewal calls.
	pub const DEFAULT_RENEWAL_TIMEOUT: Duration = Duration::seconds(30);

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Appends `path` to the base URL.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let joined = format!("{base}/{}", path.trim_start_matches('/'));

		Url::parse(&joined).map_err(|source| ConfigError::InvalidPath { path: path.into(), source })
	}

	/// Whether a 401 on `path` must be surfaced without renewal.
	///
	/// Paths are compared the way [`ClientConfig::resolve`] joins them: query and fragment are
	/// ignored and leading slashes are optional, so `auth/refresh` and `/auth/refresh` match.
	pub fn is_renewal_exempt(&self, path: &str) -> bool {
		let path = route_of(path);

		path == route_of(&self.renewal_path)
			|| self.exempt_paths.iter().any(|exempt| route_of(exempt) == path)
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL every request path is appended to.
	pub base_url: Url,
	/// Path of the designated renewal endpoint.
	pub renewal_path: String,
	/// Bounded wait applied to each renewal call.
	pub renewal_timeout: Duration,
	/// Optional bounded wait applied to ordinary calls.
	pub request_timeout: Option<Duration>,
	/// Paths whose 401 responses bypass renewal.
	pub exempt_paths: BTreeSet<String>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL and defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			renewal_path: ClientConfig::DEFAULT_RENEWAL_PATH.into(),
			renewal_timeout: ClientConfig::DEFAULT_RENEWAL_TIMEOUT,
			request_timeout: None,
			exempt_paths: BTreeSet::new(),
		}
	}

	/// Overrides the renewal endpoint path.
	pub fn renewal_path(mut self, path: impl Into<String>) -> Self {
		self.renewal_path = path.into();

		self
	}

	/// Overrides the bounded wait for renewal calls (defaults to 30 seconds).
	pub fn renewal_timeout(mut self, timeout: Duration) -> Self {
		self.renewal_timeout = timeout;

		self
	}

	/// Sets a bounded wait for ordinary calls.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Exempts a single path from renewal (e.g. the sign-in endpoint).
	pub fn exempt_path(mut self, path: impl Into<String>) -> Self {
		self.exempt_paths.insert(path.into());

		self
	}

	/// Exempts multiple paths from renewal.
	pub fn exempt_paths<I, S>(mut self, paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for path in paths.into_iter() {
			self.exempt_paths.insert(path.into());
		}

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let config = ClientConfig {
			base_url: self.base_url,
			renewal_path: self.renewal_path,
			renewal_timeout: self.renewal_timeout,
			request_timeout: self.request_timeout,
			exempt_paths: self
				.exempt_paths
				.iter()
				.map(|path| format!("/{}", route_of(path)))
				.collect(),
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	/// Re-checks invariants normally enforced by [`ClientConfigBuilder::build`].
	pub(crate) fn validate(&self) -> Result<(), ConfigError> {
		validate_base_url(&self.base_url)?;

		if !self.renewal_path.starts_with('/') {
			return Err(ConfigError::InvalidRenewalPath { path: self.renewal_path.clone() });
		}

		validate_timeout("renewal", self.renewal_timeout)?;

		if let Some(timeout) = self.request_timeout {
			validate_timeout("request", timeout)?;
		}

		self.resolve(&self.renewal_path)?;

		Ok(())
	}
}

fn validate_base_url(url: &Url) -> Result<(), ConfigError> {
	if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() {
		Ok(())
	} else {
		Err(ConfigError::InvalidBaseUrl { url: url.to_string() })
	}
}

fn validate_timeout(field: &'static str, timeout: Duration) -> Result<(), ConfigError> {
	if timeout.is_positive() { Ok(()) } else { Err(ConfigError::NonPositiveTimeout { field }) }
}

// Route portion of a request path: no query, no fragment, no leading slashes.
fn route_of(path: &str) -> &str {
	path.split(['?', '#']).next().unwrap_or(path).trim_start_matches('/')
}
