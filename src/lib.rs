//! Session-aware HTTP request client that recovers from expired short-lived credentials with a
//! single-flight renewal and a replay-once guarantee, so a burst of 401s never turns into a
//! burst of renewal calls.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod ext;
pub mod http;
pub mod obs;
pub mod renewal;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
