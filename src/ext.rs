//! Public extension contracts.
//!
//! The crate ships no concrete listeners; embedding applications implement these traits to
//! react to session lifecycle changes without coupling the request layer to their UI or
//! routing code.

pub mod session_listener;

pub use session_listener::*;
