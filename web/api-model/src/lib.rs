//! Wire types for the BlogHub HTTP API.
//!
//! Timestamps are RFC 3339 strings; identifiers are the numeric record
//! ids of the backing store.

use serde::{Deserialize, Serialize};

pub mod admin;
pub mod auth;
pub mod comment;
pub mod post;

/// Generic acknowledgement body.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
	pub message: String,
}

impl MessageResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}
