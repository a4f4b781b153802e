use serde::{Deserialize, Serialize};

use crate::database::DatabaseConfig;

#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
pub struct BackendConfig {
	pub database: DatabaseConfig,
	#[serde(default)]
	pub auth: AuthConfig,
	#[serde(default)]
	pub content: ContentConfig,
}

/// Account and session settings.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthConfig {
	/// Whether new accounts may register themselves.
	#[serde(default = "default_true")]
	pub enable_registration: bool,
	/// Login session lifetime, in hours.
	#[serde(default = "default_session_ttl")]
	pub session_ttl_hours: u32,
	/// Password-reset token lifetime, in minutes.
	#[serde(default = "default_reset_ttl")]
	pub reset_token_ttl_minutes: u32,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			enable_registration: true,
			session_ttl_hours: default_session_ttl(),
			reset_token_ttl_minutes: default_reset_ttl(),
		}
	}
}

/// Content listing and moderation settings.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContentConfig {
	#[serde(default = "default_posts_per_page")]
	pub posts_per_page: u32,
	#[serde(default = "default_comments_per_page")]
	pub comments_per_page: u32,
	#[serde(default = "default_true")]
	pub enable_comments: bool,
	/// When set, new comments skip the moderation queue.
	#[serde(default = "default_true")]
	pub auto_approve_comments: bool,
}

impl Default for ContentConfig {
	fn default() -> Self {
		Self {
			posts_per_page: default_posts_per_page(),
			comments_per_page: default_comments_per_page(),
			enable_comments: true,
			auto_approve_comments: true,
		}
	}
}

fn default_true() -> bool {
	true
}

// 7 days
fn default_session_ttl() -> u32 {
	168
}

fn default_reset_ttl() -> u32 {
	30
}

fn default_posts_per_page() -> u32 {
	10
}

fn default_comments_per_page() -> u32 {
	20
}
