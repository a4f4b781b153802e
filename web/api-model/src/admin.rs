use serde::{Deserialize, Serialize};

use crate::auth::ApiUser;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
	pub users: Vec<ApiUser>,
}

/// Aggregate service statistics.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ApiStats {
	pub total_users: i64,
	pub total_posts: i64,
	pub total_comments: i64,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct PurgePostsRequest {
	/// Age threshold in days; posts older than this are deleted.
	pub days: u32,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct PurgePostsResponse {
	pub deleted: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
	pub status: String,
	pub version: String,
}
