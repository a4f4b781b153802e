use bloghub_common_model::post::PostStatus;
use serde::{Deserialize, Serialize};

use crate::comment::ApiComment;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ApiPost {
	pub id: i64,
	pub title: String,
	pub slug: String,
	pub content: String,
	/// Comma-separated tag list, as authored.
	pub tags: String,
	pub author: i64,
	pub status: PostStatus,
	pub created_at: String,
	pub updated_at: String,
}

/// A post together with its visible comments.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ApiPostDetail {
	#[serde(flatten)]
	pub post: ApiPost,
	pub comments: Vec<ApiComment>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct NewPostRequest {
	pub title: String,
	pub content: String,
	#[serde(default)]
	pub tags: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
	pub title: Option<String>,
	pub content: Option<String>,
	pub tags: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
	pub posts: Vec<ApiPost>,
	pub page: u32,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub results: Vec<ApiPost>,
	pub count: usize,
}
