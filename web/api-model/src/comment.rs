use bloghub_common_model::comment::CommentStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ApiComment {
	pub id: i64,
	pub post: i64,
	pub author: i64,
	/// Username of the author, joined in for display.
	pub username: String,
	pub content: String,
	pub status: CommentStatus,
	pub created_at: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct NewCommentRequest {
	pub content: String,
}
