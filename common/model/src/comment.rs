use serde::{Deserialize, Serialize};

/// Moderation status of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
	/// Held for moderation.
	///
	/// Pending comments are only shown to moderators. Whether new
	/// comments start here depends on the `auto-approve-comments`
	/// setting.
	Pending,
	/// Approved for public display.
	Approved,
}
