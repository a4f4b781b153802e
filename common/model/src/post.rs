use serde::{Deserialize, Serialize};

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
	/// Visible only to its author.
	///
	/// All posts start in this status. Drafts never appear in public
	/// listings or search results.
	Draft,
	/// Publicly visible.
	Published,
}
