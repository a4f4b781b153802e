use bloghub_common_model::{comment::CommentStatus, post::PostStatus};

/// Publication state of a post.
///
/// Stored as a tiny unsigned column. Unknown values are decoded as draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PostState {
	/// State for posts visible only to their author.
	///
	/// Draft posts are excluded from public listings and search.
	#[default]
	Draft = 0,
	/// State for publicly visible posts.
	Published = 1,
}

impl From<i16> for PostState {
	fn from(value: i16) -> Self {
		match value {
			0 => Self::Draft,
			1 => Self::Published,
			_ => Self::Draft,
		}
	}
}

impl From<PostState> for PostStatus {
	fn from(value: PostState) -> Self {
		match value {
			PostState::Draft => Self::Draft,
			PostState::Published => Self::Published,
		}
	}
}

impl From<PostStatus> for PostState {
	fn from(value: PostStatus) -> Self {
		match value {
			PostStatus::Draft => Self::Draft,
			PostStatus::Published => Self::Published,
		}
	}
}

/// Moderation state of a comment.
///
/// Stored as a tiny unsigned column. Unknown values are decoded as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CommentState {
	/// State for comments held for moderation.
	///
	/// Pending comments are hidden from public comment listings.
	#[default]
	Pending = 0,
	/// State for comments approved for display.
	Approved = 1,
}

impl From<i16> for CommentState {
	fn from(value: i16) -> Self {
		match value {
			0 => Self::Pending,
			1 => Self::Approved,
			_ => Self::Pending,
		}
	}
}

impl From<CommentState> for CommentStatus {
	fn from(value: CommentState) -> Self {
		match value {
			CommentState::Pending => Self::Pending,
			CommentState::Approved => Self::Approved,
		}
	}
}

impl From<CommentStatus> for CommentState {
	fn from(value: CommentStatus) -> Self {
		match value {
			CommentStatus::Pending => Self::Pending,
			CommentStatus::Approved => Self::Approved,
		}
	}
}
