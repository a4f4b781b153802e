/// Reference to a comment record.
pub type CommentRef = i64;
