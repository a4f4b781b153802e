/// Reference to a user record.
pub type UserRef = i64;
