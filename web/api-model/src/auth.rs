use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
	pub username: String,
	pub email: String,
	pub password: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
	pub user_id: i64,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub username: String,
	pub password: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
	/// Bearer token for the `Authorization` header.
	pub token: String,
	pub user: ApiSessionUser,
}

/// The identity attached to a login session.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ApiSessionUser {
	pub id: i64,
	pub username: String,
	pub is_admin: bool,
}

/// Public account representation.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ApiUser {
	pub id: i64,
	pub username: String,
	pub email: String,
	pub is_admin: bool,
	pub created_at: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
	pub email: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ResetPasswordResponse {
	pub message: String,
	/// Present only when an account matched.
	///
	/// Development convenience; a mail transport would carry this
	/// instead.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reset_token: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
	pub email: String,
	pub token: String,
	pub new_password: String,
}
