use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};
use bloghub_api_model::{
	MessageResponse,
	admin::{PurgePostsRequest, PurgePostsResponse, UserListResponse},
};
use bloghub_backend_model::{comment::CommentRef, user::UserRef};
use serde::Deserialize;

use crate::routes::WebServices;

use super::{
	api_user,
	auth::AdminIdentity,
	error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct UserFilter {
	/// Restrict the listing to admins (`true`) or regular users (`false`).
	pub admin: Option<bool>,
}

pub async fn list_users(
	AdminIdentity(_): AdminIdentity,
	State(services): State<WebServices>,
	Query(filter): Query<UserFilter>,
) -> ApiResult<Json<UserListResponse>> {
	let users = services.backend.user.list(filter.admin).await?;
	Ok(Json(UserListResponse {
		users: users.into_iter().map(api_user).collect(),
	}))
}

pub async fn promote_user(
	AdminIdentity(_): AdminIdentity,
	State(services): State<WebServices>,
	Path(user): Path<UserRef>,
) -> ApiResult<Json<MessageResponse>> {
	services.backend.user.promote(user).await?;
	Ok(Json(MessageResponse::new("user promoted")))
}

pub async fn approve_comment(
	AdminIdentity(_): AdminIdentity,
	State(services): State<WebServices>,
	Path(comment): Path<CommentRef>,
) -> ApiResult<Json<MessageResponse>> {
	services.backend.comment.approve(comment).await?;
	Ok(Json(MessageResponse::new("comment approved")))
}

pub async fn purge_posts(
	AdminIdentity(_): AdminIdentity,
	State(services): State<WebServices>,
	Json(req): Json<PurgePostsRequest>,
) -> ApiResult<Json<PurgePostsResponse>> {
	if req.days == 0 {
		return Err(ApiError::CustomRef(
			StatusCode::BAD_REQUEST,
			"days must be at least 1",
		));
	}
	let deleted = services.backend.post.purge_older_than(req.days).await?;
	Ok(Json(PurgePostsResponse { deleted }))
}
