use axum::{
	Json, Router,
	extract::State,
	routing::{get, post},
};
use bloghub_api_model::{
	admin::{ApiStats, HealthResponse},
	auth::ApiUser,
	comment::ApiComment,
	post::ApiPost,
};
use bloghub_backend_service::{comment::CommentRecord, post::PostRecord, user::UserProfile};
use time::{PrimitiveDateTime, format_description::well_known::Rfc3339};

use super::WebServices;

mod admin;
pub mod auth;
pub mod error;
mod posts;

use error::ApiResult;

pub fn api_router() -> Router<WebServices> {
	Router::new()
		.route("/", get(handler))
		.route("/health", get(health))
		.route("/stats", get(stats))
		.route("/auth/register", post(auth::register))
		.route("/auth/login", post(auth::login))
		.route("/auth/logout", post(auth::logout))
		.route("/auth/reset-password", post(auth::reset_password))
		.route("/auth/change-password", post(auth::change_password))
		.route("/auth/profile/{username}", get(auth::profile))
		.route("/posts", get(posts::list_posts).post(posts::create_post))
		.route("/posts/search", get(posts::search))
		.route(
			"/posts/{post}",
			get(posts::get_post)
				.patch(posts::update_post)
				.delete(posts::delete_post),
		)
		.route("/posts/{post}/publish", post(posts::publish_post))
		.route("/posts/{post}/preview", get(posts::preview_post))
		.route(
			"/posts/{post}/comments",
			get(posts::list_comments).post(posts::add_comment),
		)
		.route("/admin/users", get(admin::list_users))
		.route("/admin/users/{user}/promote", post(admin::promote_user))
		.route(
			"/admin/comments/{comment}/approve",
			post(admin::approve_comment),
		)
		.route("/admin/posts/purge", post(admin::purge_posts))
}

async fn handler() -> &'static str {
	concat!("BlogHub ", env!("CARGO_PKG_VERSION"))
}

async fn health() -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "healthy".into(),
		version: env!("CARGO_PKG_VERSION").into(),
	})
}

async fn stats(State(services): State<WebServices>) -> ApiResult<Json<ApiStats>> {
	let backend = &services.backend;
	Ok(Json(ApiStats {
		total_users: backend.user.count().await?,
		total_posts: backend.post.count_published().await?,
		total_comments: backend.comment.count().await?,
	}))
}

/// Renders a stored timestamp for the wire.
///
/// Timestamp columns hold naive UTC times.
pub(crate) fn format_timestamp(ts: PrimitiveDateTime) -> String {
	ts.assume_utc()
		.format(&Rfc3339)
		.unwrap_or_else(|_| ts.to_string())
}

pub(crate) fn api_post(record: PostRecord) -> ApiPost {
	let status = record.state().into();
	ApiPost {
		id: record.id,
		title: record.title,
		slug: record.slug,
		content: record.content,
		tags: record.tags,
		author: record.author,
		status,
		created_at: format_timestamp(record.created_at),
		updated_at: format_timestamp(record.updated_at),
	}
}

pub(crate) fn api_comment(record: CommentRecord, username: String) -> ApiComment {
	let status = record.state().into();
	ApiComment {
		id: record.id,
		post: record.post,
		author: record.author,
		username,
		content: record.content,
		status,
		created_at: format_timestamp(record.created_at),
	}
}

pub(crate) fn api_user(profile: UserProfile) -> ApiUser {
	ApiUser {
		id: profile.id,
		username: profile.username,
		email: profile.email,
		is_admin: profile.is_admin,
		created_at: format_timestamp(profile.created_at),
	}
}
