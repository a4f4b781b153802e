use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
	response::Html,
};
use bloghub_api_model::{
	MessageResponse,
	comment::{ApiComment, NewCommentRequest},
	post::{
		ApiPost, ApiPostDetail, NewPostRequest, PostListResponse, SearchResponse,
		UpdatePostRequest,
	},
};
use bloghub_backend_model::{db::types::PostState, post::PostRef};
use bloghub_backend_service::post::PostChanges;
use serde::Deserialize;

use crate::routes::WebServices;

use super::{
	api_comment, api_post,
	auth::{Identity, MaybeIdentity},
	error::{ApiError, ApiResult, OptionExt},
	format_timestamp,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
	pub page: Option<u32>,
	pub per_page: Option<u32>,
}

pub async fn list_posts(
	State(services): State<WebServices>,
	Query(query): Query<ListQuery>,
) -> ApiResult<Json<PostListResponse>> {
	let page = query.page.unwrap_or(1).max(1);
	let posts = services
		.backend
		.post
		.list_published(page, query.per_page)
		.await?;
	Ok(Json(PostListResponse {
		posts: posts.into_iter().map(api_post).collect(),
		page,
	}))
}

pub async fn create_post(
	Identity(user): Identity,
	State(services): State<WebServices>,
	Json(req): Json<NewPostRequest>,
) -> ApiResult<(StatusCode, Json<ApiPost>)> {
	let record = services
		.backend
		.post
		.create(user.id, &req.title, &req.content, &req.tags)
		.await?;
	Ok((StatusCode::CREATED, Json(api_post(record))))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
	pub q: Option<String>,
	pub tags: Option<String>,
}

/// Searches published posts.
///
/// `tags` takes precedence over the keyword when both are given; with
/// neither, the result set is empty.
pub async fn search(
	State(services): State<WebServices>,
	Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
	let posts = match (query.tags, query.q) {
		(Some(tags), _) => services.backend.post.filter_by_tags(&tags).await?,
		(None, Some(keyword)) => services.backend.post.search(&keyword).await?,
		(None, None) => Vec::new(),
	};
	let results: Vec<ApiPost> = posts.into_iter().map(api_post).collect();
	let count = results.len();
	Ok(Json(SearchResponse { results, count }))
}

pub async fn get_post(
	MaybeIdentity(user): MaybeIdentity,
	State(services): State<WebServices>,
	Path(post): Path<PostRef>,
) -> ApiResult<Json<ApiPostDetail>> {
	let record = services
		.backend
		.post
		.get(post)
		.await?
		.or_api_error(StatusCode::NOT_FOUND, "post not found")?;

	// drafts are visible to their author and admins only
	let is_admin = user.as_ref().is_some_and(|user| user.is_admin);
	if record.state() == PostState::Draft {
		let is_author = user.as_ref().is_some_and(|user| user.id == record.author);
		if !is_author && !is_admin {
			return Err(ApiError::CustomRef(StatusCode::NOT_FOUND, "post not found"));
		}
	}

	let comments = services
		.backend
		.comment
		.list_for_post(post, is_admin)
		.await?;
	Ok(Json(ApiPostDetail {
		post: api_post(record),
		comments: comments
			.into_iter()
			.map(|(record, username)| api_comment(record, username))
			.collect(),
	}))
}

pub async fn update_post(
	Identity(user): Identity,
	State(services): State<WebServices>,
	Path(post): Path<PostRef>,
	Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<ApiPost>> {
	let changes = PostChanges {
		title: req.title,
		content: req.content,
		tags: req.tags,
	};
	let record = services.backend.post.update(post, user.id, changes).await?;
	Ok(Json(api_post(record)))
}

pub async fn delete_post(
	Identity(user): Identity,
	State(services): State<WebServices>,
	Path(post): Path<PostRef>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
	services
		.backend
		.post
		.delete(post, user.id, user.is_admin)
		.await?;
	Ok((StatusCode::ACCEPTED, Json(MessageResponse::new("post deleted"))))
}

pub async fn publish_post(
	Identity(user): Identity,
	State(services): State<WebServices>,
	Path(post): Path<PostRef>,
) -> ApiResult<Json<ApiPost>> {
	let record = services.backend.post.publish(post, user.id).await?;
	Ok(Json(api_post(record)))
}

/// A minimal HTML rendering of a post.
///
/// Drafts render for their author and admins only. All stored text is
/// escaped before interpolation.
pub async fn preview_post(
	MaybeIdentity(user): MaybeIdentity,
	State(services): State<WebServices>,
	Path(post): Path<PostRef>,
) -> ApiResult<Html<String>> {
	let record = services
		.backend
		.post
		.get(post)
		.await?
		.or_api_error(StatusCode::NOT_FOUND, "post not found")?;
	if record.state() == PostState::Draft {
		let allowed = user
			.as_ref()
			.is_some_and(|user| user.id == record.author || user.is_admin);
		if !allowed {
			return Err(ApiError::CustomRef(StatusCode::NOT_FOUND, "post not found"));
		}
	}
	let author = services
		.backend
		.user
		.username_of(record.author)
		.await?
		.unwrap_or_else(|| "unknown".into());

	Ok(Html(format!(
		"<!DOCTYPE html>\n<html><head><title>{title}</title></head>\n\
		 <body><h1>{title}</h1>\n<p class=\"byline\">by {author} on {date}</p>\n\
		 <div class=\"content\">{content}</div></body></html>\n",
		title = escape_html(&record.title),
		author = escape_html(&author),
		date = format_timestamp(record.created_at),
		content = escape_html(&record.content),
	)))
}

fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			other => escaped.push(other),
		}
	}
	escaped
}

pub async fn list_comments(
	MaybeIdentity(user): MaybeIdentity,
	State(services): State<WebServices>,
	Path(post): Path<PostRef>,
) -> ApiResult<Json<Vec<ApiComment>>> {
	let include_pending = user.is_some_and(|user| user.is_admin);
	let comments = services
		.backend
		.comment
		.list_for_post(post, include_pending)
		.await?;
	Ok(Json(
		comments
			.into_iter()
			.map(|(record, username)| api_comment(record, username))
			.collect(),
	))
}

pub async fn add_comment(
	Identity(user): Identity,
	State(services): State<WebServices>,
	Path(post): Path<PostRef>,
	Json(req): Json<NewCommentRequest>,
) -> ApiResult<(StatusCode, Json<ApiComment>)> {
	let record = services
		.backend
		.comment
		.add(post, user.id, &req.content)
		.await?;
	let comment = api_comment(record, user.username);
	Ok((StatusCode::CREATED, Json(comment)))
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use bloghub_backend_service::{
		BackendServices, database::DatabaseConfig, session::SessionUser,
	};

	use crate::config::{BlogConfig, WebConfig};

	use super::*;

	async fn test_services() -> WebServices {
		let config = BlogConfig {
			web: WebConfig {
				listen: "tcp://127.0.0.1:0".into(),
			},
			database: DatabaseConfig {
				url: "sqlite://:memory:".into(),
				max_connections: 1,
			},
			auth: Default::default(),
			content: Default::default(),
		};
		let backend = BackendServices::new(config.clone().try_into().unwrap())
			.await
			.unwrap();
		WebServices {
			config: Arc::new(config),
			backend,
		}
	}

	#[tokio::test]
	async fn test_search_without_terms_is_empty() {
		let services = test_services().await;
		let Json(body) = search(
			State(services),
			Query(SearchQuery {
				q: None,
				tags: None,
			}),
		)
		.await
		.unwrap();
		assert_eq!(body.count, 0);
		assert!(body.results.is_empty());
	}

	#[tokio::test]
	async fn test_preview_draft_visibility() {
		let services = test_services().await;
		let alice = services
			.backend
			.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();
		let post = services
			.backend
			.post
			.create(alice, "Draft Post", "not yet public", "")
			.await
			.unwrap();

		// anonymous callers cannot tell the draft exists
		let anon = preview_post(MaybeIdentity(None), State(services.clone()), Path(post.id)).await;
		assert!(anon.is_err());

		// the author previews their own draft
		let author = SessionUser {
			id: alice,
			username: "alice".into(),
			is_admin: false,
		};
		let Html(page) = preview_post(
			MaybeIdentity(Some(author)),
			State(services.clone()),
			Path(post.id),
		)
		.await
		.unwrap();
		assert!(page.contains("Draft Post"));

		// other users get the same 404 as anonymous callers
		let other = SessionUser {
			id: alice + 1,
			username: "bob".into(),
			is_admin: false,
		};
		let denied = preview_post(MaybeIdentity(Some(other)), State(services), Path(post.id)).await;
		assert!(denied.is_err());
	}

	#[test]
	fn test_escape_html() {
		assert_eq!(
			escape_html("<script>alert('x')</script>"),
			"&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
		);
		assert_eq!(escape_html("a & b"), "a &amp; b");
		assert_eq!(escape_html("plain"), "plain");
	}
}
