use std::sync::Arc;

use bloghub_backend_model::{
	comment::CommentRef,
	db::{now_utc, schema, types::CommentState},
	post::PostRef,
	user::UserRef,
};
use diesel::{
	ExpressionMethods, OptionalExtension, QueryDsl, Queryable, RunQueryDsl, Selectable,
	SelectableHelper, insert_into, update,
};
use thiserror::Error;
use time::PrimitiveDateTime;
use tracing::info;

use crate::{Result, config::BackendConfig, database::DatabaseService};

use schema::comment::dsl;

/// Comment service.
#[derive(Debug)]
pub struct CommentService {
	db: Arc<DatabaseService>,
	config: Arc<BackendConfig>,
}

/// A full comment row.
#[derive(Debug, PartialEq, Eq, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::comment)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommentRecord {
	pub id: CommentRef,
	pub post: PostRef,
	pub author: UserRef,
	pub content: String,
	pub state: i16,
	pub created_at: PrimitiveDateTime,
}

impl CommentRecord {
	pub fn state(&self) -> CommentState {
		CommentState::from(self.state)
	}
}

impl CommentService {
	pub fn new(db: Arc<DatabaseService>, config: Arc<BackendConfig>) -> Self {
		Self { db, config }
	}

	/// Adds a comment to an existing post.
	///
	/// The initial state follows the `auto-approve-comments` setting.
	pub async fn add(
		&self,
		post: PostRef,
		author: UserRef,
		content: &str,
	) -> Result<CommentRecord> {
		if !self.config.content.enable_comments {
			return Err(CommentError::CommentsDisabled.into());
		}
		if content.is_empty() {
			return Err(CommentError::EmptyContent.into());
		}

		let mut conn = self.db.get().await?;
		use schema::post::dsl as post_dsl;
		let exists: Option<PostRef> = post_dsl::post
			.select(post_dsl::id)
			.filter(post_dsl::id.eq(post))
			.first(&mut *conn)
			.optional()?;
		if exists.is_none() {
			return Err(CommentError::PostNotFound.into());
		}

		let state = if self.config.content.auto_approve_comments {
			CommentState::Approved
		} else {
			CommentState::Pending
		};
		let record = insert_into(dsl::comment)
			.values((
				dsl::post.eq(post),
				dsl::author.eq(author),
				dsl::content.eq(content),
				dsl::state.eq(state as i16),
				dsl::created_at.eq(now_utc()),
			))
			.returning(CommentRecord::as_returning())
			.get_result(&mut *conn)?;
		info!(id = record.id, post, "added comment");

		Ok(record)
	}

	/// Lists a post's comments with author usernames, oldest first.
	///
	/// Pending comments are included only on request (moderation view).
	pub async fn list_for_post(
		&self,
		post: PostRef,
		include_pending: bool,
	) -> Result<Vec<(CommentRecord, String)>> {
		use schema::user;

		let mut conn = self.db.get().await?;
		let mut query = dsl::comment
			.inner_join(user::table)
			.filter(dsl::post.eq(post))
			.order(dsl::created_at.asc())
			.limit(self.config.content.comments_per_page as i64)
			.select((CommentRecord::as_select(), user::username))
			.into_boxed();
		if !include_pending {
			query = query.filter(dsl::state.eq(CommentState::Approved as i16));
		}
		Ok(query.load(&mut *conn)?)
	}

	/// Approves a pending comment.
	pub async fn approve(&self, id: CommentRef) -> Result<()> {
		let mut conn = self.db.get().await?;
		let rows = update(dsl::comment.filter(dsl::id.eq(id)))
			.set(dsl::state.eq(CommentState::Approved as i16))
			.execute(&mut *conn)?;
		if rows == 0 {
			return Err(CommentError::NotFound.into());
		}
		info!(id, "approved comment");
		Ok(())
	}

	pub async fn count(&self) -> Result<i64> {
		let mut conn = self.db.get().await?;
		Ok(dsl::comment.count().get_result(&mut *conn)?)
	}
}

#[derive(Debug, Error)]
pub enum CommentError {
	#[error("comment not found")]
	NotFound,
	#[error("post not found")]
	PostNotFound,
	#[error("comments are disabled")]
	CommentsDisabled,
	#[error("comment content is required")]
	EmptyContent,
}

#[cfg(test)]
mod test {
	use bloghub_backend_model::db::types::CommentState;

	use crate::{BackendError, config::BackendConfig, test::test_env};

	use super::*;

	#[tokio::test]
	async fn test_add_and_list() {
		let env = test_env().await;
		let alice = env
			.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();
		let post = env
			.post
			.create(alice, "A Post", "content", "")
			.await
			.unwrap();

		let comment = env.comment.add(post.id, alice, "Great post!").await.unwrap();
		// default config auto-approves
		assert_eq!(comment.state(), CommentState::Approved);

		let comments = env.comment.list_for_post(post.id, false).await.unwrap();
		assert_eq!(comments.len(), 1);
		assert_eq!(comments[0].0.content, "Great post!");
		assert_eq!(comments[0].1, "alice");
		assert_eq!(env.comment.count().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_add_to_missing_post() {
		let env = test_env().await;
		let alice = env
			.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();

		let err = env.comment.add(42, alice, "hello?").await.unwrap_err();
		assert!(matches!(
			err,
			BackendError::CommentError(CommentError::PostNotFound)
		));
	}

	#[tokio::test]
	async fn test_moderation_queue() {
		let env = test_env().await;
		let mut config = BackendConfig::clone(&env.config);
		config.content.auto_approve_comments = false;
		let env = crate::BackendServices::new(config).await.unwrap();

		let alice = env
			.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();
		let post = env
			.post
			.create(alice, "A Post", "content", "")
			.await
			.unwrap();
		let comment = env.comment.add(post.id, alice, "pending me").await.unwrap();
		assert_eq!(comment.state(), CommentState::Pending);

		// hidden from the public listing until approved
		assert!(
			env.comment
				.list_for_post(post.id, false)
				.await
				.unwrap()
				.is_empty()
		);
		assert_eq!(
			env.comment.list_for_post(post.id, true).await.unwrap().len(),
			1
		);

		env.comment.approve(comment.id).await.unwrap();
		assert_eq!(
			env.comment
				.list_for_post(post.id, false)
				.await
				.unwrap()
				.len(),
			1
		);

		let err = env.comment.approve(999).await.unwrap_err();
		assert!(matches!(
			err,
			BackendError::CommentError(CommentError::NotFound)
		));
	}
}
