use std::sync::Arc;

use bloghub_backend_model::{
	db::{now_utc, schema, types::PostState},
	post::{PostRef, slugify},
	user::UserRef,
};
use diesel::{
	BoolExpressionMethods, EscapeExpressionMethods, ExpressionMethods, OptionalExtension,
	QueryDsl, Queryable, RunQueryDsl, Selectable, SelectableHelper, TextExpressionMethods,
	delete, insert_into, result::DatabaseErrorKind, update,
};
use thiserror::Error;
use time::{Duration, PrimitiveDateTime};
use tracing::info;

use crate::{Result, config::BackendConfig, database::DatabaseService};

use schema::post::dsl;

const SEARCH_LIMIT: i64 = 50;
const MAX_PER_PAGE: u32 = 100;

/// Blog post service.
#[derive(Debug)]
pub struct PostService {
	db: Arc<DatabaseService>,
	config: Arc<BackendConfig>,
}

/// A full post row.
#[derive(Debug, PartialEq, Eq, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::post)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PostRecord {
	pub id: PostRef,
	pub author: UserRef,
	pub title: String,
	pub slug: String,
	pub content: String,
	pub tags: String,
	pub state: i16,
	pub created_at: PrimitiveDateTime,
	pub updated_at: PrimitiveDateTime,
}

impl PostRecord {
	pub fn state(&self) -> PostState {
		PostState::from(self.state)
	}
}

/// Partial update of a post; `None` fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct PostChanges {
	pub title: Option<String>,
	pub content: Option<String>,
	pub tags: Option<String>,
}

impl PostService {
	pub fn new(db: Arc<DatabaseService>, config: Arc<BackendConfig>) -> Self {
		Self { db, config }
	}

	/// Creates a new draft post.
	pub async fn create(
		&self,
		author: UserRef,
		title: &str,
		content: &str,
		tags: &str,
	) -> Result<PostRecord> {
		if title.is_empty() || content.is_empty() {
			return Err(PostError::MissingFields.into());
		}
		let slug = slugify(title);
		if slug.is_empty() {
			return Err(PostError::UnsluggableTitle.into());
		}

		let now = now_utc();
		let mut conn = self.db.get().await?;
		let record = insert_into(dsl::post)
			.values((
				dsl::author.eq(author),
				dsl::title.eq(title),
				dsl::slug.eq(&slug),
				dsl::content.eq(content),
				dsl::tags.eq(tags),
				dsl::state.eq(PostState::Draft as i16),
				dsl::created_at.eq(now),
				dsl::updated_at.eq(now),
			))
			.returning(PostRecord::as_returning())
			.get_result(&mut *conn)
			.map_err(map_slug_conflict)?;
		info!(id = record.id, author, slug, "created post");

		Ok(record)
	}

	/// Fetches a post by id, in any state.
	///
	/// Visibility of drafts is the caller's concern.
	pub async fn get(&self, id: PostRef) -> Result<Option<PostRecord>> {
		let mut conn = self.db.get().await?;
		Ok(dsl::post
			.filter(dsl::id.eq(id))
			.select(PostRecord::as_select())
			.first(&mut *conn)
			.optional()?)
	}

	/// Applies a partial update; only the author may edit.
	///
	/// A title change re-derives the slug.
	pub async fn update(
		&self,
		id: PostRef,
		editor: UserRef,
		changes: PostChanges,
	) -> Result<PostRecord> {
		let mut conn = self.db.get().await?;
		let record = self.fetch_owned(&mut *conn, id, editor)?;

		let mut title = record.title;
		let mut slug = record.slug;
		if let Some(new_title) = changes.title {
			slug = slugify(&new_title);
			if new_title.is_empty() || slug.is_empty() {
				return Err(PostError::UnsluggableTitle.into());
			}
			title = new_title;
		}

		let record = update(dsl::post.filter(dsl::id.eq(id)))
			.set((
				dsl::title.eq(&title),
				dsl::slug.eq(&slug),
				changes.content.map(|content| dsl::content.eq(content)),
				changes.tags.map(|tags| dsl::tags.eq(tags)),
				dsl::updated_at.eq(now_utc()),
			))
			.returning(PostRecord::as_returning())
			.get_result(&mut *conn)
			.map_err(map_slug_conflict)?;
		info!(id, "updated post");

		Ok(record)
	}

	/// Marks a post as published; only the author may publish.
	pub async fn publish(&self, id: PostRef, editor: UserRef) -> Result<PostRecord> {
		let mut conn = self.db.get().await?;
		self.fetch_owned(&mut *conn, id, editor)?;

		let record = update(dsl::post.filter(dsl::id.eq(id)))
			.set((
				dsl::state.eq(PostState::Published as i16),
				dsl::updated_at.eq(now_utc()),
			))
			.returning(PostRecord::as_returning())
			.get_result(&mut *conn)?;
		info!(id, "published post");

		Ok(record)
	}

	/// Deletes a post and its comments; the author or an admin may delete.
	pub async fn delete(&self, id: PostRef, editor: UserRef, editor_is_admin: bool) -> Result<()> {
		let mut conn = self.db.get().await?;
		let author: Option<UserRef> = dsl::post
			.select(dsl::author)
			.filter(dsl::id.eq(id))
			.first(&mut *conn)
			.optional()?;
		let Some(author) = author else {
			return Err(PostError::NotFound.into());
		};
		if author != editor && !editor_is_admin {
			return Err(PostError::NotAuthor.into());
		}

		use schema::comment::dsl as comment_dsl;
		delete(comment_dsl::comment.filter(comment_dsl::post.eq(id))).execute(&mut *conn)?;
		delete(dsl::post.filter(dsl::id.eq(id))).execute(&mut *conn)?;
		info!(id, "deleted post");

		Ok(())
	}

	/// Lists published posts, newest first.
	///
	/// Pages are 1-based; `per_page` defaults to the configured page
	/// size and is capped at 100.
	pub async fn list_published(
		&self,
		page: u32,
		per_page: Option<u32>,
	) -> Result<Vec<PostRecord>> {
		let per_page = per_page
			.unwrap_or(self.config.content.posts_per_page)
			.clamp(1, MAX_PER_PAGE) as i64;
		let offset = (page.max(1) as i64 - 1) * per_page;

		let mut conn = self.db.get().await?;
		Ok(dsl::post
			.filter(dsl::state.eq(PostState::Published as i16))
			.order(dsl::created_at.desc())
			.limit(per_page)
			.offset(offset)
			.select(PostRecord::as_select())
			.load(&mut *conn)?)
	}

	/// Searches published posts by keyword in title or content.
	///
	/// The keyword matches literally; LIKE wildcards have no effect.
	pub async fn search(&self, keyword: &str) -> Result<Vec<PostRecord>> {
		if keyword.is_empty() {
			return Ok(Vec::new());
		}
		let pattern = like_pattern(keyword);

		let mut conn = self.db.get().await?;
		Ok(dsl::post
			.filter(
				dsl::title
					.like(pattern.clone())
					.escape('\\')
					.or(dsl::content.like(pattern).escape('\\')),
			)
			.filter(dsl::state.eq(PostState::Published as i16))
			.order(dsl::created_at.desc())
			.limit(SEARCH_LIMIT)
			.select(PostRecord::as_select())
			.load(&mut *conn)?)
	}

	/// Lists published posts matching any of the given tags.
	pub async fn filter_by_tags(&self, tags: &str) -> Result<Vec<PostRecord>> {
		let mut tags = tags.split(',').map(str::trim).filter(|tag| !tag.is_empty());
		let Some(first) = tags.next() else {
			return Ok(Vec::new());
		};

		let mut query = dsl::post
			.select(PostRecord::as_select())
			.into_boxed()
			.filter(dsl::tags.like(like_pattern(first)).escape('\\'));
		for tag in tags {
			query = query.or_filter(dsl::tags.like(like_pattern(tag)).escape('\\'));
		}

		let mut conn = self.db.get().await?;
		Ok(query
			.filter(dsl::state.eq(PostState::Published as i16))
			.order(dsl::created_at.desc())
			.limit(SEARCH_LIMIT)
			.load(&mut *conn)?)
	}

	/// Lists an author's posts, newest first, drafts included on request.
	pub async fn list_by_author(
		&self,
		author: UserRef,
		include_drafts: bool,
	) -> Result<Vec<PostRecord>> {
		let mut conn = self.db.get().await?;
		let mut query = dsl::post
			.select(PostRecord::as_select())
			.filter(dsl::author.eq(author))
			.order(dsl::created_at.desc())
			.into_boxed();
		if !include_drafts {
			query = query.filter(dsl::state.eq(PostState::Published as i16));
		}
		Ok(query.load(&mut *conn)?)
	}

	/// Deletes posts older than `days` days, with their comments.
	///
	/// Returns the number of deleted posts.
	pub async fn purge_older_than(&self, days: u32) -> Result<usize> {
		let cutoff = now_utc() - Duration::days(days as i64);
		let mut conn = self.db.get().await?;

		let old: Vec<PostRef> = dsl::post
			.select(dsl::id)
			.filter(dsl::created_at.lt(cutoff))
			.load(&mut *conn)?;
		if old.is_empty() {
			return Ok(0);
		}

		use schema::comment::dsl as comment_dsl;
		delete(comment_dsl::comment.filter(comment_dsl::post.eq_any(&old)))
			.execute(&mut *conn)?;
		let rows =
			delete(dsl::post.filter(dsl::id.eq_any(&old))).execute(&mut *conn)?;
		info!(rows, days, "purged old posts");

		Ok(rows)
	}

	pub async fn count_published(&self) -> Result<i64> {
		let mut conn = self.db.get().await?;
		Ok(dsl::post
			.filter(dsl::state.eq(PostState::Published as i16))
			.count()
			.get_result(&mut *conn)?)
	}

	fn fetch_owned(
		&self,
		conn: &mut diesel::SqliteConnection,
		id: PostRef,
		editor: UserRef,
	) -> Result<PostRecord> {
		let record: Option<PostRecord> = dsl::post
			.filter(dsl::id.eq(id))
			.select(PostRecord::as_select())
			.first(conn)
			.optional()?;
		let Some(record) = record else {
			return Err(PostError::NotFound.into());
		};
		if record.author != editor {
			return Err(PostError::NotAuthor.into());
		}
		Ok(record)
	}
}

/// Builds a contains-style LIKE pattern with `%`, `_` and `\` escaped.
fn like_pattern(term: &str) -> String {
	let mut pattern = String::with_capacity(term.len() + 2);
	pattern.push('%');
	for ch in term.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			pattern.push('\\');
		}
		pattern.push(ch);
	}
	pattern.push('%');
	pattern
}

fn map_slug_conflict(err: diesel::result::Error) -> crate::BackendError {
	match err {
		diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
			PostError::DuplicateSlug.into()
		}
		other => other.into(),
	}
}

#[derive(Debug, Error)]
pub enum PostError {
	#[error("post not found")]
	NotFound,
	#[error("title and content are required")]
	MissingFields,
	#[error("title does not yield a usable slug")]
	UnsluggableTitle,
	#[error("a post with this slug already exists")]
	DuplicateSlug,
	#[error("only the author may modify this post")]
	NotAuthor,
}

#[cfg(test)]
mod test {
	use bloghub_backend_model::db::types::PostState;

	use crate::{BackendError, test::test_env};

	use super::*;

	async fn author(env: &crate::BackendServices) -> UserRef {
		env.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn test_create_starts_as_draft() {
		let env = test_env().await;
		let alice = author(&env).await;

		let post = env
			.post
			.create(alice, "Hello World!", "first post", "intro,meta")
			.await
			.unwrap();
		assert_eq!(post.slug, "hello-world");
		assert_eq!(post.state(), PostState::Draft);

		// drafts do not show up publicly
		assert!(env.post.list_published(1, None).await.unwrap().is_empty());
		assert!(env.post.search("Hello").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_duplicate_slug() {
		let env = test_env().await;
		let alice = author(&env).await;

		env.post
			.create(alice, "Same Title", "one", "")
			.await
			.unwrap();
		let err = env
			.post
			.create(alice, "Same Title", "two", "")
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			BackendError::PostError(PostError::DuplicateSlug)
		));
	}

	#[tokio::test]
	async fn test_publish_and_list() {
		let env = test_env().await;
		let alice = author(&env).await;

		for n in 1..=3 {
			let post = env
				.post
				.create(alice, &format!("Post {n}"), "content", "")
				.await
				.unwrap();
			env.post.publish(post.id, alice).await.unwrap();
		}

		let page = env.post.list_published(1, Some(2)).await.unwrap();
		assert_eq!(page.len(), 2);
		let page = env.post.list_published(2, Some(2)).await.unwrap();
		assert_eq!(page.len(), 1);
		assert_eq!(env.post.count_published().await.unwrap(), 3);
	}

	#[tokio::test]
	async fn test_search_and_tags() {
		let env = test_env().await;
		let alice = author(&env).await;

		let rust = env
			.post
			.create(alice, "Rust ownership", "the borrow checker", "rust,lang")
			.await
			.unwrap();
		env.post.publish(rust.id, alice).await.unwrap();
		let cooking = env
			.post
			.create(alice, "Pasta night", "boil water first", "cooking")
			.await
			.unwrap();
		env.post.publish(cooking.id, alice).await.unwrap();

		// keyword matches title or content
		let hits = env.post.search("borrow").await.unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].id, rust.id);
		assert_eq!(env.post.search("water").await.unwrap().len(), 1);
		assert!(env.post.search("golang").await.unwrap().is_empty());

		// tag filter matches any listed tag
		let hits = env.post.filter_by_tags("lang, cooking").await.unwrap();
		assert_eq!(hits.len(), 2);
		assert!(env.post.filter_by_tags("").await.unwrap().is_empty());
	}

	#[test]
	fn test_like_pattern() {
		assert_eq!(like_pattern("rust"), "%rust%");
		assert_eq!(like_pattern("50%"), "%50\\%%");
		assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
	}

	#[tokio::test]
	async fn test_search_matches_wildcards_literally() {
		let env = test_env().await;
		let alice = author(&env).await;

		let sale = env
			.post
			.create(alice, "Save 10% today", "discount", "")
			.await
			.unwrap();
		env.post.publish(sale.id, alice).await.unwrap();
		let plain = env
			.post
			.create(alice, "Save 10 dollars", "coupon", "")
			.await
			.unwrap();
		env.post.publish(plain.id, alice).await.unwrap();

		// "10%" only matches the literal percent sign
		let hits = env.post.search("10%").await.unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].id, sale.id);

		// a lone underscore is not a single-character wildcard
		assert!(env.post.search("_").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_update_ownership() {
		let env = test_env().await;
		let alice = author(&env).await;
		let bob = env
			.user
			.register("bob", "bob@example.com", "password123")
			.await
			.unwrap();

		let post = env
			.post
			.create(alice, "Original", "content", "")
			.await
			.unwrap();

		let err = env
			.post
			.update(
				post.id,
				bob,
				PostChanges {
					title: Some("Hijacked".into()),
					..Default::default()
				},
			)
			.await
			.unwrap_err();
		assert!(matches!(err, BackendError::PostError(PostError::NotAuthor)));

		let updated = env
			.post
			.update(
				post.id,
				alice,
				PostChanges {
					title: Some("Updated Title".into()),
					content: Some("new content".into()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.title, "Updated Title");
		assert_eq!(updated.slug, "updated-title");
		assert_eq!(updated.content, "new content");
		// untouched fields survive
		assert_eq!(updated.tags, "");
	}

	#[tokio::test]
	async fn test_delete_rights() {
		let env = test_env().await;
		let alice = author(&env).await;
		let bob = env
			.user
			.register("bob", "bob@example.com", "password123")
			.await
			.unwrap();

		let post = env.post.create(alice, "Mine", "content", "").await.unwrap();
		let err = env.post.delete(post.id, bob, false).await.unwrap_err();
		assert!(matches!(err, BackendError::PostError(PostError::NotAuthor)));

		// admins may delete others' posts
		env.post.delete(post.id, bob, true).await.unwrap();
		assert!(env.post.get(post.id).await.unwrap().is_none());

		let err = env.post.delete(post.id, alice, false).await.unwrap_err();
		assert!(matches!(err, BackendError::PostError(PostError::NotFound)));
	}

	#[tokio::test]
	async fn test_list_by_author() {
		let env = test_env().await;
		let alice = author(&env).await;

		let draft = env.post.create(alice, "Draft", "content", "").await.unwrap();
		let public = env.post.create(alice, "Public", "content", "").await.unwrap();
		env.post.publish(public.id, alice).await.unwrap();

		let visible = env.post.list_by_author(alice, false).await.unwrap();
		assert_eq!(visible.len(), 1);
		assert_eq!(visible[0].id, public.id);

		let all = env.post.list_by_author(alice, true).await.unwrap();
		assert_eq!(all.len(), 2);
		assert!(all.iter().any(|post| post.id == draft.id));
	}

	#[tokio::test]
	async fn test_purge_spares_recent_posts() {
		let env = test_env().await;
		let alice = author(&env).await;
		env.post.create(alice, "Fresh", "content", "").await.unwrap();

		assert_eq!(env.post.purge_older_than(30).await.unwrap(), 0);
		assert!(env.post.get(1).await.unwrap().is_some());
	}
}
