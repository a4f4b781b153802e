//! BlogHub backend services.

use std::sync::Arc;

use comment::{CommentError, CommentService};
use config::BackendConfig;
use database::{DatabaseError, DatabaseService};
use post::{PostError, PostService};
use session::{SessionError, SessionService};
use thiserror::Error;
use user::{UserError, UserService};

pub mod comment;
pub mod config;
pub mod database;
pub mod post;
pub mod session;
pub mod user;

/// Service container for BlogHub backends.
///
/// All services are wrapped with [`Arc`].
#[derive(Debug, Clone)]
pub struct BackendServices {
	pub config: Arc<BackendConfig>,
	pub database: Arc<DatabaseService>,
	pub user: Arc<UserService>,
	pub session: Arc<SessionService>,
	pub post: Arc<PostService>,
	pub comment: Arc<CommentService>,
}

impl BackendServices {
	#[tracing::instrument(skip(config))]
	pub async fn new(config: BackendConfig) -> Result<Self> {
		let config = Arc::new(config);
		let database = Arc::new(DatabaseService::new(&config.database).await?);
		let user = Arc::new(UserService::new(database.clone(), config.clone()));
		let session = Arc::new(SessionService::new(database.clone(), config.clone()));
		let post = Arc::new(PostService::new(database.clone(), config.clone()));
		let comment = Arc::new(CommentService::new(database.clone(), config.clone()));

		Ok(Self {
			config,
			database,
			user,
			session,
			post,
			comment,
		})
	}
}

/// Backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
	#[error(transparent)]
	DatabaseError(#[from] DatabaseError),
	#[error(transparent)]
	UserError(#[from] UserError),
	#[error(transparent)]
	SessionError(#[from] SessionError),
	#[error(transparent)]
	PostError(#[from] PostError),
	#[error(transparent)]
	CommentError(#[from] CommentError),
}

/// A specialized [`Result`] for backend errors.
pub type Result<T, E = BackendError> = std::result::Result<T, E>;

impl From<diesel::result::Error> for BackendError {
	fn from(value: diesel::result::Error) -> Self {
		Self::DatabaseError(DatabaseError::QueryError(value))
	}
}

#[cfg(test)]
pub(crate) mod test {
	use crate::database::DatabaseConfig;

	use crate::*;

	pub async fn test_env() -> BackendServices {
		let config = BackendConfig {
			database: DatabaseConfig {
				url: "sqlite://:memory:".to_string(),
				max_connections: 1,
			},
			auth: Default::default(),
			content: Default::default(),
		};
		BackendServices::new(config).await.unwrap()
	}

	#[tokio::test]
	async fn test_init_services() {
		let env = test_env().await;
		assert_eq!(env.post.count_published().await.unwrap(), 0);
		assert_eq!(env.user.count().await.unwrap(), 0);
	}
}
