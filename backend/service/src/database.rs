use std::fmt::Debug;

use bloghub_backend_model::db::run_migrations;
use deadpool::managed::{Manager, Object, Pool, PoolError, RecycleError, RecycleResult};
use diesel::{
	Connection, ConnectionError, SqliteConnection,
	connection::{AnsiTransactionManager, SimpleConnection, TransactionManager},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

use crate::Result;

/// Configuration for [`DatabaseService`].
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
	/// URL to the SQLite database.
	///
	/// For example:
	/// - `sqlite://bloghub.db`
	/// - `sqlite://:memory:`
	pub url: String,
	/// The maximum number of connections managed by the pool.
	///
	/// When using `sqlite://:memory:`, this must be set to 1.
	#[serde(default = "default_max_conns")]
	pub max_connections: usize,
}

fn default_max_conns() -> usize {
	3
}

/// Database connection service.
pub struct DatabaseService {
	pool: Pool<SqlConnectionManager>,
}

impl DatabaseService {
	pub async fn new(config: &DatabaseConfig) -> Result<Self> {
		let manager = SqlConnectionManager(config.to_owned());
		let pool = Pool::builder(manager)
			.max_size(config.max_connections)
			.build()
			.map_err(DatabaseError::from)?;

		// migrations run through a pooled connection, so an in-memory
		// database keeps the migrated state when the connection returns
		// to the pool
		info!("running database migrations");
		let mut conn: SqlConnRef = pool.get().await.map_err(DatabaseError::from)?;
		let versions = spawn_blocking(move || run_migrations(&mut conn))
			.await
			.map_err(DatabaseError::from)?
			.map_err(DatabaseError::MigrationError)?;
		for version in versions {
			warn!(%version, "database migration applied");
		}
		info!("database migrations completed");

		Ok(Self { pool })
	}

	pub async fn get(&self) -> Result<SqlConnRef> {
		Ok(self.pool.get().await.map_err(DatabaseError::from)?)
	}
}

impl Debug for DatabaseService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DatabaseService")
			.field("config", &self.pool.manager().0)
			.finish()
	}
}

#[derive(Debug)]
pub struct SqlConnectionManager(DatabaseConfig);

pub type SqlConnRef = Object<SqlConnectionManager>;

impl Manager for SqlConnectionManager {
	type Type = SqliteConnection;
	type Error = DatabaseError;

	fn create(
		&self,
	) -> impl Future<Output = std::result::Result<SqliteConnection, DatabaseError>> + Send {
		async {
			let url = &self.0.url;
			if let Some(path) = url.strip_prefix("sqlite://") {
				SqliteConnection::establish(path).map_err(DatabaseError::ConnectionError)
			} else {
				Err(DatabaseError::UnknownUrlSchema(url.clone()))
			}
		}
	}

	fn recycle(
		&self,
		obj: &mut SqliteConnection,
		_metrics: &deadpool::managed::Metrics,
	) -> impl Future<Output = RecycleResult<DatabaseError>> + Send {
		async {
			if std::thread::panicking()
				|| AnsiTransactionManager::is_broken_transaction_manager(obj)
			{
				return Err(RecycleError::Message("Broken connection".into()));
			}
			obj.batch_execute("SELECT 1")
				.map_err(DatabaseError::QueryError)?;
			Ok(())
		}
	}
}

#[derive(Debug, Error)]
pub enum DatabaseError {
	#[error("connection error: {0}")]
	ConnectionError(#[from] ConnectionError),
	#[error("query error: {0}")]
	QueryError(#[from] diesel::result::Error),
	#[error("connection pool error: {0:?}")]
	PoolError(PoolError<()>),
	#[error("connection pool build error: {0}")]
	PoolBuildError(#[from] deadpool::managed::BuildError),
	#[error("async-await joining error: {0}")]
	JoinError(#[from] tokio::task::JoinError),
	#[error("failed to apply migration: {0}")]
	MigrationError(Box<dyn std::error::Error + Send + Sync>),

	#[error("unknown connection URL schema: {0}")]
	UnknownUrlSchema(String),
}

impl From<PoolError<DatabaseError>> for DatabaseError {
	fn from(value: PoolError<DatabaseError>) -> Self {
		Self::PoolError(match value {
			PoolError::Timeout(timeout_type) => PoolError::Timeout(timeout_type),
			PoolError::Backend(err) => return err,
			PoolError::Closed => PoolError::Closed,
			PoolError::NoRuntimeSpecified => PoolError::NoRuntimeSpecified,
			PoolError::PostCreateHook(_) => unreachable!(),
		})
	}
}
