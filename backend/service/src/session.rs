use std::sync::Arc;

use bloghub_backend_model::{
	db::{now_utc, schema::{session, user}},
	user::UserRef,
};
use diesel::{
	ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, delete, insert_into,
};
use thiserror::Error;
use time::{Duration, PrimitiveDateTime};
use tracing::{info, warn};

use crate::{
	Result,
	config::BackendConfig,
	database::DatabaseService,
	user::{random_token, verify_password},
};

/// Login session service.
///
/// Sessions are server-side rows keyed by a random bearer token.
#[derive(Debug)]
pub struct SessionService {
	db: Arc<DatabaseService>,
	config: Arc<BackendConfig>,
}

/// The authenticated identity attached to a valid session token.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SessionUser {
	pub id: UserRef,
	pub username: String,
	pub is_admin: bool,
}

/// A freshly minted login session.
#[derive(Debug, Clone)]
pub struct Session {
	pub token: String,
	pub user: SessionUser,
}

impl SessionService {
	pub fn new(db: Arc<DatabaseService>, config: Arc<BackendConfig>) -> Self {
		Self { db, config }
	}

	/// Verifies credentials and mints a session token.
	///
	/// Unknown usernames and wrong passwords are indistinguishable to
	/// the caller. Each successful login also sweeps expired sessions.
	pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
		let mut conn = self.db.get().await?;
		let row: Option<(UserRef, String, bool, bool)> = user::table
			.select((user::id, user::password_hash, user::is_admin, user::is_active))
			.filter(user::username.eq(username))
			.first(&mut *conn)
			.optional()?;
		let Some((id, hash, is_admin, is_active)) = row else {
			warn!(username, "login attempt for unknown user");
			return Err(SessionError::InvalidCredentials.into());
		};
		if !verify_password(&hash, password) {
			warn!(username, "failed login attempt");
			return Err(SessionError::InvalidCredentials.into());
		}
		if !is_active {
			return Err(SessionError::AccountDisabled.into());
		}

		let token = random_token();
		let now = now_utc();
		// opportunistic sweep; stale rows otherwise only go away when
		// their token is presented again
		let swept = delete(session::table.filter(session::expires_at.le(now)))
			.execute(&mut *conn)?;
		if swept > 0 {
			info!(swept, "removed expired sessions");
		}

		let ttl = Duration::hours(self.config.auth.session_ttl_hours as i64);
		insert_into(session::table)
			.values((
				session::token.eq(&token),
				session::user.eq(id),
				session::created_at.eq(now),
				session::expires_at.eq(now + ttl),
			))
			.execute(&mut *conn)?;
		info!(username, "user logged in");

		Ok(Session {
			token,
			user: SessionUser {
				id,
				username: username.to_owned(),
				is_admin,
			},
		})
	}

	/// Resolves a bearer token into the identity it belongs to.
	///
	/// Expired sessions are deleted on sight.
	pub async fn authenticate(&self, token: &str) -> Result<SessionUser> {
		let mut conn = self.db.get().await?;
		let row: Option<(PrimitiveDateTime, UserRef, String, bool, bool)> = session::table
			.inner_join(user::table)
			.filter(session::token.eq(token))
			.select((
				session::expires_at,
				user::id,
				user::username,
				user::is_admin,
				user::is_active,
			))
			.first(&mut *conn)
			.optional()?;
		let Some((expires_at, id, username, is_admin, is_active)) = row else {
			return Err(SessionError::InvalidToken.into());
		};
		if expires_at <= now_utc() {
			delete(session::table.filter(session::token.eq(token))).execute(&mut *conn)?;
			return Err(SessionError::InvalidToken.into());
		}
		if !is_active {
			return Err(SessionError::AccountDisabled.into());
		}

		Ok(SessionUser {
			id,
			username,
			is_admin,
		})
	}

	/// Invalidates a session token.
	///
	/// Unknown tokens are a no-op; logout never fails for the client.
	pub async fn logout(&self, token: &str) -> Result<()> {
		let mut conn = self.db.get().await?;
		let rows =
			delete(session::table.filter(session::token.eq(token))).execute(&mut *conn)?;
		if rows > 0 {
			info!("user logged out");
		}
		Ok(())
	}

	/// Removes all expired sessions, returning the count.
	pub async fn purge_expired(&self) -> Result<usize> {
		let mut conn = self.db.get().await?;
		let rows = delete(session::table.filter(session::expires_at.le(now_utc())))
			.execute(&mut *conn)?;
		Ok(rows)
	}
}

#[derive(Debug, Error)]
pub enum SessionError {
	#[error("invalid credentials")]
	InvalidCredentials,
	#[error("account is disabled")]
	AccountDisabled,
	#[error("invalid or expired session token")]
	InvalidToken,
}

#[cfg(test)]
mod test {
	use crate::{BackendError, test::test_env};

	use super::*;

	#[tokio::test]
	async fn test_login_and_authenticate() {
		let env = test_env().await;
		env.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();

		let session = env.session.login("alice", "password123").await.unwrap();
		assert_eq!(session.user.username, "alice");
		assert!(!session.user.is_admin);

		let identity = env.session.authenticate(&session.token).await.unwrap();
		assert_eq!(identity, session.user);
	}

	#[tokio::test]
	async fn test_login_rejects_bad_credentials() {
		let env = test_env().await;
		env.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();

		for (username, password) in [("alice", "wrong"), ("ghost", "password123")] {
			let err = env.session.login(username, password).await.unwrap_err();
			assert!(matches!(
				err,
				BackendError::SessionError(SessionError::InvalidCredentials)
			));
		}
	}

	#[tokio::test]
	async fn test_logout_invalidates_token() {
		let env = test_env().await;
		env.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();
		let session = env.session.login("alice", "password123").await.unwrap();

		env.session.logout(&session.token).await.unwrap();
		let err = env.session.authenticate(&session.token).await.unwrap_err();
		assert!(matches!(
			err,
			BackendError::SessionError(SessionError::InvalidToken)
		));

		// logging out twice is fine
		env.session.logout(&session.token).await.unwrap();
	}

	#[tokio::test]
	async fn test_garbage_token() {
		let env = test_env().await;
		let err = env.session.authenticate("deadbeef").await.unwrap_err();
		assert!(matches!(
			err,
			BackendError::SessionError(SessionError::InvalidToken)
		));
	}

	#[tokio::test]
	async fn test_login_sweeps_expired_sessions() {
		let env = test_env().await;
		let mut config = crate::config::BackendConfig::clone(&env.config);
		config.auth.session_ttl_hours = 0;
		let env = crate::BackendServices::new(config).await.unwrap();

		env.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();
		// zero TTL: the first session is expired the moment it exists
		env.session.login("alice", "password123").await.unwrap();
		env.session.login("alice", "password123").await.unwrap();

		// the second login already removed the first session, so only
		// its own token is left for the sweep to find
		assert_eq!(env.session.purge_expired().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_purge_expired() {
		let env = test_env().await;
		env.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();
		env.session.login("alice", "password123").await.unwrap();

		// live sessions survive the sweep
		assert_eq!(env.session.purge_expired().await.unwrap(), 0);
	}
}
