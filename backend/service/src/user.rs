use std::sync::Arc;

use argon2::{
	Argon2,
	password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use bloghub_backend_model::{
	db::{now_utc, schema},
	user::UserRef,
};
use diesel::{
	ExpressionMethods, OptionalExtension, QueryDsl, Queryable, RunQueryDsl, Selectable,
	SelectableHelper, insert_into, update,
};
use serde::Serialize;
use thiserror::Error;
use time::{Duration, PrimitiveDateTime};
use tracing::{info, warn};

use crate::{Result, config::BackendConfig, database::DatabaseService};

use schema::user::dsl;

/// User account service.
#[derive(Debug)]
pub struct UserService {
	db: Arc<DatabaseService>,
	config: Arc<BackendConfig>,
}

/// Public account fields, as exposed by profile and admin listings.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = schema::user)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserProfile {
	pub id: UserRef,
	pub username: String,
	pub email: String,
	pub is_admin: bool,
	pub created_at: PrimitiveDateTime,
}

impl UserService {
	pub fn new(db: Arc<DatabaseService>, config: Arc<BackendConfig>) -> Self {
		Self { db, config }
	}

	/// Registers a new account.
	///
	/// The first registered account is never an admin; promotion is a
	/// separate, admin-only operation.
	pub async fn register(
		&self,
		username: &str,
		email: &str,
		password: &str,
	) -> Result<UserRef> {
		if !self.config.auth.enable_registration {
			return Err(UserError::RegistrationDisabled.into());
		}
		if username.is_empty() || password.is_empty() {
			return Err(UserError::MissingFields.into());
		}
		if !valid_email(email) {
			return Err(UserError::InvalidEmail.into());
		}

		let mut conn = self.db.get().await?;
		let taken: Option<UserRef> = dsl::user
			.select(dsl::id)
			.filter(dsl::username.eq(username))
			.first(&mut *conn)
			.optional()?;
		if taken.is_some() {
			return Err(UserError::UsernameTaken.into());
		}
		let taken: Option<UserRef> = dsl::user
			.select(dsl::id)
			.filter(dsl::email.eq(email))
			.first(&mut *conn)
			.optional()?;
		if taken.is_some() {
			return Err(UserError::EmailTaken.into());
		}

		let hash = hash_password(password)?;
		let id = insert_into(dsl::user)
			.values((
				dsl::username.eq(username),
				dsl::email.eq(email),
				dsl::password_hash.eq(&hash),
				dsl::is_admin.eq(false),
				dsl::is_active.eq(true),
				dsl::created_at.eq(now_utc()),
			))
			.returning(dsl::id)
			.get_result::<UserRef>(&mut *conn)?;
		info!(username, id, "registered user");

		Ok(id)
	}

	/// Looks up a public profile by username.
	pub async fn profile(&self, username: &str) -> Result<Option<UserProfile>> {
		let mut conn = self.db.get().await?;
		Ok(dsl::user
			.filter(dsl::username.eq(username))
			.select(UserProfile::as_select())
			.first(&mut *conn)
			.optional()?)
	}

	/// Looks up a username by account id.
	pub async fn username_of(&self, id: UserRef) -> Result<Option<String>> {
		let mut conn = self.db.get().await?;
		Ok(dsl::user
			.select(dsl::username)
			.filter(dsl::id.eq(id))
			.first(&mut *conn)
			.optional()?)
	}

	/// Lists accounts, optionally filtered by admin flag.
	pub async fn list(&self, admin: Option<bool>) -> Result<Vec<UserProfile>> {
		let mut conn = self.db.get().await?;
		let mut query = dsl::user
			.select(UserProfile::as_select())
			.order(dsl::id.asc())
			.into_boxed();
		if let Some(admin) = admin {
			query = query.filter(dsl::is_admin.eq(admin));
		}
		Ok(query.load(&mut *conn)?)
	}

	/// Grants admin privileges to an account.
	pub async fn promote(&self, id: UserRef) -> Result<()> {
		let mut conn = self.db.get().await?;
		let rows = update(dsl::user.filter(dsl::id.eq(id)))
			.set(dsl::is_admin.eq(true))
			.execute(&mut *conn)?;
		if rows == 0 {
			return Err(UserError::NotFound.into());
		}
		info!(id, "promoted user to admin");
		Ok(())
	}

	pub async fn count(&self) -> Result<i64> {
		let mut conn = self.db.get().await?;
		Ok(dsl::user.count().get_result(&mut *conn)?)
	}

	/// Issues a password-reset token for the given address.
	///
	/// Returns `None` when no account matches, so callers can answer
	/// without revealing whether the address is registered.
	pub async fn issue_reset_token(&self, email: &str) -> Result<Option<String>> {
		let mut conn = self.db.get().await?;
		let id: Option<UserRef> = dsl::user
			.select(dsl::id)
			.filter(dsl::email.eq(email))
			.first(&mut *conn)
			.optional()?;
		let Some(id) = id else {
			return Ok(None);
		};

		let token = random_token();
		let ttl = Duration::minutes(self.config.auth.reset_token_ttl_minutes as i64);
		update(dsl::user.filter(dsl::id.eq(id)))
			.set((
				dsl::reset_token.eq(&token),
				dsl::reset_expires_at.eq(now_utc() + ttl),
			))
			.execute(&mut *conn)?;
		info!(id, "issued password reset token");

		Ok(Some(token))
	}

	/// Redeems a reset token and replaces the account password.
	pub async fn redeem_reset_token(
		&self,
		email: &str,
		token: &str,
		new_password: &str,
	) -> Result<()> {
		if new_password.is_empty() {
			return Err(UserError::MissingFields.into());
		}

		let mut conn = self.db.get().await?;
		let row: Option<(UserRef, Option<String>, Option<PrimitiveDateTime>)> = dsl::user
			.select((dsl::id, dsl::reset_token, dsl::reset_expires_at))
			.filter(dsl::email.eq(email))
			.first(&mut *conn)
			.optional()?;
		let Some((id, stored, expires_at)) = row else {
			return Err(UserError::InvalidResetToken.into());
		};
		let valid = stored.as_deref() == Some(token)
			&& expires_at.is_some_and(|at| at > now_utc());
		if !valid {
			warn!(id, "rejected password reset token");
			return Err(UserError::InvalidResetToken.into());
		}

		let hash = hash_password(new_password)?;
		update(dsl::user.filter(dsl::id.eq(id)))
			.set((
				dsl::password_hash.eq(&hash),
				dsl::reset_token.eq(None::<String>),
				dsl::reset_expires_at.eq(None::<PrimitiveDateTime>),
			))
			.execute(&mut *conn)?;
		info!(id, "password changed via reset token");

		Ok(())
	}
}

/// Hashes a password into an argon2id PHC string.
///
/// The salt is 16 random bytes.
pub(crate) fn hash_password(password: &str) -> Result<String, UserError> {
	use rand::Rng;
	let salt: [u8; 16] = rand::rng().random();
	let salt = SaltString::encode_b64(&salt).map_err(UserError::PasswordHash)?;
	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(UserError::PasswordHash)
}

/// Verifies a password against a stored PHC string.
///
/// Unparseable hashes verify as false instead of erroring, so a corrupt
/// row cannot be used to probe accounts.
pub(crate) fn verify_password(hash: &str, password: &str) -> bool {
	PasswordHash::new(hash)
		.map(|parsed| {
			Argon2::default()
				.verify_password(password.as_bytes(), &parsed)
				.is_ok()
		})
		.unwrap_or(false)
}

/// 32 random bytes, hex-encoded.
pub(crate) fn random_token() -> String {
	use rand::Rng;
	hex::encode(rand::rng().random::<[u8; 32]>())
}

fn valid_email(email: &str) -> bool {
	let Some((local, domain)) = email.split_once('@') else {
		return false;
	};
	!local.is_empty()
		&& !domain.is_empty()
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
		&& !email.chars().any(char::is_whitespace)
}

#[derive(Debug, Error)]
pub enum UserError {
	#[error("registration is disabled")]
	RegistrationDisabled,
	#[error("username, email and password are required")]
	MissingFields,
	#[error("invalid email address")]
	InvalidEmail,
	#[error("username is already taken")]
	UsernameTaken,
	#[error("email is already registered")]
	EmailTaken,
	#[error("user not found")]
	NotFound,
	#[error("invalid or expired reset token")]
	InvalidResetToken,
	#[error("password hashing error: {0}")]
	PasswordHash(argon2::password_hash::Error),
}

#[cfg(test)]
mod test {
	use crate::{BackendError, test::test_env};

	use super::*;

	#[tokio::test]
	async fn test_register() {
		let env = test_env().await;
		let id = env
			.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();

		let profile = env.user.profile("alice").await.unwrap().unwrap();
		assert_eq!(profile.id, id);
		assert_eq!(profile.email, "alice@example.com");
		assert!(!profile.is_admin);
	}

	#[tokio::test]
	async fn test_register_duplicate() {
		let env = test_env().await;
		env.user
			.register("alice", "alice@example.com", "password123")
			.await
			.unwrap();

		let err = env
			.user
			.register("alice", "other@example.com", "password123")
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			BackendError::UserError(UserError::UsernameTaken)
		));

		let err = env
			.user
			.register("bob", "alice@example.com", "password123")
			.await
			.unwrap_err();
		assert!(matches!(err, BackendError::UserError(UserError::EmailTaken)));
	}

	#[tokio::test]
	async fn test_register_invalid_email() {
		let env = test_env().await;
		for email in ["", "no-at-sign", "user@", "@domain.com", "user@nodot"] {
			let err = env.user.register("alice", email, "pw").await.unwrap_err();
			assert!(
				matches!(err, BackendError::UserError(UserError::InvalidEmail)),
				"{email:?}"
			);
		}
	}

	#[tokio::test]
	async fn test_promote() {
		let env = test_env().await;
		let id = env
			.user
			.register("alice", "alice@example.com", "pw123456")
			.await
			.unwrap();

		env.user.promote(id).await.unwrap();
		assert!(env.user.profile("alice").await.unwrap().unwrap().is_admin);

		let admins = env.user.list(Some(true)).await.unwrap();
		assert_eq!(admins.len(), 1);
		assert_eq!(admins[0].username, "alice");

		let err = env.user.promote(9999).await.unwrap_err();
		assert!(matches!(err, BackendError::UserError(UserError::NotFound)));
	}

	#[tokio::test]
	async fn test_reset_token_flow() {
		let env = test_env().await;
		env.user
			.register("alice", "alice@example.com", "original-pw")
			.await
			.unwrap();

		// unknown address issues nothing
		assert!(
			env.user
				.issue_reset_token("ghost@example.com")
				.await
				.unwrap()
				.is_none()
		);

		let token = env
			.user
			.issue_reset_token("alice@example.com")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(token.len(), 64);

		// wrong token is rejected
		let err = env
			.user
			.redeem_reset_token("alice@example.com", "bogus", "new-pw")
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			BackendError::UserError(UserError::InvalidResetToken)
		));

		env.user
			.redeem_reset_token("alice@example.com", &token, "new-pw")
			.await
			.unwrap();

		// token is single-use
		let err = env
			.user
			.redeem_reset_token("alice@example.com", &token, "another-pw")
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			BackendError::UserError(UserError::InvalidResetToken)
		));

		// new password logs in, old one does not
		env.session.login("alice", "new-pw").await.unwrap();
		assert!(env.session.login("alice", "original-pw").await.is_err());
	}

	#[test]
	fn test_password_hashing() {
		let hash = hash_password("mypassword").unwrap();
		assert_ne!(hash, "mypassword");
		assert!(verify_password(&hash, "mypassword"));
		assert!(!verify_password(&hash, "wrongpassword"));
		assert!(!verify_password("not-a-phc-string", "mypassword"));
	}
}
