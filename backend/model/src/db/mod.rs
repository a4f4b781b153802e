use diesel::{SqliteConnection, migration::MigrationVersion};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use time::{OffsetDateTime, PrimitiveDateTime};

pub mod schema;
pub mod types;

const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");

/// Run all pending migrations.
///
/// This is not async, so a spawn-blocking wrapper is required.
///
/// Dispatches [MigrationHarness::run_pending_migrations].
pub fn run_migrations(
	conn: &mut SqliteConnection,
) -> diesel::migration::Result<Vec<MigrationVersion<'static>>> {
	conn.run_pending_migrations(SQLITE_MIGRATIONS)
		.map(|versions| {
			versions
				.into_iter()
				.map(|version| version.as_owned())
				.collect()
		})
}

/// Current time as a UTC [`PrimitiveDateTime`].
///
/// All timestamp columns store naive UTC times.
pub fn now_utc() -> PrimitiveDateTime {
	let now = OffsetDateTime::now_utc();
	PrimitiveDateTime::new(now.date(), now.time())
}

#[cfg(test)]
pub(crate) mod test {
	use diesel::Connection;

	use super::*;

	pub fn make_empty_test_db() -> SqliteConnection {
		SqliteConnection::establish(":memory:").unwrap()
	}

	#[test]
	fn test_sqlite_migrations() {
		let mut db = make_empty_test_db();
		let versions = run_migrations(&mut db).unwrap();
		assert!(!versions.is_empty());
	}
}
