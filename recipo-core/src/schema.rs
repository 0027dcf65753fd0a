/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the full v1 schema.
///
/// - `users` / `sessions` / `verification_codes`: email-OTP identity.
/// - `countries` / `recipes`: the catalogue. `rating_avg` and `rating_count`
///   are recomputed from `reviews` whenever a review is inserted.
/// - `likes`: one row per (user, recipe); presence means liked.
/// - `reviews`: immutable comments with an optional 1..=5 rating.
///
/// All tables use `STRICT` mode. Deleting a user or recipe cascades to its
/// likes, reviews and sessions.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id          TEXT    PRIMARY KEY,
        email       TEXT    NOT NULL UNIQUE,
        name        TEXT    NOT NULL,
        role        TEXT    NOT NULL DEFAULT 'user'
                            CHECK(role IN ('user', 'admin')),
        created_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS sessions (
        token       TEXT    PRIMARY KEY,
        user_id     TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at  INTEGER NOT NULL,
        expires_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS verification_codes (
        email       TEXT    PRIMARY KEY,
        code        TEXT    NOT NULL,
        expires_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS countries (
        id          TEXT    PRIMARY KEY,
        name        TEXT    NOT NULL,
        slug        TEXT    NOT NULL UNIQUE
    ) STRICT;

    CREATE TABLE IF NOT EXISTS recipes (
        id           TEXT    PRIMARY KEY,
        slug         TEXT    NOT NULL UNIQUE,
        title        TEXT    NOT NULL,
        description  TEXT    NOT NULL DEFAULT '',
        country_id   TEXT    NOT NULL REFERENCES countries(id),
        difficulty   TEXT    NOT NULL DEFAULT 'medium'
                             CHECK(difficulty IN ('easy', 'medium', 'hard')),
        time         TEXT    NOT NULL DEFAULT '',
        ingredients  TEXT    NOT NULL DEFAULT '[]',
        instructions TEXT    NOT NULL DEFAULT '[]',
        rating_avg   REAL,
        rating_count INTEGER NOT NULL DEFAULT 0,
        created_at   INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS likes (
        user_id     TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        recipe_id   TEXT    NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
        created_at  INTEGER NOT NULL,
        PRIMARY KEY (user_id, recipe_id)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS reviews (
        id          TEXT    PRIMARY KEY,
        recipe_id   TEXT    NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
        user_id     TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        comment     TEXT    NOT NULL,
        rating      INTEGER CHECK(rating BETWEEN 1 AND 5),
        created_at  INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS reviews_by_recipe ON reviews(recipe_id, created_at);
";

/// DDL for v2: counts wrong guesses against a pending verification code.
pub const SCHEMA_V2_SQL: &str = "
    ALTER TABLE verification_codes ADD COLUMN attempts INTEGER NOT NULL DEFAULT 0;
";

/// Runs forward-only schema migration to migrate the DB to the latest version.
///
/// Idempotent: safe to call on every startup. Reads the current version
/// (`0` if the table is empty) and applies each missing step inside its own
/// `BEGIN IMMEDIATE` transaction, recording the new version with it.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    if version < 2 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V2_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (2)", [])?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_twice_records_each_version_once() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        migrate(&mut db).unwrap();
        migrate(&mut db).unwrap();

        let (rows, max): (i64, i64) = db
            .query_row("SELECT COUNT(*), MAX(version) FROM schema_version", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!((rows, max), (2, 2));
    }

    #[test]
    fn v1_database_gains_attempt_counter() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        db.execute_batch(SCHEMA_VERSION_DDL).unwrap();
        db.execute_batch(SCHEMA_V1_SQL).unwrap();
        db.execute_batch(
            "INSERT INTO schema_version (version) VALUES (1);
             INSERT INTO verification_codes (email, code, expires_at) VALUES ('a@b.c', '123456', 9);",
        )
        .unwrap();

        migrate(&mut db).unwrap();

        let attempts: i64 = db
            .query_row("SELECT attempts FROM verification_codes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(attempts, 0);
    }

    #[test]
    fn rating_check_rejects_out_of_range() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        migrate(&mut db).unwrap();
        db.execute_batch(
            "INSERT INTO users (id, email, name, created_at) VALUES ('u1', 'a@b.c', 'a', 0);
             INSERT INTO countries (id, name, slug) VALUES ('c1', 'Italy', 'italy');
             INSERT INTO recipes (id, slug, title, country_id, created_at)
                 VALUES ('r1', 'pasta', 'Pasta', 'c1', 0);",
        )
        .unwrap();

        let bad = db.execute(
            "INSERT INTO reviews (id, recipe_id, user_id, comment, rating, created_at)
             VALUES ('x', 'r1', 'u1', 'hm', 6, 0)",
            [],
        );
        assert!(bad.is_err(), "rating 6 must violate the CHECK constraint");
    }
}
