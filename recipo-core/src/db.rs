use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::types::{Comment, Country, Difficulty, Recipe, RecipeQuery, SessionUser, User};

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all database connections.
/// It sets `busy_timeout` via the `Connection` method (not a PRAGMA string) so
/// the setting takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    // Fold any WAL left over from a previous run back into the main file.
    conn.call(|db| {
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    tracing::debug!(path, "database opened");
    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

const RECIPE_COLUMNS: &str = "
    r.id, r.slug, r.title, r.description, c.name, c.slug, r.difficulty, r.time,
    r.ingredients, r.instructions, r.rating_avg, r.rating_count,
    EXISTS(SELECT 1 FROM likes l WHERE l.recipe_id = r.id AND l.user_id = ?1)";

fn recipe_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Recipe> {
    let difficulty: String = r.get(6)?;
    let ingredients: String = r.get(8)?;
    let instructions: String = r.get(9)?;
    Ok(Recipe {
        id: r.get(0)?,
        slug: r.get(1)?,
        title: r.get(2)?,
        description: r.get(3)?,
        country_name: r.get(4)?,
        country_slug: r.get(5)?,
        difficulty: Difficulty::parse(&difficulty),
        time: r.get(7)?,
        ingredients: serde_json::from_str(&ingredients).unwrap_or_default(),
        instructions: serde_json::from_str(&instructions).unwrap_or_default(),
        rating_avg: r.get(10)?,
        rating_count: r.get(11)?,
        liked: r.get(12)?,
    })
}

/// Lists recipes newest first, joined with their country.
///
/// `viewer_id` drives the per-recipe `liked` flag; pass `None` for anonymous
/// listings. `query.exclude_ids` is bound as a JSON array and expanded with
/// `json_each`, so the statement text is the same for any number of ids.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn list_recipes(
    conn: &Connection,
    viewer_id: Option<&str>,
    query: RecipeQuery,
) -> Result<Vec<Recipe>, tokio_rusqlite::Error> {
    let viewer_id = viewer_id.map(str::to_owned);
    let excluded = serde_json::to_string(&query.exclude_ids).unwrap_or_else(|_| "[]".to_owned());
    let limit: i64 = query.limit.map(i64::from).unwrap_or(-1);
    let offset: i64 = query.offset.map(i64::from).unwrap_or(0);

    conn.call(move |db| {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS}
             FROM recipes r JOIN countries c ON c.id = r.country_id
             WHERE (?2 IS NULL OR c.slug = ?2)
               AND r.id NOT IN (SELECT value FROM json_each(?3))
             ORDER BY r.created_at DESC, r.slug ASC
             LIMIT ?4 OFFSET ?5"
        );
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params![&viewer_id, &query.country_slug, &excluded, limit, offset],
                recipe_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

/// Fetches one recipe by its URL slug, or `None` when no such recipe exists.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn get_recipe_by_slug(
    conn: &Connection,
    viewer_id: Option<&str>,
    slug: &str,
) -> Result<Option<Recipe>, tokio_rusqlite::Error> {
    let viewer_id = viewer_id.map(str::to_owned);
    let slug = slug.to_owned();

    conn.call(move |db| {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS}
             FROM recipes r JOIN countries c ON c.id = r.country_id
             WHERE r.slug = ?2"
        );
        let recipe = db
            .query_row(&sql, rusqlite::params![&viewer_id, &slug], recipe_from_row)
            .optional()?;
        Ok(recipe)
    })
    .await
}

/// Up to `limit` other recipes from the same cuisine as `recipe`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn related_recipes(
    conn: &Connection,
    viewer_id: Option<&str>,
    recipe: &Recipe,
    limit: u32,
) -> Result<Vec<Recipe>, tokio_rusqlite::Error> {
    list_recipes(
        conn,
        viewer_id,
        RecipeQuery {
            limit: Some(limit),
            offset: None,
            country_slug: Some(recipe.country_slug.clone()),
            exclude_ids: vec![recipe.id.clone()],
        },
    )
    .await
}

/// Lists cuisines ordered by how many recipes they have (most first).
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn popular_countries(
    conn: &Connection,
    limit: u32,
) -> Result<Vec<Country>, tokio_rusqlite::Error> {
    conn.call(move |db| {
        let mut stmt = db.prepare(
            "SELECT c.id, c.name, c.slug, COUNT(r.id) AS n
             FROM countries c LEFT JOIN recipes r ON r.country_id = c.id
             GROUP BY c.id
             ORDER BY n DESC, c.name ASC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![limit], |r| {
                Ok(Country {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    slug: r.get(2)?,
                    recipe_count: r.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

fn comment_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let rating: Option<i64> = r.get(5)?;
    Ok(Comment {
        id: r.get(0)?,
        recipe_id: r.get(1)?,
        author_id: r.get(2)?,
        author_name: r.get(3)?,
        body: r.get(4)?,
        rating: rating.and_then(|v| u8::try_from(v).ok()),
        created_at: r.get(6)?,
    })
}

/// Loads all reviews for `recipe_id`, oldest first, with author names.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn load_reviews(
    conn: &Connection,
    recipe_id: &str,
) -> Result<Vec<Comment>, tokio_rusqlite::Error> {
    let recipe_id = recipe_id.to_owned();

    conn.call(move |db| {
        let mut stmt = db.prepare(
            "SELECT v.id, v.recipe_id, v.user_id, u.name, v.comment, v.rating, v.created_at
             FROM reviews v JOIN users u ON u.id = v.user_id
             WHERE v.recipe_id = ?1
             ORDER BY v.created_at ASC, v.rowid ASC",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![&recipe_id], comment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

fn recipe_exists(db: &rusqlite::Connection, recipe_id: &str) -> rusqlite::Result<bool> {
    db.query_row(
        "SELECT EXISTS(SELECT 1 FROM recipes WHERE id = ?1)",
        rusqlite::params![recipe_id],
        |r| r.get(0),
    )
}

/// Sets whether `user_id` likes `recipe_id`.
///
/// Inserts the `(user_id, recipe_id)` row when `liked` and deletes it otherwise,
/// inside `BEGIN IMMEDIATE`. Writing the intended state rather than flipping it
/// makes repeated calls converge on the same row.
///
/// Returns `Some(liked)` as stored, or `None` when the recipe does not exist.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the write transaction fails.
pub async fn set_like(
    conn: &Connection,
    user_id: &str,
    recipe_id: &str,
    liked: bool,
) -> Result<Option<bool>, tokio_rusqlite::Error> {
    let user_id = user_id.to_owned();
    let recipe_id = recipe_id.to_owned();

    conn.call(move |db| {
        if !recipe_exists(db, &recipe_id)? {
            return Ok(None);
        }
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        if liked {
            tx.execute(
                "INSERT INTO likes (user_id, recipe_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, recipe_id) DO NOTHING",
                rusqlite::params![&user_id, &recipe_id, now_secs()],
            )?;
        } else {
            tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND recipe_id = ?2",
                rusqlite::params![&user_id, &recipe_id],
            )?;
        }
        tx.commit()?;
        Ok(Some(liked))
    })
    .await
}

/// Inserts a review and recomputes the recipe's aggregate rating in one transaction.
///
/// `rating_avg` / `rating_count` are recomputed with `AVG` / `COUNT` over every
/// rated review of the recipe, never adjusted incrementally.
///
/// Returns the created comment (server-assigned UUID and timestamp), or `None`
/// when the recipe does not exist.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the transaction fails (including the
/// `rating BETWEEN 1 AND 5` CHECK).
pub async fn insert_review(
    conn: &Connection,
    user_id: &str,
    recipe_id: &str,
    body: &str,
    rating: Option<u8>,
) -> Result<Option<Comment>, tokio_rusqlite::Error> {
    let user_id = user_id.to_owned();
    let recipe_id = recipe_id.to_owned();
    let body = body.to_owned();

    conn.call(move |db| {
        if !recipe_exists(db, &recipe_id)? {
            return Ok(None);
        }
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_secs();

        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO reviews (id, recipe_id, user_id, comment, rating, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![&id, &recipe_id, &user_id, &body, rating, now],
        )?;
        tx.execute(
            "UPDATE recipes
             SET rating_avg   = (SELECT AVG(rating) FROM reviews
                                 WHERE recipe_id = ?1 AND rating IS NOT NULL),
                 rating_count = (SELECT COUNT(rating) FROM reviews WHERE recipe_id = ?1)
             WHERE id = ?1",
            rusqlite::params![&recipe_id],
        )?;
        let comment = tx.query_row(
            "SELECT v.id, v.recipe_id, v.user_id, u.name, v.comment, v.rating, v.created_at
             FROM reviews v JOIN users u ON u.id = v.user_id
             WHERE v.id = ?1",
            rusqlite::params![&id],
            comment_from_row,
        )?;
        tx.commit()?;
        Ok(Some(comment))
    })
    .await
}

/// Outcome of checking a submitted verification code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Valid,
    Invalid,
    Expired,
    /// The last allowed wrong guess; the pending code has been deleted.
    TooManyAttempts,
}

/// Wrong guesses allowed against one emailed code.
pub const MAX_CODE_ATTEMPTS: i64 = 3;

/// Stores `code` as the pending verification code for `email`, replacing any
/// previous one.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the upsert fails.
pub async fn store_verification_code(
    conn: &Connection,
    email: &str,
    code: &str,
    expires_at: i64,
) -> Result<(), tokio_rusqlite::Error> {
    let email = email.to_owned();
    let code = code.to_owned();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO verification_codes (email, code, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO UPDATE SET code = excluded.code,
                                              expires_at = excluded.expires_at,
                                              attempts = 0",
            rusqlite::params![&email, &code, expires_at],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Checks `code` against the pending code for `email` and consumes it on success.
///
/// Expired codes are deleted as well. A wrong code counts as an attempt; the
/// pending code survives for a retype until [`MAX_CODE_ATTEMPTS`] is reached,
/// then it is deleted and a new one must be requested.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the transaction fails.
pub async fn consume_verification_code(
    conn: &Connection,
    email: &str,
    code: &str,
) -> Result<CodeCheck, tokio_rusqlite::Error> {
    let email = email.to_owned();
    let code = code.to_owned();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let stored: Option<(String, i64, i64)> = tx
            .query_row(
                "SELECT code, expires_at, attempts FROM verification_codes WHERE email = ?1",
                rusqlite::params![&email],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;

        let check = match stored {
            None => CodeCheck::Invalid,
            Some((_, expires_at, _)) if expires_at <= now_secs() => CodeCheck::Expired,
            Some((stored, _, attempts)) if stored != code => {
                if attempts + 1 >= MAX_CODE_ATTEMPTS {
                    CodeCheck::TooManyAttempts
                } else {
                    tx.execute(
                        "UPDATE verification_codes SET attempts = attempts + 1 WHERE email = ?1",
                        rusqlite::params![&email],
                    )?;
                    CodeCheck::Invalid
                }
            }
            Some(_) => CodeCheck::Valid,
        };

        if check != CodeCheck::Invalid {
            tx.execute(
                "DELETE FROM verification_codes WHERE email = ?1",
                rusqlite::params![&email],
            )?;
        }
        tx.commit()?;
        Ok(check)
    })
    .await
}

/// Finds the user registered with `email`, creating one on first sign-in.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query or insert fails.
pub async fn find_or_create_user(
    conn: &Connection,
    email: &str,
) -> Result<User, tokio_rusqlite::Error> {
    let email = email.to_owned();

    conn.call(move |db| {
        let existing: Option<User> = db
            .query_row(
                "SELECT id, email, name, role, created_at FROM users WHERE email = ?1",
                rusqlite::params![&email],
                |r| {
                    Ok(User {
                        id: r.get(0)?,
                        email: r.get(1)?,
                        name: r.get(2)?,
                        role: r.get(3)?,
                        created_at: r.get(4)?,
                    })
                },
            )
            .optional()?;

        if let Some(user) = existing {
            return Ok(user);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: email.split('@').next().unwrap_or_default().to_owned(),
            email,
            role: "user".to_owned(),
            created_at: now_secs(),
        };
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO users (id, email, name, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![&user.id, &user.email, &user.name, &user.role, user.created_at],
        )?;
        tx.commit()?;
        Ok(user)
    })
    .await
}

/// Creates a session for `user` valid for `ttl` and returns it.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the insert fails.
pub async fn create_session(
    conn: &Connection,
    user: &User,
    ttl: Duration,
) -> Result<SessionUser, tokio_rusqlite::Error> {
    let now = now_secs();
    let session = SessionUser {
        token: uuid::Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        expires_at: now + ttl.as_secs() as i64,
    };
    let row = session.clone();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![&row.token, &row.user_id, now, row.expires_at],
        )?;
        tx.commit()?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(session)
}

/// Resolves a session token to its user. Expired or unknown tokens yield `None`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn get_session(
    conn: &Connection,
    token: &str,
) -> Result<Option<SessionUser>, tokio_rusqlite::Error> {
    let token = token.to_owned();

    conn.call(move |db| {
        let session = db
            .query_row(
                "SELECT s.token, s.user_id, u.name, u.email, s.expires_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1 AND s.expires_at > ?2",
                rusqlite::params![&token, now_secs()],
                |r| {
                    Ok(SessionUser {
                        token: r.get(0)?,
                        user_id: r.get(1)?,
                        name: r.get(2)?,
                        email: r.get(3)?,
                        expires_at: r.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    })
    .await
}

/// Deletes the session identified by `token`. Unknown tokens are a no-op.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the delete fails.
pub async fn delete_session(conn: &Connection, token: &str) -> Result<(), tokio_rusqlite::Error> {
    let token = token.to_owned();

    conn.call(move |db| {
        db.execute("DELETE FROM sessions WHERE token = ?1", rusqlite::params![&token])?;
        Ok(())
    })
    .await
}
