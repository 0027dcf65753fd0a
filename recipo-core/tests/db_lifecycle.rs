//! Integration test for the recipe store.
//!
//! Exercises: open_db, migrate, seed_demo_data, list_recipes, get_recipe_by_slug,
//! related_recipes, popular_countries, set_like, insert_review, load_reviews,
//! and the session/verification-code helpers.

use std::time::Duration;

use recipo_core::db::{self, CodeCheck};
use recipo_core::seed::seed_demo_data;
use recipo_core::types::RecipeQuery;

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("test.db");
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn schema_and_catalogue() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    // Verify schema_version = 2
    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 2, "schema_version should be 2");

    // Verify WAL mode
    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    // likes has the composite (user_id, recipe_id) PK
    let likes_pk: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT COUNT(*) FROM pragma_table_info('likes') WHERE pk > 0",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(likes_pk, 2, "likes should have composite PK");

    assert!(seed_demo_data(&conn).await.unwrap(), "empty db gets seeded");
    assert!(!seed_demo_data(&conn).await.unwrap(), "second seed is a no-op");

    let all = db::list_recipes(&conn, None, RecipeQuery::default()).await.unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|r| !r.liked), "anonymous listing has no likes");
    assert!(all.iter().all(|r| r.rating_avg.is_none() && r.rating_count == 0));

    let italian = db::list_recipes(
        &conn,
        None,
        RecipeQuery { country_slug: Some("italy".into()), ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(italian.len(), 2);
    assert!(italian.iter().all(|r| r.country_name == "Italy"));

    let page = db::list_recipes(
        &conn,
        None,
        RecipeQuery { limit: Some(2), offset: Some(1), ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, all[1].id);

    let excluded = db::list_recipes(
        &conn,
        None,
        RecipeQuery { exclude_ids: vec![all[0].id.clone(), all[1].id.clone()], ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(excluded.len(), 3);

    let carbonara = db::get_recipe_by_slug(&conn, None, "spaghetti-carbonara")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(carbonara.title, "Spaghetti Carbonara");
    assert_eq!(carbonara.ingredients.len(), 5);
    assert!(db::get_recipe_by_slug(&conn, None, "nope").await.unwrap().is_none());

    let related = db::related_recipes(&conn, None, &carbonara, 4).await.unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].slug, "margherita-pizza");

    let countries = db::popular_countries(&conn, 10).await.unwrap();
    assert_eq!(countries[0].slug, "italy");
    assert_eq!(countries[0].recipe_count, 2);
}

#[tokio::test]
async fn likes_and_reviews() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();
    seed_demo_data(&conn).await.unwrap();

    let ana = db::find_or_create_user(&conn, "ana@example.com").await.unwrap();
    assert_eq!(ana.name, "ana");
    let again = db::find_or_create_user(&conn, "ana@example.com").await.unwrap();
    assert_eq!(again.id, ana.id, "existing user is reused");
    let ben = db::find_or_create_user(&conn, "ben@example.com").await.unwrap();

    let soup = db::get_recipe_by_slug(&conn, None, "miso-soup").await.unwrap().unwrap();

    // Setting the same state twice converges on one row.
    assert_eq!(db::set_like(&conn, &ana.id, &soup.id, true).await.unwrap(), Some(true));
    assert_eq!(db::set_like(&conn, &ana.id, &soup.id, true).await.unwrap(), Some(true));
    let likes: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("SELECT COUNT(*) FROM likes", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(likes, 1);

    let seen = db::get_recipe_by_slug(&conn, Some(&ana.id), "miso-soup").await.unwrap().unwrap();
    assert!(seen.liked);
    let seen = db::get_recipe_by_slug(&conn, Some(&ben.id), "miso-soup").await.unwrap().unwrap();
    assert!(!seen.liked, "likes are per user");

    assert_eq!(db::set_like(&conn, &ana.id, &soup.id, false).await.unwrap(), Some(false));
    let seen = db::get_recipe_by_slug(&conn, Some(&ana.id), "miso-soup").await.unwrap().unwrap();
    assert!(!seen.liked);

    assert_eq!(db::set_like(&conn, &ana.id, "missing", true).await.unwrap(), None);

    // Aggregate is recomputed over rated reviews only.
    db::insert_review(&conn, &ana.id, &soup.id, "Lovely", Some(5)).await.unwrap().unwrap();
    db::insert_review(&conn, &ben.id, &soup.id, "Good", Some(4)).await.unwrap().unwrap();
    let unrated = db::insert_review(&conn, &ben.id, &soup.id, "Made it twice", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unrated.author_name, "ben");
    assert_eq!(unrated.rating, None);

    let soup = db::get_recipe_by_slug(&conn, None, "miso-soup").await.unwrap().unwrap();
    assert_eq!(soup.rating_avg, Some(4.5));
    assert_eq!(soup.rating_count, 2);

    let reviews = db::load_reviews(&conn, &soup.id).await.unwrap();
    assert_eq!(reviews.len(), 3);
    assert_eq!(reviews[0].body, "Lovely", "oldest first");
    assert_eq!(reviews[2].id, unrated.id);

    assert!(db::insert_review(&conn, &ana.id, "missing", "x", None).await.unwrap().is_none());
    assert!(
        db::insert_review(&conn, &ana.id, &soup.id, "x", Some(6)).await.is_err(),
        "CHECK rejects out-of-range ratings"
    );

    // Persistence across connections
    let conn2 = db::open_db(&path).await.unwrap();
    assert_eq!(db::load_reviews(&conn2, &soup.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn sessions_and_codes() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();
    let user = db::find_or_create_user(&conn, "cy@example.com").await.unwrap();

    let session = db::create_session(&conn, &user, Duration::from_secs(3600)).await.unwrap();
    let found = db::get_session(&conn, &session.token).await.unwrap().unwrap();
    assert_eq!(found.user_id, user.id);
    assert_eq!(found.email, "cy@example.com");

    db::delete_session(&conn, &session.token).await.unwrap();
    assert!(db::get_session(&conn, &session.token).await.unwrap().is_none());

    let expired = db::create_session(&conn, &user, Duration::ZERO).await.unwrap();
    assert!(db::get_session(&conn, &expired.token).await.unwrap().is_none());

    let later = db::now_secs() + 300;
    db::store_verification_code(&conn, "cy@example.com", "111111", later).await.unwrap();
    // Replaced by a newer code
    db::store_verification_code(&conn, "cy@example.com", "222222", later).await.unwrap();
    assert_eq!(
        db::consume_verification_code(&conn, "cy@example.com", "111111").await.unwrap(),
        CodeCheck::Invalid
    );
    assert_eq!(
        db::consume_verification_code(&conn, "cy@example.com", "222222").await.unwrap(),
        CodeCheck::Valid
    );
    assert_eq!(
        db::consume_verification_code(&conn, "cy@example.com", "222222").await.unwrap(),
        CodeCheck::Invalid,
        "codes are single use"
    );

    db::store_verification_code(&conn, "cy@example.com", "333333", 0).await.unwrap();
    assert_eq!(
        db::consume_verification_code(&conn, "cy@example.com", "333333").await.unwrap(),
        CodeCheck::Expired
    );
}

#[tokio::test]
async fn wrong_codes_lock_out_the_pending_code() {
    let conn = db::open_db(&temp_db_path()).await.unwrap();
    let later = db::now_secs() + 300;
    db::store_verification_code(&conn, "dee@example.com", "424242", later).await.unwrap();

    for _ in 1..db::MAX_CODE_ATTEMPTS {
        assert_eq!(
            db::consume_verification_code(&conn, "dee@example.com", "000000").await.unwrap(),
            CodeCheck::Invalid
        );
    }
    assert_eq!(
        db::consume_verification_code(&conn, "dee@example.com", "000000").await.unwrap(),
        CodeCheck::TooManyAttempts
    );
    assert_eq!(
        db::consume_verification_code(&conn, "dee@example.com", "424242").await.unwrap(),
        CodeCheck::Invalid,
        "the right code no longer works once locked out"
    );

    // A fresh code starts with a clean counter.
    db::store_verification_code(&conn, "dee@example.com", "515151", later).await.unwrap();
    db::consume_verification_code(&conn, "dee@example.com", "000000").await.unwrap();
    assert_eq!(
        db::consume_verification_code(&conn, "dee@example.com", "515151").await.unwrap(),
        CodeCheck::Valid
    );
}
