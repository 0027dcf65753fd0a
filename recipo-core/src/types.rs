/// A signed-up user.
///
/// Users are created on their first successful email-OTP sign-in. `name`
/// defaults to the local part of the email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,           // UUID v4 text
    pub email: String,
    pub name: String,
    pub role: String,         // "user" | "admin"
    pub created_at: i64,      // Unix timestamp seconds
}

/// The identity resolved from a session token.
///
/// Passed explicitly into every mutation through
/// [`RequestContext`](crate::gateway::RequestContext); never read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub expires_at: i64,
}

/// A cuisine, listed on the home screen with its recipe count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub recipe_count: i64,
}

/// Recipe difficulty as stored in the `recipes.difficulty` CHECK column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Unknown values read back from the database degrade to `Medium`.
    pub fn parse(s: &str) -> Self {
        match s {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// A recipe joined with its country, plus the acting user's like flag.
///
/// `liked` is always `false` for anonymous listings. `rating_avg` is the
/// server-side aggregate maintained by [`crate::db::insert_review`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub country_name: String,
    pub country_slug: String,
    pub difficulty: Difficulty,
    pub time: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub rating_avg: Option<f64>,
    pub rating_count: i64,
    pub liked: bool,
}

/// Filters for [`crate::db::list_recipes`].
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub country_slug: Option<String>,
    pub exclude_ids: Vec<String>,
}

/// Like state for one rendered recipe card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeState {
    pub recipe_id: String,
    pub liked: bool,
}

/// A review left on a recipe, joined with its author's display name.
///
/// Immutable once created: there is no edit or delete path.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,           // UUID v4 text
    pub recipe_id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub rating: Option<u8>,   // 1..=5 when present
    pub created_at: i64,
}

/// The draft being typed in a recipe's comment box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSubmission {
    pub body: String,
    pub rating: Option<u8>,
}
