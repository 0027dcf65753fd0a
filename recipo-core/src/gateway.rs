//! The Mutation Gateway: the only path by which the client changes durable state.
//!
//! Every call takes a [`RequestContext`] carrying the caller's session token.
//! Identity is resolved per call on the server side, so an expired session turns
//! into [`GatewayError::Unauthenticated`] instead of a silent no-op.

use std::future::Future;
use std::time::Duration;

use tokio_rusqlite::Connection;

use crate::db;
use crate::error::GatewayError;
use crate::types::{Comment, LikeState, SessionUser};

/// Default bound on a single gateway call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-request identity, passed explicitly into every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub session_token: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { session_token: Some(token.into()) }
    }
}

/// Durable mutations consumed by the like toggle and the comment section.
///
/// Implementations must be cheap to clone into a spawned task.
pub trait MutationGateway: Clone + Send + Sync + 'static {
    /// Persists the intended like state for the acting user on `recipe_id`.
    fn set_like(
        &self,
        ctx: &RequestContext,
        recipe_id: &str,
        liked: bool,
    ) -> impl Future<Output = Result<LikeState, GatewayError>> + Send;

    /// Persists a review and returns the created record.
    fn create_comment(
        &self,
        ctx: &RequestContext,
        recipe_id: &str,
        body: &str,
        rating: Option<u8>,
    ) -> impl Future<Output = Result<Comment, GatewayError>> + Send;

    /// Resolves the acting user; `None` means anonymous.
    fn get_session(
        &self,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<Option<SessionUser>, GatewayError>> + Send;
}

/// Bounds `fut` by `limit`, mapping an elapsed timer to [`GatewayError::Timeout`].
///
/// The underlying work is not cancelled server-side; its result is simply dropped.
pub async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?limit, "gateway call timed out");
            Err(GatewayError::Timeout(limit))
        }
    }
}

/// [`MutationGateway`] backed by the local SQLite database.
#[derive(Clone)]
pub struct SqliteGateway {
    conn: Connection,
    timeout: Duration,
}

impl SqliteGateway {
    pub fn new(conn: Connection, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    async fn require_user(&self, ctx: &RequestContext) -> Result<SessionUser, GatewayError> {
        let token = ctx.session_token.as_deref().ok_or(GatewayError::Unauthenticated)?;
        db::get_session(&self.conn, token)
            .await?
            .ok_or(GatewayError::Unauthenticated)
    }
}

impl MutationGateway for SqliteGateway {
    async fn set_like(
        &self,
        ctx: &RequestContext,
        recipe_id: &str,
        liked: bool,
    ) -> Result<LikeState, GatewayError> {
        with_timeout(self.timeout, async {
            let user = self.require_user(ctx).await?;
            let stored = db::set_like(&self.conn, &user.user_id, recipe_id, liked)
                .await?
                .ok_or_else(|| GatewayError::NotFound(format!("recipe {recipe_id}")))?;
            tracing::info!(recipe_id, liked = stored, user = %user.user_id, "like stored");
            Ok::<_, GatewayError>(LikeState { recipe_id: recipe_id.to_owned(), liked: stored })
        })
        .await
    }

    async fn create_comment(
        &self,
        ctx: &RequestContext,
        recipe_id: &str,
        body: &str,
        rating: Option<u8>,
    ) -> Result<Comment, GatewayError> {
        with_timeout(self.timeout, async {
            let user = self.require_user(ctx).await?;
            let comment = db::insert_review(&self.conn, &user.user_id, recipe_id, body, rating)
                .await?
                .ok_or_else(|| GatewayError::NotFound(format!("recipe {recipe_id}")))?;
            tracing::info!(recipe_id, comment_id = %comment.id, ?rating, "review created");
            Ok::<_, GatewayError>(comment)
        })
        .await
    }

    async fn get_session(&self, ctx: &RequestContext) -> Result<Option<SessionUser>, GatewayError> {
        let Some(token) = ctx.session_token.as_deref() else {
            return Ok(None);
        };
        with_timeout(self.timeout, async {
            Ok::<_, GatewayError>(db::get_session(&self.conn, token).await?)
        })
        .await
    }
}
