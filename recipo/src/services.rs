//! Runs queued [`Command`]s off the UI path.
//!
//! Each command becomes a spawned tokio task that talks to the store, the
//! mutation gateway, or the sign-in flow, and reports back with exactly one
//! `AppEvent`. The event loop never awaits I/O itself.

use std::path::PathBuf;
use std::sync::Arc;

use recipo_core::auth::OtpAuth;
use recipo_core::db;
use recipo_core::gateway::{MutationGateway, RequestContext, SqliteGateway};
use recipo_core::like::LikeLanes;
use recipo_core::mail::Outbox;
use recipo_core::types::RecipeQuery;
use tokio::sync::mpsc::UnboundedSender;
use tokio_rusqlite::Connection;

use crate::app::{Command, PAGE_SIZE, RELATED_LIMIT};
use crate::event::{AppEvent, AuthEvent, RecipeFeed, RecipePage};

/// Cuisines listed beside the feed.
const COUNTRY_LIMIT: u32 = 8;

#[derive(Clone)]
pub struct Services {
    conn: Connection,
    gateway: SqliteGateway,
    likes: LikeLanes<SqliteGateway>,
    auth: Arc<OtpAuth<Outbox>>,
    session_file: PathBuf,
    tx: UnboundedSender<AppEvent>,
}

impl Services {
    pub fn new(
        conn: Connection,
        gateway: SqliteGateway,
        outbox: Outbox,
        session_file: PathBuf,
        tx: UnboundedSender<AppEvent>,
    ) -> Self {
        let auth = Arc::new(OtpAuth::new(conn.clone(), outbox));
        let likes = LikeLanes::new(gateway.clone());
        Self { conn, gateway, likes, auth, session_file, tx }
    }

    /// Spawns the task for `command`. `ctx` and `viewer` describe who is acting.
    ///
    /// Likes for one recipe are queued here, in dispatch order, so the store
    /// applies them in the order the user pressed the heart.
    pub fn dispatch(&self, command: Command, ctx: RequestContext, viewer: Option<String>) {
        let command = match command {
            Command::SetLike(request) => {
                let response = self.likes.submit(request, ctx);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(AppEvent::LikeResolved(response.await));
                });
                return;
            }
            other => other,
        };
        let this = self.clone();
        tokio::spawn(async move {
            let event = this.run(command, ctx, viewer).await;
            let _ = this.tx.send(event);
        });
    }

    async fn run(&self, command: Command, ctx: RequestContext, viewer: Option<String>) -> AppEvent {
        match command {
            Command::LoadRecipes { country, offset } => {
                AppEvent::RecipesLoaded(self.load_feed(viewer.as_deref(), country, offset).await)
            }
            Command::OpenRecipe(slug) => {
                AppEvent::RecipeLoaded(self.load_page(viewer.as_deref(), &slug).await)
            }
            Command::SetLike(request) => {
                AppEvent::LikeResolved(self.likes.submit(request, ctx).await)
            }
            Command::PostComment(request) => {
                AppEvent::CommentResolved(request.send(&self.gateway, &ctx).await)
            }
            Command::SendOtp(email) => {
                let result = self.auth.send_otp(&email).await.map(|()| email);
                AppEvent::Auth(AuthEvent::CodeSent(result.map_err(|e| e.to_string())))
            }
            Command::SignIn { email, code } => {
                let result = self.auth.sign_in_otp(&email, &code).await;
                if let Ok(session) = &result {
                    if let Err(e) = tokio::fs::write(&self.session_file, &session.token).await {
                        tracing::warn!(error = %e, "could not remember session");
                    }
                }
                AppEvent::Auth(AuthEvent::SignedIn(result.map_err(|e| e.to_string())))
            }
            Command::SignOut(token) => {
                if let Err(e) = self.auth.sign_out(&token).await {
                    tracing::warn!(error = %e, "sign-out failed");
                }
                let _ = tokio::fs::remove_file(&self.session_file).await;
                AppEvent::Auth(AuthEvent::SignedOut)
            }
        }
    }

    async fn load_feed(
        &self,
        viewer: Option<&str>,
        country: Option<String>,
        offset: u32,
    ) -> Result<RecipeFeed, String> {
        let query = RecipeQuery {
            limit: Some(PAGE_SIZE),
            offset: Some(offset),
            country_slug: country,
            exclude_ids: Vec::new(),
        };
        let recipes = db::list_recipes(&self.conn, viewer, query).await.map_err(|e| e.to_string())?;
        let countries = db::popular_countries(&self.conn, COUNTRY_LIMIT)
            .await
            .map_err(|e| e.to_string())?;
        Ok(RecipeFeed { recipes, countries, append: offset > 0 })
    }

    async fn load_page(
        &self,
        viewer: Option<&str>,
        slug: &str,
    ) -> Result<Option<Box<RecipePage>>, String> {
        let page = async {
            let Some(recipe) = db::get_recipe_by_slug(&self.conn, viewer, slug).await? else {
                return Ok(None);
            };
            let reviews = db::load_reviews(&self.conn, &recipe.id).await?;
            let related = db::related_recipes(&self.conn, viewer, &recipe, RELATED_LIMIT).await?;
            Ok::<_, tokio_rusqlite::Error>(Some(Box::new(RecipePage { recipe, reviews, related })))
        };
        page.await.map_err(|e| e.to_string())
    }

    /// Checks the token remembered from the last run and reports who it belongs to.
    pub fn restore_session(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let Ok(token) = tokio::fs::read_to_string(&this.session_file).await else {
                return;
            };
            let ctx = RequestContext::with_token(token.trim());
            let session = match this.gateway.get_session(&ctx).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(error = %e, "session lookup failed");
                    None
                }
            };
            if session.is_none() {
                let _ = tokio::fs::remove_file(&this.session_file).await;
            }
            let _ = this.tx.send(AppEvent::Auth(AuthEvent::Restored(session)));
        });
    }
}
