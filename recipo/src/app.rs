//! Central application state for recipo.
//!
//! This module owns all mutable UI state: the current mode, which panel has
//! focus, the loaded recipe feed, per-recipe like toggles, the open recipe page
//! with its comment section, and the signed-in session. No ratatui rendering
//! lives here. Anything that needs I/O is queued as a [`Command`] and run by the
//! event loop; results come back through `apply_*` methods.

use std::collections::HashMap;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use recipo_core::comments::{CommentRequest, CommentResponse, CommentSection, SubmitError};
use recipo_core::error::GatewayError;
use recipo_core::gateway::RequestContext;
use recipo_core::like::{LikeOutcome, LikeRequest, LikeResponse, LikeToggle};
use recipo_core::types::{Country, Recipe, SessionUser};

use crate::event::{AuthEvent, RecipeFeed, RecipePage};

/// Recipes fetched per feed page.
pub const PAGE_SIZE: u32 = 20;
/// Related recipes shown under an open recipe.
pub const RELATED_LIMIT: u32 = 4;
/// Status messages stay up for this many logic ticks (4 Hz).
const STATUS_TICKS: u8 = 16;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing a comment into the open recipe's draft.
    Insert,
    SignInEmail,
    SignInCode,
    HelpOverlay,
}

/// Which panel currently has keyboard focus.
///
/// Cycle order: `Recipes` → `Detail` → `Comments` → `Recipes`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    Recipes,
    Detail,
    Comments,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Recipes => PanelFocus::Comments,
            PanelFocus::Detail => PanelFocus::Recipes,
            PanelFocus::Comments => PanelFocus::Detail,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Recipes => PanelFocus::Detail,
            PanelFocus::Detail => PanelFocus::Comments,
            PanelFocus::Comments => PanelFocus::Recipes,
        }
    }
}

/// Work for the event loop to run off the UI path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `offset == 0` replaces the feed; anything else appends a page.
    LoadRecipes { country: Option<String>, offset: u32 },
    OpenRecipe(String),
    SetLike(LikeRequest),
    PostComment(CommentRequest),
    SendOtp(String),
    SignIn { email: String, code: String },
    SignOut(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
    ttl: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    pub email: String,
    pub code: String,
    /// A send-code or sign-in call is in flight.
    pub busy: bool,
}

/// The recipe shown in the detail and comment panels.
#[derive(Debug)]
pub struct OpenRecipe {
    pub recipe: Recipe,
    pub related: Vec<Recipe>,
    pub comments: CommentSection,
    /// A reload arrived while a comment was posting; refetch once it settles.
    reviews_outdated: bool,
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,

    pub recipes: Vec<Recipe>,
    pub recipe_list_state: ListState,
    pub recipes_loading: bool,
    /// The last page came back full, so `m` may fetch another.
    pub has_more: bool,
    pub countries: Vec<Country>,
    /// Slug of the cuisine the feed is filtered to.
    pub country_filter: Option<String>,

    /// One optimistic toggle per recipe id seen in the feed or detail view.
    pub likes: HashMap<String, LikeToggle>,

    pub page: Option<OpenRecipe>,
    pub page_loading: bool,

    pub session: Option<SessionUser>,
    pub sign_in: SignInForm,
    pub status: Option<Status>,

    pub detail_scroll: u16,
    pub comments_scroll: u16,
    pub help_scroll: u16,

    /// Inner heights cached after each render for page-wise scrolling.
    pub recipes_viewport_height: u16,
    pub detail_viewport_height: u16,
    pub comments_viewport_height: u16,

    pub left_pct: u16,
    pub center_pct: u16,
    pub right_pct: u16,

    /// `[recipes, detail, comments]` from the last frame, for click-to-focus.
    pub panel_rects: [Rect; 3],
    /// Row holding the five rating stars in the comment panel.
    pub stars_rect: Rect,

    commands: Vec<Command>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            recipes: Vec::new(),
            recipe_list_state: ListState::default(),
            recipes_loading: false,
            has_more: false,
            countries: Vec::new(),
            country_filter: None,
            likes: HashMap::new(),
            page: None,
            page_loading: false,
            session: None,
            sign_in: SignInForm::default(),
            status: None,
            detail_scroll: 0,
            comments_scroll: 0,
            help_scroll: 0,
            recipes_viewport_height: 0,
            detail_viewport_height: 0,
            comments_viewport_height: 0,
            left_pct: 30,
            center_pct: 40,
            right_pct: 30,
            panel_rects: [Rect::default(); 3],
            stars_rect: Rect::default(),
            commands: Vec::new(),
        }
    }
}

impl AppState {
    /// Identity for the next gateway call, taken from the current session.
    pub fn ctx(&self) -> RequestContext {
        match &self.session {
            Some(s) => RequestContext::with_token(s.token.clone()),
            None => RequestContext::anonymous(),
        }
    }

    pub fn viewer_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.user_id.clone())
    }

    /// Drains queued commands for the event loop to dispatch.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(Status { text: text.into(), kind, ttl: STATUS_TICKS });
    }

    /// Ages the status line; called on every logic tick.
    pub fn tick(&mut self) {
        if let Some(status) = &mut self.status {
            status.ttl = status.ttl.saturating_sub(1);
            if status.ttl == 0 {
                self.status = None;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Feed
    // -----------------------------------------------------------------------

    /// Queues a feed load: page one when `append` is false, the next page otherwise.
    pub fn request_recipes(&mut self, append: bool) {
        let offset = if append { self.recipes.len() as u32 } else { 0 };
        self.recipes_loading = true;
        self.commands.push(Command::LoadRecipes { country: self.country_filter.clone(), offset });
    }

    pub fn load_more(&mut self) {
        if self.has_more && !self.recipes_loading {
            self.request_recipes(true);
        }
    }

    /// Steps the cuisine filter: all → first cuisine → … → last → all.
    pub fn cycle_country(&mut self) {
        let current = self
            .country_filter
            .as_ref()
            .and_then(|slug| self.countries.iter().position(|c| &c.slug == slug));
        self.country_filter = match current {
            None => self.countries.first().map(|c| c.slug.clone()),
            Some(i) => self.countries.get(i + 1).map(|c| c.slug.clone()),
        };
        self.request_recipes(false);
    }

    pub fn apply_feed(&mut self, result: Result<RecipeFeed, String>) {
        self.recipes_loading = false;
        let feed = match result {
            Ok(feed) => feed,
            Err(e) => {
                self.set_status(format!("Could not load recipes: {e}"), StatusKind::Error);
                return;
            }
        };
        self.has_more = feed.recipes.len() == PAGE_SIZE as usize;
        for recipe in &feed.recipes {
            sync_like(&mut self.likes, recipe);
        }
        if feed.append {
            self.recipes.extend(feed.recipes);
        } else {
            self.recipes = feed.recipes;
            self.recipe_list_state.select(if self.recipes.is_empty() { None } else { Some(0) });
        }
        self.countries = feed.countries;
    }

    pub fn selected_recipe(&self) -> Option<&Recipe> {
        self.recipe_list_state.selected().and_then(|i| self.recipes.get(i))
    }

    /// What the heart for `recipe` shows, including any pending toggle.
    pub fn is_liked(&self, recipe: &Recipe) -> bool {
        self.likes.get(&recipe.id).map_or(recipe.liked, LikeToggle::liked)
    }

    // -----------------------------------------------------------------------
    // Detail page
    // -----------------------------------------------------------------------

    pub fn open_selected(&mut self) {
        if let Some(slug) = self.selected_recipe().map(|r| r.slug.clone()) {
            self.page_loading = true;
            self.commands.push(Command::OpenRecipe(slug));
        }
    }

    /// Re-fetches the feed and the open recipe.
    pub fn reload(&mut self) {
        self.request_recipes(false);
        self.reload_page();
    }

    fn reload_page(&mut self) {
        if let Some(slug) = self.page.as_ref().map(|p| p.recipe.slug.clone()) {
            self.page_loading = true;
            self.commands.push(Command::OpenRecipe(slug));
        }
    }

    pub fn apply_page(&mut self, result: Result<Option<Box<RecipePage>>, String>) {
        self.page_loading = false;
        let page = match result {
            Ok(Some(page)) => page,
            Ok(None) => return self.set_status("That recipe no longer exists", StatusKind::Error),
            Err(e) => return self.set_status(format!("Could not open recipe: {e}"), StatusKind::Error),
        };
        let RecipePage { recipe, reviews, related } = *page;
        sync_like(&mut self.likes, &recipe);
        for r in &related {
            sync_like(&mut self.likes, r);
        }

        let opened = match self.page.take() {
            // The in-flight post owns the section until it resolves.
            Some(mut old) if old.recipe.id == recipe.id && old.comments.is_submitting() => {
                old.recipe = recipe;
                old.related = related;
                old.reviews_outdated = true;
                old
            }
            // A reload of the same recipe keeps an unsent draft.
            Some(old) if old.recipe.id == recipe.id => {
                let mut comments = CommentSection::new(recipe.id.clone(), reviews);
                comments.set_body(old.comments.draft().body.clone());
                if let Some(r) = old.comments.draft().rating {
                    let _ = comments.set_rating(i64::from(r));
                }
                OpenRecipe { recipe, related, comments, reviews_outdated: false }
            }
            _ => {
                self.detail_scroll = 0;
                self.comments_scroll = 0;
                let comments = CommentSection::new(recipe.id.clone(), reviews);
                OpenRecipe { recipe, related, comments, reviews_outdated: false }
            }
        };
        self.page = Some(opened);
        if self.focus == PanelFocus::Recipes {
            self.focus = PanelFocus::Detail;
        }
    }

    // -----------------------------------------------------------------------
    // Likes
    // -----------------------------------------------------------------------

    /// The recipe the heart key acts on: the open recipe unless the feed has focus.
    fn like_target(&self) -> Option<&Recipe> {
        match (&self.page, self.focus) {
            (Some(page), PanelFocus::Detail | PanelFocus::Comments) => Some(&page.recipe),
            _ => self.selected_recipe(),
        }
    }

    /// Flips the heart at once and queues the mutation that persists it.
    pub fn toggle_like(&mut self) {
        let Some((id, liked)) = self.like_target().map(|r| (r.id.clone(), r.liked)) else {
            return;
        };
        let request = self
            .likes
            .entry(id.clone())
            .or_insert_with(|| LikeToggle::new(id, liked))
            .toggle();
        self.commands.push(Command::SetLike(request));
    }

    pub fn apply_like_response(&mut self, response: LikeResponse) {
        let Some(toggle) = self.likes.get_mut(&response.recipe_id) else {
            return;
        };
        let recipe_id = response.recipe_id.clone();
        match toggle.resolve(response) {
            LikeOutcome::Confirmed(liked) => {
                for r in self.recipes.iter_mut().filter(|r| r.id == recipe_id) {
                    r.liked = liked;
                }
                if let Some(page) = self.page.as_mut().filter(|p| p.recipe.id == recipe_id) {
                    page.recipe.liked = liked;
                }
            }
            LikeOutcome::RolledBack { error, .. } => self.gateway_failed(&error, "like recipes"),
            LikeOutcome::Stale => {}
        }
    }

    /// Reports a failed mutation. An expired or missing session opens sign-in.
    fn gateway_failed(&mut self, error: &GatewayError, action: &str) {
        match error {
            GatewayError::Unauthenticated => {
                self.set_status(format!("Sign in to {action}"), StatusKind::Error);
                self.session = None;
                self.start_sign_in();
            }
            other if other.is_retryable() => {
                self.set_status(format!("{other}. Try again."), StatusKind::Error);
            }
            other => self.set_status(other.to_string(), StatusKind::Error),
        }
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    pub fn begin_comment(&mut self) {
        if self.page.is_some() {
            self.focus = PanelFocus::Comments;
            self.mode = Mode::Insert;
        }
    }

    pub fn comment_input(&mut self, c: char) {
        if let Some(page) = &mut self.page {
            page.comments.push_char(c);
        }
    }

    pub fn comment_backspace(&mut self) {
        if let Some(page) = &mut self.page {
            page.comments.pop_char();
        }
    }

    pub fn set_rating(&mut self, stars: i64) {
        let Some(page) = &mut self.page else { return };
        if let Err(e) = page.comments.set_rating(stars) {
            self.set_status(e.to_string(), StatusKind::Error);
        }
    }

    pub fn clear_rating(&mut self) {
        if let Some(page) = &mut self.page {
            page.comments.clear_rating();
        }
    }

    pub fn hover_star(&mut self, stars: Option<u8>) {
        if let Some(page) = &mut self.page {
            page.comments.hover_rating(stars);
        }
    }

    /// Validates the draft and queues it. Invalid drafts never leave the client.
    pub fn submit_comment(&mut self) {
        let Some(page) = &mut self.page else { return };
        match page.comments.submit() {
            Ok(request) => {
                self.mode = Mode::Normal;
                self.commands.push(Command::PostComment(request));
            }
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
    }

    pub fn apply_comment_response(&mut self, response: CommentResponse) {
        let Some(page) = &mut self.page else { return };
        let outcome = match page.comments.resolve(response) {
            None => return,
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(e),
        };
        let refetch = std::mem::take(&mut page.reviews_outdated);
        match outcome {
            Ok(()) => {
                let average = page.comments.average_rating();
                let count = page.comments.comments().iter().filter(|c| c.rating.is_some()).count() as i64;
                page.recipe.rating_avg = average;
                page.recipe.rating_count = count;
                let id = page.recipe.id.clone();
                for r in self.recipes.iter_mut().filter(|r| r.id == id) {
                    r.rating_avg = average;
                    r.rating_count = count;
                }
                self.comments_scroll = u16::MAX;
                self.set_status("Comment posted", StatusKind::Info);
            }
            Err(SubmitError::Gateway(e)) => self.gateway_failed(&e, "leave a review"),
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
        if refetch {
            self.reload_page();
        }
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    pub fn start_sign_in(&mut self) {
        if let Some(s) = &self.session {
            let text = format!("Already signed in as {}", s.name);
            self.set_status(text, StatusKind::Info);
            return;
        }
        self.sign_in = SignInForm::default();
        self.mode = Mode::SignInEmail;
    }

    pub fn cancel_sign_in(&mut self) {
        self.sign_in = SignInForm::default();
        self.mode = Mode::Normal;
    }

    pub fn sign_in_input(&mut self, c: char) {
        match self.mode {
            Mode::SignInEmail => self.sign_in.email.push(c),
            Mode::SignInCode if c.is_ascii_digit() && self.sign_in.code.len() < 6 => {
                self.sign_in.code.push(c)
            }
            _ => {}
        }
    }

    pub fn sign_in_backspace(&mut self) {
        match self.mode {
            Mode::SignInEmail => {
                self.sign_in.email.pop();
            }
            Mode::SignInCode => {
                self.sign_in.code.pop();
            }
            _ => {}
        }
    }

    pub fn sign_in_submit(&mut self) {
        if self.sign_in.busy {
            return;
        }
        let command = match self.mode {
            Mode::SignInEmail => Command::SendOtp(self.sign_in.email.trim().to_owned()),
            Mode::SignInCode => Command::SignIn {
                email: self.sign_in.email.trim().to_owned(),
                code: self.sign_in.code.clone(),
            },
            _ => return,
        };
        self.sign_in.busy = true;
        self.commands.push(command);
    }

    pub fn sign_out(&mut self) {
        let Some(session) = self.session.take() else {
            self.set_status("Not signed in", StatusKind::Info);
            return;
        };
        self.commands.push(Command::SignOut(session.token));
        self.refresh_for_viewer();
    }

    /// Reloads everything whose `liked` flags depend on who is signed in.
    ///
    /// Pending toggles belonged to the previous viewer, so their responses go stale.
    fn refresh_for_viewer(&mut self) {
        for toggle in self.likes.values_mut() {
            toggle.invalidate();
        }
        self.request_recipes(false);
        self.reload_page();
    }

    pub fn apply_auth(&mut self, event: AuthEvent) {
        self.sign_in.busy = false;
        match event {
            AuthEvent::CodeSent(Ok(email)) => {
                if self.mode == Mode::SignInEmail {
                    self.mode = Mode::SignInCode;
                }
                self.set_status(format!("Code sent to {email}"), StatusKind::Info);
            }
            AuthEvent::SignedIn(Ok(session)) => {
                self.set_status(format!("Signed in as {}", session.name), StatusKind::Info);
                self.session = Some(session);
                self.cancel_sign_in();
                self.refresh_for_viewer();
            }
            AuthEvent::CodeSent(Err(e)) | AuthEvent::SignedIn(Err(e)) => {
                self.set_status(e, StatusKind::Error);
            }
            AuthEvent::SignedOut => self.set_status("Signed out", StatusKind::Info),
            AuthEvent::Restored(Some(session)) => {
                self.session = Some(session);
                self.refresh_for_viewer();
            }
            AuthEvent::Restored(None) => {}
        }
    }

    // -----------------------------------------------------------------------
    // Scrolling and layout
    // -----------------------------------------------------------------------

    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Recipes => self.recipe_list_state.scroll_down_by(lines),
            PanelFocus::Detail => self.detail_scroll = self.detail_scroll.saturating_add(lines),
            PanelFocus::Comments => {
                self.comments_scroll = self.comments_scroll.saturating_add(lines)
            }
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Recipes => self.recipe_list_state.scroll_up_by(lines),
            PanelFocus::Detail => self.detail_scroll = self.detail_scroll.saturating_sub(lines),
            PanelFocus::Comments => {
                self.comments_scroll = self.comments_scroll.saturating_sub(lines)
            }
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Recipes => self.recipe_list_state.select_first(),
            PanelFocus::Detail => self.detail_scroll = 0,
            PanelFocus::Comments => self.comments_scroll = 0,
        }
    }

    /// Paragraph offsets are clamped to their content when rendered.
    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Recipes => self.recipe_list_state.select_last(),
            PanelFocus::Detail => self.detail_scroll = u16::MAX,
            PanelFocus::Comments => self.comments_scroll = u16::MAX,
        }
    }

    fn viewport_height(&self) -> u16 {
        match self.focus {
            PanelFocus::Recipes => self.recipes_viewport_height,
            PanelFocus::Detail => self.detail_viewport_height,
            PanelFocus::Comments => self.comments_viewport_height,
        }
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.viewport_height() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.viewport_height() / 2).max(1));
    }

    /// Shrinks the detail (centre) panel, giving the width to the side panels.
    pub fn shrink_detail_panel(&mut self) {
        const MIN_CENTER: u16 = 20;
        const STEP: u16 = 5;
        if self.center_pct <= MIN_CENTER {
            return;
        }
        let transfer = STEP.min(self.center_pct - MIN_CENTER);
        self.center_pct -= transfer;
        let left_gain = transfer / 2;
        self.left_pct += left_gain;
        self.right_pct += transfer - left_gain;
    }

    /// Grows the detail panel by taking width from both side panels.
    pub fn grow_detail_panel(&mut self) {
        const MAX_CENTER: u16 = 70;
        const MIN_SIDE: u16 = 10;
        const STEP: u16 = 5;
        if self.center_pct >= MAX_CENTER {
            return;
        }
        let transfer = STEP.min(MAX_CENTER - self.center_pct);
        let left_give = (transfer / 2).min(self.left_pct.saturating_sub(MIN_SIDE));
        let right_give = (transfer - transfer / 2).min(self.right_pct.saturating_sub(MIN_SIDE));
        self.left_pct -= left_give;
        self.right_pct -= right_give;
        self.center_pct += left_give + right_give;
    }
}

/// Tracks `recipe`'s server-reported like flag without disturbing a pending toggle.
fn sync_like(likes: &mut HashMap<String, LikeToggle>, recipe: &Recipe) {
    likes
        .entry(recipe.id.clone())
        .and_modify(|t| {
            if !t.is_pending() {
                t.refresh(recipe.liked);
            }
        })
        .or_insert_with(|| LikeToggle::new(recipe.id.clone(), recipe.liked));
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipo_core::types::{Comment, Difficulty, LikeState};

    fn recipe(id: &str) -> Recipe {
        Recipe {
            id: id.into(),
            slug: format!("{id}-slug"),
            title: id.to_uppercase(),
            description: String::new(),
            country_name: "Italy".into(),
            country_slug: "italy".into(),
            difficulty: Difficulty::Easy,
            time: "10 min".into(),
            ingredients: Vec::new(),
            instructions: Vec::new(),
            rating_avg: None,
            rating_count: 0,
            liked: false,
        }
    }

    fn loaded(ids: &[&str]) -> AppState {
        let mut state = AppState::default();
        state.apply_feed(Ok(RecipeFeed {
            recipes: ids.iter().map(|id| recipe(id)).collect(),
            countries: Vec::new(),
            append: false,
        }));
        state
    }

    fn with_page(state: &mut AppState, id: &str, reviews: Vec<Comment>) {
        state.apply_page(Ok(Some(Box::new(RecipePage {
            recipe: recipe(id),
            reviews,
            related: Vec::new(),
        }))));
    }

    fn session() -> SessionUser {
        SessionUser {
            token: "tok".into(),
            user_id: "u1".into(),
            name: "ana".into(),
            email: "ana@example.com".into(),
            expires_at: i64::MAX,
        }
    }

    #[test]
    fn like_flips_before_any_response() {
        let mut state = loaded(&["r1", "r2"]);
        state.toggle_like();

        assert!(state.is_liked(&state.recipes[0].clone()));
        let cmds = state.take_commands();
        assert!(matches!(
            cmds.as_slice(),
            [Command::SetLike(LikeRequest { recipe_id, liked: true, .. })] if recipe_id == "r1"
        ));
    }

    #[test]
    fn unauthenticated_rollback_opens_sign_in() {
        let mut state = loaded(&["r1"]);
        state.toggle_like();
        let Some(Command::SetLike(req)) = state.take_commands().pop() else {
            panic!("expected a like command");
        };

        state.apply_like_response(LikeResponse {
            recipe_id: req.recipe_id,
            seq: req.seq,
            result: Err(GatewayError::Unauthenticated),
        });

        assert!(!state.is_liked(&state.recipes[0].clone()));
        assert_eq!(state.mode, Mode::SignInEmail);
        assert_eq!(state.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
    }

    #[test]
    fn confirmed_like_updates_feed_row() {
        let mut state = loaded(&["r1"]);
        state.toggle_like();
        let Some(Command::SetLike(req)) = state.take_commands().pop() else {
            panic!("expected a like command");
        };
        state.apply_like_response(LikeResponse {
            recipe_id: req.recipe_id.clone(),
            seq: req.seq,
            result: Ok(LikeState { recipe_id: req.recipe_id, liked: true }),
        });
        assert!(state.recipes[0].liked);
    }

    #[test]
    fn reload_does_not_clobber_pending_like() {
        let mut state = loaded(&["r1"]);
        state.toggle_like();
        state.apply_feed(Ok(RecipeFeed { recipes: vec![recipe("r1")], countries: Vec::new(), append: false }));
        assert!(state.is_liked(&state.recipes[0].clone()), "pending toggle survives a reload");
    }

    #[test]
    fn heart_targets_open_recipe_when_detail_focused() {
        let mut state = loaded(&["r1"]);
        with_page(&mut state, "r9", Vec::new());
        assert_eq!(state.focus, PanelFocus::Detail);

        state.toggle_like();
        let cmds = state.take_commands();
        assert!(matches!(
            cmds.as_slice(),
            [Command::SetLike(LikeRequest { recipe_id, .. })] if recipe_id == "r9"
        ));
    }

    #[test]
    fn empty_comment_is_not_queued() {
        let mut state = loaded(&["r1"]);
        with_page(&mut state, "r1", Vec::new());
        state.begin_comment();
        state.comment_input(' ');
        state.submit_comment();

        assert!(state.take_commands().is_empty());
        assert_eq!(state.mode, Mode::Insert);
        assert_eq!(state.status.as_ref().map(|s| s.text.as_str()), Some("comment cannot be empty"));
    }

    #[test]
    fn posted_comment_updates_recipe_rating() {
        let mut state = loaded(&["r1"]);
        with_page(&mut state, "r1", Vec::new());
        state.begin_comment();
        for c in "Great recipe!".chars() {
            state.comment_input(c);
        }
        state.set_rating(5);
        state.submit_comment();
        let Some(Command::PostComment(req)) = state.take_commands().pop() else {
            panic!("expected a comment command");
        };
        assert_eq!(state.mode, Mode::Normal);

        state.apply_comment_response(CommentResponse {
            recipe_id: req.recipe_id.clone(),
            result: Ok(Comment {
                id: "c1".into(),
                recipe_id: req.recipe_id,
                author_id: "u1".into(),
                author_name: "ana".into(),
                body: req.body,
                rating: req.rating,
                created_at: 0,
            }),
        });

        let page = state.page.as_ref().unwrap();
        assert_eq!(page.comments.comments().len(), 1);
        assert_eq!(page.recipe.rating_avg, Some(5.0));
        assert_eq!(state.recipes[0].rating_count, 1);
        assert!(page.comments.draft().body.is_empty());
    }

    fn post_draft(state: &mut AppState, body: &str) -> CommentRequest {
        state.begin_comment();
        for c in body.chars() {
            state.comment_input(c);
        }
        state.submit_comment();
        match state.take_commands().pop() {
            Some(Command::PostComment(req)) => req,
            other => panic!("expected a comment command, got {other:?}"),
        }
    }

    #[test]
    fn reload_while_posting_keeps_draft_for_failed_post() {
        let mut state = loaded(&["r1"]);
        with_page(&mut state, "r1", Vec::new());
        let req = post_draft(&mut state, "Needs salt");

        state.reload();
        state.take_commands();
        with_page(&mut state, "r1", Vec::new());
        assert!(state.page.as_ref().unwrap().comments.is_submitting());

        state.apply_comment_response(CommentResponse {
            recipe_id: req.recipe_id,
            result: Err(GatewayError::Transient("disk I/O".into())),
        });

        let page = state.page.as_ref().unwrap();
        assert_eq!(page.comments.draft().body, "Needs salt");
        assert_eq!(state.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
        assert_eq!(state.take_commands(), vec![Command::OpenRecipe("r1-slug".into())]);
    }

    #[test]
    fn reload_while_posting_still_shows_the_posted_comment() {
        let mut state = loaded(&["r1"]);
        with_page(&mut state, "r1", Vec::new());
        let req = post_draft(&mut state, "Lovely");

        with_page(&mut state, "r1", Vec::new());
        state.apply_comment_response(CommentResponse {
            recipe_id: req.recipe_id.clone(),
            result: Ok(Comment {
                id: "c1".into(),
                recipe_id: req.recipe_id,
                author_id: "u1".into(),
                author_name: "ana".into(),
                body: req.body,
                rating: None,
                created_at: 0,
            }),
        });

        let page = state.page.as_ref().unwrap();
        assert_eq!(page.comments.comments().len(), 1);
        assert!(page.comments.draft().body.is_empty());
        assert!(
            matches!(state.take_commands().as_slice(), [Command::OpenRecipe(_)]),
            "reviews are refetched after the post settles"
        );
    }

    #[test]
    fn sign_out_turns_pending_like_stale() {
        let mut state = loaded(&["r1"]);
        state.session = Some(session());
        state.toggle_like();
        let Some(Command::SetLike(old)) = state.take_commands().pop() else {
            panic!("expected a like command");
        };

        state.sign_out();
        state.take_commands();
        assert!(!state.is_liked(&state.recipes[0].clone()));

        // The user likes again as a guest before the old write answers.
        state.toggle_like();
        let Some(Command::SetLike(newer)) = state.take_commands().pop() else {
            panic!("expected a like command");
        };
        assert!(newer.seq > old.seq);

        state.apply_like_response(LikeResponse {
            recipe_id: old.recipe_id.clone(),
            seq: old.seq,
            result: Ok(LikeState { recipe_id: old.recipe_id, liked: true }),
        });
        assert!(state.likes["r1"].is_pending(), "old answer does not settle the new toggle");
        assert!(!state.recipes[0].liked);
    }

    #[test]
    fn restored_session_ignores_guest_like_failure() {
        let mut state = loaded(&["r1"]);
        state.toggle_like();
        let Some(Command::SetLike(req)) = state.take_commands().pop() else {
            panic!("expected a like command");
        };

        state.apply_auth(AuthEvent::Restored(Some(session())));
        state.take_commands();
        state.apply_like_response(LikeResponse {
            recipe_id: req.recipe_id,
            seq: req.seq,
            result: Err(GatewayError::Unauthenticated),
        });

        assert_eq!(state.mode, Mode::Normal, "no sign-in prompt for a superseded guest call");
        assert!(state.session.is_some());
        assert!(!state.is_liked(&state.recipes[0].clone()));
    }

    #[test]
    fn sign_in_walks_email_then_code() {
        let mut state = AppState::default();
        state.start_sign_in();
        for c in "ana@example.com".chars() {
            state.sign_in_input(c);
        }
        state.sign_in_submit();
        state.sign_in_submit();
        assert_eq!(
            state.take_commands(),
            vec![Command::SendOtp("ana@example.com".into())],
            "second submit is ignored while busy"
        );

        state.apply_auth(AuthEvent::CodeSent(Ok("ana@example.com".into())));
        assert_eq!(state.mode, Mode::SignInCode);
        for c in "12x34567".chars() {
            state.sign_in_input(c);
        }
        assert_eq!(state.sign_in.code, "123456");
        state.sign_in_submit();
        assert!(matches!(state.take_commands().as_slice(), [Command::SignIn { .. }]));

        state.apply_auth(AuthEvent::SignedIn(Ok(session())));
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(state.ctx(), RequestContext::with_token("tok"));
        assert!(matches!(state.take_commands().as_slice(), [Command::LoadRecipes { offset: 0, .. }]));
    }

    #[test]
    fn sign_out_queues_token_and_reloads() {
        let mut state = AppState::default();
        state.session = Some(session());
        state.sign_out();
        let cmds = state.take_commands();
        assert_eq!(cmds[0], Command::SignOut("tok".into()));
        assert_eq!(state.ctx(), RequestContext::anonymous());
    }

    #[test]
    fn country_filter_cycles_back_to_all() {
        let mut state = AppState::default();
        state.countries = vec![
            Country { id: "1".into(), name: "Italy".into(), slug: "italy".into(), recipe_count: 2 },
            Country { id: "2".into(), name: "Japan".into(), slug: "japan".into(), recipe_count: 1 },
        ];
        state.cycle_country();
        assert_eq!(state.country_filter.as_deref(), Some("italy"));
        state.cycle_country();
        assert_eq!(state.country_filter.as_deref(), Some("japan"));
        state.cycle_country();
        assert_eq!(state.country_filter, None);
    }

    #[test]
    fn full_page_enables_load_more() {
        let ids: Vec<String> = (0..PAGE_SIZE).map(|i| format!("r{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut state = loaded(&refs);
        assert!(state.has_more);
        state.load_more();
        assert!(matches!(
            state.take_commands().as_slice(),
            [Command::LoadRecipes { offset, .. }] if *offset == PAGE_SIZE
        ));
    }

    #[test]
    fn status_expires_after_ticks() {
        let mut state = AppState::default();
        state.set_status("hi", StatusKind::Info);
        for _ in 0..STATUS_TICKS {
            state.tick();
        }
        assert!(state.status.is_none());
    }

    #[test]
    fn detail_panel_resize_is_bounded() {
        let mut state = AppState::default();
        for _ in 0..20 {
            state.grow_detail_panel();
        }
        assert!(state.center_pct <= 70);
        assert!(state.left_pct >= 10 && state.right_pct >= 10);
        for _ in 0..20 {
            state.shrink_detail_panel();
        }
        assert_eq!(state.center_pct, 20);
        assert_eq!(state.left_pct + state.center_pct + state.right_pct, 100);
    }
}
