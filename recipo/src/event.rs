//! Event bus for recipo.
//!
//! All user input, timer ticks, and background-task results are normalised into
//! a single `AppEvent` enum and sent over a tokio unbounded MPSC channel. The
//! main loop receives from this channel and dispatches accordingly.
//!
//! Two independent intervals drive the render and logic cycles:
//! - **Render interval** (33 ms, about 30 FPS) triggers a `terminal.draw()` call.
//! - **Tick interval** (250 ms = 4 Hz) ages the status line.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use recipo_core::comments::CommentResponse;
use recipo_core::like::LikeResponse;
use recipo_core::types::{Comment, Country, Recipe, SessionUser};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// A page of the recipe feed plus the cuisine list shown beside it.
#[derive(Debug)]
pub struct RecipeFeed {
    pub recipes: Vec<Recipe>,
    pub countries: Vec<Country>,
    /// `true` when this page extends the current list instead of replacing it.
    pub append: bool,
}

/// Everything the detail view needs for one recipe.
#[derive(Debug)]
pub struct RecipePage {
    pub recipe: Recipe,
    pub reviews: Vec<Comment>,
    pub related: Vec<Recipe>,
}

/// Outcome of a sign-in step, already rendered to user-facing text on failure.
#[derive(Debug)]
pub enum AuthEvent {
    CodeSent(Result<String, String>),
    SignedIn(Result<SessionUser, String>),
    SignedOut,
    /// A session token remembered from a previous run was checked.
    Restored(Option<SessionUser>),
}

/// All events the application can receive from any source.
#[derive(Debug)]
#[non_exhaustive]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    ///
    /// Release and repeat events are filtered in [`spawn_event_task`] to avoid
    /// double-firing on Windows.
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    Tick,
    Render,
    RecipesLoaded(Result<RecipeFeed, String>),
    /// `Ok(None)` means the slug no longer exists.
    RecipeLoaded(Result<Option<Box<RecipePage>>, String>),
    LikeResolved(LikeResponse),
    CommentResolved(CommentResponse),
    Auth(AuthEvent),
    Quit,
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender (`tx`) is cloned and distributed to background tasks;
/// the receiver (`rx`) is owned by the main event loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the background tokio task that feeds terminal input and timers into
/// the event channel.
///
/// `reader.next().fuse()` keeps `select!` from polling a finished stream if
/// crossterm's input ends. Send errors are ignored: once the receiver is gone
/// the process is shutting down.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = tick_tick => {
                    let _ = tx.send(AppEvent::Tick);
                }
                _ = render_tick => {
                    let _ = tx.send(AppEvent::Render);
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => {
                            if key.kind == KeyEventKind::Press {
                                let _ = tx.send(AppEvent::Key(key));
                            }
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Ok(Event::Mouse(mouse))) => {
                            let _ = tx.send(AppEvent::Mouse(mouse));
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}
