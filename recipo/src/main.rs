//! recipo: browse recipes, like them, and leave reviews from the terminal.
//!
//! Entry point for the `recipo` binary. Wires together the terminal lifecycle
//! (`tui`), the unified event bus (`event`), the panels (`ui`), and the shared
//! WAL-mode SQLite store (`recipo-core`).
//!
//! # Startup sequence
//!
//! 1. Load config and start file logging. Both are safe before terminal init.
//! 2. `install_panic_hook()` so a panic restores the terminal before printing.
//! 3. `register_sigterm()`, polled in the event loop.
//! 4. `init_tui()` enters the alternate screen and raw mode.
//! 5. Open the database, seed it if empty, and start the mail worker.
//! 6. Queue the first feed load and try to restore the last session.
//!
//! `restore_tui()` runs after the loop exits. The `?` operator is only used
//! before `init_tui()`; a draw error breaks out of the loop and is returned
//! once the terminal has been restored.

mod app;
mod config;
mod event;
mod services;
mod theme;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::Ordering;

use recipo_core::gateway::SqliteGateway;
use tracing_subscriber::EnvFilter;

use crate::event::AppEvent;
use crate::ui::keybindings::{KeyAction, handle_key, handle_mouse};

/// Log filter variable, e.g. `RECIPO_LOG=recipo_core=debug`.
const LOG_ENV: &str = "RECIPO_LOG";

/// Logs go to a file: stdout belongs to the terminal UI.
fn init_logging(path: &Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn create_parent(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => std::fs::create_dir_all(dir),
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config_file = config::config_path();
    let (config, warning) = config::load(&config_file);
    init_logging(&config.log_path)?;
    if let Some(warning) = warning {
        tracing::warn!("{warning}; using defaults");
    }
    tracing::info!(db = %config.database_path.display(), "starting recipo");

    let theme = theme::Theme::from_name(&config.theme);
    let mut state = app::AppState::default();

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;

    // Open the store before entering the alternate screen so errors print normally.
    create_parent(&config.database_path)?;
    let conn = recipo_core::db::open_db(&config.database_path.to_string_lossy())
        .await
        .map_err(std::io::Error::other)?;
    if config.seed_demo_data {
        match recipo_core::seed::seed_demo_data(&conn).await {
            Ok(true) => tracing::info!("seeded demo recipes"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "could not seed demo recipes"),
        }
    }

    // The worker thread is detached; queued mail is flushed while the UI runs.
    let (outbox, _mail_worker) =
        recipo_core::mail::spawn_mail_worker(config.outbox_dir.clone(), config.mail_from.clone());

    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let gateway = SqliteGateway::new(conn.clone(), config.gateway_timeout());
    let services =
        services::Services::new(conn, gateway, outbox, config.session_file(), handler.tx.clone());
    services.restore_session();
    state.request_recipes(false);

    let mut draw_error = None;
    'event_loop: loop {
        for command in state.take_commands() {
            tracing::debug!(?command, "dispatching");
            services.dispatch(command, state.ctx(), state.viewer_id());
        }

        tokio::select! {
            // Heartbeat: SIGTERM is checked at least every 50ms even when idle.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            tracing::error!(error = %e, "draw failed");
                            draw_error = Some(e);
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Mouse(mouse)) => {
                        handle_mouse(mouse, &mut state);
                    }
                    // ratatui picks up the new size on the next Render.
                    Some(AppEvent::Resize(_, _)) => {}
                    Some(AppEvent::Tick) => state.tick(),
                    Some(AppEvent::RecipesLoaded(result)) => state.apply_feed(result),
                    Some(AppEvent::RecipeLoaded(result)) => state.apply_page(result),
                    Some(AppEvent::LikeResolved(response)) => state.apply_like_response(response),
                    Some(AppEvent::CommentResolved(response)) => {
                        state.apply_comment_response(response)
                    }
                    Some(AppEvent::Auth(auth)) => state.apply_auth(auth),
                    Some(AppEvent::Quit) | None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;
    tracing::info!("recipo exited");
    match draw_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
