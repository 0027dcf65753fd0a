//! Terminal lifecycle management for recipo.
//!
//! The TUI draws to stderr so stdout stays free for shell redirection. Logging
//! goes to a file (see `main.rs`), never to either stream, because any stray
//! write would corrupt the alternate screen.

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::SIGTERM;
use signal_hook::flag::register;
use std::io::{stderr, BufWriter, Stderr};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};

/// CrosstermBackend over a buffered stderr writer.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Enables raw mode, enters the alternate screen, and turns on mouse capture
/// (clicks, wheel, and motion for the star-rating hover).
///
/// Call [`restore_tui`] at every exit path.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Restores the terminal to its pre-TUI state. Idempotent.
///
/// ratatui does not restore the terminal on `Drop`, so this must run on every
/// exit path including the panic hook.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before the panic message
/// prints. Must be called before [`init_tui`]. Chains onto the previous hook.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_tui();
        original_hook(panic_info);
    }));
}

/// Registers a SIGTERM handler that sets the returned flag.
///
/// The event loop polls the flag on its 50 ms heartbeat.
pub fn register_sigterm() -> std::io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    register(SIGTERM, Arc::clone(&term))?;
    Ok(term)
}
