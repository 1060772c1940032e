//! Terminal UI for the lectern classroom client.
//!
//! Presentation glue over the data layer: it issues high-level reads
//! ("list courses", "list coursework for course X") and renders the typed
//! results or their error banners. All correctness obligations live below
//! in `lectern-client`.

pub mod app;
pub mod events;
pub mod ui;

use std::io::{self, Stdout};
use std::panic;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use lectern_client::ClassroomClient;

pub use app::App;

/// Terminal type alias for convenience.
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode.
pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode.
pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Install a panic hook that restores the terminal before panicking, so a
/// crash doesn't leave the shell in raw mode.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Run the interactive interface until the user quits.
pub async fn run(client: ClassroomClient) -> Result<()> {
    install_panic_hook();
    let mut terminal = init_terminal()?;

    let mut app = App::new(client);
    let result = app.run(&mut terminal).await;

    restore_terminal(&mut terminal)?;
    result
}
