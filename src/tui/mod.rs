mod app;
mod event_handler;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

use crate::config::Config;
use app::App;

/// Run the interactive generator
pub async fn run(config: &Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.clone());

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.drain_events();
        app.tick = app.tick.wrapping_add(1);

        // Draw UI
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll briefly, then yield so background generations make progress
        if poll(Duration::from_millis(50))? {
            if let Event::Key(key) = read()? {
                if key.kind == KeyEventKind::Press {
                    event_handler::handle_key(app, key);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        if app.should_quit {
            return Ok(());
        }
    }
}
