//! Party RPG narrated by an AI game master.
//!
//! A vim-style terminal interface: create a leader, gather up to three
//! companions and tell the game master what the party does.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripting:
//!
//! ```bash
//! cargo run -p rpg -- --user noa --headless
//! ```

mod app;
mod config;
mod events;
mod headless;
mod ui;

use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use rpg_core::{GameSession, SaveStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use config::{Args, Settings, DEFAULT_LOG_FILTER};
use events::{handle_event, EventResult};
use ui::render::render;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_args(Args::parse());
    if settings.user.is_empty() {
        eprintln!("Error: --user must not be blank.");
        std::process::exit(2);
    }

    init_logging(&settings.log_file)?;
    info!(user = %settings.user, save_dir = %settings.save_dir.display(), "Starting");

    let session = match GameSession::from_env(settings.master_config()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Set GEMINI_API_KEY in a .env file or with: export GEMINI_API_KEY=your_key_here");
            std::process::exit(1);
        }
    };
    let store = SaveStore::new(&settings.save_dir);

    if settings.headless {
        return headless::run_headless(session, store, &settings.user)
            .await
            .map_err(Into::into);
    }

    let mut app = App::new(session, store, settings.user.clone());
    app.refresh_save_flag().await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

/// Send logs to a file; the terminal belongs to the game.
fn init_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, &app))?;

        // Queued work runs between frames so its status is already on screen
        if app.is_busy() {
            app.run_pending().await;
            if app.should_quit {
                return Ok(());
            }
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            if handle_event(&mut app, ev) == EventResult::Quit {
                return Ok(());
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
