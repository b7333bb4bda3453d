use std::io;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kanban_service::BlockingHttpService;
use kanban_tui::app::{load_with_retry, App};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const INIT_ATTEMPTS: u32 = 3;
const INIT_BACKOFF: Duration = Duration::from_secs(1);
const TICK: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "kanban", about = "Terminal client for the kanban board")]
struct Cli {
    /// Base URL of a running kanban-server
    #[arg(long, env = "KANBAN_SERVER", default_value = "http://localhost:3000")]
    server: String,
}

fn main() -> Result<()> {
    // Only log when asked to; the board owns the terminal otherwise.
    if std::env::var_os("KANBAN_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_env("KANBAN_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(io::stderr)
            .init();
    }

    let cli = Cli::parse();
    let service = BlockingHttpService::new(&cli.server).context("failed to create HTTP client")?;

    let tasks = match load_with_retry(&service, INIT_ATTEMPTS, INIT_BACKOFF) {
        Ok(tasks) => tasks,
        Err(e) => bail!(
            "Failed to load kanban board: {e}\n\
             Please check that:\n  \
             - the server is running at {}\n  \
             - the database is connected\n  \
             - the network connection is available",
            cli.server
        ),
    };
    info!(server = %cli.server, count = tasks.len(), "board loaded");

    run_tui(App::with_tasks(service, tasks))
}

fn run_tui(app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        // Draw the loading state before blocking on the request.
        if app.has_pending() {
            app.run_pending();
            continue;
        }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C always quits
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                // q quits unless we're typing
                if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                    break;
                }
                app.handle_key(key);
            }
        }
        app.tick(Instant::now());
    }

    Ok(())
}
