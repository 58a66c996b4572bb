mod api;
mod app;
mod config;
mod events;
mod export;
mod models;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::GenerationClient;
use app::App;
use events::AppEvent;
use export::SystemClipboard;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Resolve config and credential before touching the terminal so
    // failures print normally
    let config = config::load_config()?;
    let api_key = config::resolve_api_key(&config, std::env::var(config::API_KEY_ENV).ok())?;
    let client = GenerationClient::new(&config, api_key)?;
    let output_dir = config::output_dir(&config);

    tracing::info!(model = %client.model(), api_url = %config.api_url, "Starting AppForge");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        config.app_title.clone(),
        config.model.clone(),
        Duration::from_millis(config.caption_interval_ms),
    );

    // Create channel for async events
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let res = run_app(&mut terminal, &mut app, &client, &output_dir, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "Application loop failed");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Some((path, file)) = open_log_file() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %path.display(), "Logging initialized");
        return;
    }

    // Without a log file, drop logs rather than writing over the TUI
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> Option<(PathBuf, File)> {
    config::log_file_candidates().into_iter().find_map(|candidate| {
        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
            .ok()
            .map(|file| (candidate, file))
    })
}

/// Run the single generation request for `prompt` in the background.
fn spawn_generation(
    client: &GenerationClient,
    prompt: String,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let client = client.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let result = client.generate(&prompt).await;
        deliver_result(&tx, result);
    });
}

/// Hand a finished generation to the UI loop. Returns false if the loop is gone.
fn deliver_result(
    tx: &mpsc::UnboundedSender<AppEvent>,
    result: Result<models::GeneratedApp, api::GenerationError>,
) -> bool {
    match tx.send(AppEvent::from(result)) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "Generation result dropped; the UI loop has exited");
            false
        }
    }
}

const fn handle_help_keys(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> bool {
    if !app.show_help {
        return false;
    }

    match key {
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Esc => {
            app.show_help = false;
        }
        _ => {}
    }
    true
}

/// Apply a key press. Returns a prompt when a generation must be started.
fn handle_keyboard_input(
    app: &mut App,
    key: KeyCode,
    modifiers: KeyModifiers,
    clipboard: &mut SystemClipboard,
    output_dir: &Path,
) -> Option<String> {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    match key {
        KeyCode::Char('c') if ctrl => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return None;
        }
        KeyCode::Esc => {
            // Esc never cancels a request in flight
            app.exit_pending = false;
            return None;
        }
        _ if app.exit_pending => {
            // Any other key cancels pending exit
            app.exit_pending = false;
        }
        _ => {}
    }

    match key {
        KeyCode::Char('q') if ctrl => app.quit(),
        KeyCode::Char('h') if ctrl => app.toggle_help(),
        KeyCode::Char('r') if ctrl => return app.retry(),
        KeyCode::Char('l') if ctrl => app.input.clear(),
        KeyCode::Char('y') if ctrl => app.copy_active_file(clipboard),
        KeyCode::Char('s') if ctrl => app.download_project(output_dir),

        KeyCode::F(n @ 1..=2) => app.load_preset(usize::from(n - 1)),

        KeyCode::Tab => app.next_file(),
        KeyCode::BackTab => app.previous_file(),
        KeyCode::Up if modifiers.contains(KeyModifiers::ALT) => app.previous_file(),
        KeyCode::Down if modifiers.contains(KeyModifiers::ALT) => app.next_file(),
        KeyCode::Up => app.scroll_code_up(1),
        KeyCode::Down => app.scroll_code_down(1),
        KeyCode::PageUp => app.scroll_code_up(20),
        KeyCode::PageDown => app.scroll_code_down(20),
        KeyCode::Home => app.scroll_code_up(usize::MAX),

        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => return app.submit(),
        KeyCode::Char(c) if !ctrl => app.input.push(c),

        _ => {}
    }
    None
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &GenerationClient,
    output_dir: &Path,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut clipboard = SystemClipboard::default();

    loop {
        app.tick(Instant::now());
        terminal.draw(|f| ui::render(f, app))?;

        // Check for generation results first
        while let Ok(app_event) = event_rx.try_recv() {
            app.handle_event(app_event);
        }

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_help_keys(app, key.code, key.modifiers) {
                    if let Some(prompt) =
                        handle_keyboard_input(app, key.code, key.modifiers, &mut clipboard, output_dir)
                    {
                        spawn_generation(client, prompt, event_tx);
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
