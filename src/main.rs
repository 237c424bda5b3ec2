//! KubeGraf console - browse and manage Kubernetes resources
//!
//! A terminal UI that lists cluster resources from the KubeGraf backend,
//! keeps them fresh through a TTL cache, and dispatches YAML edits, deletes,
//! scales and restarts back to the backend.

use std::error::Error;
use std::io::{self, Stdout};
use std::panic;
use std::process;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use kubegraf_tui::api::ApiClient;
use kubegraf_tui::app::{App, Command, StatusMessage};
use kubegraf_tui::cache::ResourceCache;
use kubegraf_tui::cli::{Cli, StartupConfig};
use kubegraf_tui::config::Config;
use kubegraf_tui::refresh::{self, RefreshConfig, RefreshHandle};
use kubegraf_tui::resources::ResourceRef;
use kubegraf_tui::{editor, logging, ui};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Leaves the TUI so a child process can own the terminal
fn suspend_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
}

fn resume_terminal(terminal: &mut Tui) -> io::Result<()> {
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()
}

/// Fetches a manifest, opens it in `$EDITOR`, and saves the result
async fn edit_resource(
    terminal: &mut Tui,
    app: &mut App,
    target: ResourceRef,
) -> Result<(), Box<dyn Error>> {
    let yaml = match app.api().get_yaml(&target).await {
        Ok(yaml) => yaml,
        Err(e) => {
            app.status = Some(StatusMessage::error(format!(
                "Failed to load YAML for {}: {}",
                target.display_name(),
                e
            )));
            return Ok(());
        }
    };

    suspend_terminal(terminal)?;
    let edited = editor::edit(&yaml);
    resume_terminal(terminal)?;

    match edited {
        Ok(Some(yaml)) => app.save_yaml(&target, yaml).await,
        Ok(None) => app.status = Some(StatusMessage::info("No changes made")),
        Err(e) => {
            warn!(error = %e, "editor failed");
            app.status = Some(StatusMessage::error(format!("Edit failed: {}", e)));
        }
    }
    Ok(())
}

/// Main event loop
async fn run(
    terminal: &mut Tui,
    app: &mut App,
    refresh_handle: &mut RefreshHandle,
) -> Result<(), Box<dyn Error>> {
    loop {
        // Render UI
        terminal.draw(|f| ui::render(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if let Some(command) = app.take_command() {
            // Show the queued status before blocking on I/O
            terminal.draw(|f| ui::render(f, app))?;
            match command {
                Command::EditYaml(target) => edit_resource(terminal, app, target).await?,
                other => app.run_command(other).await,
            }
            refresh_handle.watch(Some(app.cache_key().to_string()));
        }

        while let Some(message) = refresh::try_recv(refresh_handle) {
            app.handle_refresh(message);
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Parse CLI arguments before touching the terminal
    let cli = Cli::parse();
    let startup_config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    cli.apply_to(&mut config);

    let _log_guard = match logging::log_dir() {
        Some(dir) => match logging::init(&dir, &config.log_filter) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Warning: logging disabled: {}", e);
                None
            }
        },
        None => None,
    };
    info!(
        server = %config.base_url,
        cluster = %config.cluster,
        ttl_ms = config.cache_ttl.as_millis() as u64,
        background_refresh = config.background_refresh,
        "starting kubegraf-tui"
    );

    let api = ApiClient::new(config.base_url.clone())?;
    let cache = ResourceCache::new();
    let mut app = App::new(api, cache.clone(), config.scope(), config.cache_options())
        .with_startup_config(startup_config);
    let mut refresh_handle = RefreshHandle::spawn(
        cache,
        RefreshConfig::for_ttl(config.cache_ttl, config.background_refresh),
    );

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Initial render to show loading state
    terminal.draw(|f| ui::render(f, &app))?;

    // Trigger initial data load
    app.load_initial_data().await;
    refresh_handle.watch(Some(app.cache_key().to_string()));

    let result = run(&mut terminal, &mut app, &mut refresh_handle).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    refresh_handle.shutdown().await;
    info!("exiting");

    result
}
