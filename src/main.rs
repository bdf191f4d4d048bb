mod app;
mod config;
mod diff;
mod engine;
mod ui;

use anyhow::{Context, Result};
use app::{Handler, ScreenSize, Waker};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use engine::FsEngine;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;
use ui::surface::TerminalSurface;

/// Side-by-side diff of two files or directory trees
#[derive(Parser)]
#[command(name = "sidediff", version, about)]
struct Cli {
    /// Left-hand file or directory
    left: String,

    /// Right-hand file or directory
    right: String,

    /// Lines of context around each change (overrides the config file)
    #[arg(long)]
    context: Option<usize>,

    /// Extra config file merged over ~/.config/sidediff/diff.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override a config value, e.g. `-o colors.background=#202020` (repeatable)
    #[arg(short = 'o', long = "override", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Write debug logs to this file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,
}

type Viewer = Handler<TerminalSurface<Stdout>>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.debug_log {
        init_logging(path)?;
    }

    let config = config::load_config(cli.config.as_deref(), &cli.overrides)?;
    let engine = Arc::new(FsEngine::new(config.clone())?);
    let (waker, wake_rx) = Waker::channel();
    let mut handler = Handler::new(
        TerminalSurface::new(io::stdout()),
        engine,
        waker,
        config,
        cli.context,
        cli.left,
        cli.right,
    );

    // Terminal setup
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;

    let result = handler
        .initialize()
        .and_then(|_| run_app(&mut handler, &wake_rx));

    // Cleanup
    let finalized = handler.finalize();
    disable_raw_mode()?;
    execute!(io::stdout(), cursor::Show, LeaveAlternateScreen)?;

    if let Err(err) = result.and(finalized) {
        log::error!("{:?}", err);
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
    Ok(())
}

/// Route `log` output to `path`. Never the terminal, which belongs to the viewer.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run_app(handler: &mut Viewer, wake_rx: &Receiver<()>) -> Result<()> {
    loop {
        // Poll with a timeout so worker wakeups are picked up promptly
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !handle_key(handler, key)? {
                        return Ok(());
                    }
                }
                Event::Resize(columns, rows) => {
                    let old = handler.screen_size();
                    handler.on_resize(old, ScreenSize::new(rows, columns))?;
                }
                _ => {}
            }
        }

        // Several results may arrive per wake; one drain handles them all
        let mut woken = false;
        while wake_rx.try_recv().is_ok() {
            woken = true;
        }
        if woken {
            handler.on_wakeup()?;
        }
    }
}

/// Returns `false` when the viewer should quit
fn handle_key(handler: &mut Viewer, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(false),
        KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Enter => handler.scroll_by(1)?,
        KeyCode::Char('k') | KeyCode::Up => handler.scroll_by(-1)?,
        KeyCode::Char(' ') | KeyCode::PageDown => handler.page_down()?,
        KeyCode::Char('b') | KeyCode::PageUp => handler.page_up()?,
        KeyCode::Char('g') | KeyCode::Home => handler.scroll_to_top()?,
        KeyCode::Char('G') | KeyCode::End => handler.scroll_to_bottom()?,
        KeyCode::Char('+') => handler.change_context_count(1)?,
        KeyCode::Char('-') => handler.change_context_count(-1)?,
        KeyCode::Char('=') => handler.restore_context_count()?,
        _ => {}
    }
    Ok(true)
}
