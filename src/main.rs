mod app;
mod client;
mod config;
mod logging;
mod session;
mod ui;

use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::handler;
use crate::app::state::AppState;
use crate::client::codec::MAX_USERNAME_LEN;
use crate::client::loopback::LoopbackTransport;
use crate::client::manager::ChannelManager;
use crate::client::tag::Tag;
use crate::client::transport::Transport;
use crate::logging::ChatLogger;
use crate::session::{RedrawSignal, SessionRegistry};
use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        EventStream,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Status expiry and housekeeping cadence.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Terminal client for broadcast channels.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Name attached to your messages
    #[arg(long)]
    username: Option<String>,

    /// Key that allows sending admin messages
    #[arg(long)]
    admin_key: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// File that remembers joined channels between runs
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.log_path.as_deref(), args.verbose)?;

    let cfg = load_config(&args)?;
    if cfg.username.is_empty() || cfg.username.len() > MAX_USERNAME_LEN {
        bail!(
            "username must be between 1 and {} bytes, got {}",
            MAX_USERNAME_LEN,
            cfg.username.len()
        );
    }

    let transport: Arc<dyn Transport> = match &cfg.transport.state_file {
        Some(path) => Arc::new(
            LoopbackTransport::with_state_file(cfg.transport.max_payload_size, path.clone())
                .with_context(|| format!("Failed to load session state from {}", path.display()))?,
        ),
        None => Arc::new(LoopbackTransport::new(cfg.transport.max_payload_size)),
    };
    let manager = Arc::new(ChannelManager::new(
        transport,
        cfg.username.clone(),
        cfg.transport.admin_key.clone(),
    ));
    tracing::info!(username = %cfg.username, admin = manager.has_admin_key(), "starting");

    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, cfg, manager).await;

    // Restore terminal
    restore_terminal()?;

    if let Err(e) = result {
        tracing::error!("fatal: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Config file first, then command line flags on top.
fn load_config(args: &Args) -> Result<config::AppConfig> {
    let path = args.config.clone().unwrap_or_else(config::config_path);
    let first_run = !path.exists();
    let mut cfg = config::load_config_from(&path)?;
    if first_run {
        // Keeps the generated username stable across runs.
        if let Err(e) = config::save_config_to(&cfg, &path) {
            tracing::warn!("could not write default config: {:#}", e);
        }
    }

    if let Some(username) = &args.username {
        cfg.username = username.clone();
    }
    if let Some(key) = &args.admin_key {
        cfg.transport.admin_key = Some(key.clone());
    }
    if let Some(path) = &args.state_file {
        cfg.transport.state_file = Some(path.clone());
    }
    Ok(cfg)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cfg: config::AppConfig,
    manager: Arc<ChannelManager>,
) -> Result<()> {
    let (redraw, mut redraw_rx) = RedrawSignal::channel();

    let mut registry =
        SessionRegistry::new(redraw).with_max_transcript(cfg.ui.max_transcript);
    let chat_logger = ChatLogger::new(&cfg.logging);
    if chat_logger.is_enabled() {
        registry = registry.with_logger(Arc::new(Mutex::new(chat_logger)));
    }
    let registry = Arc::new(registry);

    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| tracing::warn!("clipboard unavailable: {}", e))
        .ok();

    let mut state = AppState::new(
        cfg,
        registry.clone(),
        manager.has_admin_key(),
        clipboard.is_some(),
    );
    if let Ok((w, h)) = crossterm::terminal::size() {
        state.terminal_size = (w, h);
    }

    let mut reader = EventStream::new();
    let mut tick = tokio::time::interval(TICK_INTERVAL);

    // Rejoin channels from the previous run without blocking the UI
    let (replay_tx, mut replay_rx) = mpsc::unbounded_channel::<usize>();
    {
        let registry = registry.clone();
        let manager = manager.clone();
        tokio::spawn(async move {
            let restored = registry.replay(&manager).await;
            let _ = replay_tx.send(restored);
        });
    }

    // Initial render
    terminal.draw(|f| ui::render(f, &state))?;

    // Main event loop
    loop {
        let event = tokio::select! {
            Some(Ok(event)) = reader.next() => AppEvent::Terminal(event),
            Some(()) = redraw_rx.recv() => AppEvent::Redraw,
            Some(restored) = replay_rx.recv() => AppEvent::ReplayFinished { restored },
            _ = tick.tick() => AppEvent::Tick,
        };

        let actions = handler::handle_event(&mut state, event);

        for action in actions {
            execute_action(&mut state, &manager, &mut clipboard, action);
        }

        if state.should_quit {
            say_goodbye(&registry);
            break;
        }

        // Conditional render (only if dirty)
        if state.dirty {
            terminal.draw(|f| ui::render(f, &state))?;
            state.dirty = false;
        }
    }

    Ok(())
}

fn execute_action(
    state: &mut AppState,
    manager: &ChannelManager,
    clipboard: &mut Option<arboard::Clipboard>,
    action: Action,
) {
    match action {
        Action::SendMessage { handle, text, admin } => {
            let Some(session) = state.registry.get(handle) else {
                state.input.restore(text);
                state.open_error("Failed to send message", "the channel is no longer joined");
                return;
            };
            let result = if admin {
                session.send_admin(&text)
            } else {
                session.send(&text)
            };
            match result {
                Ok(()) => {
                    if !manager.echoes_own_broadcasts() {
                        let tag = if admin { Tag::Admin } else { Tag::Default };
                        session.append_local(tag, manager.username(), &text);
                    }
                }
                Err(e) => {
                    state.input.restore(text);
                    state.open_error("Failed to send message", e.to_string());
                }
            }
        }
        Action::CreateChannel { name, description } => {
            match manager.create(&state.registry, &name, &description) {
                Ok(_) => {
                    state.close_dialog();
                    state.feed_scroll = 0;
                }
                Err(e) => state.open_error("Failed to create new channel", e.to_string()),
            }
        }
        Action::JoinChannel { pretty_print } => {
            match manager.join_pretty(&state.registry, &pretty_print) {
                Ok(_) => {
                    state.close_dialog();
                    state.feed_scroll = 0;
                }
                Err(e) => state.open_error("Failed to join channel", e.to_string()),
            }
        }
        Action::LeaveChannel { handle } => match manager.leave(&state.registry, handle) {
            Ok(()) => {
                state.close_dialog();
                state.feed_scroll = 0;
            }
            Err(e) => state.open_error("Failed to leave channel", e.to_string()),
        },
        Action::CopyToClipboard { text } => {
            let copied = clipboard
                .as_mut()
                .map(|cb| cb.set_text(text).map_err(|e| e.to_string()));
            match copied {
                Some(Ok(())) => state.set_status("Pretty print copied to clipboard"),
                Some(Err(e)) => state.open_error("Failed to copy to clipboard", e),
                None => state.open_error("Failed to copy to clipboard", "no clipboard available"),
            }
        }
        Action::Quit => state.should_quit = true,
    }
}

/// Tell every joined channel we are leaving. Channels stay joined on the
/// transport so they come back next run.
fn say_goodbye(registry: &SessionRegistry) {
    for session in registry.sessions() {
        if let Err(e) = session.send_notice(Tag::Exit) {
            tracing::warn!(channel = %session.name(), "exit notice failed: {}", e);
        }
    }
    tracing::info!("shutting down");
}
