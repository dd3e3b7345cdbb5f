// TUI event loop and terminal management
use crate::app::Action;
use crate::App;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use reltrack_core::{controller::run_effect, Effect, Message, TrackerBackend};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How long to wait for input before redrawing (toasts need the ticks)
const TICK: Duration = Duration::from_millis(100);

pub async fn run_tui(
    mut app: App,
    backend: Arc<dyn TrackerBackend>,
    mouse_enabled: bool,
) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if mouse_enabled {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    } else {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut app, backend).await;

    // Restore terminal even if the loop bailed out
    disable_raw_mode()?;
    if mouse_enabled {
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    } else {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    backend: Arc<dyn TrackerBackend>,
) -> anyhow::Result<()> {
    // Finished requests come back here as messages
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    info!("Starting TUI");
    dispatch(app, Message::Init, &backend, &tx);

    loop {
        while let Ok(message) = rx.try_recv() {
            dispatch(app, message, &backend, &tx);
        }

        app.toasts.prune(Instant::now());
        terminal.draw(|f| crate::ui::render(f, app))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match app.handle_key(key) {
                    Some(Action::Dispatch(message)) => dispatch(app, message, &backend, &tx),
                    Some(Action::OpenInBrowser(url)) => {
                        if let Err(e) = open::that(&url) {
                            app.error_message = Some(format!("Failed to open browser: {}", e));
                        }
                    }
                    Some(Action::Quit) => app.quit(),
                    None => {}
                },
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollDown => app.next_repository(),
                    MouseEventKind::ScrollUp => app.previous_repository(),
                    _ => {}
                },
                _ => {}
            }
        }

        if app.should_quit {
            info!("Leaving TUI");
            break;
        }
    }

    Ok(())
}

/// Run the reducer, then start every resulting request on its own task so
/// the screen keeps redrawing while they are in flight. Nothing is
/// cancelled and nothing is queued behind anything else.
fn dispatch(
    app: &mut App,
    message: Message,
    backend: &Arc<dyn TrackerBackend>,
    tx: &mpsc::UnboundedSender<Message>,
) {
    for effect in app.apply(message, Instant::now()) {
        spawn_effect(effect, Arc::clone(backend), tx.clone());
    }
}

fn spawn_effect(
    effect: Effect,
    backend: Arc<dyn TrackerBackend>,
    tx: mpsc::UnboundedSender<Message>,
) {
    debug!("Spawning {:?}", effect);
    tokio::spawn(async move {
        if let Some(reply) = run_effect(backend.as_ref(), effect).await {
            if tx.send(reply).is_err() {
                warn!("UI went away before a request finished");
            }
        }
    });
}
