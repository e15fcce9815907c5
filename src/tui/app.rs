//! TUI application state and main event loop

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::time;

use super::ui;
use crate::api::LanyardClient;
use crate::poller::{Poller, PollerState};

/// Repaint cadence so elapsed-time strings stay fresh.
const REDRAW_INTERVAL: Duration = Duration::from_secs(1);

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_exit: bool,
    /// Discord user being watched
    pub user_id: String,
    /// Latest state published by the poller
    pub state: PollerState,
}

impl App {
    fn new(user_id: String) -> Self {
        Self {
            should_exit: false,
            user_id,
            state: PollerState::Loading,
        }
    }

    /// Handle a key press. `r` is the manual-retry affordance.
    fn handle_key(&mut self, code: KeyCode, poller: &Poller) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_exit = true,
            KeyCode::Char('r') => poller.retry(),
            _ => {}
        }
    }

    /// Render the UI
    pub fn render(&self, frame: &mut ratatui::Frame) {
        ui::render(frame, self);
    }
}

/// Run the TUI application, restoring the terminal on the way out.
pub async fn run(user_id: String) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, user_id).await;
    ratatui::restore();
    result
}

async fn run_app(terminal: &mut DefaultTerminal, user_id: String) -> Result<()> {
    let client = Arc::new(LanyardClient::new(user_id.clone()));
    let poller = Poller::start(client);
    let mut state_rx = poller.subscribe();

    let mut app = App::new(user_id);
    let mut events = EventStream::new();
    let mut redraw = time::interval(REDRAW_INTERVAL);

    while !app.should_exit {
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.handle_key(key.code, &poller);
                    }
                    // Resize etc. -- handled on next draw
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    // Poller task is gone; nothing left to watch.
                    break;
                }
                app.state = state_rx.borrow_and_update().clone();
            }
            _ = redraw.tick() => {}
        }
    }

    poller.stop();
    Ok(())
}
