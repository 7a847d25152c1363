// TUI module - terminal dashboard
//
// This module manages the dashboard using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks)
// - Running key actions against the controller

pub mod app;
pub mod components;
pub mod ui;

use crate::app::App;
use crate::logging::LogBuffer;
use crate::notify::Notification;
use crate::stats::Period;
use anyhow::{Context, Result};
use app::{Action, Dashboard};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

/// Run the dashboard until the user quits
///
/// Requires a logged-in user. The terminal is restored even when the event
/// loop fails.
pub async fn run_dashboard(app: &mut App, log_buffer: LogBuffer, period: Period) -> Result<()> {
    app.current_user()?;

    let mut dashboard = Dashboard::new(period, log_buffer);
    refresh(app, &mut dashboard);

    // Set up terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    tracing::info!("Dashboard opened ({})", period);
    let result = run_event_loop(&mut terminal, app, &mut dashboard).await;

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on the redraw tick and keyboard input with tokio::select!, and
/// runs whatever action a key produced.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    dashboard: &mut Dashboard,
) -> Result<()> {
    let mut tick_interval =
        tokio::time::interval(Duration::from_millis(app.config().dashboard.tick_ms));

    loop {
        terminal
            .draw(|f| ui::draw(f, dashboard))
            .context("Failed to draw terminal")?;

        let mut action = Action::None;
        tokio::select! {
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key)) = event::read() {
                        if key.kind == KeyEventKind::Press {
                            action = dashboard.handle_key(key.code);
                        }
                    }
                }
            } => {}

            _ = tick_interval.tick() => {
                dashboard.tick();
            }
        }

        perform(app, dashboard, action);

        if dashboard.should_quit {
            break;
        }
    }

    tracing::info!("Dashboard closed");
    Ok(())
}

/// Reload the period's analyses from the store
fn refresh(app: &App, dashboard: &mut Dashboard) {
    match app.history(dashboard.period) {
        Ok(analyses) => {
            let user = app.state().current_user().cloned();
            tracing::debug!(
                "Loaded {} analyses for {}",
                analyses.len(),
                dashboard.period
            );
            dashboard.load(user, analyses, Utc::now());
        }
        Err(e) => dashboard.notify(vec![Notification::error(e.to_string())]),
    }
}

fn perform(app: &mut App, dashboard: &mut Dashboard, action: Action) {
    let result = match action {
        Action::None | Action::Quit => return,
        Action::Refresh => {
            refresh(app, dashboard);
            return;
        }
        Action::ExportHistory => app.export_history(dashboard.period, None).map(|_| ()),
        Action::ExportProfile => app.export_profile(None).map(|_| ()),
        Action::ExportReport(id) => app.export_report(Some(&id), None).map(|_| ()),
    };

    let mut notifications = app.take_notifications();
    if let Err(e) = result {
        notifications.push(Notification::error(e.to_string()));
    }
    dashboard.notify(notifications);
}
