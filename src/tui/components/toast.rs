//! Toast notification component
//!
//! A non-blocking overlay that auto-dismisses. Renders in the bottom-right
//! corner on top of all other content, colored by notification level.

use crate::notify::{Level, Notification};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

/// Errors stay up longer than confirmations
const SHORT: Duration = Duration::from_secs(3);
const LONG: Duration = Duration::from_secs(6);

pub struct Toast {
    notification: Notification,
    created_at: Instant,
    duration: Duration,
}

impl Toast {
    pub fn new(notification: Notification) -> Self {
        let duration = if notification.level == Level::Error {
            LONG
        } else {
            SHORT
        };
        Self {
            notification,
            created_at: Instant::now(),
            duration,
        }
    }

    pub fn message(&self) -> &str {
        &self.notification.message
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }

    fn color(&self) -> Color {
        match self.notification.level {
            Level::Success => Color::Green,
            Level::Info => Color::Cyan,
            Level::Error => Color::Red,
        }
    }

    /// Render the toast in the bottom-right corner
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let text = self.notification.to_string();
        // 2 for borders, 2 for padding
        let width = (text.width() as u16 + 4).min(area.width.saturating_sub(4));
        let height = 3;

        let x = area.right().saturating_sub(width + 2);
        let y = area.bottom().saturating_sub(height + 2);
        let toast_area = Rect::new(x, y, width, height);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.color()));
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(block);

        // Clear the area first so toast appears on top
        f.render_widget(Clear, toast_area);
        f.render_widget(paragraph, toast_area);
    }
}
