// Logs panel - newest captured log entries, color-coded by level

use crate::logging::{LogEntry, LogLevel};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

fn level_style(level: &LogLevel) -> Style {
    match level {
        LogLevel::Error => Style::default().fg(Color::Red),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Info => Style::default().fg(Color::Gray),
        LogLevel::Debug | LogLevel::Trace => Style::default().fg(Color::DarkGray),
    }
}

pub fn format_log_entry(entry: &LogEntry) -> String {
    format!(
        "{} {:5} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.as_str(),
        entry.message
    )
}

pub struct LogsPanel;

impl LogsPanel {
    /// Render as many of `entries` as fit, newest at the bottom
    pub fn render(f: &mut Frame, area: Rect, entries: &[LogEntry]) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = entries.len().saturating_sub(visible);
        let items: Vec<ListItem> = entries
            .iter()
            .skip(skip)
            .map(|entry| ListItem::new(format_log_entry(entry)).style(level_style(&entry.level)))
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Logs ")
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(list, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_log_entry() {
        let entry = LogEntry {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap(),
            level: LogLevel::Warn,
            message: "Prediction service unavailable".to_string(),
        };
        assert_eq!(
            format_log_entry(&entry),
            "09:05:07 WARN  Prediction service unavailable"
        );
    }
}
