// UI rendering - dashboard layout
//
// ┌ title ───────────────────────────────────────────────┐
// │ stat cards                                            │
// ├ trend chart ──────────────┬ gauge / results / recent ┤
// ├ history table ────────────┼ windows / months / notes ┤
// ├ logs ─────────────────────────────────────────────────┤
// └ key help ─────────────────────────────────────────────┘

use super::app::Dashboard;
use super::components::charts_panel::ChartsPanel;
use super::components::logs_panel::LogsPanel;
use crate::analysis::PredictionSource;
use crate::stats::{Period, Tone};
use crate::store::Analysis;
use crate::util::{format_date, initials, truncate_file_name, FILE_NAME_WIDTH};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

/// Log lines kept on screen
const LOG_HEIGHT: u16 = 6;

pub fn draw(f: &mut Frame, dashboard: &Dashboard) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(LOG_HEIGHT),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_title(f, rows[0], dashboard);
    render_stat_cards(f, rows[1], dashboard);
    render_main(f, rows[2], dashboard);
    LogsPanel::render(f, rows[3], &dashboard.log_buffer.recent(LOG_HEIGHT as usize));
    render_help(f, rows[4], dashboard.period);

    if dashboard.show_detail {
        if let Some(analysis) = dashboard.selected_analysis() {
            render_detail(f, analysis);
        }
    }
    if let Some(toast) = &dashboard.toast {
        let area = f.area();
        toast.render(f, area);
    }
}

fn render_title(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let user = match &dashboard.user {
        Some(user) => format!("[{}] {}", initials(&user.name), user.name),
        None => "Not logged in".to_string(),
    };
    let line = Line::from(vec![
        Span::styled(
            " ParkinsonDetect ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} ", user)),
        Span::styled(
            format!("│ {}", dashboard.period.label()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn stat_card(f: &mut Frame, area: Rect, title: &str, value: String, detail: String, color: Color) {
    let text = Text::from(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray))),
    ]);
    let card = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", title))
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(card, area);
}

fn render_stat_cards(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);
    let stats = &dashboard.stats;

    stat_card(
        f,
        cols[0],
        "Total Analyses",
        stats.total_analyses.to_string(),
        format!("{} this month", stats.this_month),
        Color::Cyan,
    );
    stat_card(
        f,
        cols[1],
        "Average Score",
        if stats.total_analyses > 0 {
            format!("{:.3}", stats.average_score)
        } else {
            "-".to_string()
        },
        match stats.lowest_score {
            Some(low) => format!("lowest {:.3}", low),
            None => String::new(),
        },
        Color::Yellow,
    );
    stat_card(
        f,
        cols[2],
        "Healthy",
        format!("{}%", stats.healthy_percent),
        format!(
            "{} healthy / {} at risk",
            stats.healthy_count, stats.at_risk_count
        ),
        Color::Green,
    );
    stat_card(
        f,
        cols[3],
        "Trend",
        match stats.score_trend {
            Some(trend) => trend.label().to_string(),
            None => "-".to_string(),
        },
        format!("{:+.1}% vs previous", stats.trend_percent),
        Color::Magenta,
    );
}

fn render_main(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(cols[0]);
    ChartsPanel::render_trend(f, left[0], dashboard.trend.as_ref());
    render_history(f, left[1], dashboard);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Min(4),
        ])
        .split(cols[1]);
    ChartsPanel::render_gauge(f, right[0], dashboard.gauge.as_ref());

    let bars = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right[1]);
    ChartsPanel::render_distribution(f, bars[0], &dashboard.distribution);
    ChartsPanel::render_comparison(f, bars[1], &dashboard.comparison);

    let counts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right[2]);
    ChartsPanel::render_counts(f, counts[0], " Windows ", &dashboard.windows.bars);
    ChartsPanel::render_counts(f, counts[1], " Monthly ", &dashboard.monthly.bars);

    render_insights(f, right[3], dashboard);
}

fn render_history(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let header = Row::new(["Date", "File", "Score", "Result", "Windows"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = dashboard
        .analyses
        .iter()
        .rev()
        .map(|a| {
            let color = if a.result.is_healthy() {
                Color::Green
            } else {
                Color::Red
            };
            let mut result = a.result.as_str().to_string();
            if a.source == PredictionSource::Demo {
                result.push_str(" (demo)");
            }
            let windows = if a.windows > 0 {
                a.windows.to_string()
            } else {
                "-".to_string()
            };
            Row::new([
                Cell::from(format_date(a.timestamp)),
                Cell::from(truncate_file_name(&a.file_name, FILE_NAME_WIDTH)),
                Cell::from(format!("{:.3}", a.score)),
                Cell::from(result).style(Style::default().fg(color)),
                Cell::from(windows),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(15),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" History ({}) ", dashboard.analyses.len()))
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default().with_selected(dashboard.selected);
    f.render_stateful_widget(table, area, &mut state);
}

fn render_insights(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let lines: Vec<Line> = dashboard
        .insights
        .iter()
        .map(|insight| {
            let (icon, color) = match insight.tone {
                Tone::Positive => ("✓", Color::Green),
                Tone::Neutral => ("ℹ", Color::Cyan),
                Tone::Attention => ("!", Color::Yellow),
            };
            Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::raw(insight.message),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Insights ")
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_help(f: &mut Frame, area: Rect, period: Period) {
    let key = Style::default().fg(Color::Cyan);
    let mut spans = Vec::new();
    for (k, desc) in [
        ("1/2/3", "7d/30d/all"),
        ("Tab", "next period"),
        ("↑/↓", "select"),
        ("Enter", "details"),
        ("x", "report"),
        ("e", "csv"),
        ("p", "profile"),
        ("r", "refresh"),
        ("q", "quit"),
    ] {
        spans.push(Span::styled(format!(" {}", k), key));
        spans.push(Span::raw(format!(" {} ", desc)));
    }
    spans.push(Span::styled(
        format!("│ {}", period),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Calculate centered rect for the detail dialog
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn render_detail(f: &mut Frame, analysis: &Analysis) {
    let label = Style::default().fg(Color::DarkGray);
    let row = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", name), label),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("  {}", analysis.result.headline()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        row("File", analysis.file_name.clone()),
        row(
            "Date",
            analysis.timestamp.format("%d/%m/%Y %H:%M").to_string(),
        ),
        row("Score", format!("{:.6}", analysis.score)),
        row("Threshold", format!("{:.6}", analysis.threshold)),
        row("Label", analysis.label.clone()),
        row("Windows", analysis.windows.to_string()),
        row("Time", format!("{} ms", analysis.analysis_time)),
        row("Source", format!("{:?}", analysis.source).to_lowercase()),
    ];
    if let Some(sha) = &analysis.metadata.file_sha256 {
        lines.push(row("SHA-256", sha.chars().take(16).collect()));
    }
    lines.push(row("Id", analysis.id.clone()));

    let area = centered_rect(64, lines.len() as u16 + 2, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Analysis ")
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogBuffer;
    use crate::stats::tests::{analysis, at};
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(dashboard: &Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|f| draw(f, dashboard)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(60, 10, area), Rect::new(20, 15, 60, 10));
        assert_eq!(centered_rect(200, 10, area).width, 100);
    }

    #[test]
    fn test_draw_empty_dashboard() {
        let dashboard = Dashboard::new(Period::All, LogBuffer::new());
        let screen = rendered(&dashboard);
        assert!(screen.contains("ParkinsonDetect"));
        assert!(screen.contains("No analyses in this period"));
    }

    #[test]
    fn test_draw_with_history_and_detail() {
        let mut dashboard = Dashboard::new(Period::All, LogBuffer::new());
        dashboard.load(
            None,
            vec![
                analysis(0.4, 3, at(2026, 10, 1)),
                analysis(1.9, 2, at(2026, 10, 9)),
            ],
            at(2026, 10, 18),
        );
        let screen = rendered(&dashboard);
        assert!(screen.contains("History (2)"));
        assert!(screen.contains("09/10/2026"));

        dashboard.show_detail = true;
        let screen = rendered(&dashboard);
        assert!(screen.contains("Abnormal Patterns Detected"));
    }
}
