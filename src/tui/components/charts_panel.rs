// Charts panel - ratatui renderings of the chart models
//
// Score trend with threshold line, risk gauge, and bar charts for the
// class distribution, window counts, months and recent scores.

use crate::charts::{
    Bar as ChartBar, ComparisonChart, DistributionChart, RiskGauge, TrendChart,
};
use crate::analysis::Classification;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::Line,
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, Gauge, GraphType,
        Paragraph,
    },
    Frame,
};

/// Comparison bars carry f64 scores; BarChart wants integers
const SCORE_SCALE: f64 = 1000.0;

const HEALTHY: Color = Color::Green;
const AT_RISK: Color = Color::Red;

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::DarkGray))
}

pub struct ChartsPanel;

impl ChartsPanel {
    pub fn render_placeholder(f: &mut Frame, area: Rect, title: &str) {
        let placeholder = Paragraph::new("No analyses in this period")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(panel(title));
        f.render_widget(placeholder, area);
    }

    /// Score progression with the threshold as a second dataset
    pub fn render_trend(f: &mut Frame, area: Rect, trend: Option<&TrendChart>) {
        let title = " Score Trend ";
        let Some(trend) = trend else {
            Self::render_placeholder(f, area, title);
            return;
        };

        let series = trend.series();
        let threshold = trend.threshold_line();
        let above: Vec<(f64, f64)> = trend
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.above_threshold)
            .map(|(i, p)| (i as f64, p.score))
            .collect();

        let datasets = vec![
            Dataset::default()
                .name("MSE score")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&series),
            Dataset::default()
                .name("Above threshold")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(AT_RISK))
                .data(&above),
            Dataset::default()
                .name(format!("Threshold {:.3}", trend.threshold))
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Yellow))
                .data(&threshold),
        ];

        let date_label = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%d/%m").to_string()).unwrap_or_default()
        };
        let chart = Chart::new(datasets)
            .block(panel(title))
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(Color::DarkGray))
                    .bounds([0.0, trend.x_max()])
                    .labels([date_label(trend.first_date()), date_label(trend.last_date())]),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(Color::DarkGray))
                    .bounds([0.0, trend.y_max])
                    .labels([
                        "0".to_string(),
                        format!("{:.1}", trend.y_max / 2.0),
                        format!("{:.1}", trend.y_max),
                    ]),
            );
        f.render_widget(chart, area);
    }

    /// Latest score as a share of the threshold
    pub fn render_gauge(f: &mut Frame, area: Rect, gauge: Option<&RiskGauge>) {
        let title = " Latest Risk ";
        let Some(gauge) = gauge else {
            Self::render_placeholder(f, area, title);
            return;
        };

        let color = if gauge.at_risk() { AT_RISK } else { HEALTHY };
        let widget = Gauge::default()
            .block(panel(title))
            .gauge_style(Style::default().fg(color))
            .ratio((gauge.percent / 100.0).clamp(0.0, 1.0))
            .label(format!(
                "{} - {:.3} / {:.3}",
                gauge.status(),
                gauge.latest_score,
                gauge.threshold
            ));
        f.render_widget(widget, area);
    }

    pub fn render_distribution(f: &mut Frame, area: Rect, distribution: &DistributionChart) {
        let title = " Results ";
        if distribution.total() == 0 {
            Self::render_placeholder(f, area, title);
            return;
        }

        let bars = [
            (Classification::Healthy, distribution.healthy, HEALTHY),
            (Classification::AtRisk, distribution.at_risk, AT_RISK),
        ]
        .map(|(class, count, color)| {
            Bar::default()
                .value(count as u64)
                .label(Line::from(class.as_str()))
                .text_value(format!("{} ({:.1}%)", count, distribution.percent(class)))
                .style(Style::default().fg(color))
        });

        let chart = BarChart::default()
            .block(panel(title))
            .data(BarGroup::default().bars(&bars))
            .bar_width(12)
            .bar_gap(2);
        f.render_widget(chart, area);
    }

    /// Generic count bars (window histogram, monthly activity)
    pub fn render_counts(f: &mut Frame, area: Rect, title: &str, bars: &[ChartBar]) {
        if bars.is_empty() {
            Self::render_placeholder(f, area, title);
            return;
        }

        let bars: Vec<Bar> = bars
            .iter()
            .map(|b| {
                Bar::default()
                    .value(b.value)
                    .label(Line::from(b.label.clone()))
            })
            .collect();
        let chart = BarChart::default()
            .block(panel(title))
            .data(BarGroup::default().bars(&bars))
            .bar_width(9)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Magenta));
        f.render_widget(chart, area);
    }

    /// Last analyses side by side, the newest emphasised
    pub fn render_comparison(f: &mut Frame, area: Rect, comparison: &ComparisonChart) {
        let title = " Recent Scores ";
        if comparison.scores.is_empty() {
            Self::render_placeholder(f, area, title);
            return;
        }

        let latest = comparison.latest_index();
        let bars: Vec<Bar> = comparison
            .scores
            .iter()
            .enumerate()
            .map(|(i, score)| {
                let color = if *score > comparison.threshold {
                    AT_RISK
                } else {
                    HEALTHY
                };
                let mut style = Style::default().fg(color);
                if Some(i) == latest {
                    style = style.add_modifier(Modifier::BOLD);
                }
                Bar::default()
                    .value((score * SCORE_SCALE).round().max(0.0) as u64)
                    .text_value(format!("{:.2}", score))
                    .style(style)
            })
            .collect();

        let chart = BarChart::default()
            .block(panel(title))
            .data(BarGroup::default().bars(&bars))
            .bar_width(5)
            .bar_gap(1);
        f.render_widget(chart, area);
    }
}
