//! Chart models for the dashboard
//!
//! Each chart is plain data built from a chronological analysis history.
//! The TUI turns these into ratatui widgets; nothing here draws.

use chrono::{DateTime, NaiveDate, Utc};

use crate::analysis::{Classification, REFERENCE_THRESHOLD};
use crate::stats;
use crate::store::Analysis;

/// Analyses shown side by side in the comparison chart
const COMPARISON_SIZE: usize = 10;

fn is_above(score: f64, threshold: f64) -> bool {
    score > threshold
}

// ─────────────────────────────────────────────────────────────────────────────
// Score trend
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub above_threshold: bool,
}

/// Score progression with the reference threshold line
#[derive(Debug, Clone, PartialEq)]
pub struct TrendChart {
    pub points: Vec<TrendPoint>,
    pub threshold: f64,
    /// Upper y bound; the lower bound is always zero
    pub y_max: f64,
}

impl TrendChart {
    pub fn from_history(analyses: &[Analysis]) -> Option<Self> {
        if analyses.is_empty() {
            return None;
        }
        let mut sorted: Vec<&Analysis> = analyses.iter().collect();
        sorted.sort_by_key(|a| a.timestamp);

        let threshold = REFERENCE_THRESHOLD;
        let points: Vec<TrendPoint> = sorted
            .iter()
            .map(|a| TrendPoint {
                timestamp: a.timestamp,
                score: a.score,
                above_threshold: is_above(a.score, threshold),
            })
            .collect();
        let top = points
            .iter()
            .map(|p| p.score)
            .fold(threshold, f64::max);

        Some(Self {
            points,
            threshold,
            y_max: top * 1.1,
        })
    }

    /// (x, y) pairs with x as the point index
    pub fn series(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.score))
            .collect()
    }

    /// Two-point horizontal line spanning the series
    pub fn threshold_line(&self) -> Vec<(f64, f64)> {
        let last = self.points.len().saturating_sub(1).max(1) as f64;
        vec![(0.0, self.threshold), (last, self.threshold)]
    }

    pub fn x_max(&self) -> f64 {
        self.points.len().saturating_sub(1).max(1) as f64
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.timestamp.date_naive())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.timestamp.date_naive())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Distribution
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionChart {
    pub healthy: usize,
    pub at_risk: usize,
}

impl DistributionChart {
    pub fn from_history(analyses: &[Analysis]) -> Self {
        let healthy = analyses
            .iter()
            .filter(|a| a.result == Classification::Healthy)
            .count();
        Self {
            healthy,
            at_risk: analyses.len() - healthy,
        }
    }

    pub fn total(&self) -> usize {
        self.healthy + self.at_risk
    }

    /// Share of one class with one decimal, e.g. 66.7
    pub fn percent(&self, class: Classification) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let part = match class {
            Classification::Healthy => self.healthy,
            Classification::AtRisk => self.at_risk,
        };
        (part as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Risk gauge
// ─────────────────────────────────────────────────────────────────────────────

/// Latest score as a share of the threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskGauge {
    pub latest_score: f64,
    pub threshold: f64,
    /// min(100, latest / threshold * 100)
    pub percent: f64,
    /// Scale maximum, at least 2.0
    pub max: f64,
}

impl RiskGauge {
    pub fn from_history(analyses: &[Analysis]) -> Option<Self> {
        let latest = analyses.iter().max_by_key(|a| a.timestamp)?;
        Some(Self::for_score(latest.score))
    }

    pub fn for_score(latest_score: f64) -> Self {
        let threshold = REFERENCE_THRESHOLD;
        Self {
            latest_score,
            threshold,
            percent: (latest_score / threshold * 100.0).clamp(0.0, 100.0),
            max: f64::max(2.0, latest_score * 1.5),
        }
    }

    pub fn at_risk(&self) -> bool {
        is_above(self.latest_score, self.threshold)
    }

    pub fn status(&self) -> &'static str {
        if self.at_risk() {
            "Risk Detected"
        } else {
            "Healthy Pattern"
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bar charts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: u64,
}

/// How many analyses scored each number of windows
#[derive(Debug, Clone, PartialEq)]
pub struct WindowChart {
    pub bars: Vec<Bar>,
}

impl WindowChart {
    pub fn from_history(analyses: &[Analysis]) -> Self {
        let bars = stats::window_histogram(analyses)
            .into_iter()
            .map(|(windows, count)| Bar {
                label: format!("{} Windows", windows),
                value: count as u64,
            })
            .collect();
        Self { bars }
    }
}

/// Analyses per calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyChart {
    pub bars: Vec<Bar>,
}

impl MonthlyChart {
    pub fn from_history(analyses: &[Analysis]) -> Self {
        let bars = stats::monthly_counts(analyses)
            .into_iter()
            .map(|(month, count)| Bar {
                label: month_label(&month),
                value: count as u64,
            })
            .collect();
        Self { bars }
    }
}

/// "2026-10" -> "Oct 2026"
fn month_label(key: &str) -> String {
    NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| key.to_string())
}

/// The most recent analyses, oldest first, with the latest flagged
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonChart {
    pub scores: Vec<f64>,
    pub threshold: f64,
}

impl ComparisonChart {
    pub fn from_history(analyses: &[Analysis]) -> Self {
        let skip = analyses.len().saturating_sub(COMPARISON_SIZE);
        Self {
            scores: analyses.iter().skip(skip).map(|a| a.score).collect(),
            threshold: REFERENCE_THRESHOLD,
        }
    }

    pub fn latest_index(&self) -> Option<usize> {
        self.scores.len().checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::{analysis, at};

    #[test]
    fn test_trend_chart_orders_and_flags() {
        let history = vec![
            analysis(1.9, 3, at(2026, 10, 5)),
            analysis(0.4, 3, at(2026, 10, 1)),
        ];
        let chart = TrendChart::from_history(&history).unwrap();

        assert_eq!(chart.points[0].score, 0.4);
        assert!(!chart.points[0].above_threshold);
        assert!(chart.points[1].above_threshold);
        assert_eq!(chart.threshold, 1.376);
        assert!((chart.y_max - 1.9 * 1.1).abs() < 1e-9);
        assert_eq!(chart.series(), vec![(0.0, 0.4), (1.0, 1.9)]);
        assert_eq!(chart.threshold_line(), vec![(0.0, 1.376), (1.0, 1.376)]);
        assert!(TrendChart::from_history(&[]).is_none());
    }

    #[test]
    fn test_trend_chart_y_bound_covers_threshold() {
        let chart = TrendChart::from_history(&[analysis(0.1, 3, at(2026, 10, 1))]).unwrap();
        assert!(chart.y_max > chart.threshold);
        assert_eq!(chart.x_max(), 1.0);
    }

    #[test]
    fn test_distribution_percentages() {
        let history = vec![
            analysis(0.2, 3, at(2026, 10, 1)),
            analysis(0.3, 3, at(2026, 10, 2)),
            analysis(1.7, 3, at(2026, 10, 3)),
        ];
        let chart = DistributionChart::from_history(&history);
        assert_eq!(chart.total(), 3);
        assert_eq!(chart.percent(Classification::Healthy), 66.7);
        assert_eq!(chart.percent(Classification::AtRisk), 33.3);
        assert_eq!(
            DistributionChart::from_history(&[]).percent(Classification::Healthy),
            0.0
        );
    }

    #[test]
    fn test_risk_gauge() {
        let low = RiskGauge::for_score(0.688);
        assert!((low.percent - 50.0).abs() < 1e-9);
        assert_eq!(low.max, 2.0);
        assert_eq!(low.status(), "Healthy Pattern");

        let high = RiskGauge::for_score(3.0);
        assert_eq!(high.percent, 100.0);
        assert!((high.max - 4.5).abs() < 1e-9);
        assert!(high.at_risk());

        let history = vec![
            analysis(3.0, 3, at(2026, 10, 1)),
            analysis(0.688, 3, at(2026, 10, 9)),
        ];
        let gauge = RiskGauge::from_history(&history).unwrap();
        assert_eq!(gauge.latest_score, 0.688);
        assert!(RiskGauge::from_history(&[]).is_none());
    }

    #[test]
    fn test_bar_charts() {
        let history = vec![
            analysis(0.2, 4, at(2026, 9, 30)),
            analysis(0.3, 2, at(2026, 10, 1)),
            analysis(0.4, 4, at(2026, 10, 2)),
        ];

        let windows = WindowChart::from_history(&history);
        assert_eq!(windows.bars[0].label, "2 Windows");
        assert_eq!(windows.bars[1].value, 2);

        let monthly = MonthlyChart::from_history(&history);
        let labels: Vec<&str> = monthly.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Sep 2026", "Oct 2026"]);
    }

    #[test]
    fn test_comparison_keeps_last_ten() {
        let history: Vec<Analysis> = (1..=12)
            .map(|d| analysis(d as f64 / 10.0, 3, at(2026, 10, d)))
            .collect();
        let chart = ComparisonChart::from_history(&history);
        assert_eq!(chart.scores.len(), 10);
        assert_eq!(chart.scores[0], 0.3);
        assert_eq!(chart.latest_index(), Some(9));
    }
}
