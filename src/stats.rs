//! Dashboard statistics over a user's analysis history
//!
//! All functions are pure. Analyses are passed in chronological order (as
//! returned by `DataStore::user_analyses`) unless a parameter says
//! otherwise, and `now` is explicit so period filters are testable.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::analysis::Classification;
use crate::store::Analysis;

/// Scores compared by `trend_percent` on each side
const TREND_WINDOW: usize = 5;
/// Scores compared by `recent_trend` on each side
const RECENT_WINDOW: usize = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Period filter
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Period {
    #[value(name = "7d")]
    Week,
    #[value(name = "30d")]
    Month,
    #[default]
    #[value(name = "all")]
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Week => "Last 7 days",
            Self::Month => "Last 30 days",
            Self::All => "All time",
        }
    }

    /// Next period in 7d -> 30d -> all order
    pub fn next(&self) -> Self {
        match self {
            Self::Week => Self::Month,
            Self::Month => Self::All,
            Self::All => Self::Week,
        }
    }

    /// Earliest timestamp kept, None for all time
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Week => Some(now - Duration::days(7)),
            Self::Month => Some(now - Duration::days(30)),
            Self::All => None,
        }
    }

    pub fn filter(&self, analyses: &[Analysis], now: DateTime<Utc>) -> Vec<Analysis> {
        match self.cutoff(now) {
            Some(cutoff) => analyses
                .iter()
                .filter(|a| a.timestamp >= cutoff)
                .cloned()
                .collect(),
            None => analyses.to_vec(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" | "week" => Ok(Self::Week),
            "30d" | "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(format!("unknown period '{}' (expected 7d, 30d or all)", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Score statistics
// ─────────────────────────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Descriptive statistics of a score series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let mean = mean(scores);
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        Some(Self {
            count: scores.len(),
            mean,
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev: variance.sqrt(),
        })
    }

    /// 100 minus the coefficient of variation in percent, clamped to 0-100
    pub fn consistency_score(&self) -> f64 {
        if self.mean == 0.0 {
            return if self.std_dev == 0.0 { 100.0 } else { 0.0 };
        }
        (100.0 - (self.std_dev / self.mean) * 100.0).clamp(0.0, 100.0)
    }
}

/// Percentage change of the newest five scores against the five before
///
/// Negative means scores went down (improvement for MSE scores). Zero when
/// there is no older window to compare with.
pub fn trend_percent(newest_first: &[f64]) -> f64 {
    if newest_first.len() < 2 {
        return 0.0;
    }
    let split = newest_first.len().min(TREND_WINDOW);
    let end = newest_first.len().min(TREND_WINDOW * 2);
    let recent = &newest_first[..split];
    let older = &newest_first[split..end];
    if older.is_empty() {
        return 0.0;
    }

    let older_avg = mean(older);
    if older_avg == 0.0 {
        return 0.0;
    }
    (mean(recent) - older_avg) / older_avg * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecentTrend {
    Improving,
    Stable,
    Variable,
}

impl RecentTrend {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Improving => "Improving",
            Self::Stable => "Stable",
            Self::Variable => "Variable",
        }
    }
}

/// Last three scores against the three before them
pub fn recent_trend(chronological: &[f64]) -> Option<RecentTrend> {
    if chronological.len() < RECENT_WINDOW {
        return None;
    }
    let split = chronological.len() - RECENT_WINDOW;
    let recent = &chronological[split..];
    let previous = &chronological[split.saturating_sub(RECENT_WINDOW)..split];
    if previous.is_empty() {
        return None;
    }

    let (recent, previous) = (mean(recent), mean(previous));
    Some(if recent < previous {
        RecentTrend::Improving
    } else if recent > previous {
        RecentTrend::Variable
    } else {
        RecentTrend::Stable
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Direction of the five newest scores, newer half against older half
///
/// A change inside +/-10% of the older average counts as stable.
pub fn insight_trend(newest_first: &[f64]) -> InsightTrend {
    let recent = &newest_first[..newest_first.len().min(TREND_WINDOW)];
    if recent.len() < 3 {
        return InsightTrend::InsufficientData;
    }
    let half = recent.len().div_ceil(2);
    let newer = mean(&recent[..half]);
    let older = mean(&recent[half..]);

    if newer < older * 0.9 {
        InsightTrend::Improving
    } else if newer > older * 1.1 {
        InsightTrend::Declining
    } else {
        InsightTrend::Stable
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dashboard
// ─────────────────────────────────────────────────────────────────────────────

/// Headline numbers for the stat cards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_analyses: usize,
    pub average_score: f64,
    pub healthy_count: usize,
    pub at_risk_count: usize,
    pub healthy_percent: u32,
    pub at_risk_percent: u32,
    pub this_month: usize,
    pub lowest_score: Option<f64>,
    pub last_analysis: Option<DateTime<Utc>>,
    pub score_trend: Option<RecentTrend>,
    pub trend_percent: f64,
    pub summary: Option<ScoreSummary>,
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        (part as f64 / total as f64 * 100.0).round() as u32
    }
}

impl DashboardStats {
    pub fn compute(analyses: &[Analysis], now: DateTime<Utc>) -> Self {
        let scores: Vec<f64> = analyses.iter().map(|a| a.score).collect();
        let newest_first: Vec<f64> = scores.iter().rev().copied().collect();
        let total = analyses.len();
        let healthy = analyses
            .iter()
            .filter(|a| a.result == Classification::Healthy)
            .count();
        let at_risk = total - healthy;
        let summary = ScoreSummary::from_scores(&scores);

        Self {
            total_analyses: total,
            average_score: mean(&scores),
            healthy_count: healthy,
            at_risk_count: at_risk,
            healthy_percent: percent(healthy, total),
            at_risk_percent: percent(at_risk, total),
            this_month: analyses
                .iter()
                .filter(|a| a.timestamp.year() == now.year() && a.timestamp.month() == now.month())
                .count(),
            lowest_score: summary.map(|s| s.min),
            last_analysis: analyses.iter().map(|a| a.timestamp).max(),
            score_trend: recent_trend(&scores),
            trend_percent: trend_percent(&newest_first),
            summary,
        }
    }
}

/// Analyses per calendar month, keyed `YYYY-MM`, oldest first
pub fn monthly_counts(analyses: &[Analysis]) -> Vec<(String, usize)> {
    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for analysis in analyses {
        *months
            .entry(analysis.timestamp.format("%Y-%m").to_string())
            .or_default() += 1;
    }
    months.into_iter().collect()
}

/// Number of analyses per window count, ascending
pub fn window_histogram(analyses: &[Analysis]) -> Vec<(u32, usize)> {
    let mut windows: BTreeMap<u32, usize> = BTreeMap::new();
    for analysis in analyses {
        *windows.entry(analysis.windows).or_default() += 1;
    }
    windows.into_iter().collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Insights
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Neutral,
    Attention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub tone: Tone,
    pub message: &'static str,
}

impl Insight {
    fn new(tone: Tone, message: &'static str) -> Self {
        Self { tone, message }
    }
}

pub const NO_INSIGHTS: &str = "No analysis data available for insights.";

/// Plain-language remarks on level, direction and regularity of the history
pub fn insights(analyses: &[Analysis]) -> Vec<Insight> {
    if analyses.is_empty() {
        return vec![Insight::new(Tone::Neutral, NO_INSIGHTS)];
    }

    let scores: Vec<f64> = analyses.iter().map(|a| a.score).collect();
    let newest_first: Vec<f64> = scores.iter().rev().copied().collect();
    let average = mean(&scores);
    let mut out = Vec::new();

    out.push(if average < 1.0 {
        Insight::new(
            Tone::Positive,
            "Your motion patterns show consistently healthy characteristics.",
        )
    } else if average > 1.5 {
        Insight::new(
            Tone::Attention,
            "Your recent analyses show patterns that may require attention.",
        )
    } else {
        Insight::new(
            Tone::Neutral,
            "Your motion patterns are within normal variation ranges.",
        )
    });

    match insight_trend(&newest_first) {
        InsightTrend::Improving => out.push(Insight::new(
            Tone::Positive,
            "Your recent motion patterns show improvement over time.",
        )),
        InsightTrend::Declining => out.push(Insight::new(
            Tone::Attention,
            "Consider consulting with a healthcare professional about recent changes.",
        )),
        InsightTrend::Stable | InsightTrend::InsufficientData => {}
    }

    if analyses.len() >= 10 {
        out.push(Insight::new(
            Tone::Positive,
            "Excellent commitment to regular monitoring!",
        ));
    } else if analyses.len() >= 5 {
        out.push(Insight::new(
            Tone::Positive,
            "Good progress with regular analysis tracking.",
        ));
    }

    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::PredictionSource;
    use crate::store::AnalysisMetadata;
    use chrono::TimeZone;

    pub(crate) fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    pub(crate) fn analysis(score: f64, windows: u32, timestamp: DateTime<Utc>) -> Analysis {
        let result = if score > 1.376 {
            Classification::AtRisk
        } else {
            Classification::Healthy
        };
        Analysis {
            id: format!("analysis_{}", timestamp.timestamp()),
            user_id: "user_1".to_string(),
            timestamp,
            file_name: "walk.zip".to_string(),
            score,
            label: if result.is_healthy() { "Sain" } else { "Parkinson" }.to_string(),
            windows,
            threshold: 1.3764445960521698,
            result,
            analysis_time: 1000,
            file_size: 1024,
            source: PredictionSource::Live,
            metadata: AnalysisMetadata::default(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_period_parse_and_filter() {
        assert_eq!("7d".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("30D".parse::<Period>().unwrap(), Period::Month);
        assert!("fortnight".parse::<Period>().is_err());

        let now = at(2026, 10, 18);
        let history = vec![
            analysis(0.5, 3, at(2026, 8, 1)),
            analysis(0.6, 3, at(2026, 10, 1)),
            analysis(0.7, 3, at(2026, 10, 15)),
        ];
        assert_eq!(Period::Week.filter(&history, now).len(), 1);
        assert_eq!(Period::Month.filter(&history, now).len(), 2);
        assert_eq!(Period::All.filter(&history, now).len(), 3);
    }

    #[test]
    fn test_score_summary() {
        let summary = ScoreSummary::from_scores(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(summary.count, 8);
        assert!(close(summary.mean, 5.0));
        assert!(close(summary.std_dev, 2.0));
        assert!(close(summary.min, 2.0));
        assert!(close(summary.max, 9.0));
        assert!(close(summary.consistency_score(), 60.0));
        assert!(ScoreSummary::from_scores(&[]).is_none());
    }

    #[test]
    fn test_consistency_clamped() {
        let summary = ScoreSummary::from_scores(&[0.0, 0.0, 9.0]).unwrap();
        assert_eq!(summary.consistency_score(), 0.0);
        let flat = ScoreSummary::from_scores(&[1.0, 1.0]).unwrap();
        assert_eq!(flat.consistency_score(), 100.0);
    }

    #[test]
    fn test_trend_percent() {
        assert_eq!(trend_percent(&[1.0]), 0.0);
        assert_eq!(trend_percent(&[1.0, 1.0, 1.0]), 0.0);
        // Newest five average 1.0, next five 2.0
        let scores = [1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 9.0];
        assert!(close(trend_percent(&scores), -50.0));
    }

    #[test]
    fn test_recent_trend() {
        assert_eq!(recent_trend(&[1.0, 2.0]), None);
        assert_eq!(recent_trend(&[1.0, 2.0, 3.0]), None);
        assert_eq!(
            recent_trend(&[2.0, 2.0, 2.0, 1.0, 1.0, 1.0]),
            Some(RecentTrend::Improving)
        );
        assert_eq!(recent_trend(&[1.0, 1.0, 2.0, 2.0]), Some(RecentTrend::Variable));
        assert_eq!(recent_trend(&[1.0, 1.0, 1.0, 1.0]), Some(RecentTrend::Stable));
    }

    #[test]
    fn test_insight_trend() {
        assert_eq!(insight_trend(&[1.0, 2.0]), InsightTrend::InsufficientData);
        // Newer half (first three) lower than the older two
        assert_eq!(
            insight_trend(&[0.5, 0.5, 0.5, 1.0, 1.0, 7.0]),
            InsightTrend::Improving
        );
        assert_eq!(insight_trend(&[2.0, 2.0, 1.0]), InsightTrend::Declining);
        assert_eq!(insight_trend(&[1.0, 1.05, 1.0]), InsightTrend::Stable);
    }

    #[test]
    fn test_dashboard_stats() {
        let now = at(2026, 10, 18);
        let history = vec![
            analysis(0.4, 3, at(2026, 9, 20)),
            analysis(1.8, 4, at(2026, 10, 2)),
            analysis(0.3, 4, at(2026, 10, 10)),
        ];
        let stats = DashboardStats::compute(&history, now);

        assert_eq!(stats.total_analyses, 3);
        assert_eq!(stats.healthy_count, 2);
        assert_eq!(stats.at_risk_count, 1);
        assert_eq!(stats.healthy_percent, 67);
        assert_eq!(stats.at_risk_percent, 33);
        assert_eq!(stats.this_month, 2);
        assert_eq!(stats.lowest_score, Some(0.3));
        assert_eq!(stats.last_analysis, Some(at(2026, 10, 10)));
        assert!(close(stats.average_score, 2.5 / 3.0));
    }

    #[test]
    fn test_empty_dashboard() {
        let stats = DashboardStats::compute(&[], at(2026, 10, 18));
        assert_eq!(stats.total_analyses, 0);
        assert_eq!(stats.healthy_percent, 0);
        assert_eq!(stats.average_score, 0.0);
        assert!(stats.lowest_score.is_none());
        assert!(stats.summary.is_none());
    }

    #[test]
    fn test_monthly_and_window_buckets() {
        let history = vec![
            analysis(0.4, 5, at(2026, 9, 20)),
            analysis(0.5, 3, at(2026, 10, 2)),
            analysis(0.6, 5, at(2026, 10, 10)),
            analysis(0.7, 2, at(2025, 12, 31)),
        ];
        assert_eq!(
            monthly_counts(&history),
            vec![
                ("2025-12".to_string(), 1),
                ("2026-09".to_string(), 1),
                ("2026-10".to_string(), 2)
            ]
        );
        assert_eq!(window_histogram(&history), vec![(2, 1), (3, 1), (5, 2)]);
    }

    #[test]
    fn test_insights() {
        assert_eq!(insights(&[])[0].message, NO_INSIGHTS);

        let healthy: Vec<Analysis> = (1..=10)
            .map(|d| analysis(0.2, 3, at(2026, 10, d)))
            .collect();
        let out = insights(&healthy);
        assert_eq!(out[0].tone, Tone::Positive);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].message, "Excellent commitment to regular monitoring!");

        // Newest scores climbing fast
        let worsening = vec![
            analysis(1.0, 3, at(2026, 10, 1)),
            analysis(1.0, 3, at(2026, 10, 2)),
            analysis(2.5, 3, at(2026, 10, 3)),
        ];
        let out = insights(&worsening);
        assert_eq!(out[0].tone, Tone::Neutral);
        assert_eq!(out[1].tone, Tone::Attention);
    }
}
