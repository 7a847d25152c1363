//! Exports: per-analysis JSON report, profile dump and history CSV

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::{AnalysisOutcome, Classification, PredictionSource};
use crate::stats::DashboardStats;
use crate::store::{Analysis, UserSnapshot};

pub const METHODOLOGY: &str = "Autoencoder-based anomaly detection";
pub const SAMPLING_RATE: &str = "20Hz";
pub const WINDOW_SIZE: &str = "100 samples";
pub const DISCLAIMER: &str = "This tool is for research and educational purposes only. \
Results should not be used as a substitute for professional medical advice.";
pub const REPORT_VERSION: &str = "1.0";

pub const CSV_HEADER: &str = "Date,File,MSE Score,Result,Windows";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis report
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub patient_id: String,
    pub patient_name: String,
    pub analysis_date: DateTime<Utc>,
    pub file_name: String,
    pub score: f64,
    /// Headline, e.g. "Healthy Motion Patterns"
    pub result: String,
    pub classification: Classification,
    pub windows: u32,
    pub threshold: f64,
    pub source: PredictionSource,
    pub methodology: &'static str,
    pub sampling_rate: &'static str,
    pub window_size: &'static str,
    pub disclaimer: &'static str,
    pub report_version: &'static str,
}

impl AnalysisReport {
    #[allow(clippy::too_many_arguments)]
    fn new(
        patient: Option<&UserSnapshot>,
        analysis_date: DateTime<Utc>,
        file_name: &str,
        score: f64,
        classification: Classification,
        windows: u32,
        threshold: f64,
        source: PredictionSource,
    ) -> Self {
        Self {
            patient_id: patient
                .map(|u| u.id.clone())
                .unwrap_or_else(|| "anonymous".to_string()),
            patient_name: patient
                .map(|u| u.name.clone())
                .unwrap_or_else(|| "Anonymous User".to_string()),
            analysis_date,
            file_name: file_name.to_string(),
            score,
            result: classification.headline().to_string(),
            classification,
            windows,
            threshold,
            source,
            methodology: METHODOLOGY,
            sampling_rate: SAMPLING_RATE,
            window_size: WINDOW_SIZE,
            disclaimer: DISCLAIMER,
            report_version: REPORT_VERSION,
        }
    }

    /// Report for a result that has not necessarily been saved
    pub fn from_outcome(patient: Option<&UserSnapshot>, outcome: &AnalysisOutcome) -> Self {
        Self::new(
            patient,
            outcome.completed_at,
            &outcome.file_name,
            outcome.prediction.score,
            outcome.classification,
            outcome.prediction.windows,
            outcome.prediction.threshold,
            outcome.source,
        )
    }

    /// Report for a stored analysis
    pub fn from_analysis(patient: &UserSnapshot, analysis: &Analysis) -> Self {
        Self::new(
            Some(patient),
            analysis.timestamp,
            &analysis.file_name,
            analysis.score,
            analysis.result,
            analysis.windows,
            analysis.threshold,
            analysis.source,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile export
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileExport {
    pub exported_at: DateTime<Utc>,
    pub user: UserSnapshot,
    pub analyses: Vec<Analysis>,
    pub statistics: DashboardStats,
}

// ─────────────────────────────────────────────────────────────────────────────
// History CSV
// ─────────────────────────────────────────────────────────────────────────────

/// Prefix cells a spreadsheet would evaluate as formulas
fn neutralize_formula(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@']) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

/// Quote a field containing a comma, quote or line break
pub fn csv_escape(value: &str) -> String {
    let safe = neutralize_formula(value);
    if safe.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", safe.replace('"', "\"\""))
    } else {
        safe
    }
}

/// History as CSV, None when there is nothing to export
pub fn history_csv(analyses: &[Analysis]) -> Option<String> {
    if analyses.is_empty() {
        return None;
    }

    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for analysis in analyses {
        let windows = if analysis.windows > 0 {
            analysis.windows.to_string()
        } else {
            String::new()
        };
        let row = [
            analysis.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            csv_escape(&analysis.file_name),
            analysis.score.to_string(),
            analysis.result.as_str().to_string(),
            windows,
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    Some(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// File names and writing
// ─────────────────────────────────────────────────────────────────────────────

pub fn report_file_name(date: NaiveDate) -> String {
    format!("parkinson_analysis_{}.json", date.format("%Y-%m-%d"))
}

pub fn profile_file_name(date: NaiveDate) -> String {
    format!("parkinson-detect-profile-{}.json", date.format("%Y-%m-%d"))
}

pub fn history_file_name(date: NaiveDate) -> String {
    format!("analyses-history-{}.csv", date.format("%Y-%m-%d"))
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(value)?;
    write_text(path, &json)
}

pub fn write_text(path: &Path, contents: &str) -> Result<(), ReportError> {
    fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::{demo_prediction, Upload};
    use crate::stats::tests::{analysis, at};
    use tempfile::TempDir;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("walk.zip"), "walk.zip");
        assert_eq!(csv_escape("a,b.zip"), "\"a,b.zip\"");
        assert_eq!(csv_escape("say \"hi\".zip"), "\"say \"\"hi\"\".zip\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
        assert_eq!(csv_escape("=SUM(A1).zip"), "'=SUM(A1).zip");
    }

    #[test]
    fn test_history_csv() {
        assert!(history_csv(&[]).is_none());

        let mut first = analysis(0.25, 4, at(2026, 10, 1));
        first.file_name = "morning, walk.zip".to_string();
        let second = analysis(1.5, 0, at(2026, 10, 2));

        let csv = history_csv(&[first, second]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "2026-10-01 12:00,\"morning, walk.zip\",0.25,healthy,4"
        );
        assert_eq!(lines[2], "2026-10-02 12:00,walk.zip,1.5,at-risk,");
    }

    #[test]
    fn test_report_from_demo_outcome() {
        let upload = Upload::from_bytes("walk.zip", vec![0; 8]);
        let outcome = AnalysisOutcome::demo(demo_prediction(), &upload, 0, "offline".into());
        let report = AnalysisReport::from_outcome(None, &outcome);

        assert_eq!(report.patient_id, "anonymous");
        assert_eq!(report.result, "Healthy Motion Patterns");
        assert_eq!(report.source, PredictionSource::Demo);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["methodology"], "Autoencoder-based anomaly detection");
        assert_eq!(json["samplingRate"], "20Hz");
        assert_eq!(json["windowSize"], "100 samples");
        assert_eq!(json["source"], "demo");
    }

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(report_file_name(date), "parkinson_analysis_2026-10-18.json");
        assert_eq!(profile_file_name(date), "parkinson-detect-profile-2026-10-18.json");
        assert_eq!(history_file_name(date), "analyses-history-2026-10-18.csv");
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &serde_json::json!({"a": 1})).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\"a\": 1"));

        let missing = dir.path().join("nope").join("out.json");
        assert!(matches!(
            write_json(&missing, &1),
            Err(ReportError::Io { .. })
        ));
    }
}
