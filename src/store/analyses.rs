//! Analysis operations on the analyses collection

use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{
    AnalysesDocument, Analysis, AnalysisMetadata, CollectionStatistics, DailyCount, DataStore,
    NewAnalysis, StoreError, UserProfile, UsersDocument,
};
use crate::analysis::{api_version, client_id, Classification};

/// Days of per-day counts kept in the collection statistics
const DAILY_HISTORY_DAYS: usize = 30;

fn generate_analysis_id() -> String {
    format!("analysis_{}", Uuid::new_v4().simple())
}

impl AnalysesDocument {
    /// Recompute collection counters from scratch (O(n) on every write)
    pub fn recompute_statistics(&mut self) {
        let total = self.analyses.len();
        let healthy = self
            .analyses
            .iter()
            .filter(|a| a.result == Classification::Healthy)
            .count();
        let average = if total > 0 {
            self.analyses.iter().map(|a| a.score).sum::<f64>() / total as f64
        } else {
            0.0
        };

        let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for analysis in &self.analyses {
            *per_day.entry(analysis.timestamp.date_naive()).or_default() += 1;
        }
        let skip = per_day.len().saturating_sub(DAILY_HISTORY_DAYS);
        let daily_analyses = per_day
            .into_iter()
            .skip(skip)
            .map(|(date, count)| DailyCount { date, count })
            .collect();

        self.statistics = CollectionStatistics {
            total_healthy: healthy,
            total_at_risk: total - healthy,
            average_score: average,
            daily_analyses,
        };
    }

    /// Drop every analysis owned by `user_id`; returns how many went
    pub fn remove_for_user(&mut self, user_id: &str) -> usize {
        let before = self.analyses.len();
        self.analyses.retain(|a| a.user_id != user_id);
        let removed = before - self.analyses.len();
        if removed > 0 {
            self.recompute_statistics();
        }
        removed
    }

    fn scores_for(&self, user_id: &str) -> Vec<f64> {
        self.analyses
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.score)
            .collect()
    }
}

impl DataStore {
    /// Persist an analysis and refresh the owner's denormalized profile
    ///
    /// Two separate full-document writes: analyses.json, then users.json.
    pub fn save_analysis(&self, user_id: &str, new: NewAnalysis) -> Result<Analysis, StoreError> {
        let mut users: UsersDocument = self.load()?;
        let index = users
            .users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

        let mut analyses: AnalysesDocument = self.load()?;
        let analysis = Analysis {
            id: generate_analysis_id(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            file_name: new.file_name,
            score: new.score,
            label: new.label,
            windows: new.windows,
            threshold: new.threshold,
            result: new.result,
            analysis_time: new.analysis_time,
            file_size: new.file_size,
            source: new.source,
            metadata: AnalysisMetadata {
                api_version: api_version().to_string(),
                client: client_id(),
                file_sha256: new.file_sha256,
            },
        };

        analyses.analyses.push(analysis.clone());
        analyses.recompute_statistics();
        self.save(&mut analyses)?;

        let scores = analyses.scores_for(user_id);
        let user = &mut users.users[index];
        user.analyses.push(analysis.id.clone());
        user.profile.total_analyses += 1;
        user.profile.last_analysis = Some(analysis.timestamp);
        match analysis.result {
            Classification::Healthy => user.profile.risk_assessments.healthy += 1,
            Classification::AtRisk => user.profile.risk_assessments.at_risk += 1,
        }
        user.profile.average_score = scores.iter().sum::<f64>() / scores.len() as f64;
        self.save(&mut users)?;

        tracing::info!(
            "Saved analysis {} for {} (score {:.6}, {})",
            analysis.id,
            user_id,
            analysis.score,
            analysis.result
        );
        Ok(analysis)
    }

    /// A user's analyses in insertion (chronological) order
    pub fn user_analyses(&self, user_id: &str) -> Result<Vec<Analysis>, StoreError> {
        let analyses: AnalysesDocument = self.load()?;
        Ok(analyses
            .analyses
            .into_iter()
            .filter(|a| a.user_id == user_id)
            .collect())
    }

    /// Look up one analysis, scoped to its owner
    pub fn find_analysis(
        &self,
        user_id: &str,
        analysis_id: &str,
    ) -> Result<Option<Analysis>, StoreError> {
        let analyses: AnalysesDocument = self.load()?;
        Ok(analyses
            .analyses
            .into_iter()
            .find(|a| a.user_id == user_id && a.id == analysis_id))
    }

    /// Remove a user's history and reset their profile counters
    pub fn clear_user_analyses(&self, user_id: &str) -> Result<usize, StoreError> {
        let mut users: UsersDocument = self.load()?;
        let user = users
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

        let mut analyses: AnalysesDocument = self.load()?;
        let removed = analyses.remove_for_user(user_id);
        if removed > 0 {
            self.save(&mut analyses)?;
        }

        user.analyses.clear();
        user.profile = UserProfile::default();
        user.metadata.last_updated = Some(Utc::now());
        self.save(&mut users)?;

        tracing::info!("Cleared {} analyses for {}", removed, user_id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::analysis::PredictionSource;

    fn new_analysis(score: f64, result: Classification) -> NewAnalysis {
        NewAnalysis {
            file_name: "session.zip".to_string(),
            score,
            label: if result.is_healthy() { "Sain" } else { "Parkinson" }.to_string(),
            windows: 4,
            threshold: 1.3764445960521698,
            result,
            analysis_time: 900,
            file_size: 2048,
            file_sha256: Some("deadbeef".to_string()),
            source: PredictionSource::Live,
        }
    }

    #[test]
    fn test_save_analysis_updates_profile() {
        let (_dir, store) = temp_store();
        let user = store.create_user(new_user("jean@x.com")).unwrap();

        let first = store
            .save_analysis(&user.id, new_analysis(0.5, Classification::Healthy))
            .unwrap();
        let after_first = store.find_user_by_id(&user.id).unwrap().unwrap();
        assert_eq!(after_first.profile.total_analyses, 1);
        assert_eq!(after_first.analyses, vec![first.id.clone()]);
        assert!((after_first.profile.average_score - 0.5).abs() < 1e-12);

        store
            .save_analysis(&user.id, new_analysis(1.5, Classification::AtRisk))
            .unwrap();
        let after_second = store.find_user_by_id(&user.id).unwrap().unwrap();
        assert_eq!(after_second.profile.total_analyses, 2);
        assert!((after_second.profile.average_score - 1.0).abs() < 1e-12);
        assert_eq!(after_second.profile.risk_assessments.healthy, 1);
        assert_eq!(after_second.profile.risk_assessments.at_risk, 1);
        assert!(after_second.profile.last_analysis.is_some());
    }

    #[test]
    fn test_average_ignores_other_users() {
        let (_dir, store) = temp_store();
        let jean = store.create_user(new_user("jean@x.com")).unwrap();
        let marie = store.create_user(new_user("marie@x.com")).unwrap();

        store
            .save_analysis(&marie.id, new_analysis(9.0, Classification::AtRisk))
            .unwrap();
        store
            .save_analysis(&jean.id, new_analysis(0.2, Classification::Healthy))
            .unwrap();
        store
            .save_analysis(&jean.id, new_analysis(0.4, Classification::Healthy))
            .unwrap();

        let jean = store.find_user_by_id(&jean.id).unwrap().unwrap();
        assert!((jean.profile.average_score - 0.3).abs() < 1e-12);

        let doc: AnalysesDocument = store.load().unwrap();
        assert_eq!(doc.metadata.total_analyses, 3);
        assert_eq!(doc.statistics.total_healthy, 2);
        assert_eq!(doc.statistics.total_at_risk, 1);
        assert!((doc.statistics.average_score - 9.6 / 3.0).abs() < 1e-12);
        assert_eq!(doc.statistics.daily_analyses.len(), 1);
        assert_eq!(doc.statistics.daily_analyses[0].count, 3);
    }

    #[test]
    fn test_save_analysis_requires_existing_user() {
        let (_dir, store) = temp_store();
        let err = store
            .save_analysis("user_ghost", new_analysis(0.1, Classification::Healthy))
            .unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(_)));

        // Nothing was written for the ghost
        let doc: AnalysesDocument = store.load().unwrap();
        assert!(doc.analyses.is_empty());
    }

    #[test]
    fn test_saved_analysis_metadata() {
        let (_dir, store) = temp_store();
        let user = store.create_user(new_user("jean@x.com")).unwrap();
        let saved = store
            .save_analysis(&user.id, new_analysis(0.1, Classification::Healthy))
            .unwrap();

        assert!(saved.id.starts_with("analysis_"));
        assert_eq!(saved.metadata.client, client_id());
        assert_eq!(saved.metadata.file_sha256.as_deref(), Some("deadbeef"));

        let found = store.find_analysis(&user.id, &saved.id).unwrap();
        assert_eq!(found, Some(saved.clone()));
        assert!(store.find_analysis("user_other", &saved.id).unwrap().is_none());
    }

    #[test]
    fn test_user_analyses_in_insertion_order() {
        let (_dir, store) = temp_store();
        let user = store.create_user(new_user("jean@x.com")).unwrap();
        for score in [0.3, 0.1, 0.2] {
            store
                .save_analysis(&user.id, new_analysis(score, Classification::Healthy))
                .unwrap();
        }

        let scores: Vec<f64> = store
            .user_analyses(&user.id)
            .unwrap()
            .iter()
            .map(|a| a.score)
            .collect();
        assert_eq!(scores, vec![0.3, 0.1, 0.2]);
    }

    #[test]
    fn test_clear_user_analyses() {
        let (_dir, store) = temp_store();
        let jean = store.create_user(new_user("jean@x.com")).unwrap();
        let marie = store.create_user(new_user("marie@x.com")).unwrap();
        store
            .save_analysis(&jean.id, new_analysis(0.2, Classification::Healthy))
            .unwrap();
        store
            .save_analysis(&jean.id, new_analysis(1.8, Classification::AtRisk))
            .unwrap();
        store
            .save_analysis(&marie.id, new_analysis(0.7, Classification::Healthy))
            .unwrap();

        assert_eq!(store.clear_user_analyses(&jean.id).unwrap(), 2);

        let jean = store.find_user_by_id(&jean.id).unwrap().unwrap();
        assert_eq!(jean.profile, UserProfile::default());
        assert!(jean.analyses.is_empty());
        assert!(store.user_analyses(&jean.id).unwrap().is_empty());

        let doc: AnalysesDocument = store.load().unwrap();
        assert_eq!(doc.analyses.len(), 1);
        assert_eq!(doc.statistics.total_at_risk, 0);
        assert!((doc.statistics.average_score - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_delete_user_removes_analyses() {
        let (_dir, store) = temp_store();
        let jean = store.create_user(new_user("jean@x.com")).unwrap();
        store
            .save_analysis(&jean.id, new_analysis(0.2, Classification::Healthy))
            .unwrap();

        store.delete_user(&jean.id).unwrap();
        let doc: AnalysesDocument = store.load().unwrap();
        assert!(doc.analyses.is_empty());
        assert_eq!(doc.statistics.total_healthy, 0);
    }
}
