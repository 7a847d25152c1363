//! Stored entities: users, analyses and the two collection documents
//!
//! Field names are camelCase on disk, matching the documents of the web
//! front-end. Unknown fields are ignored on load.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{Classification, PredictionSource};

pub const DOCUMENT_VERSION: &str = "1.0";
pub const DATA_SCHEMA: &str = "v1";

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    /// Encoded PBKDF2 hash, see `auth::password`
    pub password: String,
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub medical_id: Option<String>,
    #[serde(default)]
    pub profile: UserProfile,
    /// Ids of this user's analyses (references into analyses.json)
    #[serde(default)]
    pub analyses: Vec<String>,
    #[serde(default)]
    pub settings: UserSettings,
    pub metadata: UserMetadata,
}

/// Denormalized per-user statistics, rewritten on every analysis save
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub total_analyses: usize,
    pub last_analysis: Option<DateTime<Utc>>,
    pub average_score: f64,
    #[serde(default)]
    pub risk_assessments: RiskAssessments,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessments {
    pub healthy: usize,
    pub at_risk: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub notifications: bool,
    pub data_retention: bool,
    pub privacy_level: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            data_retention: true,
            privacy_level: "standard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserMetadata {
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub login_count: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// A user with the credential removed: what sessions and exports carry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: String,
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub join_date: DateTime<Utc>,
    pub medical_id: Option<String>,
    pub profile: UserProfile,
    pub settings: UserSettings,
    pub metadata: UserMetadata,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            date_of_birth: user.date_of_birth,
            join_date: user.join_date,
            medical_id: user.medical_id.clone(),
            profile: user.profile.clone(),
            settings: user.settings.clone(),
            metadata: user.metadata.clone(),
        }
    }
}

/// Input for `DataStore::create_user` (password already hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub password_hash: String,
    pub medical_id: Option<String>,
}

/// Typed partial update for `DataStore::update_user`
///
/// `None` leaves a field untouched. `medical_id: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub medical_id: Option<Option<String>>,
    pub settings: Option<UserSettings>,
    pub password_hash: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub file_name: String,
    pub score: f64,
    /// Label as returned by the model (e.g. "Sain")
    pub label: String,
    pub windows: u32,
    pub threshold: f64,
    pub result: Classification,
    /// Round-trip time of the submission in milliseconds
    pub analysis_time: u64,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub source: PredictionSource,
    #[serde(default)]
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub api_version: String,
    pub client: String,
    pub file_sha256: Option<String>,
}

/// Input for `DataStore::save_analysis`
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub file_name: String,
    pub score: f64,
    pub label: String,
    pub windows: u32,
    pub threshold: f64,
    pub result: Classification,
    pub analysis_time: u64,
    pub file_size: u64,
    pub file_sha256: Option<String>,
    pub source: PredictionSource,
}

// ─────────────────────────────────────────────────────────────────────────────
// Documents
// ─────────────────────────────────────────────────────────────────────────────

/// users.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsersDocument {
    pub users: Vec<User>,
    pub metadata: UsersMetadata,
    #[serde(default)]
    pub config: UsersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsersMetadata {
    pub version: String,
    pub last_updated: DateTime<Utc>,
    pub total_users: usize,
    pub data_schema: String,
}

/// Limits stored alongside the users collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsersConfig {
    pub max_users: usize,
    pub password_min_length: usize,
    pub session_expiry_days: i64,
    pub analysis_retention_days: i64,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            max_users: 10_000,
            password_min_length: 8,
            session_expiry_days: 30,
            analysis_retention_days: 365,
        }
    }
}

impl Default for UsersDocument {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            metadata: UsersMetadata {
                version: DOCUMENT_VERSION.to_string(),
                last_updated: Utc::now(),
                total_users: 0,
                data_schema: DATA_SCHEMA.to_string(),
            },
            config: UsersConfig::default(),
        }
    }
}

/// analyses.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysesDocument {
    pub analyses: Vec<Analysis>,
    pub metadata: AnalysesMetadata,
    #[serde(default)]
    pub statistics: CollectionStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysesMetadata {
    pub version: String,
    pub last_updated: DateTime<Utc>,
    pub total_analyses: usize,
    pub data_schema: String,
}

/// Aggregate counters over the whole analyses collection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatistics {
    pub total_healthy: usize,
    pub total_at_risk: usize,
    pub average_score: f64,
    #[serde(default)]
    pub daily_analyses: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyCount {
    /// Calendar day, YYYY-MM-DD
    pub date: NaiveDate,
    pub count: usize,
}

impl Default for AnalysesDocument {
    fn default() -> Self {
        Self {
            analyses: Vec::new(),
            metadata: AnalysesMetadata {
                version: DOCUMENT_VERSION.to_string(),
                last_updated: Utc::now(),
                total_analyses: 0,
                data_schema: DATA_SCHEMA.to_string(),
            },
            statistics: CollectionStatistics::default(),
        }
    }
}
