//! Application controller
//!
//! `App` owns every service (store, sessions, hasher, prediction client)
//! and the current `AppState`. State is a plain value: each transition
//! consumes the old state and returns the new one. Operations queue
//! user-facing notifications that the caller drains and displays.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::analysis::AnalysisOutcome;
use crate::auth::{self, AuthError, PasswordHasher, SignupForm};
use crate::config::Config;
use crate::notify::Notification;
use crate::predict::{demo_prediction, PredictClient, PredictError, Upload, UploadError};
use crate::report::{self, AnalysisReport, ProfileExport, ReportError};
use crate::session::{Session, SessionError, SessionStore};
use crate::stats::{DashboardStats, Period};
use crate::store::{Analysis, DataStore, StoreError, UserSnapshot, UserUpdate};

pub const DEMO_NOTICE: &str = "Using demo data for analysis...";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Please log in first")]
    NotLoggedIn,

    #[error("Please select a file first")]
    NoFile,

    #[error("No results to save")]
    NoResult,

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub session: Option<Session>,
    pub selected_file: Option<Upload>,
    pub last_outcome: Option<AnalysisOutcome>,
}

impl AppState {
    pub fn with_session(self, session: Session) -> Self {
        Self {
            session: Some(session),
            ..self
        }
    }

    /// Logged out state; drops the file and result too
    pub fn signed_out(self) -> Self {
        Self::default()
    }

    /// A new file invalidates the previous result
    pub fn with_file(self, upload: Upload) -> Self {
        Self {
            selected_file: Some(upload),
            last_outcome: None,
            ..self
        }
    }

    pub fn with_outcome(self, outcome: AnalysisOutcome) -> Self {
        Self {
            last_outcome: Some(outcome),
            ..self
        }
    }

    /// Replace the session's user snapshot after a profile change
    pub fn with_user(self, user: UserSnapshot) -> Self {
        let session = self.session.map(|session| Session { user, ..session });
        Self { session, ..self }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_user(&self) -> Option<&UserSnapshot> {
        self.session.as_ref().map(|s| &s.user)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller
// ─────────────────────────────────────────────────────────────────────────────

pub struct App {
    config: Config,
    store: DataStore,
    sessions: SessionStore,
    hasher: PasswordHasher,
    client: PredictClient,
    state: AppState,
    notifications: Vec<Notification>,
}

impl App {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let store = DataStore::open(&config.storage)?;
        let sessions = SessionStore::new(store.data_dir(), &config.session);
        Self::with_sessions(config, store, sessions)
    }

    /// Build with an explicit session store (tests keep sessions in a temp dir)
    pub fn with_sessions(
        config: Config,
        store: DataStore,
        sessions: SessionStore,
    ) -> Result<Self, AppError> {
        let hasher = PasswordHasher::new(config.security.pbkdf2_iterations);
        let client = PredictClient::new(&config.api)?;
        tracing::debug!(
            "Controller ready (data dir {}, endpoint {})",
            store.data_dir().display(),
            client.url()
        );

        Ok(Self {
            config,
            store,
            sessions,
            hasher,
            client,
            state: AppState::default(),
            notifications: Vec::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Hand queued notifications to the caller
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn transition(&mut self, apply: impl FnOnce(AppState) -> AppState) {
        self.state = apply(std::mem::take(&mut self.state));
    }

    pub fn current_user(&self) -> Result<&UserSnapshot, AppError> {
        self.state.current_user().ok_or(AppError::NotLoggedIn)
    }

    fn current_user_id(&self) -> Result<String, AppError> {
        Ok(self.current_user()?.id.clone())
    }

    fn refresh_user(&mut self, user_id: &str) -> Result<(), AppError> {
        let user = self
            .store
            .find_user_by_id(user_id)?
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;
        self.transition(|s| s.with_user(UserSnapshot::from(&user)));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accounts
    // ─────────────────────────────────────────────────────────────────────────

    /// Resume a stored session; returns whether one was found
    pub fn restore(&mut self) -> Result<bool, AppError> {
        match self.sessions.restore(&self.store)? {
            Some(session) => {
                tracing::debug!("Restored session for {}", session.user.id);
                self.transition(|s| s.with_session(session));
                Ok(true)
            }
            None => {
                self.transition(AppState::signed_out);
                Ok(false)
            }
        }
    }

    /// Create the account and log it in (remembered)
    pub fn signup(&mut self, form: &SignupForm) -> Result<UserSnapshot, AppError> {
        let user = auth::signup(&self.store, &self.hasher, form, Utc::now().date_naive())?;
        let user = self.store.record_login(&user.id)?;
        let session = self.sessions.issue(&self.store, &user, true)?;
        let snapshot = session.user.clone();

        self.transition(|s| s.with_session(session));
        self.notify(Notification::success("Account created successfully!"));
        Ok(snapshot)
    }

    pub fn login(
        &mut self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<UserSnapshot, AppError> {
        let user = auth::login(&self.store, email, password)?;
        let session = self.sessions.issue(&self.store, &user, remember)?;
        let snapshot = session.user.clone();

        self.transition(|s| s.with_session(session));
        self.notify(Notification::success(format!("Welcome back, {}!", snapshot.name)));
        Ok(snapshot)
    }

    pub fn logout(&mut self) -> Result<(), AppError> {
        self.sessions.clear()?;
        self.transition(AppState::signed_out);
        self.notify(Notification::success("Logged out"));
        Ok(())
    }

    pub fn update_profile(
        &mut self,
        name: Option<String>,
        medical_id: Option<Option<String>>,
    ) -> Result<UserSnapshot, AppError> {
        let user_id = self.current_user_id()?;
        if let Some(name) = &name {
            if name.trim().chars().count() < auth::validation::MIN_NAME_LENGTH {
                return Err(AuthError::from(auth::ValidationError::NameTooShort).into());
            }
        }

        let user = self.store.update_user(
            &user_id,
            UserUpdate {
                name,
                medical_id,
                ..Default::default()
            },
        )?;
        let snapshot = UserSnapshot::from(&user);
        self.transition(|s| s.with_user(snapshot.clone()));
        self.notify(Notification::success("Profile updated"));
        Ok(snapshot)
    }

    pub fn change_password(
        &mut self,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), AppError> {
        let user_id = self.current_user_id()?;
        auth::change_password(
            &self.store,
            &self.hasher,
            &user_id,
            current,
            new_password,
            confirm,
        )?;
        self.refresh_user(&user_id)?;
        self.notify(Notification::success("Password changed"));
        Ok(())
    }

    /// Remove the account and all its analyses, then log out
    pub fn delete_account(&mut self) -> Result<(), AppError> {
        let user_id = self.current_user_id()?;
        self.store.delete_user(&user_id)?;
        self.sessions.clear()?;
        self.transition(AppState::signed_out);
        self.notify(Notification::success("Account deleted"));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Analysis
    // ─────────────────────────────────────────────────────────────────────────

    pub fn select_file(&mut self, path: &Path) -> Result<&Upload, AppError> {
        let upload = Upload::from_path(path)?;
        tracing::info!("Selected {} ({} bytes)", upload.file_name, upload.size);
        self.transition(|s| s.with_file(upload));
        self.state.selected_file.as_ref().ok_or(AppError::NoFile)
    }

    /// Submit the selected file
    ///
    /// With `api.demo_fallback` on, a failed submission yields the fixed demo
    /// prediction tagged as demo, after an info notification. Otherwise the
    /// failure is returned.
    pub async fn analyze(&mut self) -> Result<AnalysisOutcome, AppError> {
        self.current_user()?;
        let upload = self.state.selected_file.clone().ok_or(AppError::NoFile)?;

        let started = Instant::now();
        let result = self.client.submit(&upload).await;
        let outcome = match result {
            Ok(prediction) => {
                AnalysisOutcome::live(prediction, &upload, started.elapsed().as_millis() as u64)
            }
            Err(e) if self.config.api.demo_fallback => {
                tracing::warn!("Prediction failed ({}), substituting demo result", e);
                self.notify(Notification::info(DEMO_NOTICE));
                tokio::time::sleep(Duration::from_millis(self.config.api.demo_delay_ms)).await;
                AnalysisOutcome::demo(
                    demo_prediction(),
                    &upload,
                    started.elapsed().as_millis() as u64,
                    e.to_string(),
                )
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!("Prediction service unavailable: {}", e);
                }
                return Err(e.into());
            }
        };

        self.transition(|s| s.with_outcome(outcome.clone()));
        Ok(outcome)
    }

    /// Persist the last outcome to the current user's history
    pub fn save_result(&mut self) -> Result<Analysis, AppError> {
        let user_id = self.current_user_id()?;
        let outcome = self.state.last_outcome.as_ref().ok_or(AppError::NoResult)?;

        let analysis = self.store.save_analysis(&user_id, outcome.to_new_analysis())?;
        self.refresh_user(&user_id)?;
        self.notify(Notification::success("Results saved to your profile!"));
        Ok(analysis)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History and statistics
    // ─────────────────────────────────────────────────────────────────────────

    /// The current user's analyses within `period`, oldest first
    pub fn history(&self, period: Period) -> Result<Vec<Analysis>, AppError> {
        let user_id = self.current_user_id()?;
        let analyses = self.store.user_analyses(&user_id)?;
        Ok(period.filter(&analyses, Utc::now()))
    }

    pub fn dashboard_stats(&self, period: Period) -> Result<DashboardStats, AppError> {
        Ok(DashboardStats::compute(&self.history(period)?, Utc::now()))
    }

    pub fn clear_history(&mut self) -> Result<usize, AppError> {
        let user_id = self.current_user_id()?;
        let removed = self.store.clear_user_analyses(&user_id)?;
        self.refresh_user(&user_id)?;
        self.notify(Notification::success(format!(
            "History cleared ({} analyses removed)",
            removed
        )));
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Exports
    // ─────────────────────────────────────────────────────────────────────────

    /// Report for a saved analysis, or for the unsaved last result
    pub fn report(&self, analysis_id: Option<&str>) -> Result<AnalysisReport, AppError> {
        match analysis_id {
            Some(id) => {
                let user = self.current_user()?;
                let analysis = self
                    .store
                    .find_analysis(&user.id, id)?
                    .ok_or_else(|| AppError::AnalysisNotFound(id.to_string()))?;
                Ok(AnalysisReport::from_analysis(user, &analysis))
            }
            None => {
                let outcome = self.state.last_outcome.as_ref().ok_or(AppError::NoResult)?;
                Ok(AnalysisReport::from_outcome(
                    self.state.current_user(),
                    outcome,
                ))
            }
        }
    }

    pub fn export_report(
        &mut self,
        analysis_id: Option<&str>,
        out: Option<&Path>,
    ) -> Result<PathBuf, AppError> {
        let report = self.report(analysis_id)?;
        let path = output_path(out, report::report_file_name(Utc::now().date_naive()));
        report::write_json(&path, &report)?;
        self.notify(Notification::success(format!(
            "Report saved to {}",
            path.display()
        )));
        Ok(path)
    }

    pub fn export_profile(&mut self, out: Option<&Path>) -> Result<PathBuf, AppError> {
        let user = self.current_user()?.clone();
        let analyses = self.store.user_analyses(&user.id)?;
        let now = Utc::now();
        let export = ProfileExport {
            exported_at: now,
            statistics: DashboardStats::compute(&analyses, now),
            user,
            analyses,
        };

        let path = output_path(out, report::profile_file_name(now.date_naive()));
        report::write_json(&path, &export)?;
        self.notify(Notification::success(format!(
            "Data exported to {}",
            path.display()
        )));
        Ok(path)
    }

    /// Write the history CSV; None (with an info notice) when it is empty
    pub fn export_history(
        &mut self,
        period: Period,
        out: Option<&Path>,
    ) -> Result<Option<PathBuf>, AppError> {
        let analyses = self.history(period)?;
        let Some(csv) = report::history_csv(&analyses) else {
            self.notify(Notification::info("No analyses to export"));
            return Ok(None);
        };

        let path = output_path(out, report::history_file_name(Utc::now().date_naive()));
        report::write_text(&path, &csv)?;
        self.notify(Notification::success(format!(
            "History exported to {}",
            path.display()
        )));
        Ok(Some(path))
    }
}

/// `out` as given, a directory joined with the default name, or the default
/// name in the working directory
fn output_path(out: Option<&Path>, default_name: String) -> PathBuf {
    match out {
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_name),
    }
}
