// Dashboard state
//
// Holds the analyses of the selected period and every chart model derived
// from them. Key handling is pure: it updates selection and returns an
// `Action` for the event loop to run against the controller.

use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;

use super::components::toast::Toast;
use crate::charts::{
    ComparisonChart, DistributionChart, MonthlyChart, RiskGauge, TrendChart, WindowChart,
};
use crate::logging::LogBuffer;
use crate::notify::Notification;
use crate::stats::{insights, DashboardStats, Insight, Period};
use crate::store::{Analysis, UserSnapshot};

/// Work the event loop performs on behalf of a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Refresh,
    ExportHistory,
    ExportProfile,
    ExportReport(String),
    Quit,
}

pub struct Dashboard {
    pub period: Period,
    pub user: Option<UserSnapshot>,
    /// Analyses in the period, oldest first
    pub analyses: Vec<Analysis>,
    pub stats: DashboardStats,
    pub insights: Vec<Insight>,
    pub trend: Option<TrendChart>,
    pub gauge: Option<RiskGauge>,
    pub distribution: DistributionChart,
    pub windows: WindowChart,
    pub monthly: MonthlyChart,
    pub comparison: ComparisonChart,
    /// Row in the history table (newest first)
    pub selected: Option<usize>,
    pub show_detail: bool,
    pub toast: Option<Toast>,
    pub log_buffer: LogBuffer,
    pub should_quit: bool,
}

impl Dashboard {
    pub fn new(period: Period, log_buffer: LogBuffer) -> Self {
        let mut dashboard = Self {
            period,
            user: None,
            analyses: Vec::new(),
            stats: DashboardStats::compute(&[], Utc::now()),
            insights: Vec::new(),
            trend: None,
            gauge: None,
            distribution: DistributionChart::from_history(&[]),
            windows: WindowChart::from_history(&[]),
            monthly: MonthlyChart::from_history(&[]),
            comparison: ComparisonChart::from_history(&[]),
            selected: None,
            show_detail: false,
            toast: None,
            log_buffer,
            should_quit: false,
        };
        dashboard.load(None, Vec::new(), Utc::now());
        dashboard
    }

    /// Replace the data and rebuild every chart
    pub fn load(&mut self, user: Option<UserSnapshot>, analyses: Vec<Analysis>, now: DateTime<Utc>) {
        self.user = user;
        self.stats = DashboardStats::compute(&analyses, now);
        self.insights = insights(&analyses);
        self.trend = TrendChart::from_history(&analyses);
        self.gauge = RiskGauge::from_history(&analyses);
        self.distribution = DistributionChart::from_history(&analyses);
        self.windows = WindowChart::from_history(&analyses);
        self.monthly = MonthlyChart::from_history(&analyses);
        self.comparison = ComparisonChart::from_history(&analyses);
        self.analyses = analyses;

        self.selected = match self.selected {
            _ if self.analyses.is_empty() => None,
            Some(i) => Some(i.min(self.analyses.len() - 1)),
            None => Some(0),
        };
        if self.selected.is_none() {
            self.show_detail = false;
        }
    }

    /// Analysis under the table cursor
    pub fn selected_analysis(&self) -> Option<&Analysis> {
        self.selected
            .and_then(|row| self.analyses.iter().rev().nth(row))
    }

    /// Show the newest notification as a toast
    pub fn notify(&mut self, notifications: Vec<Notification>) {
        if let Some(last) = notifications.into_iter().last() {
            self.toast = Some(Toast::new(last));
        }
    }

    /// Drop an expired toast (called on each tick)
    pub fn tick(&mut self) {
        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }
    }

    fn select_period(&mut self, period: Period) -> Action {
        if period == self.period {
            return Action::None;
        }
        self.period = period;
        self.selected = None;
        Action::Refresh
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.analyses.len();
        if len == 0 {
            return;
        }
        let current = self.selected.unwrap_or(0);
        self.selected = Some(if down {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        });
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        if self.show_detail {
            match code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    self.show_detail = false;
                    return Action::None;
                }
                _ => {}
            }
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                Action::Quit
            }
            KeyCode::Char('1') => self.select_period(Period::Week),
            KeyCode::Char('2') => self.select_period(Period::Month),
            KeyCode::Char('3') => self.select_period(Period::All),
            KeyCode::Tab => self.select_period(self.period.next()),
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(true);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(false);
                Action::None
            }
            KeyCode::Enter => {
                self.show_detail = self.selected_analysis().is_some();
                Action::None
            }
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('e') => Action::ExportHistory,
            KeyCode::Char('p') => Action::ExportProfile,
            KeyCode::Char('x') => self
                .selected_analysis()
                .map(|a| Action::ExportReport(a.id.clone()))
                .unwrap_or(Action::None),
            _ => Action::None,
        }
    }
}
