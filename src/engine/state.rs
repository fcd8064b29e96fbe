//! Published engine state and its derived display values.

use crate::{credentials::DEFAULT_WARNING_THRESHOLD_DAYS, tempo::Worklog};

use super::status::{self, DerivedStatus, StatusColor};

/// The single record observers read; only the engine writes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineState {
    /// Whole days since the latest worklog, from the most recent refresh.
    pub days_since_last_worklog: Option<i64>,
    /// Latest worklog, from the same refresh as the day count.
    pub latest_worklog: Option<Worklog>,
    /// True while one refresh is in flight.
    pub is_loading: bool,
    /// User-visible message of the last failed refresh.
    pub error_message: Option<String>,
    /// Whether the credential store holds a record.
    pub has_credentials: bool,
    /// Threshold read from the stored credentials.
    pub warning_threshold_days: u32,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            days_since_last_worklog: None,
            latest_worklog: None,
            is_loading: false,
            error_message: None,
            has_credentials: false,
            warning_threshold_days: DEFAULT_WARNING_THRESHOLD_DAYS,
        }
    }
}

impl EngineState {
    pub fn status(&self) -> DerivedStatus {
        DerivedStatus::classify(self.days_since_last_worklog, self.warning_threshold_days)
    }

    pub fn status_emoji(&self) -> &'static str {
        self.status().emoji()
    }

    pub fn color_bucket(&self) -> StatusColor {
        self.status().color()
    }

    pub fn status_bar_title(&self) -> String {
        status::status_bar_title(self.days_since_last_worklog, self.warning_threshold_days)
    }

    pub fn status_bar_tooltip(&self) -> String {
        status::status_bar_tooltip(self.days_since_last_worklog)
    }

    /// Reset display fields and the threshold; connection flags are untouched.
    pub(super) fn clear_display(&mut self) {
        self.days_since_last_worklog = None;
        self.latest_worklog = None;
        self.error_message = None;
        self.warning_threshold_days = DEFAULT_WARNING_THRESHOLD_DAYS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let s = EngineState::default();
        assert_eq!(s.warning_threshold_days, 7);
        assert!(!s.is_loading);
        assert!(!s.has_credentials);
        assert_eq!(s.status(), DerivedStatus::Unknown);
        assert_eq!(s.status_bar_title(), "⏱️");
        assert_eq!(s.status_emoji(), "");
    }

    #[test]
    fn test_accessors_follow_threshold() {
        let s = EngineState {
            days_since_last_worklog: Some(4),
            warning_threshold_days: 3,
            ..EngineState::default()
        };
        assert_eq!(s.status(), DerivedStatus::Warning);
        assert_eq!(s.color_bucket(), StatusColor::Orange);
        assert_eq!(s.status_bar_title(), "⏰ 4");
        assert_eq!(s.status_bar_tooltip(), "Last worklog: 4 days ago");
    }
}
