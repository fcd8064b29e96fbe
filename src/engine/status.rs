//! Healthy / warning / stale classification derived from elapsed days.

/// Three-level status plus the no-data case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerivedStatus {
    /// At or under the threshold.
    Healthy,
    /// Exactly one day past the threshold.
    Warning,
    /// More than one day past the threshold.
    Stale,
    /// No day count known.
    Unknown,
}

/// Status bar tint, one per status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Orange,
    Red,
    Neutral,
}

/// Title shown when no day count is known.
pub const UNKNOWN_TITLE: &str = "⏱️";
/// Tooltip shown when no day count is known.
pub const UNKNOWN_TOOLTIP: &str = "No worklog data available";

impl DerivedStatus {
    /// Partition `days` at `threshold` and `threshold + 1`.
    pub fn classify(days: Option<i64>, threshold: u32) -> Self {
        let Some(days) = days else {
            return Self::Unknown;
        };
        let threshold = i64::from(threshold);
        if days <= threshold {
            Self::Healthy
        } else if days == threshold + 1 {
            Self::Warning
        } else {
            Self::Stale
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Healthy => "✅",
            Self::Warning => "⏰",
            Self::Stale => "🚨",
            Self::Unknown => "",
        }
    }

    pub fn color(self) -> StatusColor {
        match self {
            Self::Healthy => StatusColor::Green,
            Self::Warning => StatusColor::Orange,
            Self::Stale => StatusColor::Red,
            Self::Unknown => StatusColor::Neutral,
        }
    }
}

/// Status bar label: `"<emoji> <days>"`, or the unknown marker.
pub fn status_bar_title(days: Option<i64>, threshold: u32) -> String {
    match days {
        Some(d) => format!("{} {d}", DerivedStatus::classify(days, threshold).emoji()),
        None => UNKNOWN_TITLE.to_string(),
    }
}

/// Hover text for the status bar label.
pub fn status_bar_tooltip(days: Option<i64>) -> String {
    match days {
        Some(1) => "Last worklog: 1 day ago".to_string(),
        Some(d) => format!("Last worklog: {d} days ago"),
        None => UNKNOWN_TOOLTIP.to_string(),
    }
}
