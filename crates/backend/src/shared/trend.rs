use contracts::shared::trend::Trend;

/// Period-over-period change ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeText {
    /// "+20.0%", "-3.5%" or "N/A"
    pub text: String,
    /// Percent change
    pub change: f64,
    pub trend: Trend,
}

/// Percent change of `current` against `previous`.
///
/// A zero `previous` reports "N/A" with a neutral trend instead of infinite growth.
pub fn change_text(current: f64, previous: f64) -> ChangeText {
    if previous == 0.0 {
        return ChangeText {
            text: "N/A".to_string(),
            change: 0.0,
            trend: Trend::Neutral,
        };
    }

    let change = (current - previous) / previous * 100.0;
    let sign = if change >= 0.0 { "+" } else { "" };
    ChangeText {
        text: format!("{}{:.1}%", sign, change),
        change,
        trend: Trend::from_change(change),
    }
}
