//! Availability verdict for a calendar day cell.
//!
//! The reservation calendar paints each day cell with an inline background
//! color. We match on the RGB triple rather than the full declaration because
//! the page alternates between `rgb(...)` and `rgba(..., alpha)`.
//!
//! ```text
//! 49, 200, 25      green  → available
//! 247, 205, 212    pink   → sold out
//! aria-disabled    true   → disabled (outside booking window)
//! anything else           → not available, reason carries the raw style
//! ```
//!
//! Color checks run before the disabled flag: a green cell wins even if the
//! markup also marks it disabled.

const AVAILABLE_SIGNATURE: &str = "49, 200, 25";
const SOLD_OUT_SIGNATURE: &str = "247, 205, 212";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub available: bool,
    pub reason: String,
}

impl ClassificationResult {
    fn available(reason: impl Into<String>) -> Self {
        Self {
            available: true,
            reason: reason.into(),
        }
    }

    fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: reason.into(),
        }
    }
}

/// Classifies a day cell from its `style` and `aria-disabled` attributes.
///
/// Total over its inputs; the page markup is not ours and must never abort a run.
pub fn classify_day_style(style: Option<&str>, aria_disabled: Option<&str>) -> ClassificationResult {
    let raw_style = style.unwrap_or_default();
    let style_text = raw_style.to_lowercase();
    let is_disabled = aria_disabled
        .map(|flag| flag.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if style_text.contains(AVAILABLE_SIGNATURE) {
        return ClassificationResult::available("Calendar day color is green (available)");
    }
    if style_text.contains(SOLD_OUT_SIGNATURE) {
        return ClassificationResult::unavailable("Target day is sold out");
    }
    if is_disabled {
        return ClassificationResult::unavailable("Target day is disabled in calendar");
    }
    if !style_text.is_empty() {
        return ClassificationResult::unavailable(format!(
            "Unrecognized calendar style for target day: {}",
            raw_style
        ));
    }
    ClassificationResult::unavailable("Target day has no availability style")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_green_means_available() {
        let result = classify_day_style(
            Some("background-color: rgba(49, 200, 25, 0.2); color: rgb(0, 0, 0);"),
            Some("false"),
        );
        assert!(result.available);
        assert!(result.reason.to_lowercase().contains("available"));
    }

    #[test]
    fn test_green_wins_over_disabled_flag() {
        let result = classify_day_style(Some("background: RGB(49, 200, 25)"), Some("TRUE"));
        assert!(result.available);
    }

    #[test]
    fn test_pink_means_sold_out() {
        let result = classify_day_style(
            Some("background-color: rgb(247, 205, 212); color: rgb(0, 0, 0);"),
            Some("false"),
        );
        assert!(!result.available);
        assert!(result.reason.to_lowercase().contains("sold out"));
    }

    #[test]
    fn test_pink_wins_over_disabled_flag() {
        let result = classify_day_style(Some("background-color: rgb(247, 205, 212)"), Some("true"));
        assert!(!result.available);
        assert!(result.reason.contains("sold out"));
    }

    #[test]
    fn test_disabled_means_not_available() {
        let result = classify_day_style(None, Some("true"));
        assert!(!result.available);
        assert!(result.reason.to_lowercase().contains("disabled"));
    }

    #[test]
    fn test_disabled_flag_is_case_insensitive() {
        let result = classify_day_style(Some(""), Some("True"));
        assert!(result.reason.contains("disabled"));
    }

    #[test]
    fn test_unrecognized_style_keeps_raw_text() {
        let style = "background-color: rgb(1, 2, 3);";
        let result = classify_day_style(Some(style), Some("false"));
        assert!(!result.available);
        assert!(result.reason.contains("Unrecognized"));
        assert!(result.reason.contains(style));
    }

    #[test]
    fn test_no_signals_at_all() {
        let result = classify_day_style(None, None);
        assert!(!result.available);
        assert!(result.reason.contains("no availability style"));
    }

    #[test]
    fn test_whitespace_style_is_unrecognized() {
        let result = classify_day_style(Some("   "), None);
        assert!(!result.available);
        assert_eq!(result.reason, "Unrecognized calendar style for target day:    ");
    }

    #[test]
    fn test_padded_disabled_flag_is_not_disabled() {
        let result = classify_day_style(None, Some(" true"));
        assert!(!result.available);
        assert_eq!(result.reason, "Target day has no availability style");
    }
}
