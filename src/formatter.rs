use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::classifier::classify;
use crate::extractor::extract_params;
use crate::rules::{ActionLabel, RuleTable};

pub const MAX_ACTION_LENGTH: usize = 24;
pub const MAX_INFO_LENGTH: usize = 34;
pub const MAX_CONTEXT_LENGTH: usize = 20;
pub const DEFAULT_FALLBACK_CONTEXT: &str = "ServiceContext";

const ELLIPSIS: char = '…';

/// Collapse whitespace runs (newlines included) to single spaces and trim.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to `max` characters, ending in `…` when anything was cut.
pub fn clamp(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let head: String = value.chars().take(max.saturating_sub(1)).collect();
    format!("{}{}", head.trim_end(), ELLIPSIS)
}

/// Context string appended to every information hint: the ASCII
/// alphanumerics of the title, at most 20 of them.
pub fn fallback_context(title: &str, default: &str) -> String {
    let context: String = title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_CONTEXT_LENGTH)
        .collect();
    if context.is_empty() {
        default.to_string()
    } else {
        context
    }
}

/// One step rendered in `N. Action:Param1,Param2` notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedStep {
    pub order: u32,
    pub action: String,
    pub info: String,
}

impl fmt::Display for FormattedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}:{}", self.order, self.action, self.info)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StepFormatter<'r> {
    rules: &'r RuleTable,
}

impl<'r> StepFormatter<'r> {
    pub fn new(rules: &'r RuleTable) -> Self {
        Self { rules }
    }

    /// Format one action (or result, with `is_result`) of step `order`.
    ///
    /// Text with a colon is read as `ActionHint:InformationHint`; only the
    /// segment between the first and second colon feeds extraction. Empty
    /// text skips classification and emits the fallback action with the
    /// context as its only parameter.
    pub fn format(&self, text: &str, order: u32, is_result: bool, context: &str) -> FormattedStep {
        let normalized = normalize_text(text);

        if normalized.is_empty() {
            trace!(order, is_result, "empty step text, using fallback line");
            return FormattedStep {
                order,
                action: ActionLabel::fallback(is_result).to_string(),
                info: clamp(context, MAX_INFO_LENGTH),
            };
        }

        let (action_hint, info_hint) = match normalized.split_once(':') {
            Some((action, rest)) => (action, rest.split_once(':').map_or(rest, |(info, _)| info)),
            None => (normalized.as_str(), normalized.as_str()),
        };

        let label = classify(self.rules, action_hint, is_result);
        let params = extract_params(
            self.rules,
            &format!("{} {}", info_hint, context),
            label,
            is_result,
        );

        FormattedStep {
            order,
            action: clamp(label.as_str(), MAX_ACTION_LENGTH),
            info: clamp(&params.join(","), MAX_INFO_LENGTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_short_values() {
        assert_eq!(clamp("SessionToken", 34), "SessionToken");
    }

    #[test]
    fn clamp_trims_before_the_marker() {
        assert_eq!(clamp("abcd efgh", 6), "abcd…");
        assert_eq!(clamp("abcdefgh", 5).chars().count(), 5);
    }

    #[test]
    fn normalize_collapses_newlines() {
        assert_eq!(normalize_text("  a\r\n b\t\tc  "), "a b c");
    }

    #[test]
    fn context_uses_ascii_alphanumerics_only() {
        assert_eq!(fallback_context("주문 Order-Service v2", DEFAULT_FALLBACK_CONTEXT), "OrderServicev2");
        assert_eq!(fallback_context("주문 처리", DEFAULT_FALLBACK_CONTEXT), "ServiceContext");
        assert_eq!(
            fallback_context("A very long use case title indeed", DEFAULT_FALLBACK_CONTEXT),
            "Averylongusecasetitl"
        );
    }
}
