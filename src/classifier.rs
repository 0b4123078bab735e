use tracing::trace;

use crate::rules::{ActionLabel, RuleTable};

/// Map an action or result phrase to a canonical action label.
///
/// Rules are tried in declared order and the first match wins. Unmatched
/// text falls back to `ReturnValidationResult` for results and
/// `RouteServiceRequest` otherwise. Callers handle empty text themselves.
pub fn classify(rules: &RuleTable, text: &str, is_result: bool) -> ActionLabel {
    match rules.match_action(text) {
        Some(label) => label,
        None => {
            let fallback = ActionLabel::fallback(is_result);
            trace!(text, %fallback, "no action rule matched");
            fallback
        }
    }
}
