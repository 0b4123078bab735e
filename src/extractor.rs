//! Parameter label extraction.
//!
//! Three sources feed the parameter list, merged in priority order with
//! duplicates removed: keyword rules, identifiers written explicitly in the
//! text, and the defaults declared for the chosen action label.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::rules::{ActionLabel, RuleTable};

/// Maximum number of parameter labels attached to one formatted step.
pub const MAX_INFO_PARAMS: usize = 3;

static QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["'`][^"'`]{2,}["'`]"#).expect("quoted identifier pattern is valid")
});

// ASCII word boundaries are checked by hand so identifiers glued to Hangul
// particles (`deviceId를`) are still picked up.
static BARE_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^A-Za-z0-9_])([A-Za-z][A-Za-z0-9]*(?:Id|ID|Token|Rule|Policy|Vector|Dataset|Snapshot)(?:[-_][A-Za-z0-9]+)*)",
    )
    .expect("bare identifier pattern is valid")
});

fn is_ascii_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Normalize a raw identifier to PascalCase.
///
/// Characters other than ASCII alphanumerics, whitespace, `-` and `_` are
/// dropped; the remaining words (split on whitespace, `-` and `_`) get their
/// first letter upper-cased and are concatenated. Returns `None` when
/// nothing survives.
pub fn to_pascal_identifier(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let joined: String = cleaned
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();

    (!joined.is_empty()).then_some(joined)
}

/// Identifiers written out in the text: quoted substrings first, then bare
/// tokens ending in a known identifier suffix.
pub fn explicit_identifiers(text: &str) -> Vec<String> {
    let quoted = QUOTED.find_iter(text).map(|m| {
        let raw = m.as_str();
        // delimiters are single-byte ASCII
        &raw[1..raw.len() - 1]
    });

    let bare = BARE_IDENTIFIER.captures_iter(text).filter_map(|caps| {
        let token = caps.get(1)?;
        let followed_by_word = text[token.end()..].chars().next().is_some_and(is_ascii_word);
        (!followed_by_word).then(|| token.as_str())
    });

    quoted
        .chain(bare)
        .filter_map(to_pascal_identifier)
        .collect()
}

/// Ordered, deduplicated parameter labels for `text`, at most
/// [`MAX_INFO_PARAMS`] of them.
pub fn extract_params(
    rules: &RuleTable,
    text: &str,
    action: ActionLabel,
    is_result: bool,
) -> Vec<String> {
    let mut labels: IndexSet<String> = rules.match_info(text).map(str::to_string).collect();
    labels.extend(explicit_identifiers(text));

    match rules.defaults_for(action) {
        Some(defaults) => labels.extend(defaults.iter().cloned()),
        None => {
            let fallback = if is_result { "ValidationResult" } else { "ServiceRequest" };
            labels.insert(fallback.to_string());
        }
    }

    labels.into_iter().take(MAX_INFO_PARAMS).collect()
}
