//! Requirement drafts returned by the generation backend, normalized to the
//! priority-specific wording and screened for banned modal verbs.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{extract_json_block, Priority, Requirement, RequirementType};

pub const DEFAULT_BANNED_WORDS: [&str; 3] = ["shall", "should", "may"];

const EMPTY_DESCRIPTION: &str = "the actor performs the required operation.";

static KNOWN_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(It is required that|It is recommended that|It optionally can)\s*")
        .expect("requirement prefix pattern is valid")
});

#[derive(Debug, Error)]
pub enum RequirementError {
    #[error("failed to parse requirement drafts: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{} requirement(s) use banned words ({words}): {}", .offending.len(), .offending.join(" | "))]
    BannedWords { words: String, offending: Vec<String> },
}

impl Priority {
    pub fn prefix(self) -> &'static str {
        match self {
            Priority::High => "It is required that ",
            Priority::Medium => "It is recommended that ",
            Priority::Low => "It optionally can ",
        }
    }
}

/// Rewrite a description to start with the prefix of its priority.
pub fn normalize_description(description: &str, priority: Priority) -> String {
    let stripped = KNOWN_PREFIX.replace(description.trim(), "");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let body = if cleaned.is_empty() { EMPTY_DESCRIPTION } else { cleaned.as_str() };
    format!("{}{}", priority.prefix(), body)
}

/// Whole-word, case-insensitive matcher for words a requirement must avoid.
#[derive(Debug, Clone)]
pub struct BannedWordFilter {
    words: Vec<String>,
    regex: Option<Regex>,
}

impl BannedWordFilter {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Result<Self, regex::Error> {
        let words: Vec<String> = words
            .iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        let regex = if words.is_empty() {
            None
        } else {
            let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
            Some(
                RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self { words, regex })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_banned(&self, description: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(description))
    }
}

impl Default for BannedWordFilter {
    fn default() -> Self {
        Self::new(&DEFAULT_BANNED_WORDS[..]).expect("default banned words are valid")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequirementDraft {
    #[serde(rename = "type")]
    pub kind: RequirementType,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
}

#[derive(Deserialize)]
struct DraftEnvelope {
    #[serde(default)]
    requirements: Vec<RequirementDraft>,
}

/// Parse `{"requirements": [...]}`, tolerating a markdown code fence.
pub fn parse_drafts(content: &str) -> Result<Vec<RequirementDraft>, RequirementError> {
    let envelope: DraftEnvelope = serde_json::from_str(extract_json_block(content))?;
    Ok(envelope.requirements)
}

/// Turn drafts into requirements of `use_case_id`.
///
/// The whole batch is rejected if any raw description contains a banned
/// word, so the caller can ask the backend to regenerate it.
pub fn finalize_requirements(
    use_case_id: &str,
    drafts: Vec<RequirementDraft>,
    filter: &BannedWordFilter,
) -> Result<Vec<Requirement>, RequirementError> {
    let offending: Vec<String> = drafts
        .iter()
        .filter(|d| filter.is_banned(&d.description))
        .map(|d| d.description.clone())
        .collect();
    if !offending.is_empty() {
        return Err(RequirementError::BannedWords {
            words: filter.words().join(", "),
            offending,
        });
    }

    debug!(count = drafts.len(), use_case_id, "finalizing requirements");
    Ok(drafts
        .into_iter()
        .map(|draft| Requirement {
            id: uuid::Uuid::new_v4().to_string(),
            use_case_id: use_case_id.to_string(),
            kind: draft.kind,
            description: normalize_description(&draft.description, draft.priority),
            priority: draft.priority,
            selected: false,
        })
        .collect())
}
