use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("failed to parse use case JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("use case `{title}` has an empty flow")]
    EmptyFlow { title: String },

    #[error("step at position {position} has order 0, orders must be positive")]
    ZeroOrder { position: usize },

    #[error("duplicate step order {order}")]
    DuplicateOrder { order: u32 },

    #[error("step {order} has no actor")]
    MissingActor { order: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub order: u32,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementType {
    Functional,
    NonFunctional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    pub use_case_id: String,
    #[serde(rename = "type")]
    pub kind: RequirementType,
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub selected: bool,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCase {
    #[serde(default = "new_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    pub flow: Vec<Step>,
    #[serde(default)]
    pub d2_diagram: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Strip a markdown code fence around a JSON payload, if present.
pub fn extract_json_block(response: &str) -> &str {
    if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
            .trim()
    } else if response.contains("```") {
        response
            .split("```")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
            .trim()
    } else {
        response.trim()
    }
}

impl UseCase {
    /// Parse a use case as returned by the generation backend.
    pub fn from_json(content: &str) -> Result<Self, UseCaseError> {
        Ok(serde_json::from_str(extract_json_block(content))?)
    }

    /// Structural checks on the flow. Step text is never rejected: empty
    /// actions are handled by the diagram fallbacks.
    pub fn validate(&self) -> Result<(), UseCaseError> {
        if self.flow.is_empty() {
            return Err(UseCaseError::EmptyFlow {
                title: self.title.clone(),
            });
        }

        let mut seen = HashSet::new();
        for (position, step) in self.flow.iter().enumerate() {
            if step.order == 0 {
                return Err(UseCaseError::ZeroOrder { position });
            }
            if !seen.insert(step.order) {
                return Err(UseCaseError::DuplicateOrder { order: step.order });
            }
            if step.actor.trim().is_empty() {
                return Err(UseCaseError::MissingActor { order: step.order });
            }
        }

        if self.flow.windows(2).any(|pair| pair[0].order > pair[1].order) {
            warn!(title = %self.title, "flow orders are not ascending, diagram keeps input order");
        }

        Ok(())
    }

    pub fn toggle_requirement(&mut self, requirement_id: &str) -> bool {
        match self.requirements.iter_mut().find(|r| r.id == requirement_id) {
            Some(requirement) => {
                requirement.selected = !requirement.selected;
                true
            }
            None => false,
        }
    }

    pub fn selected_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.selected)
    }
}

/// Strict JSON schema the generation backend is asked to follow.
pub fn use_case_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "description": { "type": "string" },
            "assumptions": {
                "type": "array",
                "items": { "type": "string" }
            },
            "actors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "description": { "type": "string" }
                    },
                    "required": ["name", "description"],
                    "additionalProperties": false
                }
            },
            "flow": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "order": { "type": "integer", "minimum": 1 },
                        "actor": { "type": "string" },
                        "target": { "type": "string" },
                        "action": { "type": "string" },
                        "result": { "type": ["string", "null"] }
                    },
                    "required": ["order", "actor", "target", "action", "result"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["title", "description", "assumptions", "actors", "flow"],
        "additionalProperties": false
    })
}
