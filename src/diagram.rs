//! D2 sequence diagram assembly.
//!
//! Output format:
//!
//! ```text
//! shape: sequence_diagram
//! "User" -> "Gateway": "1. AuthenticateEndpoint:EndpointCredential,SessionToken"
//! "Gateway" -> "User": "1. IssueSessionToken:SessionToken,SessionId"
//! ```
//!
//! Each step yields its action line and, when the step has a result, a
//! reverse line carrying the formatted result. Steps are emitted in input
//! order with their own `order` numbers.

use std::fmt;

use serde::Serialize;

use crate::formatter::{fallback_context, FormattedStep, StepFormatter, DEFAULT_FALLBACK_CONTEXT};
use crate::model::UseCase;
use crate::participants::ParticipantSet;
use crate::rules::RuleTable;

pub const D2_PREAMBLE: &str = "shape: sequence_diagram";

/// Escape a name or label for a double-quoted D2 string.
pub fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("\r\n", " ")
        .replace('\n', " ")
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Action,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub kind: MessageKind,
    pub label: FormattedStep,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" -> \"{}\": \"{}\"",
            escape_label(&self.from),
            escape_label(&self.to),
            escape_label(&self.label.to_string())
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceDiagram {
    pub participants: Vec<String>,
    pub messages: Vec<Message>,
}

impl SequenceDiagram {
    pub fn to_d2(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SequenceDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(D2_PREAMBLE)?;
        for message in &self.messages {
            write!(f, "\n{}", message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DiagramAssembler<'r> {
    formatter: StepFormatter<'r>,
    default_context: String,
}

impl<'r> DiagramAssembler<'r> {
    pub fn new(rules: &'r RuleTable) -> Self {
        Self {
            formatter: StepFormatter::new(rules),
            default_context: DEFAULT_FALLBACK_CONTEXT.to_string(),
        }
    }

    /// Context used when the title has no ASCII alphanumerics.
    pub fn with_default_context(mut self, context: impl Into<String>) -> Self {
        self.default_context = context.into();
        self
    }

    pub fn assemble(&self, use_case: &UseCase) -> SequenceDiagram {
        let participants = ParticipantSet::from_flow(&use_case.flow);
        let context = fallback_context(&use_case.title, &self.default_context);

        let mut messages = Vec::with_capacity(use_case.flow.len() * 2);
        for step in &use_case.flow {
            let actor = step.actor.trim();
            let target = participants.resolve_target(step);

            messages.push(Message {
                from: actor.to_string(),
                to: target.to_string(),
                kind: MessageKind::Action,
                label: self.formatter.format(&step.action, step.order, false, &context),
            });

            if let Some(result) = step.result.as_deref().filter(|r| !r.is_empty()) {
                messages.push(Message {
                    from: target.to_string(),
                    to: actor.to_string(),
                    kind: MessageKind::Result,
                    label: self.formatter.format(result, step.order, true, &context),
                });
            }
        }

        SequenceDiagram {
            participants: participants.to_vec(),
            messages,
        }
    }

    pub fn render(&self, use_case: &UseCase) -> String {
        self.assemble(use_case).to_d2()
    }

    /// Store the rendered diagram on the use case.
    pub fn attach(&self, use_case: &mut UseCase) {
        use_case.d2_diagram = self.render(use_case);
    }
}
