use indexmap::IndexSet;

use crate::model::Step;

/// Distinct actor and target names of a flow, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantSet {
    names: IndexSet<String>,
}

impl ParticipantSet {
    pub fn from_flow(flow: &[Step]) -> Self {
        let names = flow
            .iter()
            .flat_map(|step| [Some(step.actor.as_str()), step.target.as_deref()])
            .flatten()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// First participant other than `actor`, or `actor` itself when the flow
    /// has nobody else.
    pub fn fallback_target<'a>(&'a self, actor: &'a str) -> &'a str {
        let actor = actor.trim();
        self.iter().find(|name| *name != actor).unwrap_or(actor)
    }

    /// Explicit target of `step` if it has a non-blank one, else the
    /// fallback target for its actor.
    pub fn resolve_target<'a>(&'a self, step: &'a Step) -> &'a str {
        match step.target.as_deref().map(str::trim) {
            Some(target) if !target.is_empty() => target,
            _ => self.fallback_target(&step.actor),
        }
    }
}
