//! Canonical D2 sequence diagrams from use case flows.
//!
//! The pipeline is deterministic: a step's action text is classified by an
//! ordered rule table, its information parameters are extracted, and the
//! result is rendered as `N. Action:Param1,Param2` on a D2 message line.

pub mod app;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod diagram;
pub mod error_handler;
pub mod extractor;
pub mod formatter;
pub mod model;
pub mod participants;
pub mod requirements;
pub mod rules;
pub mod template_engine;

pub use diagram::{DiagramAssembler, SequenceDiagram};
pub use formatter::{FormattedStep, StepFormatter};
pub use model::{Step, UseCase};
pub use rules::{ActionLabel, RuleTable};
