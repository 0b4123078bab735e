use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "usecase-builder")]
#[command(about = "🧩 UseCase Builder - canonical sequence diagrams from use case flows")]
#[command(long_about = "UseCase Builder turns generated use case documents into canonical D2 sequence diagrams and normalized requirement lists.

QUICK START:
  usecase-builder diagram --file login.json                        # Print the D2 source
  usecase-builder format \"사용자가 로그인 페이지에서 인증을 시도한다\"   # Format one step
  usecase-builder rules --export rules.yml                         # Dump the built-in rule table

EXAMPLES:
  usecase-builder diagram --file login.json --format markdown --output login.md
  usecase-builder diagram --dir ./usecases --output ./diagrams --continue-on-error
  usecase-builder requirements --file drafts.json --use-case-id 42
  usecase-builder config --rules-path ./rules.yml")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Build the D2 sequence diagram of a use case")]
    #[command(long_about = "Build the D2 sequence diagram of one or more use case documents.

INPUT OPTIONS (choose one):
  <JSON>     Use case JSON given inline
  --file     Use case JSON file (markdown code fences are tolerated)
  --dir      Directory of use case JSON files, each processed on its own

OUTPUT OPTIONS:
  --format   d2 (diagram source), json (use case with d2Diagram filled), markdown (report)
  --template Report template used by markdown output
  --output   File to write; a directory when --dir is used

EXAMPLES:
  usecase-builder diagram --file login.json
  usecase-builder diagram --dir ./usecases --output ./out --format json --skip-invalid")]
    Diagram {
        #[arg(help = "Use case JSON given inline")]
        json: Option<String>,

        #[arg(short, long, help = "Use case JSON file")]
        file: Option<PathBuf>,

        #[arg(short, long, help = "Directory of use case JSON files")]
        dir: Option<PathBuf>,

        #[arg(short, long, help = "Save output to file (or directory with --dir)")]
        output: Option<PathBuf>,

        #[arg(long, help = "Output format", value_enum)]
        format: Option<OutputFormat>,

        #[arg(long, help = "Rule table YAML overriding the configured one")]
        rules: Option<PathBuf>,

        #[arg(long, help = "Report template for markdown output (built-in: usecase)")]
        template: Option<String>,

        #[arg(long, help = "Add custom branding to markdown reports")]
        branding: Option<String>,

        #[arg(long, help = "Continue processing on errors instead of stopping")]
        continue_on_error: bool,

        #[arg(long, help = "Skip invalid files during directory processing")]
        skip_invalid: bool,
    },

    #[command(about = "Format a single action or result phrase")]
    #[command(long_about = "Format one action or result phrase in the canonical `N. Action:Param1,Param2` notation.

EXAMPLES:
  usecase-builder format \"Gateway forwards the request\" --order 2
  usecase-builder format \"Backend returns the validation result\" --order 2 --result
  usecase-builder format \"\" --order 3 --context OrderService")]
    Format {
        #[arg(help = "Action or result text")]
        text: String,

        #[arg(long, default_value_t = 1, help = "Step order number")]
        order: u32,

        #[arg(long, help = "Treat the text as a step result")]
        result: bool,

        #[arg(long, help = "Fallback context (defaults to the configured one)")]
        context: Option<String>,

        #[arg(long, help = "Derive the fallback context from this use case title")]
        title: Option<String>,

        #[arg(long, help = "Rule table YAML overriding the configured one")]
        rules: Option<PathBuf>,
    },

    #[command(about = "List the participants of a use case flow")]
    Participants {
        #[arg(short, long, help = "Use case JSON file")]
        file: PathBuf,
    },

    #[command(about = "Normalize requirement drafts")]
    #[command(long_about = "Normalize requirement drafts returned by the generation backend.

Descriptions are rewritten to the prefix of their priority:
  high    It is required that ...
  medium  It is recommended that ...
  low     It optionally can ...

Drafts containing a banned word (default: shall, should, may) are rejected as a batch.

EXAMPLES:
  usecase-builder requirements --file drafts.json --use-case-id 42
  usecase-builder requirements --file drafts.json --attach login.json --output login.json")]
    Requirements {
        #[arg(short, long, help = "Requirement drafts JSON file")]
        file: PathBuf,

        #[arg(long, help = "Identifier of the owning use case")]
        use_case_id: Option<String>,

        #[arg(long, help = "Use case JSON file to append the requirements to")]
        attach: Option<PathBuf>,

        #[arg(short, long, help = "Save output to file")]
        output: Option<PathBuf>,
    },

    #[command(about = "Inspect, export or check rule tables")]
    #[command(long_about = "Inspect, export or check action/parameter rule tables.

EXAMPLES:
  usecase-builder rules                       # Summary of the active table
  usecase-builder rules --export rules.yml    # Write the built-in table as YAML
  usecase-builder rules --check rules.yml     # Compile a table and report problems")]
    Rules {
        #[arg(long, help = "Write the built-in rule table to this YAML file")]
        export: Option<PathBuf>,

        #[arg(long, help = "Compile and check a rule table YAML file")]
        check: Option<PathBuf>,
    },

    #[command(about = "Print the JSON schema use cases are generated against")]
    Schema {
        #[arg(short, long, help = "Save the schema to file")]
        output: Option<PathBuf>,
    },

    #[command(about = "Show and manage configuration")]
    #[command(long_about = "Show and manage the UseCase Builder configuration.

EXAMPLES:
  usecase-builder config --show
  usecase-builder config --rules-path ./rules.yml
  usecase-builder config --fallback-context OrderService
  usecase-builder config --template-dir ~/.usecase-builder/templates
  usecase-builder config --validate

CONFIGURATION FILE: ~/.usecase-builder/config.yml")]
    Config {
        #[arg(long, help = "Display current configuration values")]
        show: bool,

        #[arg(long, help = "Show config file location and content")]
        debug: bool,

        #[arg(long, help = "Set the rule table YAML file")]
        rules_path: Option<PathBuf>,

        #[arg(long, help = "Go back to the built-in rule table")]
        builtin_rules: bool,

        #[arg(long, help = "Set the default fallback context")]
        fallback_context: Option<String>,

        #[arg(long, help = "Set the directory of custom report templates")]
        template_dir: Option<PathBuf>,

        #[arg(long, help = "Validate all configuration settings")]
        validate: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    D2,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::D2 => "d2",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}
