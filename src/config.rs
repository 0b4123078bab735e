use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::cli::OutputFormat;
use crate::formatter::DEFAULT_FALLBACK_CONTEXT;
use crate::requirements::{BannedWordFilter, DEFAULT_BANNED_WORDS};
use crate::rules::RuleTable;

pub const RULES_ENV_VAR: &str = "USECASE_BUILDER_RULES";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub diagram: DiagramConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub requirements: RequirementsConfig,
    /// Rule table named by `USECASE_BUILDER_RULES`; never written back.
    #[serde(skip)]
    rules_override: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramConfig {
    pub rules_path: Option<PathBuf>,
    #[serde(default = "default_fallback_context")]
    pub fallback_context: String,
}

fn default_fallback_context() -> String {
    DEFAULT_FALLBACK_CONTEXT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub default_format: OutputFormat,
    /// Directory of extra `*.hbs` report templates.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::D2,
            template_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementsConfig {
    pub banned_words: Vec<String>,
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        Self {
            banned_words: DEFAULT_BANNED_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            diagram: DiagramConfig {
                rules_path: None,
                fallback_context: default_fallback_context(),
            },
            output: OutputConfig::default(),
            requirements: RequirementsConfig::default(),
            rules_override: None,
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".usecase-builder").join("config.yml"))
    }

    /// Load the user config, writing the defaults on first use.
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path).await
        } else {
            let config = Config::default();
            config.save_to(&config_path).await?;
            Ok(config.with_env_overrides())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(self) -> Self {
        let path = std::env::var_os(RULES_ENV_VAR).map(PathBuf::from);
        self.with_rules_override(path)
    }

    pub fn with_rules_override(mut self, path: Option<PathBuf>) -> Self {
        self.rules_override = path;
        self
    }

    /// The rule table in effect: the configured one, else the override.
    pub fn active_rules_path(&self) -> Option<&Path> {
        self.diagram.rules_path.as_deref().or(self.rules_override.as_deref())
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;

        Ok(())
    }

    pub fn set_rules_path(&mut self, path: Option<PathBuf>) {
        self.diagram.rules_path = path;
    }

    pub fn set_template_dir(&mut self, dir: Option<PathBuf>) {
        self.output.template_dir = dir;
    }

    pub fn set_fallback_context(&mut self, context: String) {
        self.diagram.fallback_context = context;
    }

    /// The configured rule table, or the built-in one.
    pub fn rule_table(&self) -> Result<RuleTable> {
        match self.active_rules_path() {
            Some(path) => Ok(RuleTable::load(path)?),
            None => Ok(RuleTable::builtin().clone()),
        }
    }

    pub fn banned_word_filter(&self) -> Result<BannedWordFilter> {
        Ok(BannedWordFilter::new(self.requirements.banned_words.as_slice())?)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        match self.active_rules_path() {
            Some(path) if !path.exists() => {
                issues.push(format!("Rule table not found: {}", path.display()));
            }
            Some(path) => {
                if let Err(e) = RuleTable::load(path) {
                    issues.push(format!("Rule table {} is invalid: {}", path.display(), e));
                }
            }
            None => {}
        }

        if let Some(dir) = &self.output.template_dir {
            if !dir.is_dir() {
                warnings.push(format!("Template directory not found: {}", dir.display()));
            }
        }

        let context = &self.diagram.fallback_context;
        if context.is_empty() {
            issues.push("Fallback context must not be empty".to_string());
        } else if !context.chars().all(|c| c.is_ascii_alphanumeric()) {
            warnings.push(format!(
                "Fallback context '{}' contains characters other than ASCII letters and digits",
                context
            ));
        }

        if self.requirements.banned_words.is_empty() {
            warnings.push("No banned words configured, requirement wording is not screened".to_string());
        } else if let Err(e) = self.banned_word_filter() {
            issues.push(format!("Banned word list is invalid: {}", e));
        }

        ValidationResult {
            is_valid: issues.is_empty(),
            issues,
            warnings,
        }
    }
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}
