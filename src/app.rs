use anyhow::{anyhow, Context as _, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cli::{Commands, OutputFormat};
use crate::config::Config;
use crate::diagram::{DiagramAssembler, SequenceDiagram};
use crate::error_handler::{ErrorHandler, ProcessingError};
use crate::formatter::{fallback_context, StepFormatter};
use crate::model::{use_case_schema, UseCase, UseCaseError};
use crate::participants::ParticipantSet;
use crate::requirements::{finalize_requirements, parse_drafts};
use crate::rules::{RuleSpec, RuleTable};
use crate::template_engine::{TemplateEngine, USECASE_TEMPLATE};

pub struct App {
    pub config: Config,
    rules: RuleTable,
    templates: TemplateEngine,
}

/// A parsed and validated use case with its diagram attached.
#[derive(Debug, Clone)]
pub struct ProcessedUseCase {
    pub use_case: UseCase,
    pub diagram: SequenceDiagram,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().await?;
        let mut app = Self::with_config(config)?;
        app.load_custom_templates().await?;
        Ok(app)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let rules = config.rule_table()?;
        let templates = TemplateEngine::new()?;
        debug!(
            action_rules = rules.action_rule_count(),
            info_rules = rules.info_rule_count(),
            "rule table ready"
        );

        Ok(Self { config, rules, templates })
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Register the templates of the configured template directory.
    pub async fn load_custom_templates(&mut self) -> Result<()> {
        if let Some(dir) = self.config.output.template_dir.clone() {
            let mut templates = TemplateEngine::with_template_dir(dir)?;
            let loaded = templates.load_custom_templates().await?;
            debug!(loaded, "custom templates registered");
            self.templates = templates;
        }
        Ok(())
    }

    fn resolve_rules(&self, path: Option<PathBuf>) -> Result<Cow<'_, RuleTable>> {
        match path {
            Some(path) => {
                info!(path = %path.display(), "using rule table override");
                Ok(Cow::Owned(RuleTable::load(&path)?))
            }
            None => Ok(Cow::Borrowed(&self.rules)),
        }
    }

    /// Parse, validate and diagram one use case document.
    pub fn process_use_case(&self, content: &str, rules: &RuleTable) -> Result<ProcessedUseCase, UseCaseError> {
        let mut use_case = UseCase::from_json(content)?;
        use_case.validate()?;

        let assembler = DiagramAssembler::new(rules).with_default_context(self.config.diagram.fallback_context.clone());
        let diagram = assembler.assemble(&use_case);
        use_case.d2_diagram = diagram.to_d2();

        Ok(ProcessedUseCase { use_case, diagram })
    }

    pub fn render_output(
        &self,
        processed: &ProcessedUseCase,
        format: OutputFormat,
        template: Option<&str>,
        branding: Option<String>,
    ) -> Result<String> {
        match format {
            OutputFormat::D2 => Ok(processed.diagram.to_d2()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&processed.use_case)?),
            OutputFormat::Markdown => {
                let template = template.unwrap_or(USECASE_TEMPLATE);
                if !self.templates.has_template(template) {
                    return Err(anyhow!(
                        "Template '{}' not found. Available: {}",
                        template,
                        self.templates.list_templates().join(", ")
                    ));
                }
                let context = self.templates.create_context(branding);
                self.templates
                    .render_use_case(template, &context, &processed.use_case, &processed.diagram)
            }
        }
    }

    pub async fn run_command(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Diagram {
                json,
                file,
                dir,
                output,
                format,
                rules,
                template,
                branding,
                continue_on_error,
                skip_invalid,
            } => {
                let format = format.unwrap_or(self.config.output.default_format);
                let rules = self.resolve_rules(rules)?;

                if let Some(dir_path) = dir {
                    let mut handler = ErrorHandler::new(continue_on_error, skip_invalid);
                    return self
                        .process_directory_batch(
                            &dir_path,
                            output,
                            format,
                            &rules,
                            template.as_deref(),
                            branding,
                            &mut handler,
                        )
                        .await;
                }

                let content = self.get_input_text(json, file).await?;
                eprintln!("🧩 Building sequence diagram...");
                let processed = self.process_use_case(&content, &rules)?;
                eprintln!(
                    "✅ {} participants, {} messages",
                    processed.diagram.participants.len(),
                    processed.diagram.messages.len()
                );

                let rendered = self.render_output(&processed, format, template.as_deref(), branding)?;
                self.emit(&rendered, output.as_deref(), "Diagram").await?;
            }

            Commands::Format {
                text,
                order,
                result,
                context,
                title,
                rules,
            } => {
                let rules = self.resolve_rules(rules)?;
                let default_context = &self.config.diagram.fallback_context;
                let context = match (title, context) {
                    (Some(title), _) => fallback_context(&title, default_context),
                    (None, Some(context)) => context,
                    (None, None) => default_context.clone(),
                };

                let step = StepFormatter::new(&rules).format(&text, order, result, &context);
                println!("{}", step);
            }

            Commands::Participants { file } => {
                let content = self.read_file(&file).await?;
                let use_case = UseCase::from_json(&content)?;
                let participants = ParticipantSet::from_flow(&use_case.flow);

                println!("👥 Participants of '{}' ({}):", use_case.title, participants.len());
                for (index, name) in participants.iter().enumerate() {
                    println!("  {}. {}", index + 1, name);
                }
            }

            Commands::Requirements {
                file,
                use_case_id,
                attach,
                output,
            } => {
                let content = self.read_file(&file).await?;
                let drafts = parse_drafts(&content)?;
                let filter = self.config.banned_word_filter()?;
                eprintln!("📋 Normalizing {} requirement drafts...", drafts.len());

                let rendered = match attach {
                    Some(use_case_path) => {
                        let mut use_case = UseCase::from_json(&self.read_file(&use_case_path).await?)?;
                        let id = use_case_id.unwrap_or_else(|| use_case.id.clone());
                        let requirements = finalize_requirements(&id, drafts, &filter)?;
                        use_case.requirements.extend(requirements);
                        serde_json::to_string_pretty(&use_case)?
                    }
                    None => {
                        let id = use_case_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                        let requirements = finalize_requirements(&id, drafts, &filter)?;
                        serde_json::to_string_pretty(&requirements)?
                    }
                };

                eprintln!("✅ Requirements normalized");
                self.emit(&rendered, output.as_deref(), "Requirements").await?;
            }

            Commands::Rules { export, check } => {
                if let Some(path) = &export {
                    let yaml = RuleSpec::builtin().to_yaml()?;
                    write_file(path, &yaml).await?;
                    println!("📁 Built-in rule table exported: {}", path.display());
                }

                if let Some(path) = &check {
                    println!("🔍 Checking rule table {}...", path.display());
                    match RuleTable::load(path) {
                        Ok(table) => {
                            println!("✅ Rule table is valid!");
                            print_rule_counts(&table);
                        }
                        Err(e) => {
                            println!("❌ Rule table is invalid: {}", e);
                            return Err(e.into());
                        }
                    }
                }

                if export.is_none() && check.is_none() {
                    match self.config.active_rules_path() {
                        Some(path) => println!("📐 Active rule table: {}", path.display()),
                        None => println!("📐 Active rule table: built-in"),
                    }
                    print_rule_counts(&self.rules);
                }
            }

            Commands::Schema { output } => {
                let schema = serde_json::to_string_pretty(&use_case_schema())?;
                self.emit(&schema, output.as_deref(), "Schema").await?;
            }

            Commands::Config {
                show,
                debug,
                rules_path,
                builtin_rules,
                fallback_context,
                template_dir,
                validate,
            } => {
                if debug {
                    let config_path = Config::config_path()?;
                    println!("Configuration file path: {:?}", config_path);
                    println!("Config file exists: {}", config_path.exists());
                    if config_path.exists() {
                        match fs::read_to_string(&config_path).await {
                            Ok(content) => {
                                println!("Config file size: {} bytes", content.len());
                                println!("Config file content:");
                                println!("{}", content);
                            }
                            Err(e) => println!("Error reading config file: {}", e),
                        }
                    }
                    return Ok(());
                }

                if show {
                    self.show_config_status();
                    return Ok(());
                }

                if validate {
                    println!("🔍 Validating configuration...");
                    let validation = self.config.validate();
                    if validation.is_valid {
                        println!("✅ Configuration is valid!");
                    } else {
                        println!("❌ Configuration issues found:");
                        for issue in &validation.issues {
                            println!("   • {}", issue);
                        }
                    }
                    if !validation.warnings.is_empty() {
                        println!("⚠️  Warnings:");
                        for warning in &validation.warnings {
                            println!("   • {}", warning);
                        }
                    }
                    return Ok(());
                }

                let mut updated = false;
                if let Some(path) = rules_path {
                    // Refuse a table that would break every later command
                    RuleTable::load(&path).with_context(|| format!("Rule table {} rejected", path.display()))?;
                    self.config.set_rules_path(Some(path));
                    updated = true;
                } else if builtin_rules {
                    self.config.set_rules_path(None);
                    updated = true;
                }

                if let Some(context) = fallback_context {
                    self.config.set_fallback_context(context);
                    updated = true;
                }

                if let Some(dir) = template_dir {
                    self.config.set_template_dir(Some(dir));
                    updated = true;
                }

                if updated {
                    self.config.save().await?;
                    self.rules = self.config.rule_table()?;
                    self.load_custom_templates().await?;
                    println!("✅ Configuration updated successfully!");
                } else {
                    println!("🔧 No configuration changes specified. Use --help for options.");
                }
            }
        }

        Ok(())
    }

    async fn get_input_text(&self, json: Option<String>, file: Option<PathBuf>) -> Result<String> {
        if let Some(json) = json {
            return Ok(json);
        }

        if let Some(file_path) = file {
            return self.read_file(&file_path).await;
        }

        Err(anyhow!("No input provided. Pass use case JSON, --file or --dir"))
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(anyhow!("File does not exist: {:?}", path));
        }

        eprintln!("📖 Reading use case from: {}", path.display());
        let content = fs::read_to_string(path).await?;
        debug!(bytes = content.len(), "loaded input file");
        Ok(content)
    }

    async fn emit(&self, content: &str, output: Option<&Path>, what: &str) -> Result<()> {
        match output {
            Some(path) => {
                write_file(path, content).await?;
                let absolute_path = fs::canonicalize(path).await.unwrap_or_else(|_| path.to_path_buf());
                println!("📁 {} saved: {}", what, absolute_path.display());
            }
            None => println!("{}", content),
        }
        Ok(())
    }

    /// Diagram every `*.json` file under `dir_path` on its own.
    async fn process_directory_batch(
        &self,
        dir_path: &Path,
        output: Option<PathBuf>,
        format: OutputFormat,
        rules: &RuleTable,
        template: Option<&str>,
        branding: Option<String>,
        handler: &mut ErrorHandler,
    ) -> Result<()> {
        if !dir_path.is_dir() {
            return Err(anyhow!("Directory does not exist: {:?}", dir_path));
        }

        eprintln!("📁 Scanning directory for use case files: {}", dir_path.display());
        let mut files: Vec<PathBuf> = WalkDir::new(dir_path)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(anyhow!("No use case files (.json) found in directory"));
        }
        eprintln!("📊 Found {} use case files to process individually", files.len());

        if let Some(out_dir) = &output {
            fs::create_dir_all(out_dir).await?;
        }

        let mut processed_count = 0;
        for file_path in files {
            eprintln!("\n🔍 Processing: {}", file_path.display());

            let outcome = self
                .process_batch_file(&file_path, output.as_deref(), format, rules, template, branding.clone())
                .await;
            match outcome {
                Ok(()) => processed_count += 1,
                Err(error) => {
                    if !handler.handle_error(error) {
                        handler.print_summary();
                        return Err(anyhow!("Stopped at {}", file_path.display()));
                    }
                }
            }
        }

        handler.print_summary();
        eprintln!("\n🎉 Processed {} use case files", processed_count);
        Ok(())
    }

    async fn process_batch_file(
        &self,
        file_path: &Path,
        output_dir: Option<&Path>,
        format: OutputFormat,
        rules: &RuleTable,
        template: Option<&str>,
        branding: Option<String>,
    ) -> Result<(), ProcessingError> {
        let content = fs::read_to_string(file_path)
            .await
            .map_err(|_| ProcessingError::file_not_found(file_path.to_path_buf()))?;

        let processed = self.process_use_case(&content, rules).map_err(|e| match e {
            UseCaseError::Parse(_) => ProcessingError::unreadable_format(file_path.to_path_buf(), e.to_string()),
            other => ProcessingError::invalid_use_case(file_path.to_path_buf(), other.to_string()),
        })?;

        let rendered = self
            .render_output(&processed, format, template, branding)
            .map_err(|e| ProcessingError::output_error(file_path.to_path_buf(), e.to_string()))?;

        match output_dir {
            Some(dir) => {
                let stem = file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("usecase");
                let target = dir.join(format!("{}.{}", stem, format.extension()));
                write_file(&target, &rendered)
                    .await
                    .map_err(|e| ProcessingError::output_error(target.clone(), e.to_string()))?;
                eprintln!("  📁 Saved: {}", target.display());
            }
            None => {
                println!("=== {} ===", processed.use_case.title);
                println!("{}", rendered);
            }
        }

        Ok(())
    }

    fn show_config_status(&self) {
        println!("🔧 Current UseCase Builder Configuration");
        println!("=======================================");

        match self.config.active_rules_path() {
            Some(path) => println!("📐 Rule table: {}", path.display()),
            None => println!("📐 Rule table: built-in"),
        }
        println!("🏷️  Fallback context: {}", self.config.diagram.fallback_context);
        println!("📄 Default output format: {:?}", self.config.output.default_format);
        match &self.config.output.template_dir {
            Some(dir) => println!("🎨 Template directory: {}", dir.display()),
            None => println!("🎨 Template directory: not set"),
        }
        println!("🎨 Templates: {}", self.templates.list_templates().join(", "));
        println!("🚫 Banned words: {}", self.config.requirements.banned_words.join(", "));

        println!("\n📝 Rule Table:");
        println!("  • Action rules: {}", self.rules.action_rule_count());
        println!("  • Information rules: {}", self.rules.info_rule_count());
        println!("  • Default parameter sets: {}", self.rules.default_count());
    }
}

fn print_rule_counts(table: &RuleTable) {
    println!("  • Action rules: {}", table.action_rule_count());
    println!("  • Information rules: {}", table.info_rule_count());
    println!("  • Default parameter sets: {}", table.default_count());
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
