use anyhow::{anyhow, Result};
use handlebars::{
    no_escape, Context, Handlebars, Helper, HelperResult, Output, RenderContext,
};
use std::path::PathBuf;
use tokio::fs;

use crate::diagram::SequenceDiagram;
use crate::model::UseCase;

pub const USECASE_TEMPLATE: &str = "usecase";

/// Built-in templates as `(name, source)` pairs.
const BUILT_IN_TEMPLATES: &[(&str, &str)] = &[(USECASE_TEMPLATE, include_str!("../templates/usecase.hbs"))];

#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub branding: Option<String>,
    pub timestamp: String,
    pub version: String,
}

pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    template_dir: Option<PathBuf>,
}

fn format_date_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let format = h
        .param(0)
        .and_then(|v| v.value().as_str())
        .unwrap_or("%Y-%m-%d %H:%M:%S");
    out.write(&chrono::Local::now().format(format).to_string())?;
    Ok(())
}

fn uppercase_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let text = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&text.to_uppercase())?;
    Ok(())
}

fn pluralize_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let count = h.param(0).and_then(|v| v.value().as_u64()).unwrap_or(0);
    let singular = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");
    let plural = h
        .param(2)
        .and_then(|v| v.value().as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}s", singular));

    if count == 1 {
        out.write(singular)?;
    } else {
        out.write(&plural)?;
    }
    Ok(())
}

impl TemplateEngine {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(no_escape);

        handlebars.register_helper("format_date", Box::new(format_date_helper));
        handlebars.register_helper("uppercase", Box::new(uppercase_helper));
        handlebars.register_helper("pluralize", Box::new(pluralize_helper));

        for (name, content) in BUILT_IN_TEMPLATES {
            handlebars
                .register_template_string(name, content)
                .map_err(|e| anyhow!("Failed to register template '{}': {}", name, e))?;
        }

        Ok(Self {
            handlebars,
            template_dir: None,
        })
    }

    pub fn with_template_dir(template_dir: PathBuf) -> Result<Self> {
        let mut engine = Self::new()?;
        engine.template_dir = Some(template_dir);
        Ok(engine)
    }

    /// Register every `*.hbs` file of the template directory under its file stem.
    pub async fn load_custom_templates(&mut self) -> Result<usize> {
        let Some(template_dir) = self.template_dir.clone() else {
            return Ok(0);
        };
        if !template_dir.exists() {
            return Ok(0);
        }

        let mut loaded = 0;
        let mut entries = fs::read_dir(&template_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("hbs") {
                continue;
            }

            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| anyhow!("Invalid template filename: {}", path.display()))?
                .to_string();
            let content = fs::read_to_string(&path).await?;
            self.handlebars
                .register_template_string(&name, &content)
                .map_err(|e| anyhow!("Failed to register template '{}': {}", name, e))?;
            loaded += 1;
        }

        Ok(loaded)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    pub fn list_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlebars.get_templates().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create_context(&self, branding: Option<String>) -> TemplateContext {
        TemplateContext {
            branding,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Render a use case report. The use case is expected to carry its
    /// rendered diagram already.
    pub fn render_use_case(
        &self,
        template_name: &str,
        context: &TemplateContext,
        use_case: &UseCase,
        diagram: &SequenceDiagram,
    ) -> Result<String> {
        let data = serde_json::json!({
            "branding": context.branding,
            "timestamp": context.timestamp,
            "version": context.version,
            "use_case": use_case,
            "participants": diagram.participants,
            "participant_count": diagram.participants.len(),
            "message_count": diagram.messages.len(),
        });

        self.handlebars
            .render(template_name, &data)
            .map_err(|e| anyhow!("Failed to render template '{}': {}", template_name, e))
    }
}
