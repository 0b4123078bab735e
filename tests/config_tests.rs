use std::path::PathBuf;

use usecase_builder::cli::OutputFormat;
use usecase_builder::config::*;
use usecase_builder::rules::RuleSpec;

#[tokio::test]
async fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.diagram.rules_path, None);
    assert_eq!(config.active_rules_path(), None);
    assert_eq!(config.diagram.fallback_context, "ServiceContext");
    assert_eq!(config.output.default_format, OutputFormat::D2);
    assert_eq!(config.requirements.banned_words, vec!["shall", "should", "may"]);
}

#[tokio::test]
async fn test_config_modification() {
    let mut config = Config::default();

    config.set_rules_path(Some(PathBuf::from("/tmp/rules.yml")));
    config.set_fallback_context("OrderService".to_string());

    assert_eq!(config.diagram.rules_path, Some(PathBuf::from("/tmp/rules.yml")));
    assert_eq!(config.diagram.fallback_context, "OrderService");
}

#[test]
fn test_config_path() {
    let path = Config::config_path().unwrap();
    assert!(path.to_string_lossy().contains(".usecase-builder"));
    assert!(path.to_string_lossy().contains("config.yml"));
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.yml");

    let mut config = Config::default();
    config.set_fallback_context("Billing".to_string());
    config.output.default_format = OutputFormat::Markdown;
    config.save_to(&path).await.unwrap();

    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded.diagram.fallback_context, "Billing");
    assert_eq!(loaded.output.default_format, OutputFormat::Markdown);
}

#[tokio::test]
async fn test_partial_file_gets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    tokio::fs::write(&path, "diagram:\n  rules_path: null\n").await.unwrap();

    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded.diagram.fallback_context, "ServiceContext");
    assert_eq!(loaded.requirements.banned_words.len(), 3);
}

#[test]
fn test_validate_reports_missing_rule_table() {
    let mut config = Config::default();
    config.set_rules_path(Some(PathBuf::from("/definitely/not/here/rules.yml")));

    let result = config.validate();
    assert!(!result.is_valid);
    assert!(result.issues[0].contains("Rule table not found"));
}

#[test]
fn test_validate_accepts_exported_rules() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.yml");
    std::fs::write(&path, RuleSpec::builtin().to_yaml().unwrap()).unwrap();

    let mut config = Config::default();
    config.set_rules_path(Some(path));
    let result = config.validate();
    assert!(result.is_valid, "{:?}", result.issues);
    assert_eq!(config.rule_table().unwrap().action_rule_count(), 20);
}

#[test]
fn test_validate_flags_context_and_banned_words() {
    let mut config = Config::default();
    config.set_rules_path(None);
    config.set_fallback_context(String::new());
    config.requirements.banned_words.clear();

    let result = config.validate();
    assert!(!result.is_valid);
    assert!(result.issues.iter().any(|i| i.contains("Fallback context")));
    assert!(result.warnings.iter().any(|w| w.contains("No banned words")));

    config.set_fallback_context("주문".to_string());
    let result = config.validate();
    assert!(result.is_valid);
    assert!(result.warnings.iter().any(|w| w.contains("ASCII")));
}

#[tokio::test]
async fn test_rules_override_is_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    let override_path = dir.path().join("override-rules.yml");

    let config = Config::default().with_rules_override(Some(override_path.clone()));
    assert_eq!(config.active_rules_path(), Some(override_path.as_path()));
    config.save_to(&path).await.unwrap();

    let saved = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(!saved.contains("override-rules.yml"), "{saved}");

    let reloaded = Config::load_from(&path).await.unwrap().with_rules_override(None);
    assert_eq!(reloaded.diagram.rules_path, None);
    assert_eq!(reloaded.active_rules_path(), None);
}

#[test]
fn test_configured_rules_beat_override() {
    let mut config = Config::default().with_rules_override(Some(PathBuf::from("/tmp/override.yml")));
    config.set_rules_path(Some(PathBuf::from("/tmp/configured.yml")));
    assert_eq!(config.active_rules_path(), Some(PathBuf::from("/tmp/configured.yml").as_path()));

    config.set_rules_path(None);
    assert_eq!(config.active_rules_path(), Some(PathBuf::from("/tmp/override.yml").as_path()));

    let result = config.validate();
    assert!(result.issues.iter().any(|i| i.contains("/tmp/override.yml")));
}

#[tokio::test]
async fn test_env_rules_applied_on_load_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    let rules = dir.path().join("env-rules.yml");
    std::fs::write(&rules, RuleSpec::builtin().to_yaml().unwrap()).unwrap();
    Config::default().save_to(&path).await.unwrap();

    std::env::set_var(RULES_ENV_VAR, &rules);
    let loaded = Config::load_from(&path).await;
    std::env::remove_var(RULES_ENV_VAR);
    let loaded = loaded.unwrap();

    assert_eq!(loaded.active_rules_path(), Some(rules.as_path()));
    assert_eq!(loaded.rule_table().unwrap().action_rule_count(), 20);

    // Saving while the variable was set leaves the file untouched
    loaded.save_to(&path).await.unwrap();
    let after_unset = Config::load_from(&path).await.unwrap();
    assert_eq!(after_unset.diagram.rules_path, None);
    assert_eq!(after_unset.active_rules_path(), None);
}
