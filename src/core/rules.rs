// GachaSniff - core/rules.rs
//
// Pattern rule loading, validation, and compilation.
// Core layer: accepts TOML strings, never touches the filesystem.
// I/O is handled by app::rule_mgr which feeds content here.

use crate::core::model::PatternRule;
use crate::util::constants;
use crate::util::error::RuleError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw TOML rule definition as deserialized from a .toml file.
/// This is validated and compiled into a `PatternRule` for runtime use.
#[derive(Debug, Deserialize)]
pub struct RuleDefinition {
    pub rule: RuleMeta,
    pub matching: MatchingDef,
}

#[derive(Debug, Deserialize)]
pub struct RuleMeta {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MatchingDef {
    pub pattern: String,
}

// =============================================================================
// Rule validation and compilation
// =============================================================================

/// Parse a TOML string into a `RuleDefinition`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_rule_toml(toml_content: &str, source_path: &Path) -> Result<RuleDefinition, RuleError> {
    toml::from_str(toml_content).map_err(|e| RuleError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

/// Validate a `RuleDefinition` and compile it into a runtime `PatternRule`.
///
/// Validates that id, category, and pattern are non-empty and that the
/// pattern is a valid regex within the length limit.
pub fn validate_and_compile(def: RuleDefinition, is_builtin: bool) -> Result<PatternRule, RuleError> {
    let id = def.rule.id.trim().to_string();

    if id.is_empty() {
        return Err(RuleError::MissingField {
            rule_id: "(empty)".to_string(),
            field: "rule.id",
        });
    }
    if def.rule.category.trim().is_empty() {
        return Err(RuleError::MissingField {
            rule_id: id,
            field: "rule.category",
        });
    }
    if def.matching.pattern.is_empty() {
        return Err(RuleError::MissingField {
            rule_id: id,
            field: "matching.pattern",
        });
    }

    let pattern = compile_regex(&id, &def.matching.pattern)?;

    Ok(PatternRule {
        id,
        category: def.rule.category,
        description: def.rule.description,
        pattern,
        is_builtin,
    })
}

/// Compile a regex pattern with length validation to prevent ReDoS.
fn compile_regex(rule_id: &str, pattern: &str) -> Result<Regex, RuleError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(RuleError::RegexTooLong {
            rule_id: rule_id.to_string(),
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    Regex::new(pattern).map_err(|e| RuleError::InvalidRegex {
        rule_id: rule_id.to_string(),
        pattern: pattern.to_string(),
        source: e,
    })
}

// =============================================================================
// Built-in rules (embedded at compile time)
// =============================================================================

/// Embedded TOML content for built-in rules, in priority order.
/// Each tuple is (filename, TOML content).
pub fn builtin_rule_sources() -> Vec<(&'static str, &'static str)> {
    vec![
        ("genshin.toml", include_str!("../../rules/genshin.toml")),
        ("star_rail.toml", include_str!("../../rules/star_rail.toml")),
        ("zzz.toml", include_str!("../../rules/zzz.toml")),
    ]
}

/// Load and validate all built-in rules, preserving priority order.
///
/// Invalid rules are logged as errors and skipped (non-fatal).
pub fn load_builtin_rules() -> Vec<PatternRule> {
    let mut rules = Vec::new();

    for (filename, content) in builtin_rule_sources() {
        let path = Path::new("<builtin>").join(filename);
        match parse_rule_toml(content, &path).and_then(|def| validate_and_compile(def, true)) {
            Ok(rule) => {
                tracing::debug!(rule_id = %rule.id, "Loaded built-in rule");
                rules.push(rule);
            }
            Err(e) => {
                // Built-in rule failures are bugs, but we still degrade gracefully
                tracing::error!(file = filename, error = %e, "Failed to load built-in rule");
            }
        }
    }

    rules
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_RULE_TOML: &str = r#"
[rule]
id = "test-rule"
category = "Test Game"
description = "A test rule"

[matching]
pattern = 'https://example\.com/gacha/\S+'
"#;

    #[test]
    fn test_parse_valid_rule() {
        let def = parse_rule_toml(VALID_RULE_TOML, Path::new("test.toml")).unwrap();
        assert_eq!(def.rule.id, "test-rule");
        assert_eq!(def.rule.category, "Test Game");
    }

    #[test]
    fn test_compile_valid_rule() {
        let def = parse_rule_toml(VALID_RULE_TOML, Path::new("test.toml")).unwrap();
        let rule = validate_and_compile(def, false).unwrap();

        assert_eq!(rule.id, "test-rule");
        assert!(!rule.is_builtin);
        assert_eq!(
            rule.find("x https://example.com/gacha/abc?y=1 z"),
            Some("https://example.com/gacha/abc?y=1")
        );
    }

    #[test]
    fn test_missing_required_field() {
        let toml = r#"
[rule]
id = "no-category"
category = "  "

[matching]
pattern = "x"
"#;
        let def = parse_rule_toml(toml, Path::new("bad.toml")).unwrap();
        match validate_and_compile(def, false).unwrap_err() {
            RuleError::MissingField { field, .. } => assert_eq!(field, "rule.category"),
            other => panic!("Expected MissingField, got: {other:?}"),
        }
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let toml = r#"
[rule]
id = "no-matching"
category = "X"
"#;
        assert!(matches!(
            parse_rule_toml(toml, Path::new("bad.toml")),
            Err(RuleError::TomlParse { .. })
        ));
    }

    #[test]
    fn test_invalid_regex() {
        let toml = r#"
[rule]
id = "bad-regex"
category = "Bad"

[matching]
pattern = "[invalid"
"#;
        let def = parse_rule_toml(toml, Path::new("bad.toml")).unwrap();
        assert!(matches!(
            validate_and_compile(def, false).unwrap_err(),
            RuleError::InvalidRegex { .. }
        ));
    }

    #[test]
    fn test_regex_too_long() {
        let long_pattern = "a".repeat(constants::MAX_REGEX_PATTERN_LENGTH + 1);
        let toml = format!(
            r#"
[rule]
id = "long-regex"
category = "Long"

[matching]
pattern = '{long_pattern}'
"#
        );
        let def = parse_rule_toml(&toml, Path::new("long.toml")).unwrap();
        assert!(matches!(
            validate_and_compile(def, false).unwrap_err(),
            RuleError::RegexTooLong { .. }
        ));
    }

    #[test]
    fn test_load_builtin_rules_in_priority_order() {
        let rules = load_builtin_rules();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["genshin", "star-rail", "zzz"]);
        assert!(rules.iter().all(|r| r.is_builtin));

        let categories: Vec<&str> = rules.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["原神", "崩坏：星穹铁道", "绝区零"]);
    }

    #[test]
    fn test_builtin_patterns_are_case_sensitive() {
        let rules = load_builtin_rules();
        let genshin = &rules[0];
        assert!(genshin
            .find("HTTPS://WEBSTATIC.MIHOYO.COM/HK4E/EVENT/x")
            .is_none());
    }
}
