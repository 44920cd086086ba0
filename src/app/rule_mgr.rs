// GachaSniff - app/rule_mgr.rs
//
// Manages loading of pattern rules from both built-in sources (embedded in
// the binary) and user-defined TOML files on disk.
// User rules override built-in rules with the same ID, keeping the built-in's
// priority slot; new user rules are appended after the built-ins.

use crate::core::model::{PatternRule, RuleSet};
use crate::core::rules;
use crate::util::constants;
use crate::util::error::RuleError;
use std::path::{Path, PathBuf};

/// Load all available rules: built-in first, then user-defined overrides.
///
/// Invalid user rules are logged and skipped (non-fatal).
///
/// Returns the merged rule set and any non-fatal errors encountered.
pub fn load_all_rules(user_rule_dir: Option<&Path>) -> (RuleSet, Vec<RuleError>) {
    let mut all = rules::load_builtin_rules();
    let mut errors = Vec::new();

    tracing::debug!(builtin_count = all.len(), "Loaded built-in rules");

    if let Some(dir) = user_rule_dir {
        if dir.is_dir() {
            let (user_rules, user_errors) = load_user_rules(dir);
            errors.extend(user_errors);
            merge_user_rules(&mut all, user_rules);
        } else {
            tracing::debug!(
                dir = %dir.display(),
                "User rule directory does not exist (skipping)"
            );
        }
    }

    if all.len() > constants::MAX_RULES {
        tracing::warn!(
            count = all.len(),
            max = constants::MAX_RULES,
            "Too many rules loaded, truncating"
        );
        errors.push(RuleError::TooManyRules {
            count: all.len(),
            max: constants::MAX_RULES,
        });
        all.truncate(constants::MAX_RULES);
    }

    tracing::debug!(total = all.len(), "Rule loading complete");

    (RuleSet::new(all), errors)
}

fn merge_user_rules(all: &mut Vec<PatternRule>, user_rules: Vec<PatternRule>) {
    for user_rule in user_rules {
        if let Some(pos) = all.iter().position(|r| r.id == user_rule.id) {
            tracing::info!(rule_id = %user_rule.id, "User rule overrides built-in");
            all[pos] = user_rule;
        } else {
            tracing::info!(rule_id = %user_rule.id, "Loaded user-defined rule");
            all.push(user_rule);
        }
    }
}

/// Load user-defined rules from a directory.
///
/// Files are visited in file-name order so the priority of appended rules is
/// stable across platforms.
fn load_user_rules(dir: &Path) -> (Vec<PatternRule>, Vec<RuleError>) {
    let mut loaded = Vec::new();
    let mut errors = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(RuleError::Io {
                path: dir.to_path_buf(),
                source: e,
            });
            return (loaded, errors);
        }
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry_result in entries {
        match entry_result {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => errors.push(RuleError::Io {
                path: dir.to_path_buf(),
                source: e,
            }),
        }
    }
    paths.sort();

    for path in paths {
        // Only process .toml files
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }

        match load_rule_file(&path) {
            Ok(rule) => loaded.push(rule),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping invalid rule file");
                errors.push(e);
            }
        }
    }

    (loaded, errors)
}

fn load_rule_file(path: &Path) -> Result<PatternRule, RuleError> {
    let io_err = |source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(io_err)?;
    if metadata.len() > constants::MAX_RULE_FILE_SIZE {
        return Err(RuleError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_RULE_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(io_err)?;
    rules::parse_rule_toml(&content, path).and_then(|def| rules::validate_and_compile(def, false))
}
