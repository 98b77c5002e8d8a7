use std::collections::HashSet;
use std::path::Path;

use log::debug;

use crate::config::schema::{CredentialSettings, FilterConfig, OneOrMany, RawConfig, RuleSpec};
use crate::error::ConfigError;
use crate::filter::{AddressMatcher, FilterRule, RuleActions, Scope};

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FilterConfig, ConfigError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<FilterConfig, ConfigError> {
    // An empty document is valid YAML but deserializes to nothing at all
    let raw: RawConfig = if content.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_yaml::from_str(content)?
    };

    if raw.filters.is_empty() {
        return Err(ConfigError::NoFilters);
    }

    let mut names = HashSet::new();
    let mut filters = Vec::with_capacity(raw.filters.len());
    for entry in raw.filters {
        let (name, spec) = single_entry(entry)?;
        if !names.insert(name.clone()) {
            return Err(ConfigError::InvalidRule {
                name,
                reason: "Duplicate rule name".to_string(),
            });
        }
        let rule = build_rule(name, spec.unwrap_or_default())?;
        debug!("Loaded rule '{}' on {}", rule.name, rule.scope);
        filters.push(rule);
    }

    Ok(FilterConfig {
        filters,
        credentials: CredentialSettings {
            imap_domain: raw.imap_domain,
            imap_username: raw.imap_username,
            imap_password: raw.imap_password,
            imap_password_file: raw.imap_password_file,
        },
    })
}

fn single_entry<V>(
    entry: std::collections::BTreeMap<String, V>,
) -> Result<(String, V), ConfigError> {
    let keys: Vec<String> = entry.keys().cloned().collect();
    let mut entries = entry.into_iter();
    match (entries.next(), entries.next()) {
        (Some(pair), None) => Ok(pair),
        _ => Err(ConfigError::Validation {
            message: format!(
                "Each filter must be a single-key mapping of name to rule, found keys {:?}",
                keys
            ),
        }),
    }
}

fn build_rule(name: String, spec: RuleSpec) -> Result<FilterRule, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidRule {
        name: name.clone(),
        reason: reason.to_string(),
    };

    let folder = match spec.folder {
        Some(folder) if folder.trim().is_empty() => return Err(invalid("folder must not be empty")),
        Some(folder) => folder,
        None => Scope::default().folder,
    };

    let query = match spec.query.map(OneOrMany::into_vec) {
        Some(query) if query.is_empty() => {
            return Err(invalid("query must contain at least one search criterion"))
        }
        Some(query) => query,
        None => Scope::default().query,
    };

    if spec.move_to.as_deref().is_some_and(|m| m.trim().is_empty()) {
        return Err(invalid("move destination must not be empty"));
    }

    Ok(FilterRule {
        from: compile(&name, spec.from)?,
        to: compile(&name, spec.to)?,
        cc: compile(&name, spec.cc)?,
        subject: compile(&name, spec.subject)?,
        scope: Scope { folder, query },
        actions: RuleActions {
            move_to: spec.move_to,
            star: spec.star,
            mark_important: spec.mark,
        },
        name,
    })
}

fn compile(rule: &str, patterns: Option<OneOrMany>) -> Result<Option<AddressMatcher>, ConfigError> {
    patterns
        .map(|p| {
            AddressMatcher::new(p.into_vec()).map_err(|(pattern, e)| ConfigError::InvalidPattern {
                rule: rule.to_string(),
                pattern,
                reason: e.to_string(),
            })
        })
        .transpose()
}
