use serde::Deserialize;
use std::collections::BTreeMap;

use crate::email::Credentials;
use crate::error::ConfigError;
use crate::filter::FilterRule;
use crate::secrets::resolve_secret;

/// Config file as written on disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawConfig {
    #[serde(default)]
    pub imap_domain: Option<String>,
    #[serde(default)]
    pub imap_username: Option<String>,
    #[serde(default)]
    pub imap_password: Option<String>,
    #[serde(default)]
    pub imap_password_file: Option<String>,
    /// Each entry is a single-key mapping of rule name to rule body.
    #[serde(default)]
    pub filters: Vec<BTreeMap<String, Option<RuleSpec>>>,
}

/// A pattern field that may be written as one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Body of one rule entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(default)]
    pub from: Option<OneOrMany>,
    #[serde(default)]
    pub to: Option<OneOrMany>,
    #[serde(default)]
    pub cc: Option<OneOrMany>,
    #[serde(default)]
    pub subject: Option<OneOrMany>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub query: Option<OneOrMany>,
    #[serde(default, rename = "move")]
    pub move_to: Option<String>,
    #[serde(default)]
    pub star: bool,
    #[serde(default)]
    pub mark: bool,
}

/// Credential-related settings read from the config file.
///
/// Command-line flags and environment variables take precedence; see
/// [`CredentialSettings::resolve`].
#[derive(Debug, Clone, Default)]
pub struct CredentialSettings {
    pub imap_domain: Option<String>,
    pub imap_username: Option<String>,
    pub imap_password: Option<String>,
    pub imap_password_file: Option<String>,
}

impl CredentialSettings {
    /// Merges command-line values over the config file into [`Credentials`].
    ///
    /// The password comes from, in order: `password`, `imap-password`, then
    /// `imap-password-file`. Callers fold environment fallbacks into the
    /// arguments; nothing here reads the environment.
    pub fn resolve(
        &self,
        domain: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Credentials, ConfigError> {
        let domain = first_non_empty(domain, self.imap_domain.as_deref())
            .ok_or(ConfigError::MissingSetting("imap-domain"))?;
        let username = first_non_empty(username, self.imap_username.as_deref())
            .ok_or(ConfigError::MissingSetting("imap-username"))?;
        let password = resolve_secret(
            first_non_empty(password, self.imap_password.as_deref()),
            self.imap_password_file.as_deref(),
            None,
        )?;

        Ok(Credentials::new(domain, username, password))
    }
}

fn first_non_empty<'a>(primary: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    primary
        .filter(|s| !s.is_empty())
        .or(fallback.filter(|s| !s.is_empty()))
}

/// Validated configuration ready for the engine.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub filters: Vec<FilterRule>,
    pub credentials: CredentialSettings,
}
