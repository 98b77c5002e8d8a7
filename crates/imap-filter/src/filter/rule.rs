use std::fmt;

use crate::email::MessageRecord;

use super::matcher::{compare, AddressMatcher};

pub const DEFAULT_FOLDER: &str = "INBOX";
pub const DEFAULT_QUERY: &str = "ALL";

/// The (folder, search query) pair a rule draws its candidates from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub folder: String,
    pub query: Vec<String>,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            folder: DEFAULT_FOLDER.to_string(),
            query: vec![DEFAULT_QUERY.to_string()],
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.folder, self.query.join(" "))
    }
}

/// What to do with the messages a rule matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleActions {
    pub move_to: Option<String>,
    pub star: bool,
    pub mark_important: bool,
}

impl RuleActions {
    pub fn is_empty(&self) -> bool {
        self.move_to.is_none() && !self.star && !self.mark_important
    }
}

/// One named filter rule.
///
/// A rule only decides match / no match; executing its actions is up to the
/// engine.
#[derive(Debug, Clone)]
pub struct FilterRule {
    pub name: String,
    pub from: Option<AddressMatcher>,
    pub to: Option<AddressMatcher>,
    pub cc: Option<AddressMatcher>,
    pub subject: Option<AddressMatcher>,
    pub scope: Scope,
    pub actions: RuleActions,
}

impl FilterRule {
    /// A rule with no predicates, default scope and no actions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: None,
            to: None,
            cc: None,
            subject: None,
            scope: Scope::default(),
            actions: RuleActions::default(),
        }
    }

    /// Checks every present predicate, stopping at the first failure.
    pub fn compare(&self, message: &MessageRecord) -> bool {
        compare(self.from.as_ref(), message.from())
            && compare(self.to.as_ref(), message.to())
            && compare(self.cc.as_ref(), message.cc())
            && self
                .subject
                .as_ref()
                .map_or(true, |m| m.compare_text(message.subject()))
    }

    pub fn actions(&self) -> &RuleActions {
        &self.actions
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

fn patterns_or_any(matcher: &Option<AddressMatcher>) -> String {
    match matcher {
        Some(m) => format!("{:?}", m.patterns()),
        None => "*".to_string(),
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "filter: {}", self.name)?;
        writeln!(f, "  folder: {}", self.scope.folder)?;
        writeln!(f, "  query: {:?}", self.scope.query)?;
        writeln!(f, "  from: {}", patterns_or_any(&self.from))?;
        writeln!(f, "  to: {}", patterns_or_any(&self.to))?;
        writeln!(f, "  cc: {}", patterns_or_any(&self.cc))?;
        writeln!(f, "  subject: {}", patterns_or_any(&self.subject))?;
        writeln!(f, "  move: {}", self.actions.move_to.as_deref().unwrap_or("-"))?;
        writeln!(f, "  star: {}", self.actions.star)?;
        write!(f, "  mark: {}", self.actions.mark_important)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str]) -> Option<AddressMatcher> {
        Some(AddressMatcher::new(patterns.iter().map(|p| p.to_string()).collect()).unwrap())
    }

    fn message(raw_headers: &str) -> MessageRecord {
        let raw = format!(
            "{}Date: Tue, 14 Jan 2025 18:30:00 +0000\r\n\r\n",
            raw_headers
        );
        MessageRecord::from_raw(1, raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_rule_without_predicates_matches_everything() {
        let rule = FilterRule::new("catch-all");
        assert!(rule.compare(&message("From: a@b.com\r\n")));
        assert!(rule.compare(&message("Subject: nothing else\r\n")));
    }

    #[test]
    fn test_predicates_are_anded() {
        let mut rule = FilterRule::new("boss-to-me");
        rule.from = matcher(&["boss@work.com"]);
        rule.to = matcher(&["me@work.com"]);

        assert!(rule.compare(&message("From: boss@work.com\r\nTo: me@work.com\r\n")));
        assert!(!rule.compare(&message("From: boss@work.com\r\nTo: other@work.com\r\n")));
        assert!(!rule.compare(&message("From: intern@work.com\r\nTo: me@work.com\r\n")));
    }

    #[test]
    fn test_empty_to_requires_no_recipients() {
        let mut rule = FilterRule::new("bcc-only");
        rule.to = matcher(&[]);

        assert!(rule.compare(&message("From: a@b.com\r\n")));
        assert!(!rule.compare(&message("From: a@b.com\r\nTo: me@work.com\r\n")));
    }

    #[test]
    fn test_cc_predicate() {
        let mut rule = FilterRule::new("cc-list");
        rule.cc = matcher(&["*@lists.example.org"]);

        assert!(rule.compare(&message("From: a@b.com\r\nCc: dev@lists.example.org\r\n")));
        assert!(!rule.compare(&message("From: a@b.com\r\n")));
    }

    #[test]
    fn test_subject_predicate() {
        let mut rule = FilterRule::new("invoices");
        rule.subject = matcher(&["*invoice*"]);

        assert!(rule.compare(&message("Subject: Your Invoice #42\r\n")));
        assert!(!rule.compare(&message("Subject: Lunch?\r\n")));
    }

    #[test]
    fn test_default_scope() {
        let rule = FilterRule::new("x");
        assert_eq!(rule.scope().folder, "INBOX");
        assert_eq!(rule.scope().query, vec!["ALL".to_string()]);
        assert!(rule.actions().is_empty());
    }

    #[test]
    fn test_display_summary() {
        let mut rule = FilterRule::new("spam");
        rule.from = matcher(&["*@spam.com"]);
        rule.actions.move_to = Some("Spam".to_string());

        let summary = rule.to_string();
        assert!(summary.starts_with("filter: spam"));
        assert!(summary.contains("from: [\"*@spam.com\"]"));
        assert!(summary.contains("to: *"));
        assert!(summary.contains("move: Spam"));
    }
}
