//! Builder patterns for creating rules and raw messages programmatically.

#![allow(dead_code)]

use imap_filter::filter::{AddressMatcher, FilterRule};

fn matcher(patterns: &[&str]) -> AddressMatcher {
    AddressMatcher::new(patterns.iter().map(|p| p.to_string()).collect())
        .expect("test patterns should compile")
}

/// Builder for creating `FilterRule` instances.
pub struct RuleBuilder {
    rule: FilterRule,
}

impl RuleBuilder {
    /// A rule with no predicates, the default scope and no actions.
    pub fn new(name: &str) -> Self {
        Self {
            rule: FilterRule::new(name),
        }
    }

    pub fn from(mut self, patterns: &[&str]) -> Self {
        self.rule.from = Some(matcher(patterns));
        self
    }

    pub fn to(mut self, patterns: &[&str]) -> Self {
        self.rule.to = Some(matcher(patterns));
        self
    }

    pub fn cc(mut self, patterns: &[&str]) -> Self {
        self.rule.cc = Some(matcher(patterns));
        self
    }

    pub fn subject(mut self, patterns: &[&str]) -> Self {
        self.rule.subject = Some(matcher(patterns));
        self
    }

    pub fn folder(mut self, folder: &str) -> Self {
        self.rule.scope.folder = folder.to_string();
        self
    }

    pub fn query(mut self, query: &[&str]) -> Self {
        self.rule.scope.query = query.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn move_to(mut self, destination: &str) -> Self {
        self.rule.actions.move_to = Some(destination.to_string());
        self
    }

    pub fn star(mut self) -> Self {
        self.rule.actions.star = true;
        self
    }

    pub fn mark(mut self) -> Self {
        self.rule.actions.mark_important = true;
        self
    }

    pub fn build(self) -> FilterRule {
        self.rule
    }
}

/// Builder for raw RFC 5322 header blocks.
pub struct MessageBuilder {
    from: Vec<String>,
    to: Vec<String>,
    cc: Vec<String>,
    subject: Option<String>,
    date: Option<String>,
}

impl MessageBuilder {
    /// A message with a valid date and nothing else.
    pub fn new() -> Self {
        Self {
            from: vec![],
            to: vec![],
            cc: vec![],
            subject: None,
            date: Some("Mon, 15 Jan 2024 18:00:00 +0000".to_string()),
        }
    }

    pub fn from(mut self, address: &str) -> Self {
        self.from.push(address.to_string());
        self
    }

    pub fn to(mut self, address: &str) -> Self {
        self.to.push(address.to_string());
        self
    }

    pub fn cc(mut self, address: &str) -> Self {
        self.cc.push(address.to_string());
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    /// Leaves out the Date header entirely.
    pub fn without_date(mut self) -> Self {
        self.date = None;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut raw = String::new();
        if !self.from.is_empty() {
            raw.push_str(&format!("From: {}\r\n", self.from.join(", ")));
        }
        if !self.to.is_empty() {
            raw.push_str(&format!("To: {}\r\n", self.to.join(", ")));
        }
        if !self.cc.is_empty() {
            raw.push_str(&format!("Cc: {}\r\n", self.cc.join(", ")));
        }
        if let Some(subject) = self.subject {
            raw.push_str(&format!("Subject: {}\r\n", subject));
        }
        if let Some(date) = self.date {
            raw.push_str(&format!("Date: {}\r\n", date));
        }
        raw.push_str("Message-ID: <test@example.com>\r\n\r\n");
        raw.into_bytes()
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
