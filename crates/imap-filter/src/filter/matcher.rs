use glob::{MatchOptions, Pattern, PatternError};

/// Compiled set of shell-style globs matched case-insensitively.
#[derive(Debug, Clone)]
pub struct AddressMatcher {
    /// Patterns as written in the config, for display.
    sources: Vec<String>,
    compiled: Vec<Pattern>,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl AddressMatcher {
    /// Compiles `patterns`, failing on the first invalid glob.
    pub fn new(patterns: Vec<String>) -> Result<Self, (String, PatternError)> {
        let compiled = patterns
            .iter()
            .map(|p| Pattern::new(&shell_glob(&p.to_lowercase())).map_err(|e| (p.clone(), e)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            sources: patterns,
            compiled,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.sources
    }

    /// True when any address matches any pattern.
    ///
    /// An empty pattern list is an explicit "must be empty" constraint and
    /// matches only an empty address list.
    pub fn compare(&self, addresses: &[String]) -> bool {
        if self.compiled.is_empty() {
            return addresses.is_empty();
        }

        addresses.iter().any(|addr| {
            let addr = addr.to_lowercase();
            self.compiled
                .iter()
                .any(|pattern| pattern.matches_with(&addr, MATCH_OPTIONS))
        })
    }

    /// Matches a single free-text value such as a subject.
    pub fn compare_text(&self, text: &str) -> bool {
        if self.compiled.is_empty() {
            return text.is_empty();
        }
        self.compare(&[text.to_string()])
    }
}

/// Rewrites a shell glob into the dialect `glob::Pattern` accepts.
///
/// `glob` gives `**` path semantics and rejects an unterminated `[`. Here a
/// run of stars is a single `*`, and a `[` without a closing `]` is literal.
fn shell_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end + 1;
                }
                None => {
                    out.push_str("[[]");
                    i += 1;
                }
            },
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Index of the `]` closing the class opened at `start`.
///
/// A leading `!` negates, and a `]` right after the opener (or after `!`) is a
/// member rather than the terminator.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// Evaluates an optional predicate: an absent matcher places no constraint.
pub fn compare(matcher: Option<&AddressMatcher>, addresses: &[String]) -> bool {
    matcher.map_or(true, |m| m.compare(addresses))
}
