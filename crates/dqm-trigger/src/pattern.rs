//! Trigger path patterns.

use dqm_core::{Error, Result};
use regex::Regex;

/// A configured path entry: a name with optional `*` / `?` wildcards,
/// optionally negated with a leading `~`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    glob: String,
    re: Regex,
    negated: bool,
}

impl PathPattern {
    /// Parse one configured entry.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (negated, glob) = match trimmed.strip_prefix('~') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };
        if glob.is_empty() {
            return Err(Error::Config(format!("empty trigger path entry '{raw}'")));
        }
        if glob.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!("trigger path entry '{raw}' contains whitespace")));
        }
        let re = glob_regex(glob)
            .map_err(|e| Error::Config(format!("trigger path entry '{raw}': {e}")))?;
        Ok(Self { raw: trimmed.to_string(), glob: glob.to_string(), re, negated })
    }

    /// The entry as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True for `~`-prefixed entries.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// True if the pattern contains wildcards.
    pub fn is_wildcard(&self) -> bool {
        self.glob.contains(['*', '?'])
    }

    /// Does `name` match the pattern (ignoring negation)?
    pub fn matches(&self, name: &str) -> bool {
        self.re.is_match(name)
    }

    /// Menu entries matched by this pattern, in menu order.
    pub fn expand<'m>(&self, menu: &'m [String]) -> Vec<&'m str> {
        menu.iter().filter(|n| self.matches(n)).map(String::as_str).collect()
    }
}

/// Anchored regex for a `*` / `?` glob; everything else matches literally.
fn glob_regex(glob: &str) -> std::result::Result<Regex, regex::Error> {
    let mut re = String::with_capacity(glob.len() + 8);
    re.push_str("^(?s:");
    let mut buf = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    re.push_str(")$");
    Regex::new(&re)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Vec<String> {
        ["HLT_IsoMu24_v4", "HLT_IsoMu27_v5", "HLT_Mu50_v3", "HLT_PFMET120_PFMHT120_IDTight_v7"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn exact_and_wildcard() {
        let p = PathPattern::parse("HLT_Mu50_v3").unwrap();
        assert!(!p.is_wildcard());
        assert_eq!(p.expand(&menu()), vec!["HLT_Mu50_v3"]);

        let p = PathPattern::parse("HLT_IsoMu2?_v*").unwrap();
        assert!(p.is_wildcard());
        assert_eq!(p.expand(&menu()), vec!["HLT_IsoMu24_v4", "HLT_IsoMu27_v5"]);

        let p = PathPattern::parse("*PFMET*").unwrap();
        assert_eq!(p.expand(&menu()), vec!["HLT_PFMET120_PFMHT120_IDTight_v7"]);

        assert!(PathPattern::parse("HLT_Ele32_v*").unwrap().expand(&menu()).is_empty());
    }

    #[test]
    fn negation() {
        let p = PathPattern::parse(" ~HLT_Mu50_v* ").unwrap();
        assert!(p.is_negated());
        assert_eq!(p.as_str(), "~HLT_Mu50_v*");
        assert!(p.matches("HLT_Mu50_v3"));
    }

    #[test]
    fn malformed_entries() {
        assert!(PathPattern::parse("").is_err());
        assert!(PathPattern::parse("~").is_err());
        assert!(PathPattern::parse("HLT_A OR HLT_B").is_err());
    }

    #[test]
    fn glob_edge_cases() {
        let m = |pat: &str, name: &str| PathPattern::parse(pat).unwrap().matches(name);
        assert!(m("*", "HLT_Anything"));
        assert!(m("a*b*c", "aXXbYYc"));
        assert!(!m("a*b*c", "aXXbYY"));
        assert!(!m("abc", "abcd"));
        assert!(!m("bc", "abc"));
        assert!(m("a?c", "abc"));
        assert!(!m("a?c", "ac"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let p = PathPattern::parse("HLT_Mu8.5+(x)_v[1]").unwrap();
        assert!(!p.is_wildcard());
        assert!(p.matches("HLT_Mu8.5+(x)_v[1]"));
        assert!(!p.matches("HLT_Mu8X5+(x)_v[1]"));
        assert!(!p.matches("HLT_Mu8.55(x)_v1"));
    }
}
