use std::fmt::Display;

use regex::bytes::Regex;

use crate::{
    config::{Config, RuleSpec},
    diff::TokenDiff,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Title,
    Content,
    Diff,
}

impl Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Title => write!(f, "title"),
            RuleKind::Content => write!(f, "content"),
            RuleKind::Diff => write!(f, "diff"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {kind} regex `{pattern}`")]
    InvalidRegex {
        kind: RuleKind,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

fn compile(kind: RuleKind, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
        kind,
        pattern: pattern.to_string(),
        source,
    })
}

#[derive(Debug, Clone)]
struct Rule {
    label: String,
    regex: Regex,
}

impl Rule {
    fn compile(kind: RuleKind, index: usize, spec: &RuleSpec) -> Result<Self, ConfigError> {
        let label = match (&spec.name, kind) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, RuleKind::Diff) => format!("regex_{index}"),
            _ => format!("regex{index}"),
        };

        Ok(Self {
            label,
            regex: compile(kind, &spec.pattern)?,
        })
    }

    // empty input never matches, even for patterns like `^$`
    fn matches(&self, haystack: &[u8]) -> bool {
        !haystack.is_empty() && self.regex.is_match(haystack)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffMatch {
    pub added: bool,
    pub deleted: bool,
}

/// Per-rule results for one revision, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub content: Vec<bool>,
    pub diff: Vec<DiffMatch>,
}

/// The compiled title, content and diff rules.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    title_rules: Vec<Regex>,
    content_rules: Vec<Rule>,
    diff_rules: Vec<Rule>,
}

impl Classifier {
    /// Compile every pattern in `config`. Fails on the first invalid one.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let title_rules = config
            .title_patterns
            .iter()
            .map(|pattern| compile(RuleKind::Title, pattern))
            .collect::<Result<_, _>>()?;
        let content_rules = config
            .content_rules
            .iter()
            .enumerate()
            .map(|(index, spec)| Rule::compile(RuleKind::Content, index, spec))
            .collect::<Result<_, _>>()?;
        let diff_rules = config
            .diff_rules
            .iter()
            .enumerate()
            .map(|(index, spec)| Rule::compile(RuleKind::Diff, index, spec))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            title_rules,
            content_rules,
            diff_rules,
        })
    }

    /// Whether revisions of an article with this title are emitted at all.
    pub fn title_passes(&self, title: &[u8]) -> bool {
        self.title_rules.is_empty() || self.title_rules.iter().any(|regex| regex.is_match(title))
    }

    pub fn classify(&self, text: &[u8], diff: &TokenDiff) -> Classification {
        Classification {
            content: self
                .content_rules
                .iter()
                .map(|rule| rule.matches(text))
                .collect(),
            diff: self
                .diff_rules
                .iter()
                .map(|rule| DiffMatch {
                    added: rule.matches(&diff.additions),
                    deleted: rule.matches(&diff.deletions),
                })
                .collect(),
        }
    }

    /// Names of the classifier columns: content rules, then an add/del pair per diff rule.
    pub fn column_names(&self) -> Vec<String> {
        let content = self.content_rules.iter().map(|rule| rule.label.clone());
        let diff = self
            .diff_rules
            .iter()
            .flat_map(|rule| [format!("{}_add", rule.label), format!("{}_del", rule.label)]);
        content.chain(diff).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(additions: &str, deletions: &str) -> TokenDiff {
        TokenDiff {
            additions: additions.as_bytes().to_vec(),
            deletions: deletions.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_title_gate() {
        let open = Classifier::new(&Config::default()).unwrap();
        assert!(open.title_passes(b"anything"));
        assert!(open.title_passes(b""));

        let gated = Classifier::new(&Config {
            title_patterns: vec!["^Talk:".into(), "Rust".into()],
            ..Config::default()
        })
        .unwrap();
        assert!(gated.title_passes(b"Talk:Main Page"));
        // partial match, not anchored
        assert!(gated.title_passes(b"The Rust language"));
        assert!(!gated.title_passes(b"Main Page"));
    }

    #[test]
    fn test_column_names() {
        let classifier = Classifier::new(&Config {
            content_rules: vec![
                RuleSpec::named("links", r"\[\["),
                RuleSpec::unnamed("foo"),
            ],
            diff_rules: vec![RuleSpec::unnamed("bar"), RuleSpec::named("vandal", "poop")],
            ..Config::default()
        })
        .unwrap();

        assert_eq!(
            classifier.column_names(),
            vec![
                "links",
                "regex1",
                "regex_0_add",
                "regex_0_del",
                "vandal_add",
                "vandal_del"
            ]
        );
    }

    #[test]
    fn test_classify() {
        let classifier = Classifier::new(&Config {
            content_rules: vec![RuleSpec::unnamed("cat"), RuleSpec::unnamed("dog")],
            diff_rules: vec![RuleSpec::unnamed("new"), RuleSpec::unnamed("old|gone")],
            ..Config::default()
        })
        .unwrap();

        let result = classifier.classify(b"the cat sat", &diff("brand new", "old stuff"));
        assert_eq!(result.content, vec![true, false]);
        assert_eq!(
            result.diff,
            vec![
                DiffMatch {
                    added: true,
                    deleted: false
                },
                DiffMatch {
                    added: false,
                    deleted: true
                }
            ]
        );
    }

    #[test]
    fn test_empty_inputs_never_match() {
        let classifier = Classifier::new(&Config {
            content_rules: vec![RuleSpec::unnamed("^$"), RuleSpec::unnamed(".*")],
            diff_rules: vec![RuleSpec::unnamed(".*")],
            ..Config::default()
        })
        .unwrap();

        let result = classifier.classify(b"", &diff("", ""));
        assert_eq!(result.content, vec![false, false]);
        assert_eq!(result.diff, vec![DiffMatch::default()]);
    }

    #[test]
    fn test_invalid_regex() {
        let error = Classifier::new(&Config {
            diff_rules: vec![RuleSpec::named("broken", "(unclosed")],
            ..Config::default()
        })
        .unwrap_err();

        let ConfigError::InvalidRegex { kind, pattern, .. } = error;
        assert_eq!(kind, RuleKind::Diff);
        assert_eq!(pattern, "(unclosed");
    }
}
