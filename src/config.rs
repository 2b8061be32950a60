//! Run configuration as plain data. Regexes are compiled later by [`crate::classifier::Classifier`].

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One tab-separated line per revision.
    #[default]
    Simple,
    /// Every line is followed by the raw comment and text of the revision.
    Full,
}

/// A regex with an optional column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub name: Option<String>,
    pub pattern: String,
}

impl RuleSpec {
    pub fn named(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            pattern: pattern.into(),
        }
    }

    pub fn unnamed(pattern: impl Into<String>) -> Self {
        Self {
            name: None,
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub output_mode: OutputMode,
    /// Matched against the full text of every revision, one column each.
    pub content_rules: Vec<RuleSpec>,
    /// Matched against the additions and the deletions of every revision, two columns each.
    pub diff_rules: Vec<RuleSpec>,
    /// If any are given, only articles whose title matches at least one of them are emitted.
    pub title_patterns: Vec<String>,
}
