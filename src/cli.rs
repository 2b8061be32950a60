use std::{ffi::OsString, path::PathBuf};

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::config::{Config, OutputMode, RuleSpec};

/// Convert a MediaWiki revision-history dump into a tab-separated table with one line per revision.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "wikiq", version)]
pub struct CommandLine {
    /// Follow every line with the raw comment and text of the revision
    #[arg(short = 'v', long)]
    pub full: bool,
    /// Column name for the next content regex
    #[arg(short = 'n', long = "content-name", value_name = "NAME")]
    pub content_names: Vec<String>,
    /// Add a column that is TRUE if the regex matches the revision text
    #[arg(short = 'r', long = "content-regex", value_name = "REGEX")]
    pub content_regexes: Vec<String>,
    /// Column name for the next diff regex
    #[arg(short = 'N', long = "diff-name", value_name = "NAME")]
    pub diff_names: Vec<String>,
    /// Add two columns that are TRUE if the regex matches the added or removed text
    #[arg(short = 'R', long = "diff-regex", value_name = "REGEX")]
    pub diff_regexes: Vec<String>,
    /// Only write articles whose title matches one of these regexes
    #[arg(short = 't', long = "title-regex", value_name = "REGEX")]
    pub title_regexes: Vec<String>,
    /// Print the output mode and header, then exit without reading any input
    #[arg(short = 'd', long)]
    pub dry_run: bool,
    /// Dump to read, `.zst` files are decompressed. Reads standard input if omitted
    pub input: Option<PathBuf>,
}

impl CommandLine {
    /// Parse `args` (including the binary name) into the command line and the run configuration.
    pub fn try_parse_config<I, T>(args: I) -> Result<(Self, Config), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let command_line = Self::from_arg_matches(&matches)?;

        let config = Config {
            output_mode: if command_line.full {
                OutputMode::Full
            } else {
                OutputMode::Simple
            },
            content_rules: pair_rules(&matches, "content_names", "content_regexes"),
            diff_rules: pair_rules(&matches, "diff_names", "diff_regexes"),
            title_patterns: command_line.title_regexes.clone(),
        };
        Ok((command_line, config))
    }
}

fn indexed_values<'a>(matches: &'a ArgMatches, id: &str) -> Vec<(usize, &'a String)> {
    match (matches.indices_of(id), matches.get_many::<String>(id)) {
        (Some(indices), Some(values)) => indices.zip(values).collect(),
        _ => Vec::new(),
    }
}

// a name belongs to the next regex on the command line, the last one wins if several precede it
fn pair_rules(matches: &ArgMatches, names_id: &str, regexes_id: &str) -> Vec<RuleSpec> {
    let mut names = indexed_values(matches, names_id).into_iter().peekable();

    indexed_values(matches, regexes_id)
        .into_iter()
        .map(|(regex_index, pattern)| {
            let mut name = None;
            while let Some((_, candidate)) = names.next_if(|(index, _)| *index < regex_index) {
                name = Some(candidate.clone());
            }
            RuleSpec {
                name,
                pattern: pattern.clone(),
            }
        })
        .collect()
}
