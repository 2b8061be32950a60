// SPDX-License-Identifier: MPL-2.0
//! # wikiq
//!
//! A streaming converter from MediaWiki revision-history XML dumps to flat, tab-separated revision tables.
//!
//! ## Overview
//!
//! `wikiq` reads a dump (every article with its full list of revisions, each revision with its complete text) and writes one line per revision. Besides the metadata of the revision, every line carries a few derived signals:
//!
//! - **Text hash**: the MD5 digest of the revision text.
//! - **Reversion**: if the text is byte-identical to an earlier revision of the same article, the id of the most recent such revision.
//! - **Token diff**: the size of the text added and removed compared to the previous revision of the same article, on the level of whitespace-separated tokens.
//! - **Regex flags**: user supplied regular expressions matched against the full text and, separately, against the added and removed text.
//!
//! Title regexes act as a filter: if any are given, only articles with a matching title are written.
//!
//! The input is never held in memory as a whole. Memory usage is bounded by the history of one article (its reversion table and the tokens of its last revision) plus the text of the current revision, so even multi-terabyte dumps can be streamed through.
//!
//! ## Getting Started
//!
//! ### Command Line
//!
//! ```text
//! wikiq [-v] [-n NAME] [-r REGEX]... [-N NAME] [-R REGEX]... [-t REGEX]... [-d] [INPUT]
//! ```
//!
//! The dump is read from `INPUT` (decompressed on the fly if it ends in `.zst`) or from standard input, the table is written to standard output.
//!
//! - `-v`: full output, every line is followed by a `comment:` and a `text:` line with the raw comment and text.
//! - `-r REGEX`: add a content column, `TRUE` if the regex matches somewhere in the revision text.
//! - `-R REGEX`: add two diff columns, `TRUE` if the regex matches the added (`_add`) or removed (`_del`) text.
//! - `-n NAME` / `-N NAME`: the column name for the next `-r` / `-R`. Unnamed columns are numbered.
//! - `-t REGEX`: only write revisions of articles whose title matches (any of the) title regexes.
//! - `-d`: only print the header that would be written and exit.
//!
//! Diagnostics go to standard error, their verbosity is controlled with the `RUST_LOG` environment variable.
//!
//! ### Library Usage
//!
//! ```rust
//! use wikiq::config::{Config, RuleSpec};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dump = r#"<mediawiki><page><title>Main Page</title><id>1</id>
//!         <revision><id>10</id><timestamp>2003-11-07T00:43:23Z</timestamp>
//!         <contributor><ip>127.0.0.1</ip></contributor><text>[[Link]] text</text></revision>
//!     </page></mediawiki>"#;
//!
//!     let config = Config {
//!         content_rules: vec![RuleSpec::named("links", r"\[\[")],
//!         ..Config::default()
//!     };
//!
//!     let mut output = Vec::new();
//!     let stats = wikiq::convert(dump.as_bytes(), &mut output, &config)?;
//!     assert_eq!(stats.rows, 1);
//!
//!     let table = String::from_utf8(output)?;
//!     assert!(table.lines().nth(1).unwrap().ends_with("\tTRUE"));
//!     Ok(())
//! }
//! ```
//!
//! ## Output Format
//!
//! The first line is a header. It is written before any input is read, so even an empty or invalid dump produces one. The fixed columns are
//!
//! `title`, `articleid`, `revid`, `date`, `time`, `anon`, `editor`, `editor_id`, `minor`, `text_size`, `text_md5`, `reversion`, `additions_size`, `deletions_size`
//!
//! followed by one column per content regex and two columns per diff regex. Booleans are written as `TRUE`/`FALSE`. Anonymous editors have an empty `editor` and their IP address as `editor_id`.
//!
//! ## Modules and API
//!
//! - [`dump_parser`]: the streaming XML driver. Pushes element and character data events into a [`dump_parser::DumpHandler`].
//! - [`processor`]: the handler that routes character data into the fields of the current revision and turns finished revisions into rows.
//! - [`state`]: the block × element state machine deciding which field character data belongs to.
//! - [`diff`], [`reversion`], [`classifier`]: the derived signals.
//! - [`output`]: the row format.
//!
//! ## Features and Configuration
//!
//! ### Logging and Error Handling
//!
//! - Uses the `tracing` crate for logging. Run summaries are logged at the `info` level, per-article and per-row details at `debug` and `trace`.
//! - Malformed XML aborts the run with the line the problem was detected on.
//! - Revisions with a malformed timestamp get an empty date and time. Enable the `strict` feature to abort instead.
//!
//! ```toml
//! [dependencies]
//! wikiq = { version = "0.1.0", features = ["strict"] }
//! ```
//!
//! ## Limitations
//!
//! - Regexes use the syntax of the `regex` crate. Backreferences and lookaround are not supported.
//! - Only a fixed set of element names is interpreted. Unknown elements are skipped together with their text.
//!
//! ## Licensing
//!
//! This project is licensed under the Mozilla Public License 2.0.

use std::io::{Read, Write};

pub mod buffer;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod diff;
pub mod dump_parser;
pub mod output;
pub mod processor;
pub mod reversion;
pub mod state;
#[cfg(test)]
mod test_support;
pub mod timestamp;

use classifier::{Classifier, ConfigError};
use config::{Config, OutputMode};
use dump_parser::{DumpParser, ParsingError};
use output::RowWriter;
use processor::{ProcessingError, ProcessingStats, RevisionProcessor};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

/// Convert a complete dump read from `input` into rows written to `output`.
///
/// The regexes in `config` are compiled before anything is read or written. The header is
/// written next, then one row per revision as the dump is streamed.
pub fn convert<R: Read, W: Write>(
    input: R,
    output: W,
    config: &Config,
) -> Result<ProcessingStats, Error> {
    let classifier = Classifier::new(config)?;
    convert_with(input, output, classifier, config.output_mode)
}

/// Like [`convert`], with rules that have already been compiled.
pub fn convert_with<R: Read, W: Write>(
    input: R,
    output: W,
    classifier: Classifier,
    output_mode: OutputMode,
) -> Result<ProcessingStats, Error> {
    let mut processor = RevisionProcessor::new(classifier, RowWriter::new(output, output_mode))?;

    DumpParser::new(input).run(&mut processor)?;

    let stats = processor.stats();
    processor.finish()?;
    Ok(stats)
}
