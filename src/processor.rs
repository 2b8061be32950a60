//! Turns the element events of a dump into output rows.
//!
//! [`RevisionProcessor`] owns the state machine and all accumulated data. Article scoped data
//! lives in an `ArticleContext` that is replaced as a whole when the next `<title>` opens, so
//! nothing about a previous article can leak into the next one.

use std::{
    collections::TryReserveError,
    io::{self, Write},
};

use tracing::instrument;

use crate::{
    buffer::FieldBuffer,
    classifier::Classifier,
    diff::{diff_revision, TokenSequence},
    dump_parser::DumpHandler,
    output::{RevisionRow, RowWriter},
    reversion::{ReversionTracker, TextHash},
    state::{Element, State, Tag, Transition},
    timestamp::{split_timestamp, TimestampParts, TIMESTAMP_LENGTH},
};

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("out of memory while growing the {field:?} field by {requested} bytes")]
    OutOfMemory {
        field: Element,
        requested: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error("revision {revision_id} has a malformed timestamp `{timestamp}`")]
    MalformedTimestamp {
        revision_id: String,
        timestamp: String,
    },
}

#[derive(Debug, Default)]
struct ArticleContext {
    title: FieldBuffer,
    article_id: FieldBuffer,
    reversions: ReversionTracker,
    /// Tokens of the last revision, `None` until the first revision has been processed.
    previous_tokens: Option<TokenSequence>,
}

#[derive(Debug, Default)]
struct RevisionFields {
    revision_id: FieldBuffer,
    timestamp: FieldBuffer,
    timestamp_parts: Option<TimestampParts>,
    editor: FieldBuffer,
    editor_id: FieldBuffer,
    minor: bool,
    comment: FieldBuffer,
    text: FieldBuffer,
}

impl RevisionFields {
    fn reset(&mut self) {
        self.revision_id.reset();
        self.timestamp.reset();
        self.timestamp_parts = None;
        self.editor.reset();
        self.editor_id.reset();
        self.minor = false;
        self.comment.reset();
        self.text.reset();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessingStats {
    /// Number of `<title>` elements encountered.
    pub articles: u64,
    /// Revisions that were finalized. Revisions of skipped articles never finalize and are not counted.
    pub revisions: u64,
    pub rows: u64,
}

pub struct RevisionProcessor<W: Write> {
    classifier: Classifier,
    writer: RowWriter<W>,
    state: State,
    article: ArticleContext,
    revision: RevisionFields,
    stats: ProcessingStats,
}

impl<W: Write> std::fmt::Debug for RevisionProcessor<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionProcessor")
            .field("state", &self.state)
            .field("article", &self.article)
            .field("revision", &self.revision)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<W: Write> RevisionProcessor<W> {
    /// Create a processor and write the header line.
    pub fn new(classifier: Classifier, mut writer: RowWriter<W>) -> Result<Self, ProcessingError> {
        writer.write_header(&classifier.column_names())?;

        Ok(Self {
            classifier,
            writer,
            state: State::default(),
            article: ArticleContext::default(),
            revision: RevisionFields {
                // revision texts are commonly a few hundred KiB
                text: FieldBuffer::with_capacity(1024 * 1024),
                ..RevisionFields::default()
            },
            stats: ProcessingStats::default(),
        })
    }

    pub fn stats(&self) -> ProcessingStats {
        ProcessingStats {
            rows: self.writer.rows_written(),
            ..self.stats
        }
    }

    /// Flush the output and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, ProcessingError> {
        self.writer.flush()?;

        let stats = self.stats();
        tracing::info!(
            message = "Finished processing",
            articles = stats.articles,
            revisions = stats.revisions,
            rows = stats.rows
        );
        Ok(self.writer.into_inner())
    }

    fn start_article(&mut self) {
        self.stats.articles += 1;
        self.article = ArticleContext::default();
        self.revision.reset();
    }

    fn finish_title(&mut self) {
        let title = self.article.title.as_bytes();
        tracing::debug!(title = %String::from_utf8_lossy(title), "Article started");

        if !self.classifier.title_passes(title) {
            tracing::debug!("Title rejected, skipping article");
            self.state.skip_article();
        }
    }

    fn finish_revision(&mut self) -> Result<(), ProcessingError> {
        self.stats.revisions += 1;
        let result = self.emit_revision();
        self.revision.reset();
        result
    }

    #[instrument(level = "trace", skip(self), fields(revision_id = %String::from_utf8_lossy(self.revision.revision_id.as_bytes())))]
    fn emit_revision(&mut self) -> Result<(), ProcessingError> {
        if !self.classifier.title_passes(self.article.title.as_bytes()) {
            return Ok(());
        }

        let revision = &self.revision;
        let revision_id = String::from_utf8_lossy(revision.revision_id.as_bytes());

        if revision.timestamp_parts.is_none() {
            let timestamp = String::from_utf8_lossy(revision.timestamp.as_bytes());
            if cfg!(feature = "strict") {
                return Err(ProcessingError::MalformedTimestamp {
                    revision_id: revision_id.into_owned(),
                    timestamp: timestamp.into_owned(),
                });
            }
            tracing::debug!(message = "Malformed timestamp, leaving date and time blank", timestamp = %timestamp);
        }

        let text = revision.text.as_bytes();
        let text_hash = TextHash::of(text);
        let reverted_to = self.article.reversions.record(text_hash, &revision_id);

        let tokens = TokenSequence::tokenize(text);
        let diff = diff_revision(self.article.previous_tokens.as_ref(), text, &tokens);
        self.article.previous_tokens = Some(tokens);

        let classification = self.classifier.classify(text, &diff);

        let parts = revision.timestamp_parts.as_ref();
        let row = RevisionRow {
            title: self.article.title.as_bytes(),
            article_id: self.article.article_id.as_bytes(),
            revision_id: revision.revision_id.as_bytes(),
            date: parts.map_or(&b""[..], TimestampParts::date),
            time: parts.map_or(&b""[..], TimestampParts::time),
            editor: revision.editor.as_bytes(),
            editor_id: revision.editor_id.as_bytes(),
            minor: revision.minor,
            text_hash,
            reverted_to: reverted_to.as_deref(),
            additions_size: diff.additions.len(),
            deletions_size: diff.deletions.len(),
            classification: &classification,
            comment: revision.comment.as_bytes(),
            text,
        };
        self.writer.write_row(&row)?;

        tracing::trace!(
            message = "Row written",
            md5 = %text_hash,
            reverted_to = reverted_to.as_deref(),
            additions = diff.additions.len(),
            deletions = diff.deletions.len()
        );
        Ok(())
    }
}

impl<W: Write> DumpHandler for RevisionProcessor<W> {
    fn start_element(&mut self, name: &[u8]) -> Result<(), ProcessingError> {
        let Some(tag) = Tag::from_name(name) else {
            return Ok(());
        };

        match self.state.open(tag) {
            Transition::StartArticle => self.start_article(),
            Transition::MarkMinor => self.revision.minor = true,
            _ => {}
        }
        Ok(())
    }

    fn end_element(&mut self, name: &[u8]) -> Result<(), ProcessingError> {
        match self.state.close(Tag::from_name(name)) {
            Transition::FinishTitle => self.finish_title(),
            Transition::FinishRevision => self.finish_revision()?,
            _ => {}
        }
        Ok(())
    }

    fn characters(&mut self, data: &[u8]) -> Result<(), ProcessingError> {
        let Some(element) = self.state.text_target() else {
            return Ok(());
        };

        let buffer = match element {
            Element::Title => &mut self.article.title,
            Element::ArticleId => &mut self.article.article_id,
            Element::RevisionId => &mut self.revision.revision_id,
            Element::Timestamp => &mut self.revision.timestamp,
            Element::Editor => &mut self.revision.editor,
            Element::EditorId => &mut self.revision.editor_id,
            Element::Comment => &mut self.revision.comment,
            Element::Text => &mut self.revision.text,
            // structural elements, their content is whitespace
            Element::Revision | Element::Contributor | Element::Minor | Element::Unused => {
                return Ok(())
            }
        };

        buffer
            .append(data)
            .map_err(|source| ProcessingError::OutOfMemory {
                field: element,
                requested: data.len(),
                source,
            })?;

        if element == Element::Timestamp && buffer.len() == TIMESTAMP_LENGTH {
            let parts = split_timestamp(buffer.as_bytes());
            self.revision.timestamp_parts = parts;
        }
        Ok(())
    }
}
