use std::io::{self, Write};

use crate::{classifier::Classification, config::OutputMode, reversion::TextHash};

/// Columns every row starts with, followed by the classifier columns.
pub const FIXED_COLUMNS: &[&str] = &[
    "title",
    "articleid",
    "revid",
    "date",
    "time",
    "anon",
    "editor",
    "editor_id",
    "minor",
    "text_size",
    "text_md5",
    "reversion",
    "additions_size",
    "deletions_size",
];

/// Everything that ends up in the output for one revision.
#[derive(Debug)]
pub struct RevisionRow<'a> {
    pub title: &'a [u8],
    pub article_id: &'a [u8],
    pub revision_id: &'a [u8],
    pub date: &'a [u8],
    pub time: &'a [u8],
    pub editor: &'a [u8],
    pub editor_id: &'a [u8],
    pub minor: bool,
    pub text_hash: TextHash,
    pub reverted_to: Option<&'a str>,
    pub additions_size: usize,
    pub deletions_size: usize,
    pub classification: &'a Classification,
    pub comment: &'a [u8],
    pub text: &'a [u8],
}

impl RevisionRow<'_> {
    /// Registered editors have a username, anonymous ones only an IP.
    pub fn is_anonymous(&self) -> bool {
        self.editor.is_empty()
    }
}

fn flag(value: bool) -> &'static [u8] {
    if value {
        b"TRUE"
    } else {
        b"FALSE"
    }
}

/// Writes the tab-separated output stream.
#[derive(Debug)]
pub struct RowWriter<W: Write> {
    out: W,
    mode: OutputMode,
    rows_written: u64,
}

impl<W: Write> RowWriter<W> {
    pub fn new(out: W, mode: OutputMode) -> Self {
        Self {
            out,
            mode,
            rows_written: 0,
        }
    }

    pub fn write_header(&mut self, classifier_columns: &[String]) -> io::Result<()> {
        let columns = FIXED_COLUMNS
            .iter()
            .copied()
            .chain(classifier_columns.iter().map(String::as_str));
        for (index, column) in columns.enumerate() {
            if index > 0 {
                self.out.write_all(b"\t")?;
            }
            self.out.write_all(column.as_bytes())?;
        }
        self.out.write_all(b"\n")
    }

    pub fn write_row(&mut self, row: &RevisionRow) -> io::Result<()> {
        let out = &mut self.out;

        for field in [row.title, row.article_id, row.revision_id, row.date, row.time] {
            out.write_all(field)?;
            out.write_all(b"\t")?;
        }
        out.write_all(flag(row.is_anonymous()))?;
        out.write_all(b"\t")?;
        out.write_all(row.editor)?;
        out.write_all(b"\t")?;
        out.write_all(row.editor_id)?;
        out.write_all(b"\t")?;
        out.write_all(flag(row.minor))?;
        write!(
            out,
            "\t{}\t{}\t{}\t{}\t{}",
            row.text.len(),
            row.text_hash,
            row.reverted_to.unwrap_or(""),
            row.additions_size,
            row.deletions_size
        )?;

        for &matched in &row.classification.content {
            out.write_all(b"\t")?;
            out.write_all(flag(matched))?;
        }
        for matched in &row.classification.diff {
            out.write_all(b"\t")?;
            out.write_all(flag(matched.added))?;
            out.write_all(b"\t")?;
            out.write_all(flag(matched.deleted))?;
        }
        out.write_all(b"\n")?;

        if self.mode == OutputMode::Full {
            out.write_all(b"comment:")?;
            out.write_all(row.comment)?;
            out.write_all(b"\ntext:")?;
            out.write_all(row.text)?;
            out.write_all(b"\n")?;
        }

        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
