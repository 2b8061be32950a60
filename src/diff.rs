use std::ops::Range;

use imara_diff::{intern::Interner, Algorithm};

// space, tab, newline and carriage return separate tokens
fn is_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

/// The whitespace-separated tokens of a revision text.
///
/// Stores a copy of the text and the token spans instead of one allocation per token, since an
/// article keeps the sequence of its previous revision around until the next one arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence {
    text: Vec<u8>,
    spans: Vec<Range<usize>>,
}

impl TokenSequence {
    pub fn tokenize(text: &[u8]) -> Self {
        let mut spans = Vec::new();
        let mut token_start = None;

        for (pos, &byte) in text.iter().enumerate() {
            if is_separator(byte) {
                if let Some(start) = token_start.take() {
                    spans.push(start..pos);
                }
            } else if token_start.is_none() {
                token_start = Some(pos);
            }
        }
        if let Some(start) = token_start {
            spans.push(start..text.len());
        }

        Self {
            text: text.to_vec(),
            spans,
        }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.spans.get(index).map(|span| &self.text[span.clone()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.spans.iter().map(move |span| &self.text[span.clone()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTag {
    Equal,
    Insert,
    Delete,
}

/// Minimal edit script turning `old` into `new`.
///
/// The number of `Equal` entries is the length of a longest common subsequence of both sides.
///
/// Within a changed hunk the inserted tokens come before the deleted ones. Filtering the script
/// for `Equal` and `Insert` yields `new`, filtering for `Equal` and `Delete` yields `old`.
pub fn edit_script<'a>(old: &'a TokenSequence, new: &'a TokenSequence) -> Vec<(ChangeTag, &'a [u8])> {
    let mut interner = Interner::new(old.len() + new.len());
    let old_tokens: Vec<_> = old.iter().map(|token| interner.intern(token)).collect();
    let new_tokens: Vec<_> = new.iter().map(|token| interner.intern(token)).collect();

    let mut result = Vec::with_capacity(old.len().max(new.len()));

    let mut last_old_pos = 0;
    imara_diff::diff_with_tokens(
        Algorithm::MyersMinimal,
        &old_tokens,
        &new_tokens,
        interner.num_tokens(),
        |before: Range<u32>, after: Range<u32>| {
            for token in old.spans[last_old_pos..before.start as usize].iter() {
                result.push((ChangeTag::Equal, &old.text[token.clone()]));
            }
            last_old_pos = before.end as usize;

            for token in &new.spans[after.start as usize..after.end as usize] {
                result.push((ChangeTag::Insert, &new.text[token.clone()]));
            }

            for token in &old.spans[before.start as usize..before.end as usize] {
                result.push((ChangeTag::Delete, &old.text[token.clone()]));
            }
        },
    );

    for token in &old.spans[last_old_pos..] {
        result.push((ChangeTag::Equal, &old.text[token.clone()]));
    }

    result
}

/// Added and removed text of a revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDiff {
    pub additions: Vec<u8>,
    pub deletions: Vec<u8>,
}

/// Diff two token sequences. Inserted and deleted tokens are each joined with a single space,
/// in document order; unchanged tokens contribute to neither side.
///
/// The separators of the input are not carried over, so the size of `additions` and `deletions`
/// counts token bytes plus one space between neighbouring tokens, not the bytes of the changed
/// stretch of text.
pub fn diff_tokens(old: &TokenSequence, new: &TokenSequence) -> TokenDiff {
    let mut diff = TokenDiff::default();

    for (tag, token) in edit_script(old, new) {
        let target = match tag {
            ChangeTag::Equal => continue,
            ChangeTag::Insert => &mut diff.additions,
            ChangeTag::Delete => &mut diff.deletions,
        };
        if !target.is_empty() {
            target.push(b' ');
        }
        target.extend_from_slice(token);
    }

    diff
}

/// Diff a revision against the previous revision of the same article.
///
/// The first revision of an article has nothing to compare with, its whole text counts as added.
pub fn diff_revision(previous: Option<&TokenSequence>, text: &[u8], current: &TokenSequence) -> TokenDiff {
    match previous {
        Some(previous) => diff_tokens(previous, current),
        None => TokenDiff {
            additions: text.to_vec(),
            deletions: Vec::new(),
        },
    }
}
