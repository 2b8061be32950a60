use std::fmt::{Debug, Display};

use compact_str::CompactString;
use md5::{Digest, Md5};
use rustc_hash::FxHashMap;

/// MD5 digest of a revision text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextHash(pub [u8; 16]);

impl TextHash {
    pub fn of(text: &[u8]) -> Self {
        Self(Md5::digest(text).into())
    }

    /// Lowercase hex representation, 32 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Display for TextHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for TextHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TextHash").field(&self.to_hex()).finish()
    }
}

/// Detects revisions whose text is byte-identical to an earlier revision of the same article.
///
/// Owned by the article context, so the key space never crosses article boundaries.
#[derive(Debug, Default)]
pub struct ReversionTracker {
    revisions_by_hash: FxHashMap<TextHash, CompactString>,
}

impl ReversionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `revision_id` as the latest revision with text hash `hash`.
    ///
    /// Returns the id previously recorded for the same hash. The lookup happens before the
    /// insert, so a text that occurs a third time reports the second occurrence.
    pub fn record(&mut self, hash: TextHash, revision_id: &str) -> Option<CompactString> {
        self.revisions_by_hash
            .insert(hash, CompactString::from(revision_id))
    }

    pub fn len(&self) -> usize {
        self.revisions_by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions_by_hash.is_empty()
    }
}
