use std::{collections::TryReserveError, fmt::Debug};

/// Append-only byte buffer for a single logical field of a revision.
///
/// Character data for one field arrives in fragments of arbitrary size, so the buffer only
/// ever appends to its end. Growth goes through [`Vec::try_reserve`], which grows the backing
/// storage geometrically; the accumulated prefix is copied only when a reallocation happens,
/// never on a plain append. There is no upper bound on the size of a field.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct FieldBuffer {
    bytes: Vec<u8>,
    reallocations: usize,
}

impl FieldBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            reallocations: 0,
        }
    }

    /// Truncate to empty. Keeps the allocation so the next revision can reuse it.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Append `data` to the end of the buffer.
    ///
    /// Fails only if the allocator cannot provide the required capacity; the buffer is left
    /// unchanged in that case.
    pub fn append(&mut self, data: &[u8]) -> Result<(), TryReserveError> {
        if self.bytes.capacity() - self.bytes.len() < data.len() {
            self.bytes.try_reserve(data.len())?;
            self.reallocations += 1;
        }
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Number of times the backing storage had to grow since the buffer was created.
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }
}

impl AsRef<[u8]> for FieldBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Debug for FieldBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // fields can be megabytes long, only show a prefix
        const PREVIEW: usize = 64;
        let preview = &self.bytes[..self.bytes.len().min(PREVIEW)];
        f.debug_struct("FieldBuffer")
            .field("len", &self.bytes.len())
            .field("capacity", &self.bytes.capacity())
            .field("preview", &String::from_utf8_lossy(preview))
            .finish()
    }
}
