//! Splitting of dump timestamps of the form `2003-11-07T00:43:23Z`.

pub const TIMESTAMP_LENGTH: usize = 20;
const DATE_LENGTH: usize = 10;
const TIME_LENGTH: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimestampParts {
    date: [u8; DATE_LENGTH],
    time: [u8; TIME_LENGTH],
}

impl TimestampParts {
    /// `YYYY-MM-DD`
    pub fn date(&self) -> &[u8] {
        &self.date
    }

    /// `HH:MM:SS`
    pub fn time(&self) -> &[u8] {
        &self.time
    }
}

impl std::fmt::Debug for TimestampParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampParts")
            .field("date", &String::from_utf8_lossy(&self.date))
            .field("time", &String::from_utf8_lossy(&self.time))
            .finish()
    }
}

/// Split a timestamp into its date and time parts.
///
/// Only the layout is checked (the length), not the digits: dump timestamps come from the
/// database and are trusted to be well-formed once they have the right size. Anything that is
/// not exactly [`TIMESTAMP_LENGTH`] bytes long yields `None`.
pub fn split_timestamp(timestamp: &[u8]) -> Option<TimestampParts> {
    if timestamp.len() != TIMESTAMP_LENGTH {
        return None;
    }

    let date = timestamp[..DATE_LENGTH].try_into().ok()?;
    // skip the `T` separator
    let time = timestamp[DATE_LENGTH + 1..DATE_LENGTH + 1 + TIME_LENGTH]
        .try_into()
        .ok()?;
    Some(TimestampParts { date, time })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_timestamp() {
        let parts = split_timestamp(b"2003-11-07T00:43:23Z").unwrap();
        assert_eq!(parts.date(), b"2003-11-07");
        assert_eq!(parts.time(), b"00:43:23");
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(split_timestamp(b""), None);
        assert_eq!(split_timestamp(b"2003-11-07T00:43:23"), None);
        assert_eq!(split_timestamp(b"2003-11-07T00:43:23ZZ"), None);
        assert_eq!(split_timestamp(b"20031107004323"), None);
    }
}
