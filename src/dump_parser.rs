use std::{
    fmt::Debug,
    io::{self, BufRead, Read},
};

use quick_xml::events::Event;

use crate::processor::ProcessingError;

/// Receiver of the element and character data events of a dump, in document order.
///
/// Character data of a single element may be delivered in several calls.
pub trait DumpHandler {
    fn start_element(&mut self, name: &[u8]) -> Result<(), ProcessingError>;
    fn end_element(&mut self, name: &[u8]) -> Result<(), ProcessingError>;
    fn characters(&mut self, data: &[u8]) -> Result<(), ProcessingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("{source} at line {line}")]
    XmlError { source: quick_xml::Error, line: u64 },
    #[error("unexpected end of input at line {line}")]
    Eof { line: u64 },
    #[error("{source} at line {line}")]
    Handler { source: ProcessingError, line: u64 },
}

impl ParsingError {
    /// 1-based line of the input at which the error was detected.
    pub fn line(&self) -> u64 {
        match self {
            ParsingError::XmlError { line, .. }
            | ParsingError::Eof { line }
            | ParsingError::Handler { line, .. } => *line,
        }
    }

    /// Whether the input itself is at fault, as opposed to the handler it was fed to.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, ParsingError::XmlError { .. } | ParsingError::Eof { .. })
    }
}

// big enough to keep the number of read calls low on multi-gigabyte dumps
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Buffered reader that counts the newlines handed out, so errors can be reported by line.
pub struct LineCountingReader<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    line: u64,
}

impl<R: Read> LineCountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: vec![0; READ_BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            filled: 0,
            line: 1,
        }
    }

    /// The line the next byte to be consumed is on.
    pub fn line(&self) -> u64 {
        self.line
    }
}

impl<R: Read> Read for LineCountingReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let amount = available.len().min(out.len());
        out[..amount].copy_from_slice(&available[..amount]);
        self.consume(amount);
        Ok(amount)
    }
}

impl<R: Read> BufRead for LineCountingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.filled {
            self.filled = self.inner.read(&mut self.buf)?;
            self.pos = 0;
        }
        Ok(&self.buf[self.pos..self.filled])
    }

    fn consume(&mut self, amount: usize) {
        let end = (self.pos + amount).min(self.filled);
        self.line += memchr::memchr_iter(b'\n', &self.buf[self.pos..end]).count() as u64;
        self.pos = end;
    }
}

impl<R> Debug for LineCountingReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineCountingReader")
            .field("buf.len", &self.buf.len())
            .field("pos", &self.pos)
            .field("filled", &self.filled)
            .field("line", &self.line)
            .finish()
    }
}

/// Pushes the events of an XML dump into a [`DumpHandler`].
///
/// The whole document is streamed, only the current event is held in memory.
pub struct DumpParser<R: Read> {
    xml_parser: quick_xml::Reader<LineCountingReader<R>>,
    buf: Vec<u8>,
    depth: usize,
}

impl<R: Read> Debug for DumpParser<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpParser")
            .field("reader", self.xml_parser.get_ref())
            .field("buf.len", &self.buf.len())
            .field("buf.capacity", &self.buf.capacity())
            .field("depth", &self.depth)
            .finish()
    }
}

impl<R: Read> DumpParser<R> {
    pub fn new(reader: R) -> Self {
        let mut xml_parser = quick_xml::Reader::from_reader(LineCountingReader::new(reader));
        // `<minor />` has to look like an open and a close tag to the handler
        xml_parser.config_mut().expand_empty_elements = true;

        Self {
            xml_parser,
            // preallocate 1 MiB for the buffer
            buf: Vec::with_capacity(1024 * 1024),
            depth: 0,
        }
    }

    pub fn line(&self) -> u64 {
        self.xml_parser.get_ref().line()
    }

    /// Feed the complete document to `handler`.
    ///
    /// Stops at the first malformed construct or handler error. A document that ends with
    /// elements still open, or that contains no element at all, is malformed as well.
    pub fn run<H: DumpHandler>(&mut self, handler: &mut H) -> Result<(), ParsingError> {
        let mut seen_root = false;

        loop {
            let event = match self.xml_parser.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(source) => {
                    let line = self.xml_parser.get_ref().line();
                    tracing::error!(
                        message = "Malformed XML",
                        error = %source,
                        line,
                        position = self.xml_parser.buffer_position()
                    );
                    return Err(ParsingError::XmlError { source, line });
                }
            };

            let result = match event {
                Event::Start(ref e) => {
                    self.depth += 1;
                    seen_root = true;
                    handler.start_element(e.name().as_ref())
                }
                Event::End(ref e) => {
                    self.depth = self.depth.saturating_sub(1);
                    handler.end_element(e.name().as_ref())
                }
                Event::Text(ref e) if self.depth > 0 => match e.unescape() {
                    Ok(text) => handler.characters(text.as_bytes()),
                    Err(source) => {
                        let line = self.xml_parser.get_ref().line();
                        return Err(ParsingError::XmlError { source, line });
                    }
                },
                Event::CData(ref e) if self.depth > 0 => handler.characters(e),
                Event::Eof => {
                    if self.depth > 0 || !seen_root {
                        let line = self.xml_parser.get_ref().line();
                        tracing::error!(message = "Unexpected end of input", depth = self.depth, line);
                        return Err(ParsingError::Eof { line });
                    }
                    return Ok(());
                }
                _ => Ok(()),
            };

            if let Err(source) = result {
                let line = self.xml_parser.get_ref().line();
                return Err(ParsingError::Handler { source, line });
            }

            self.buf.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl DumpHandler for Recorder {
        fn start_element(&mut self, name: &[u8]) -> Result<(), ProcessingError> {
            self.events
                .push(format!("<{}>", String::from_utf8_lossy(name)));
            Ok(())
        }

        fn end_element(&mut self, name: &[u8]) -> Result<(), ProcessingError> {
            self.events
                .push(format!("</{}>", String::from_utf8_lossy(name)));
            Ok(())
        }

        fn characters(&mut self, data: &[u8]) -> Result<(), ProcessingError> {
            self.events.push(String::from_utf8_lossy(data).into_owned());
            Ok(())
        }
    }

    fn record(xml: &str) -> Result<Vec<String>, ParsingError> {
        let mut recorder = Recorder::default();
        DumpParser::new(xml.as_bytes()).run(&mut recorder)?;
        Ok(recorder.events)
    }

    #[test]
    fn test_events() {
        let events =
            record("<?xml version=\"1.0\"?>\n<page><title>A &amp; B</title><minor/></page>\n")
                .unwrap();
        assert_eq!(
            events,
            vec!["<page>", "<title>", "A & B", "</title>", "<minor>", "</minor>", "</page>"]
        );
    }

    #[test]
    fn test_cdata() {
        let events = record("<text><![CDATA[a <b> c]]></text>").unwrap();
        assert_eq!(events, vec!["<text>", "a <b> c", "</text>"]);
    }

    #[test]
    fn test_mismatched_tag_reports_line() {
        let error = record("<page>\n<title>x</title>\n<revision>\n</page>\n").unwrap_err();
        assert!(matches!(error, ParsingError::XmlError { .. }), "{error:?}");
        assert!(error.is_malformed_input());
        assert_eq!(error.line(), 4);
    }

    #[test]
    fn test_truncated_document() {
        let error = record("<page>\n<title>x</title>\n").unwrap_err();
        assert!(!matches!(error, ParsingError::Handler { .. }), "{error:?}");
        assert_eq!(error.line(), 3);
    }

    #[test]
    fn test_empty_document() {
        let error = record("").unwrap_err();
        assert!(matches!(error, ParsingError::Eof { line: 1 }), "{error:?}");
        assert!(error.is_malformed_input());
    }

    #[test]
    fn test_handler_errors_are_not_malformed_input() {
        struct Failing;

        impl DumpHandler for Failing {
            fn start_element(&mut self, _name: &[u8]) -> Result<(), ProcessingError> {
                Err(ProcessingError::Output(io::Error::other("broken pipe")))
            }

            fn end_element(&mut self, _name: &[u8]) -> Result<(), ProcessingError> {
                Ok(())
            }

            fn characters(&mut self, _data: &[u8]) -> Result<(), ProcessingError> {
                Ok(())
            }
        }

        let error = DumpParser::new(&b"<page></page>"[..])
            .run(&mut Failing)
            .unwrap_err();
        assert!(matches!(error, ParsingError::Handler { line: 1, .. }), "{error:?}");
        assert!(!error.is_malformed_input());
    }

    #[test]
    fn test_line_counting_reader() {
        let mut reader = LineCountingReader::new(&b"one\ntwo\nthree"[..]);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "one\n");
        assert_eq!(reader.line(), 2);

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "two\nthree");
        assert_eq!(reader.line(), 3);
    }
}
