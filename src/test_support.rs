use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use crate::{
    config::Config,
    convert,
    processor::ProcessingStats,
};

pub mod prelude {
    pub(crate) use super::{anonymous, dump_to_xml, dummy_revision, run, Page, Revision};
    pub(crate) use proptest::prelude::*;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contributor {
    Registered { username: String, id: u64 },
    Anonymous { ip: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: u64,
    pub timestamp: String,
    pub contributor: Contributor,
    pub minor: bool,
    pub comment: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub id: u64,
    pub revisions: Vec<Revision>,
}

pub fn dummy_revision() -> Revision {
    Revision {
        id: 0,
        timestamp: "2003-11-07T00:43:23Z".into(),
        contributor: Contributor::Registered {
            username: "Dummy".into(),
            id: 1,
        },
        minor: false,
        comment: None,
        text: String::new(),
    }
}

pub fn anonymous(ip: &str) -> Contributor {
    Contributor::Anonymous { ip: ip.into() }
}

type XmlWriter<'a> = quick_xml::Writer<Cursor<&'a mut Vec<u8>>>;

fn start(writer: &mut XmlWriter, name: &str) {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .unwrap();
}

fn end(writer: &mut XmlWriter, name: &str) {
    writer.write_event(Event::End(BytesEnd::new(name))).unwrap();
}

// empty content is written as `<name />`, otherwise the indentation would end up as content
fn text_element(writer: &mut XmlWriter, start_tag: BytesStart, content: &str) {
    if content.is_empty() {
        writer.write_event(Event::Empty(start_tag)).unwrap();
        return;
    }

    let end_tag = start_tag.to_end().into_owned();
    writer.write_event(Event::Start(start_tag)).unwrap();
    writer
        .write_event(Event::Text(BytesText::new(content)))
        .unwrap();
    writer.write_event(Event::End(end_tag)).unwrap();
}

fn write_revision(writer: &mut XmlWriter, revision: &Revision) {
    start(writer, "revision");
    text_element(writer, BytesStart::new("id"), &revision.id.to_string());
    text_element(writer, BytesStart::new("timestamp"), &revision.timestamp);

    start(writer, "contributor");
    match &revision.contributor {
        Contributor::Registered { username, id } => {
            text_element(writer, BytesStart::new("username"), username);
            text_element(writer, BytesStart::new("id"), &id.to_string());
        }
        Contributor::Anonymous { ip } => {
            text_element(writer, BytesStart::new("ip"), ip);
        }
    }
    end(writer, "contributor");

    if revision.minor {
        writer
            .write_event(Event::Empty(BytesStart::new("minor")))
            .unwrap();
    }
    if let Some(comment) = &revision.comment {
        text_element(writer, BytesStart::new("comment"), comment);
    }
    text_element(writer, BytesStart::new("model"), "wikitext");
    text_element(writer, BytesStart::new("format"), "text/x-wiki");
    text_element(
        writer,
        BytesStart::new("text").with_attributes([
            ("bytes", revision.text.len().to_string().as_str()),
            ("xml:space", "preserve"),
        ]),
        &revision.text,
    );
    end(writer, "revision");
}

/// Serialize `pages` as a complete, indented dump document including a `<siteinfo>` block.
pub fn dump_to_xml(pages: &[Page]) -> String {
    let mut xml = Vec::new();
    let mut writer = quick_xml::Writer::new_with_indent(Cursor::new(&mut xml), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .unwrap();

    writer
        .write_event(Event::Start(
            BytesStart::new("mediawiki").with_attributes([("version", "0.11"), ("xml:lang", "en")]),
        ))
        .unwrap();
    start(&mut writer, "siteinfo");
    text_element(&mut writer, BytesStart::new("sitename"), "Wikipedia");
    text_element(&mut writer, BytesStart::new("dbname"), "enwiki");
    end(&mut writer, "siteinfo");

    for page in pages {
        start(&mut writer, "page");
        text_element(&mut writer, BytesStart::new("title"), &page.title);
        text_element(&mut writer, BytesStart::new("ns"), "0");
        text_element(&mut writer, BytesStart::new("id"), &page.id.to_string());
        for revision in &page.revisions {
            write_revision(&mut writer, revision);
        }
        end(&mut writer, "page");
    }

    end(&mut writer, "mediawiki");
    drop(writer);

    String::from_utf8(xml).unwrap()
}

/// Run `xml` through the whole pipeline, returning the output split into lines and fields.
pub fn run(xml: &str, config: &Config) -> (Vec<Vec<String>>, ProcessingStats) {
    let mut output = Vec::new();
    let stats = convert(xml.as_bytes(), &mut output, config).unwrap();

    let lines = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect();
    (lines, stats)
}
