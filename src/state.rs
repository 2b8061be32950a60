//! The two-level (block × element) state that decides where character data belongs.
//!
//! The same tag name can mean different things depending on nesting (`<id>` is the article id
//! inside a page, the revision id inside a revision and the editor id inside a contributor), so
//! instead of tracking the full element path we remember the enclosing block and the field that
//! is currently open.

/// Tags that influence the state. Everything else is ignored on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Title,       // <title>Main Page</title>
    Revision,    // <revision>...</revision>
    Contributor, // <contributor><username>blah</username><id>500</id></contributor>
    Id,          // <id>500</id>, meaning depends on the block
    Minor,       // <minor />
    Timestamp,   // <timestamp>2003-12-05T06:41:50Z</timestamp>
    Username,    // <username>blah</username>
    Ip,          // <ip>127.0.0.1</ip>
    Comment,     // <comment>blah</comment>
    Text,        // <text xml:space="preserve" bytes="20">blah</text>
    Container,   // <page>, <mediawiki>, <restrictions>, <siteinfo>: content is swallowed
}

impl Tag {
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Tag::Title),
            b"revision" => Some(Tag::Revision),
            b"contributor" => Some(Tag::Contributor),
            b"id" => Some(Tag::Id),
            b"minor" => Some(Tag::Minor),
            b"timestamp" => Some(Tag::Timestamp),
            b"username" => Some(Tag::Username),
            b"ip" => Some(Tag::Ip),
            b"comment" => Some(Tag::Comment),
            b"text" => Some(Tag::Text),
            b"page" | b"mediawiki" | b"restrictions" | b"siteinfo" => Some(Tag::Container),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Title,
    Revision,
    Contributor,
    /// Everything up to the next `<title>` is ignored.
    Skip,
}

/// The field that receives character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Title,
    ArticleId,
    Revision,
    RevisionId,
    Timestamp,
    Contributor,
    Editor,
    EditorId,
    Minor,
    Comment,
    Unused,
    Text,
}

/// Side effect the caller has to perform after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// A new article begins, all article and revision state has to be replaced.
    StartArticle,
    /// The revision carries the minor edit marker. The tag has no content, so this happens on open.
    MarkMinor,
    /// The title is complete.
    FinishTitle,
    /// The revision is complete and has to be emitted.
    FinishRevision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    block: Block,
    element: Element,
}

impl Default for State {
    fn default() -> Self {
        Self {
            block: Block::Title,
            element: Element::Unused,
        }
    }
}

impl State {
    pub fn block(&self) -> Block {
        self.block
    }

    pub fn element(&self) -> Element {
        self.element
    }

    /// Ignore everything until the next article starts.
    pub fn skip_article(&mut self) {
        self.block = Block::Skip;
        self.element = Element::Unused;
    }

    pub fn open(&mut self, tag: Tag) -> Transition {
        // a title starts a new article, even if the previous one was skipped
        if tag == Tag::Title {
            self.block = Block::Title;
            self.element = Element::Title;
            return Transition::StartArticle;
        }

        if self.block == Block::Skip {
            return Transition::None;
        }

        match tag {
            Tag::Title => unreachable!("handled above"),
            Tag::Revision => {
                self.block = Block::Revision;
                self.element = Element::Revision;
            }
            Tag::Contributor => {
                self.block = Block::Contributor;
                self.element = Element::Contributor;
            }
            Tag::Id => {
                self.element = match self.block {
                    Block::Title => Element::ArticleId,
                    Block::Revision => Element::RevisionId,
                    Block::Contributor => Element::EditorId,
                    Block::Skip => unreachable!("handled above"),
                };
            }
            Tag::Minor => {
                self.element = Element::Minor;
                return Transition::MarkMinor;
            }
            Tag::Timestamp => self.element = Element::Timestamp,
            Tag::Username => self.element = Element::Editor,
            Tag::Ip => self.element = Element::EditorId,
            Tag::Comment => self.element = Element::Comment,
            Tag::Text => self.element = Element::Text,
            Tag::Container => self.element = Element::Unused,
        }

        Transition::None
    }

    /// Any close tag ends the current field, so whitespace between tags is dropped.
    pub fn close(&mut self, tag: Option<Tag>) -> Transition {
        self.element = Element::Unused;

        match tag {
            _ if self.block == Block::Skip => Transition::None,
            Some(Tag::Revision) => Transition::FinishRevision,
            Some(Tag::Title) => Transition::FinishTitle,
            _ => Transition::None,
        }
    }

    /// The field character data should currently be appended to, if any.
    pub fn text_target(&self) -> Option<Element> {
        if self.block == Block::Skip || self.element == Element::Unused {
            None
        } else {
            Some(self.element)
        }
    }
}
