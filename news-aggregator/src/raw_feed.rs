//! Path-based reading of `rss/channel/item` and `feed/entry` documents.
//!
//! Works on element local names only, so namespaced elements such as
//! `atom:link` or `dc:date` land on the same fields as their plain forms.
//! Values are kept as raw text; interpretation happens in the parser.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

/// Root elements of documents that carry entries.
const FEED_ROOTS: [&str; 3] = ["rss", "feed", "RDF"];

/// Fields of one `item`/`entry`, first non-empty value per field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub category: Option<String>,
    pub pub_date: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawFeed {
    pub root: Option<String>,
    pub entries: Vec<RawEntry>,
}

impl RawFeed {
    pub fn is_feed(&self) -> bool {
        self.root.as_deref().is_some_and(|root| FEED_ROOTS.contains(&root))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Category,
    PubDate,
    Published,
    Updated,
}

impl Field {
    fn from_element(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Field::Title),
            "link" => Some(Field::Link),
            "category" => Some(Field::Category),
            "pubDate" => Some(Field::PubDate),
            "published" | "date" => Some(Field::Published),
            "updated" => Some(Field::Updated),
            _ => None,
        }
    }
}

impl RawEntry {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Category => &mut self.category,
            Field::PubDate => &mut self.pub_date,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        }
    }

    fn offer(&mut self, field: Field, value: &str) {
        let value = value.trim();
        let slot = self.slot(field);
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value.to_string());
        }
    }

    /// `<link href>` and `<category term>` carry their value as an attribute.
    fn offer_attributes(&mut self, name: &str, element: &BytesStart) {
        let (field, key) = match name {
            "link" => (Field::Link, b"href".as_slice()),
            "category" => (Field::Category, b"term".as_slice()),
            _ => return,
        };

        for attr in element.attributes().flatten() {
            if attr.key.local_name().as_ref() == key {
                if let Ok(value) = attr.unescape_value() {
                    self.offer(field, &value);
                }
            }
        }
    }
}

/// An entry being read: its element depth and the child field collecting text.
struct OpenEntry {
    depth: usize,
    entry: RawEntry,
    field: Option<(Field, String)>,
}

fn local_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn text_of(text: &BytesText) -> String {
    text.unescape()
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(text).into_owned())
}

/// Collect every `item`/`entry` element in document order. Entries nested
/// inside another entry are not collected separately.
pub fn decode(content: &str) -> Result<RawFeed, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    let mut feed = RawFeed::default();
    let mut depth = 0usize;
    let mut open: Option<OpenEntry> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = local_name(&element);
                if depth == 0 && feed.root.is_none() {
                    feed.root = Some(name.clone());
                }
                depth += 1;

                if open.is_none() && (name == "item" || name == "entry") {
                    open = Some(OpenEntry {
                        depth,
                        entry: RawEntry::default(),
                        field: None,
                    });
                } else if let Some(current) = open.as_mut().filter(|c| depth == c.depth + 1) {
                    current.entry.offer_attributes(&name, &element);
                    current.field = Field::from_element(&name).map(|f| (f, String::new()));
                }
            }
            Event::Empty(element) => {
                let name = local_name(&element);
                if depth == 0 && feed.root.is_none() {
                    feed.root = Some(name.clone());
                }
                if let Some(current) = open.as_mut() {
                    if depth == current.depth {
                        current.entry.offer_attributes(&name, &element);
                    }
                }
            }
            Event::Text(text) => {
                if let Some((_, buffer)) = open.as_mut().and_then(|c| c.field.as_mut()) {
                    buffer.push_str(&text_of(&text));
                }
            }
            Event::CData(data) => {
                if let Some((_, buffer)) = open.as_mut().and_then(|c| c.field.as_mut()) {
                    buffer.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                let mut closes_entry = false;
                if let Some(current) = open.as_mut() {
                    if depth == current.depth + 1 {
                        if let Some((field, value)) = current.field.take() {
                            current.entry.offer(field, &value);
                        }
                    }
                    closes_entry = depth == current.depth;
                }
                if closes_entry {
                    if let Some(done) = open.take() {
                        feed.entries.push(done.entry);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(feed)
}
