//! RSS document parsing.
//!
//! Walks `quick-xml` events over a fetched document and extracts the channel
//! title/link/description plus every `<item>`. Item publish dates are kept as
//! the raw strings the publisher sent; normalization happens later in
//! [`super::dates`].
//!
//! XXE protection: quick-xml (0.37) does not parse `<!ENTITY>` declarations
//! from a DOCTYPE. Entity resolution is limited to the five XML builtins plus
//! the fixed [`EXTRA_ENTITIES`] table below; anything else is a parse error.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// HTML named character references some publishers leave inside otherwise
/// well-formed XML. Registered as extra entity expansions instead of
/// rejecting the document.
const EXTRA_ENTITIES: &[(&str, &str)] = &[
    ("ldquo", "\u{201C}"),
    ("rdquo", "\u{201D}"),
    ("ndash", "\u{2013}"),
    ("mdash", "\u{2014}"),
    ("hellip", "\u{2026}"),
];

/// Resolver handed to `unescape_with`. A custom resolver replaces the
/// default entity handling entirely, so the XML builtins must be resolved
/// here as well.
fn resolve_entity(name: &str) -> Option<&'static str> {
    EXTRA_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|&(_, expansion)| expansion)
        .or_else(|| quick_xml::escape::resolve_predefined_entity(name))
}

/// Errors from structural feed parsing.
#[derive(Debug, Error)]
pub enum FeedParseError {
    /// The document is not well-formed XML, or contains an entity reference
    /// that is neither an XML builtin nor in [`EXTRA_ENTITIES`].
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document ended while an element was still open.
    #[error("document truncated inside <{0}>")]
    Truncated(String),

    /// The document contains no `<channel>` element.
    #[error("document has no <channel> element")]
    MissingChannel,
}

/// A single entry of a parsed feed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// The publish date exactly as the feed carried it.
    pub pub_date: String,
}

/// The ephemeral, in-memory result of one fetch. Consumed by the scheduler
/// and discarded; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<ParsedItem>,
}

/// Parses an RSS document into a [`ParsedFeed`].
///
/// # Errors
///
/// Returns [`FeedParseError`] when the document is malformed, truncated, or
/// has no `<channel>` element.
pub fn parse_feed(document: &str) -> Result<ParsedFeed, FeedParseError> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut feed = ParsedFeed::default();
    let mut saw_channel = false;
    let mut item: Option<ParsedItem> = None;
    let mut open_elements: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "channel" {
                    saw_channel = true;
                }
                if name == "item" && item.is_none() {
                    item = Some(ParsedItem::default());
                }
                open_elements.push(name);
            }
            Event::End(_) => {
                if let Some(closed) = open_elements.pop() {
                    if closed == "item" {
                        if let Some(finished) = item.take() {
                            feed.items.push(finished);
                        }
                    }
                }
            }
            Event::Text(t) => {
                let text = t
                    .unescape_with(resolve_entity)
                    .map_err(quick_xml::Error::from)?
                    .into_owned();
                record_text(&mut feed, &mut item, &open_elements, &text);
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(c.as_ref()).into_owned();
                record_text(&mut feed, &mut item, &open_elements, &text);
            }
            Event::Eof => {
                if let Some(open) = open_elements.pop() {
                    return Err(FeedParseError::Truncated(open));
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(FeedParseError::MissingChannel);
    }

    // Publishers commonly double-encode entities, so run a full HTML
    // unescape over the already-XML-decoded text fields.
    feed.title = html_escape::decode_html_entities(&feed.title).into_owned();
    feed.description = html_escape::decode_html_entities(&feed.description).into_owned();
    for item in &mut feed.items {
        item.title = html_escape::decode_html_entities(&item.title).into_owned();
        item.description = html_escape::decode_html_entities(&item.description).into_owned();
    }

    Ok(feed)
}

/// Routes a text run to the channel or item field the parser is inside of.
/// Text for elements we do not model (enclosures, namespaced extensions, ...)
/// is dropped.
fn record_text(
    feed: &mut ParsedFeed,
    item: &mut Option<ParsedItem>,
    open_elements: &[String],
    text: &str,
) {
    let Some(current) = open_elements.last() else {
        return;
    };
    let parent = open_elements
        .len()
        .checked_sub(2)
        .and_then(|i| open_elements.get(i));

    match (parent.map(String::as_str), current.as_str()) {
        (Some("item"), field) => {
            if let Some(item) = item.as_mut() {
                match field {
                    "title" => item.title.push_str(text),
                    "link" => item.link.push_str(text),
                    "description" => item.description.push_str(text),
                    "pubDate" => item.pub_date.push_str(text),
                    _ => {}
                }
            }
        }
        (Some("channel"), "title") => feed.title.push_str(text),
        (Some("channel"), "link") => feed.link.push_str(text),
        (Some("channel"), "description") => feed.description.push_str(text),
        _ => {}
    }
}
