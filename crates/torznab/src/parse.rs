use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::models::ReleaseItem;
use crate::TorznabError;

/// Parse a Torznab/Newznab search response from raw XML bytes.
///
/// Items without a title or link are dropped; `size` and `category` come from
/// `newznab:attr` elements on each item.
pub fn parse_torznab_feed(xml: &[u8]) -> Result<Vec<ReleaseItem>, TorznabError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();

    let mut current_item: Option<ReleaseItemBuilder> = None;
    let mut current_element = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                current_element = name.clone();

                if name == "item" {
                    current_item = Some(ReleaseItemBuilder::default());
                } else if name == "newznab:attr" {
                    if let Some(ref mut item) = current_item {
                        item.apply_attr(&e);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                // newznab attributes are usually self-closing elements.
                if e.name().as_ref() == b"newznab:attr" {
                    if let Some(ref mut item) = current_item {
                        item.apply_attr(&e);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(builder) = current_item.take() {
                        if let Some(item) = builder.build() {
                            items.push(item);
                        }
                    }
                }
                current_element.clear();
            }
            Ok(Event::Text(e)) => {
                if let Some(ref mut item) = current_item {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if !text.is_empty() {
                        match current_element.as_str() {
                            "title" => item.title = Some(text),
                            "link" => item.link = Some(text),
                            "pubDate" => item.published = parse_pub_date(&text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TorznabError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn parse_pub_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[derive(Default)]
struct ReleaseItemBuilder {
    title: Option<String>,
    link: Option<String>,
    published: Option<DateTime<Utc>>,
    size: Option<i64>,
    categories: Vec<String>,
}

impl ReleaseItemBuilder {
    fn apply_attr(&mut self, element: &BytesStart<'_>) {
        let mut name: Option<String> = None;
        let mut value: Option<String> = None;
        for attr in element.attributes().flatten() {
            let text = String::from_utf8_lossy(&attr.value).to_string();
            match attr.key.as_ref() {
                b"name" => name = Some(text),
                b"value" => value = Some(text),
                _ => {}
            }
        }
        let (Some(name), Some(value)) = (name, value) else {
            return;
        };
        match name.as_str() {
            "size" => self.size = value.parse().ok(),
            "category" => self.categories.push(value),
            _ => {}
        }
    }

    fn build(self) -> Option<ReleaseItem> {
        Some(ReleaseItem {
            title: self.title?,
            link: self.link?,
            published: self.published,
            size: self.size,
            categories: self.categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:newznab="http://www.newznab.com/DTD/2010/feeds/attributes/">
  <channel>
    <title>indexer</title>
    <item>
      <title>Fernsehwoche Maerz 2024</title>
      <link>https://indexer.example/get/abc123</link>
      <pubDate>Mon, 04 Mar 2024 10:00:00 +0000</pubDate>
      <newznab:attr name="size" value="52428800"/>
      <newznab:attr name="category" value="7000"/>
      <newznab:attr name="category" value="7010"/>
    </item>
    <item>
      <title>No Link Release</title>
    </item>
    <item>
      <title>PC Gamer Issue 345</title>
      <link>https://indexer.example/get/def456</link>
      <pubDate>not a date</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed() {
        let items = parse_torznab_feed(SAMPLE.as_bytes()).expect("should parse");
        assert_eq!(items.len(), 2, "item without link is dropped");

        let first = &items[0];
        assert_eq!(first.title, "Fernsehwoche Maerz 2024");
        assert_eq!(first.link, "https://indexer.example/get/abc123");
        assert_eq!(first.size, Some(52_428_800));
        assert_eq!(first.categories, vec!["7000", "7010"]);
        assert!(first.published.is_some());

        let second = &items[1];
        assert_eq!(second.title, "PC Gamer Issue 345");
        assert_eq!(second.published, None, "invalid pubDate is ignored");
    }

    #[test]
    fn test_parse_empty_channel() {
        let xml = r#"<rss><channel><title>empty</title></channel></rss>"#;
        assert!(parse_torznab_feed(xml.as_bytes())
            .expect("should parse")
            .is_empty());
    }

    #[test]
    fn test_parse_invalid_xml() {
        assert!(parse_torznab_feed(b"<rss></wrong>").is_err());
    }
}
