use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::paper::SeenPaper;
use crate::{Error, Result};

const FEED_TITLE: &str = "Scholar Watcher";
const FEED_DESCRIPTION: &str = "Recent items detected by Scholar Watcher";

/// RSS channel metadata
#[derive(Debug, Clone)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Channel {
    /// Channel for the whole feed, or for a single keyword
    pub fn new(link: &str, keyword: Option<&str>) -> Self {
        let title = match keyword {
            Some(kw) => format!("{} — {}", FEED_TITLE, kw),
            None => FEED_TITLE.to_string(),
        };

        Self {
            title,
            link: link.to_string(),
            description: FEED_DESCRIPTION.to_string(),
        }
    }
}

/// RFC 822 date as used by RSS 2.0
fn rss_date(dt: DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Render seen papers as an RSS 2.0 document, in the given order
pub fn render_rss(channel: &Channel, items: &[SeenPaper]) -> Result<String> {
    render_rss_at(channel, items, Utc::now())
}

fn render_rss_at(channel: &Channel, items: &[SeenPaper], built_at: DateTime<Utc>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &channel.title)?;
    text_element(&mut writer, "link", &channel.link)?;
    text_element(&mut writer, "description", &channel.description)?;
    text_element(&mut writer, "language", "en")?;
    text_element(&mut writer, "lastBuildDate", &rss_date(built_at))?;

    for item in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;

        text_element(&mut writer, "title", &item.display_title())?;
        text_element(&mut writer, "link", &item.url)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&item.fingerprint)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        text_element(&mut writer, "description", &item.authors)?;
        text_element(&mut writer, "category", &item.keyword)?;
        text_element(&mut writer, "pubDate", &rss_date(item.first_seen))?;

        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seen(title: &str, year: &str, hour: u32) -> SeenPaper {
        SeenPaper {
            keyword: "graphs & networks".into(),
            fingerprint: format!("fp-{}", hour),
            title: title.into(),
            url: format!("https://example.org/p?id={}&v=1", hour),
            authors: "A <Author>".into(),
            year: year.into(),
            first_seen: Utc.with_ymd_and_hms(2024, 3, 5, hour, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_channel_titles() {
        assert_eq!(Channel::new("http://x/", None).title, "Scholar Watcher");
        assert_eq!(Channel::new("http://x/", Some("mri")).title, "Scholar Watcher — mri");
    }

    #[test]
    fn test_rss_date_format() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap();
        assert_eq!(rss_date(dt), "Tue, 05 Mar 2024 09:07:01 GMT");
    }

    #[test]
    fn test_rendered_feed_parses_back() {
        let items = vec![seen("Newer & better result", "2024", 12), seen("Older", "", 8)];
        let channel = Channel::new("http://localhost:8080/", Some("graphs & networks"));
        let xml = render_rss(&channel, &items).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("&amp;v=1"));
        assert!(xml.contains("<description>A &lt;Author&gt;</description>"));
        assert!(xml.contains("<guid isPermaLink=\"false\">fp-12</guid>"));

        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        assert_eq!(feed.title.unwrap().content, "Scholar Watcher — graphs & networks");
        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.title.as_ref().unwrap().content, "Newer & better result (2024)");
        assert_eq!(first.links[0].href, "https://example.org/p?id=12&v=1");
        assert_eq!(
            first.published.unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap()
        );

        assert_eq!(feed.entries[1].title.as_ref().unwrap().content, "Older");
    }

    #[test]
    fn test_empty_feed() {
        let built = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let xml = render_rss_at(&Channel::new("http://x/", None), &[], built).unwrap();

        assert!(xml.contains("<lastBuildDate>Mon, 01 Jan 2024 00:00:00 GMT</lastBuildDate>"));
        assert!(!xml.contains("<item>"));
    }
}
