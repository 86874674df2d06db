use anyhow::Result;
use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// (path, priority, changefreq)
const PAGES: [(&str, &str, &str); 5] = [
    ("index.html", "1.0", "monthly"),
    ("publications.html", "0.9", "monthly"),
    ("news.html", "0.8", "weekly"),
    ("resources.html", "0.7", "monthly"),
    ("activities.html", "0.6", "monthly"),
];

/// Build the urlset for the fixed site pages, all stamped with `lastmod`.
pub fn render_sitemap(site_root: &str, lastmod: NaiveDate) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let lastmod = lastmod.format("%Y-%m-%d").to_string();

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;
    for (path, priority, changefreq) in PAGES {
        let loc = format!("{}/{}", site_root, path);
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        for (tag, value) in [
            ("loc", loc.as_str()),
            ("lastmod", lastmod.as_str()),
            ("changefreq", changefreq),
            ("priority", priority),
        ] {
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            writer.write_event(Event::Text(BytesText::new(value)))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    let mut xml = String::from_utf8(writer.into_inner())?;
    xml.push('\n');
    Ok(xml)
}
