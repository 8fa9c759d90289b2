//! Page metadata extraction (title, description, language, canonical).

use scraper::{Html, Selector};

use sitescope_shared::PageMetadata;

/// Derive page metadata from a parsed document.
///
/// Preference order mirrors what most pages actually populate:
/// og:title over `<title>`, plain meta description over
/// og:description. The language tag must be a plausible 2–5 character
/// value or it falls back to "en".
pub fn extract_metadata(doc: &Html) -> PageMetadata {
    PageMetadata {
        title: extract_title(doc),
        description: extract_description(doc),
        language: extract_language(doc),
        canonical: extract_canonical(doc),
    }
}

fn extract_title(doc: &Html) -> String {
    let og_title = Selector::parse("meta[property='og:title']").unwrap();
    if let Some(content) = doc
        .select(&og_title)
        .find_map(|el| el.value().attr("content"))
    {
        let content = content.trim();
        if !content.is_empty() {
            return content.to_string();
        }
    }

    let title = Selector::parse("title").unwrap();
    doc.select(&title)
        .next()
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

fn extract_description(doc: &Html) -> String {
    for selector_str in ["meta[name='description']", "meta[property='og:description']"] {
        let selector = Selector::parse(selector_str).unwrap();
        if let Some(content) = doc
            .select(&selector)
            .find_map(|el| el.value().attr("content"))
        {
            let content = content.trim();
            if !content.is_empty() {
                return content.to_string();
            }
        }
    }
    String::new()
}

fn extract_language(doc: &Html) -> String {
    let html = Selector::parse("html").unwrap();
    doc.select(&html)
        .next()
        .and_then(|el| el.value().attr("lang"))
        .map(str::trim)
        .filter(|lang| (2..=5).contains(&lang.chars().count()))
        .map(str::to_string)
        .unwrap_or_else(|| "en".into())
}

fn extract_canonical(doc: &Html) -> Option<String> {
    let canonical = Selector::parse("link[rel='canonical']").unwrap();
    doc.select(&canonical)
        .find_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_title_wins_over_title_tag() {
        let doc = Html::parse_document(
            "<html><head>\
             <title>Plain Title</title>\
             <meta property='og:title' content=' OG Title '>\
             </head><body></body></html>",
        );
        assert_eq!(extract_metadata(&doc).title, "OG Title");
    }

    #[test]
    fn title_tag_is_the_fallback() {
        let doc =
            Html::parse_document("<html><head><title> Plain Title </title></head></html>");
        assert_eq!(extract_metadata(&doc).title, "Plain Title");
    }

    #[test]
    fn description_prefers_plain_meta() {
        let doc = Html::parse_document(
            "<html><head>\
             <meta name='description' content='plain desc'>\
             <meta property='og:description' content='og desc'>\
             </head></html>",
        );
        assert_eq!(extract_metadata(&doc).description, "plain desc");

        let doc = Html::parse_document(
            "<html><head>\
             <meta property='og:description' content='og desc'>\
             </head></html>",
        );
        assert_eq!(extract_metadata(&doc).description, "og desc");
    }

    #[test]
    fn language_tag_validation() {
        let doc = Html::parse_document("<html lang='de-AT'><body></body></html>");
        assert_eq!(extract_metadata(&doc).language, "de-AT");

        let doc = Html::parse_document("<html lang='x'><body></body></html>");
        assert_eq!(extract_metadata(&doc).language, "en");

        let doc = Html::parse_document("<html><body></body></html>");
        assert_eq!(extract_metadata(&doc).language, "en");
    }

    #[test]
    fn canonical_link() {
        let doc = Html::parse_document(
            "<html><head>\
             <link rel='canonical' href='https://example.com/real'>\
             </head></html>",
        );
        assert_eq!(
            extract_metadata(&doc).canonical.as_deref(),
            Some("https://example.com/real")
        );

        let doc = Html::parse_document("<html><head></head></html>");
        assert_eq!(extract_metadata(&doc).canonical, None);
    }

    #[test]
    fn empty_document_gives_defaults() {
        let meta = extract_metadata(&Html::parse_document("<html></html>"));
        assert_eq!(meta, PageMetadata::default());
    }
}
