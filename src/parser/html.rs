//! Small helpers over `scraper` shared by the page extractors.

use scraper::{ElementRef, Html, Selector};

use crate::utils::collapse_whitespace;

/// Visible text with whitespace collapsed. Entities are already decoded by the parser.
pub fn text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Non-empty `href` targets at or below `el`, in document order.
pub fn hrefs(el: ElementRef<'_>) -> Vec<String> {
    let anchor_selector = Selector::parse("a[href]").unwrap();
    el.select(&anchor_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether some ancestor of `el` also matches `selector`.
pub fn has_matching_ancestor(el: ElementRef<'_>, selector: &Selector) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| selector.matches(&a))
}

/// Every text node of the document containing `needle`, as its parent element.
pub fn elements_with_text<'a>(document: &'a Html, needle: &str) -> Vec<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter(|n| n.value().as_text().is_some_and(|t| t.contains(needle)))
        .filter_map(|n| n.parent().and_then(ElementRef::wrap))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNIPPET: &str = r#"
        <div class="pub list" data-publication>
            <div class="inner"><b>Korol</b> &amp; co&nbsp;&eacute;t&#233;</div>
            <img src="x.png">
            <a href=" https://doi.org/10.1/x ">doi</a>
            <a href="">empty</a>
        </div>
        <p id='p2'>second <!-- hidden --> line</p>
    "#;

    #[test]
    fn text_decodes_entities_and_skips_comments() {
        let doc = Html::parse_document(SNIPPET);
        let inner = doc.select(&Selector::parse(".inner").unwrap()).next().unwrap();
        assert_eq!(text(inner), "Korol & co été");

        let p = doc.select(&Selector::parse("#p2").unwrap()).next().unwrap();
        assert_eq!(text(p), "second line");
    }

    #[test]
    fn hrefs_are_trimmed_and_non_empty() {
        let doc = Html::parse_document(SNIPPET);
        assert_eq!(hrefs(doc.root_element()), vec!["https://doi.org/10.1/x"]);
    }

    #[test]
    fn ancestors_are_checked_not_self() {
        let doc = Html::parse_document(SNIPPET);
        let marked = Selector::parse("[data-publication]").unwrap();
        let outer = doc.select(&marked).next().unwrap();
        let inner = doc.select(&Selector::parse(".inner").unwrap()).next().unwrap();
        assert!(!has_matching_ancestor(outer, &marked));
        assert!(has_matching_ancestor(inner, &marked));
    }

    #[test]
    fn text_nodes_map_to_their_parent() {
        let doc = Html::parse_document("<p>Prof <span>@</span> U</p><p>a@b.c</p>");
        let tags: Vec<&str> = elements_with_text(&doc, "@")
            .iter()
            .map(|e| e.value().name())
            .collect();
        assert_eq!(tags, vec!["span", "p"]);
    }
}
