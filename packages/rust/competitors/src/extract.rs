//! Competitor extraction from a search results page.

use std::collections::HashSet;

use scraper::{Html, Selector};
use serde::Serialize;
use tracing::debug;
use url::Url;

/// A competitor found in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Competitor {
    /// Human-readable label derived from the link.
    pub name: String,
    /// Unwrapped target URL.
    pub url: String,
}

/// Pull up to `limit` competitors from anchors whose target path contains
/// `path_marker`. Labels are de-duplicated; the drug itself is never listed.
pub fn extract_competitors(
    html: &str,
    base_url: &Url,
    drug: &str,
    path_marker: &str,
    limit: usize,
) -> Vec<Competitor> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").expect("static selector");
    let drug_slug = slugify(drug);

    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for el in doc.select(&link_sel) {
        if found.len() >= limit {
            break;
        }
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Some(target) = resolve_target(href, base_url) else {
            continue;
        };
        if !target.path().contains(path_marker) {
            continue;
        }
        let Some(name) = competitor_label(&target, &drug_slug) else {
            continue;
        };
        if slugify(&name) == drug_slug || !seen.insert(name.to_lowercase()) {
            continue;
        }
        debug!(%name, url = %target, "competitor link");
        found.push(Competitor {
            name,
            url: target.to_string(),
        });
    }

    found
}

/// Resolve an anchor href to the page it ultimately points at.
///
/// Search engines wrap results in redirect links carrying the real target in
/// a `uddg` (or `url`) query parameter.
fn resolve_target(href: &str, base_url: &Url) -> Option<Url> {
    if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    let url = base_url.join(href).ok()?;

    let wrapped = url
        .query_pairs()
        .find(|(k, _)| k == "uddg" || k == "url")
        .and_then(|(_, v)| Url::parse(&v).ok());

    Some(wrapped.unwrap_or(url))
}

/// Label from the last path segment: extension dropped, for `a-vs-b` the
/// side that is not the drug, hyphens to spaces, words title-cased.
pub fn competitor_label(url: &Url, drug_slug: &str) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let stem = segment.split('.').next().unwrap_or(segment);

    let chosen = match stem.split_once("-vs-") {
        Some((left, right)) if left.eq_ignore_ascii_case(drug_slug) => right,
        Some((left, right)) if right.eq_ignore_ascii_case(drug_slug) => left,
        _ => stem,
    };

    let label = chosen
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(title_word)
        .collect::<Vec<_>>()
        .join(" ");

    (!label.is_empty()).then_some(label)
}

fn title_word(word: &str) -> String {
    if word.eq_ignore_ascii_case("vs") {
        return "vs".into();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"Humira Pen "` → `"humira-pen"`.
pub fn slugify(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://html.duckduckgo.com/html/").unwrap()
    }

    #[test]
    fn label_picks_the_other_side_of_vs() {
        let url = Url::parse("https://www.drugs.com/compare/ozempic-vs-trulicity").unwrap();
        assert_eq!(competitor_label(&url, "ozempic").as_deref(), Some("Trulicity"));
        let url = Url::parse("https://www.drugs.com/compare/mounjaro-vs-ozempic").unwrap();
        assert_eq!(competitor_label(&url, "ozempic").as_deref(), Some("Mounjaro"));
    }

    #[test]
    fn label_without_vs_is_title_cased_slug() {
        let url = Url::parse("https://www.drugs.com/compare/victoza-pen.html").unwrap();
        assert_eq!(competitor_label(&url, "ozempic").as_deref(), Some("Victoza Pen"));
        let url = Url::parse("https://www.drugs.com/compare/a-vs-b").unwrap();
        assert_eq!(competitor_label(&url, "ozempic").as_deref(), Some("A vs B"));
    }

    #[test]
    fn redirect_links_are_unwrapped() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.drugs.com%2Fcompare%2Fozempic-vs-rybelsus&rut=abc";
        let target = resolve_target(href, &base()).unwrap();
        assert_eq!(target.as_str(), "https://www.drugs.com/compare/ozempic-vs-rybelsus");
    }

    #[test]
    fn extraction_filters_dedupes_and_caps() {
        let html = r##"<html><body>
            <a href="https://www.drugs.com/compare/ozempic-vs-trulicity">Ozempic vs Trulicity</a>
            <a href="https://www.drugs.com/ozempic.html">Ozempic</a>
            <a href="https://www.drugs.com/compare/trulicity-vs-ozempic">dup</a>
            <a href="#top">top</a>
            <a href="https://www.drugs.com/compare/mounjaro-vs-ozempic">Mounjaro</a>
            <a href="https://www.drugs.com/compare/ozempic">self</a>
            <a href="https://www.drugs.com/compare/ozempic-vs-victoza">Victoza</a>
            <a href="https://www.drugs.com/compare/ozempic-vs-byetta">Byetta</a>
        </body></html>"##;

        let found = extract_competitors(html, &base(), "Ozempic", "/compare/", 3);
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Trulicity", "Mounjaro", "Victoza"]);
    }

    #[test]
    fn no_matching_links_yields_empty() {
        let html = r#"<a href="https://example.com/about">About</a>"#;
        assert!(extract_competitors(html, &base(), "x", "/compare/", 3).is_empty());
    }

    #[test]
    fn slugify_normalizes_whitespace_and_case() {
        assert_eq!(slugify("  Humira   Pen "), "humira-pen");
    }
}
