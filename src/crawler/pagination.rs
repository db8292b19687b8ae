//! Next-page resolution for listing pages

use crate::url::absolutize;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Links that usually belong to a pagination control, matched in document order
static PAGINATION_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"a[href*="page="], a[href*="p="], .pagination a[href], [class*="pagination"] a[href]"#,
    )
    .unwrap()
});

static REL_NEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[rel~="next"][href], link[rel~="next"][href]"#).unwrap());

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

static NEXT_CLASS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href][class*="next"], [class*="next"] a[href]"#).unwrap()
});

/// Query parameters that carry a page number
const PAGE_PARAMS: &[&str] = &["page", "p"];

/// Visible labels of a "next page" link
const NEXT_LABELS: &[&str] = &["next", "next page", "›", "»", ">"];

/// Resolves the URL of the page after `current_page`
///
/// Pagination controls are searched first for a link to `current_page + 1`,
/// by its label or its `page`/`p` query parameter. Failing that, the first
/// "next" link wins. Returns `None` when the listing has no further page.
///
/// # Example
///
/// ```
/// use practicelink_scraper::crawler::find_next_page;
/// use scraper::Html;
/// use url::Url;
///
/// let html = r#"<div class="pagination"><a href="?page=1">1</a><a href="?page=2">2</a></div>"#;
/// let base = Url::parse("https://jobs.practicelink.com/jobboard/jobsearchresults").unwrap();
/// let next = find_next_page(&Html::parse_document(html), &base, 1).unwrap();
/// assert_eq!(next.as_str(), "https://jobs.practicelink.com/jobboard/jobsearchresults?page=2");
/// ```
pub fn find_next_page(document: &Html, base_url: &Url, current_page: u32) -> Option<Url> {
    let wanted = current_page.saturating_add(1);

    let label = wanted.to_string();
    let numbered = document.select(&PAGINATION_LINKS).find_map(|element| {
        let url = resolve(element, base_url)?;
        (label_of(element) == label || page_param(&url) == Some(wanted)).then_some(url)
    });
    if numbered.is_some() {
        return numbered;
    }

    document
        .select(&REL_NEXT)
        .find_map(|element| resolve(element, base_url))
        .or_else(|| {
            document
                .select(&ANCHORS)
                .filter(|element| is_next_label(&label_of(*element)))
                .find_map(|element| resolve(element, base_url))
        })
        .or_else(|| {
            document
                .select(&NEXT_CLASS)
                .find_map(|element| resolve(element, base_url))
        })
}

fn resolve(element: ElementRef<'_>, base_url: &Url) -> Option<Url> {
    absolutize(element.value().attr("href")?, base_url)
}

fn label_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn is_next_label(label: &str) -> bool {
    let label = label.to_lowercase();
    NEXT_LABELS.contains(&label.as_str())
        || NEXT_LABELS.contains(&label.trim_end_matches(['›', '»', '>']).trim())
}

/// The page number carried in the query string, if any
fn page_param(url: &Url) -> Option<u32> {
    url.query_pairs()
        .find(|(key, _)| PAGE_PARAMS.iter().any(|param| *key == *param))
        .and_then(|(_, value)| value.trim().parse().ok())
}
