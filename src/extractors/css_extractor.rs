//! CSS selector helpers
//!
//! Thin wrappers over the scraper crate that work on an element scope
//! instead of re-parsing the whole document for every lookup.

use scraper::{ElementRef, Html, Selector};

/// Compile a selector literal. Only used for the static selectors below
/// and in the extractor modules; a typo there is a programming error.
pub(crate) fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// Concatenated text of an element, trimmed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First element under `scope` matching `selector`
pub(crate) fn first_match<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Trimmed text of the first element under `scope` matching `selector`
pub(crate) fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    first_match(scope, selector).map(element_text)
}

/// Every text node of the document, concatenated
pub(crate) fn document_text(document: &Html) -> String {
    document.root_element().text().collect()
}
