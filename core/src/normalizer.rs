use scraper::Html;
use unicode_normalization::UnicodeNormalization;

/// NFKC-normalize, lowercase and strip markup from raw field text.
pub fn normalize(text: &str) -> String {
    strip_markup(&fold(text))
}

/// Compatibility-fold and lowercase. Index text and query input both go through here.
pub fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Drop tags and keep the text they enclose, in reading order.
///
/// Parsing goes through html5ever, which recovers from any input, so broken
/// markup degrades into plain text instead of failing.
pub fn strip_markup(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect()
}
