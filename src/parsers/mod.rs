pub mod price;

pub use price::*;

use html_escape::decode_html_entities;
use scraper::{ElementRef, Selector};

/// Clean and normalize text by removing extra whitespace and decoding HTML entities
pub fn clean_text(text: &str) -> String {
    let decoded = decode_html_entities(text);
    decoded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Cleaned text of every element under `element` matching `selector`.
pub fn select_texts(element: &ElementRef<'_>, selector: &Selector) -> Vec<String> {
    element
        .select(selector)
        .map(|node| clean_text(&node.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace_and_entities() {
        assert_eq!(clean_text("  Vino&nbsp;tinto \n  750 ml "), "Vino tinto 750 ml");
        assert_eq!(clean_text("Aceite &amp; vinagre"), "Aceite & vinagre");
    }
}
