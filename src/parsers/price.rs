use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;

/// En-dash or em-dash between the two bounds of a price range.
static RANGE_DASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u{2013}\u{2014}]")
        .expect("Invalid range dash regex")
});

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₡', '₱'];
const CURRENCY_CODES: &[&str] = &["CLP", "USD", "EUR"];

/// Turns locale formatted price text such as `$12.990` or `$1.000 – $2.500`
/// into whole-unit integer candidates.
#[derive(Debug, Clone, Copy)]
pub struct PriceParser {
    thousands_separator: char,
}

impl Default for PriceParser {
    fn default() -> Self {
        Self {
            thousands_separator: '.',
        }
    }
}

/// Result of parsing a price that is allowed to fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceOutcome {
    Parsed(Vec<u64>),
    /// The text was unparsable; callers substitute a single zero candidate.
    Degraded(ParseError),
}

impl PriceOutcome {
    pub fn candidates(self) -> Vec<u64> {
        match self {
            PriceOutcome::Parsed(prices) => prices,
            PriceOutcome::Degraded(_) => vec![0],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, PriceOutcome::Degraded(_))
    }
}

impl PriceParser {
    pub fn new(thousands_separator: char) -> Self {
        Self {
            thousands_separator,
        }
    }

    /// Parse price text into one candidate, or two for a dash separated range.
    pub fn parse(&self, text: &str) -> Result<Vec<u64>, ParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }
        if !trimmed.chars().any(|c| c.is_ascii_digit()) {
            return Err(ParseError::NoDigits(trimmed.to_string()));
        }

        let cleaned = self.clean(trimmed);
        if RANGE_DASH.is_match(&cleaned) {
            RANGE_DASH
                .split(&cleaned)
                .map(|segment| parse_segment(segment, trimmed))
                .collect()
        } else {
            Ok(vec![parse_segment(&cleaned, trimmed)?])
        }
    }

    /// Like [`PriceParser::parse`] but never fails the caller.
    pub fn parse_or_default(&self, text: &str) -> PriceOutcome {
        match self.parse(text) {
            Ok(prices) => PriceOutcome::Parsed(prices),
            Err(e) => PriceOutcome::Degraded(e),
        }
    }

    fn clean(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for code in CURRENCY_CODES {
            cleaned = cleaned.replace(code, "");
        }

        cleaned
            .chars()
            .filter(|c| {
                !CURRENCY_SYMBOLS.contains(c) && *c != self.thousands_separator && !c.is_whitespace()
            })
            .collect()
    }
}

fn parse_segment(segment: &str, original: &str) -> Result<u64, ParseError> {
    if segment.is_empty() {
        return Err(ParseError::EmptySegment(original.to_string()));
    }
    if !segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::InvalidSegment(segment.to_string()));
    }

    segment
        .parse::<u64>()
        .map_err(|_| ParseError::Overflow(segment.to_string()))
}

/// Parse with the default `.` thousands separator.
pub fn parse_price(text: &str) -> Result<Vec<u64>, ParseError> {
    PriceParser::default().parse(text)
}
