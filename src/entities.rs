//! Filter and entity extraction from database-request text

use regex::Regex;

use crate::types::{FilterKey, FilterValue, Filters};

/// Closed genre vocabulary, in match priority order
pub const GENRES: &[&str] = &[
    "action", "comedy", "drama", "horror", "sci-fi", "romance", "thriller", "adventure",
    "fantasy", "mystery", "crime", "animation", "documentary", "musical", "western",
];

/// Extract narrowing filters and quoted entities from user input
///
/// Genre and director follow fixed lexical rules. Rating thresholds
/// ("rated above 8") and quoted titles ("titled \"Heat\"") are lexical
/// extensions on top of those.
pub struct FilterExtractor {
    director: Regex,
    rating: Vec<Regex>,
    title: Regex,
    quoted: Regex,
}

impl FilterExtractor {
    pub fn new() -> Self {
        // Compile regex patterns once - these should never fail
        Self {
            director: Regex::new(r"\bby\s+([a-z]+)").expect("Invalid regex pattern"),
            rating: vec![
                Regex::new(r"\b(?:rating|rated)\s+(?:of\s+)?(?:above|over|at least|>=|>)\s*(\d+(?:\.\d+)?)")
                    .expect("Invalid regex pattern"),
                Regex::new(r"\babove\s+(\d+(?:\.\d+)?)\s+stars?\b").expect("Invalid regex pattern"),
            ],
            title: Regex::new(r#"(?i)\b(?:titled|called|named)\s+"([^"]+)""#)
                .expect("Invalid regex pattern"),
            quoted: Regex::new(r#""([^"]+)""#).expect("Invalid regex pattern"),
        }
    }

    /// Build the filter mapping for `text`. At most one value per key.
    pub fn extract(&self, text: &str) -> Filters {
        let mut filters = Filters::new();
        let text_lower = text.to_lowercase();

        if let Some(genre) = GENRES.iter().find(|g| text_lower.contains(*g)) {
            filters.insert(FilterKey::Genre, FilterValue::Text(title_case(genre)));
        }

        if let Some(name) = self
            .director
            .captures(&text_lower)
            .and_then(|cap| cap.get(1))
        {
            filters.insert(FilterKey::Director, FilterValue::Text(title_case(name.as_str())));
        }

        if let Some(threshold) = self.rating_threshold(&text_lower) {
            filters.insert(FilterKey::RatingMin, FilterValue::Number(threshold));
        }

        if let Some(title) = self
            .title
            .captures(text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty())
        {
            filters.insert(FilterKey::Title, FilterValue::text(title));
        }

        filters
    }

    /// Double-quoted spans, in order of appearance
    pub fn extract_entities(&self, text: &str) -> Vec<String> {
        self.quoted
            .captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn rating_threshold(&self, text_lower: &str) -> Option<f64> {
        self.rating
            .iter()
            .filter_map(|pattern| pattern.captures(text_lower))
            .filter_map(|cap| cap.get(1)?.as_str().parse::<f64>().ok())
            .find(|value| (0.0..=10.0).contains(value))
    }
}

impl Default for FilterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper-case the first letter of every alphabetic run and lower-case the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
