//! SQL synthesis from a structured [`Intent`]
//!
//! Targets a fixed two-table schema: `movies` and `movie_viewership`, joined on
//! `movies.id = movie_viewership.movie_id`. Literals are inlined into the
//! statement text; string literals are single-quoted with embedded quotes
//! doubled and nothing else escaped.

use tracing::warn;

use crate::error::CompileError;
use crate::types::{Aggregation, FilterKey, FilterValue, Filters, Intent, IntentType, SqlStatement, TimeRange};

const COUNT_SELECT: &str = "SELECT COUNT(*) AS total FROM movies";
const MOST_WATCHED_SELECT: &str = "SELECT m.*, SUM(mv.views_count) AS total_views FROM movies m \
                                   LEFT JOIN movie_viewership mv ON m.id = mv.movie_id";
const MOVIES_SELECT: &str = "SELECT m.* FROM movies m";

/// Converts intents into executable statements
#[derive(Debug, Clone, Copy)]
pub struct SqlSynthesizer {
    list_limit: u32,
    ranked_limit: u32,
}

impl SqlSynthesizer {
    pub fn new(list_limit: u32, ranked_limit: u32) -> Self {
        Self {
            list_limit,
            ranked_limit,
        }
    }

    /// Build the statement for `intent`. Invalid shape combinations fail instead of
    /// producing malformed SQL.
    pub fn synthesize(&self, intent: &Intent) -> Result<SqlStatement, CompileError> {
        if let Err(e) = intent.validate() {
            warn!(error = %e, "refusing to synthesize invalid intent");
            return Err(e);
        }

        let sql = match (intent.intent_type, intent.aggregation) {
            (IntentType::Count, _) => self.count(&intent.filters),
            (IntentType::Aggregate, Some(Aggregation::MostWatched)) => {
                self.most_watched(&intent.filters, intent.time_range.as_ref())
            }
            (IntentType::Aggregate, Some(Aggregation::HighestRated)) => {
                self.highest_rated(&intent.filters)
            }
            // validate() rules out every other aggregate combination
            (IntentType::Aggregate, _) => {
                return Err(CompileError::Synthesis(
                    "unsupported aggregate combination".to_string(),
                ))
            }
            (IntentType::Filter | IntentType::Search, _) => self.list(&intent.filters),
        };

        Ok(SqlStatement::new(sql))
    }

    fn count(&self, filters: &Filters) -> String {
        let mut sql = COUNT_SELECT.to_string();
        let predicates: Vec<String> = filter_predicates(filters, "").collect();
        push_where(&mut sql, &predicates);
        sql
    }

    fn most_watched(&self, filters: &Filters, time_range: Option<&TimeRange>) -> String {
        let mut sql = MOST_WATCHED_SELECT.to_string();

        let mut predicates = Vec::new();
        if let Some(p) = time_range.and_then(view_date_predicate) {
            predicates.push(p);
        }
        predicates.extend(filter_predicates(filters, "m."));
        push_where(&mut sql, &predicates);

        sql.push_str(&format!(
            " GROUP BY m.id ORDER BY total_views DESC LIMIT {}",
            self.ranked_limit
        ));
        sql
    }

    fn highest_rated(&self, filters: &Filters) -> String {
        let mut sql = MOVIES_SELECT.to_string();

        let mut predicates = vec!["m.rating IS NOT NULL".to_string()];
        predicates.extend(filter_predicates(filters, "m."));
        push_where(&mut sql, &predicates);

        sql.push_str(&format!(" ORDER BY m.rating DESC LIMIT {}", self.ranked_limit));
        sql
    }

    fn list(&self, filters: &Filters) -> String {
        let mut sql = MOVIES_SELECT.to_string();
        let predicates: Vec<String> = filter_predicates(filters, "m.").collect();
        push_where(&mut sql, &predicates);
        sql.push_str(&format!(" LIMIT {}", self.list_limit));
        sql
    }
}

impl Default for SqlSynthesizer {
    fn default() -> Self {
        Self::new(20, 10)
    }
}

fn push_where(sql: &mut String, predicates: &[String]) {
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
}

fn view_date_predicate(range: &TimeRange) -> Option<String> {
    match (range.start, range.end) {
        (Some(start), Some(end)) => Some(format!(
            "mv.view_date BETWEEN '{}' AND '{}'",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )),
        (Some(start), None) => Some(format!("mv.view_date >= '{}'", start.format("%Y-%m-%d"))),
        (None, Some(end)) => Some(format!("mv.view_date <= '{}'", end.format("%Y-%m-%d"))),
        (None, None) => None,
    }
}

/// One predicate per filter, in key order, with columns prefixed by `qualifier`
fn filter_predicates<'a>(filters: &'a Filters, qualifier: &'a str) -> impl Iterator<Item = String> + 'a {
    filters.iter().map(move |(key, value)| match key {
        FilterKey::Genre => format!("{}genre = {}", qualifier, literal(value)),
        FilterKey::Director => format!("{}director LIKE {}", qualifier, like_literal(value)),
        FilterKey::RatingMin => format!("{}rating >= {}", qualifier, numeric(value)),
        FilterKey::Title => format!("{}title LIKE {}", qualifier, like_literal(value)),
    })
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn literal(value: &FilterValue) -> String {
    match value {
        FilterValue::Text(s) => quote(s),
        FilterValue::Number(n) => n.to_string(),
    }
}

fn like_literal(value: &FilterValue) -> String {
    quote(&format!("%{}%", value))
}

fn numeric(value: &FilterValue) -> String {
    match value {
        FilterValue::Number(n) => n.to_string(),
        FilterValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => n.to_string(),
            _ => quote(s),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_count_without_filters() {
        let intent = Intent::new(IntentType::Count, Some(Aggregation::CountTotal));
        let sql = SqlSynthesizer::default().synthesize(&intent).unwrap();
        assert_eq!(sql.as_str(), "SELECT COUNT(*) AS total FROM movies");
    }

    #[test]
    fn test_count_with_filters_ignores_time_range() {
        let mut intent = Intent::new(IntentType::Count, Some(Aggregation::CountTotal));
        intent.filters.insert(FilterKey::Director, FilterValue::text("Nolan"));
        intent.filters.insert(FilterKey::Genre, FilterValue::text("Drama"));
        intent.time_range = Some(TimeRange::starting(date(2024, 1, 1)));

        let sql = SqlSynthesizer::default().synthesize(&intent).unwrap();
        assert_eq!(
            sql.as_str(),
            "SELECT COUNT(*) AS total FROM movies WHERE genre = 'Drama' AND director LIKE '%Nolan%'"
        );
    }

    #[test]
    fn test_most_watched_between() {
        let mut intent = Intent::new(IntentType::Aggregate, Some(Aggregation::MostWatched));
        intent.time_range = Some(TimeRange::closed(date(2025, 1, 1), date(2025, 12, 31)));
        intent.filters.insert(FilterKey::Genre, FilterValue::text("Drama"));

        let sql = SqlSynthesizer::default().synthesize(&intent).unwrap();
        assert_eq!(
            sql.as_str(),
            "SELECT m.*, SUM(mv.views_count) AS total_views FROM movies m \
             LEFT JOIN movie_viewership mv ON m.id = mv.movie_id \
             WHERE mv.view_date BETWEEN '2025-01-01' AND '2025-12-31' AND m.genre = 'Drama' \
             GROUP BY m.id ORDER BY total_views DESC LIMIT 10"
        );
    }

    #[test]
    fn test_most_watched_open_ranges() {
        let synth = SqlSynthesizer::default();

        let mut intent = Intent::new(IntentType::Aggregate, Some(Aggregation::MostWatched));
        intent.time_range = Some(TimeRange::starting(date(2024, 1, 1)));
        assert!(synth.synthesize(&intent).unwrap().as_str().contains("WHERE mv.view_date >= '2024-01-01' GROUP BY"));

        intent.time_range = Some(TimeRange::ending(date(2024, 6, 1)));
        assert!(synth.synthesize(&intent).unwrap().as_str().contains("WHERE mv.view_date <= '2024-06-01' GROUP BY"));

        // Filters alone start the WHERE clause
        intent.time_range = None;
        intent.filters.insert(FilterKey::RatingMin, FilterValue::Number(8.0));
        let sql = synth.synthesize(&intent).unwrap();
        assert!(sql.as_str().contains("mv.movie_id WHERE m.rating >= 8 GROUP BY"));
    }

    #[test]
    fn test_highest_rated_has_no_join() {
        let mut intent = Intent::new(IntentType::Aggregate, Some(Aggregation::HighestRated));
        intent.filters.insert(FilterKey::Genre, FilterValue::text("Horror"));

        let sql = SqlSynthesizer::default().synthesize(&intent).unwrap();
        assert_eq!(
            sql.as_str(),
            "SELECT m.* FROM movies m WHERE m.rating IS NOT NULL AND m.genre = 'Horror' ORDER BY m.rating DESC LIMIT 10"
        );
        assert!(!sql.as_str().contains("movie_viewership"));
    }

    #[test]
    fn test_list_shape() {
        let synth = SqlSynthesizer::new(5, 10);
        let intent = Intent::new(IntentType::Search, None);
        assert_eq!(synth.synthesize(&intent).unwrap().as_str(), "SELECT m.* FROM movies m LIMIT 5");

        let mut intent = Intent::new(IntentType::Filter, None);
        intent.filters.insert(FilterKey::Title, FilterValue::text("Ocean's Eleven"));
        intent.filters.insert(FilterKey::RatingMin, FilterValue::Number(7.5));
        assert_eq!(
            synth.synthesize(&intent).unwrap().as_str(),
            "SELECT m.* FROM movies m WHERE m.rating >= 7.5 AND m.title LIKE '%Ocean''s Eleven%' LIMIT 5"
        );
    }

    #[test]
    fn test_invalid_intent_fails_loudly() {
        let intent = Intent::new(IntentType::Aggregate, None);
        assert!(matches!(
            SqlSynthesizer::default().synthesize(&intent),
            Err(CompileError::Synthesis(_))
        ));
    }

    #[test]
    fn test_non_finite_rating_is_rejected() {
        let synth = SqlSynthesizer::default();

        let mut intent = Intent::new(IntentType::Filter, None);
        intent.filters.insert(FilterKey::RatingMin, FilterValue::Number(f64::NAN));
        assert!(matches!(synth.synthesize(&intent), Err(CompileError::Synthesis(_))));

        let mut intent = Intent::new(IntentType::Count, Some(Aggregation::CountTotal));
        intent.filters.insert(FilterKey::RatingMin, FilterValue::Number(f64::INFINITY));
        assert!(matches!(synth.synthesize(&intent), Err(CompileError::Synthesis(_))));
    }

    #[test]
    fn test_text_rating_that_is_not_finite_stays_quoted() {
        let mut intent = Intent::new(IntentType::Search, None);
        intent.filters.insert(FilterKey::RatingMin, FilterValue::text("nan"));
        let sql = SqlSynthesizer::default().synthesize(&intent).unwrap();
        assert_eq!(sql.as_str(), "SELECT m.* FROM movies m WHERE m.rating >= 'nan' LIMIT 20");
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        let mut intent = Intent::new(IntentType::Aggregate, Some(Aggregation::MostWatched));
        intent.filters.insert(FilterKey::Title, FilterValue::text("Heat"));
        intent.filters.insert(FilterKey::Genre, FilterValue::text("Crime"));
        intent.filters.insert(FilterKey::Director, FilterValue::text("Mann"));

        let synth = SqlSynthesizer::default();
        let first = synth.synthesize(&intent).unwrap();
        let second = synth.synthesize(&intent.clone()).unwrap();
        assert_eq!(first, second);
    }
}
