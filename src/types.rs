//! Core data types flowing through the compiler

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Raw user input plus an optional display name for the speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub speaker: Option<String>,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker: None,
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }
}

/// What kind of message the user sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationLabel {
    Greeting,
    Goodbye,
    SmallTalk,
    Help,
    DatabaseRequest,
    Unclear,
}

impl ClassificationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::Greeting => "greeting",
            ClassificationLabel::Goodbye => "goodbye",
            ClassificationLabel::SmallTalk => "small_talk",
            ClassificationLabel::Help => "help",
            ClassificationLabel::DatabaseRequest => "database_request",
            ClassificationLabel::Unclear => "unclear",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query shape requested by a database utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Search,
    Filter,
    Aggregate,
    Count,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::Search => "search",
            IntentType::Filter => "filter",
            IntentType::Aggregate => "aggregate",
            IntentType::Count => "count",
        }
    }
}

/// Ranking or summary strategy applied during synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    MostWatched,
    HighestRated,
    CountTotal,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::MostWatched => "most_watched",
            Aggregation::HighestRated => "highest_rated",
            Aggregation::CountTotal => "count_total",
        }
    }
}

/// Narrowing predicate keys. Declaration order is the order predicates are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Genre,
    Director,
    RatingMin,
    Title,
}

/// A filter value; text is quoted when rendered, numbers are not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            FilterValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Filter mapping. A `BTreeMap` keeps iteration order fixed across clones.
pub type Filters = BTreeMap<FilterKey, FilterValue>;

/// Possibly open-ended date interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TimeRange {
    /// Returns `None` when both sides are absent
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            None
        } else {
            Some(Self { start, end })
        }
    }

    pub fn closed(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn starting(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn ending(end: NaiveDate) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }
}

/// Structured representation of a database request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent_type: IntentType,
    pub entities: Vec<String>,
    pub filters: Filters,
    pub aggregation: Option<Aggregation>,
    pub time_range: Option<TimeRange>,
}

impl Intent {
    pub fn new(intent_type: IntentType, aggregation: Option<Aggregation>) -> Self {
        Self {
            intent_type,
            entities: Vec::new(),
            filters: Filters::new(),
            aggregation,
            time_range: None,
        }
    }

    /// Check that `intent_type` and `aggregation` form a shape the synthesizer knows
    /// and that every numeric filter can be written as a SQL literal
    pub fn validate(&self) -> Result<(), CompileError> {
        if let Some((key, value)) = self
            .filters
            .iter()
            .find(|(_, v)| matches!(v, FilterValue::Number(n) if !n.is_finite()))
        {
            return Err(CompileError::Synthesis(format!(
                "filter {:?} has non-finite value {}",
                key, value
            )));
        }

        match (self.intent_type, self.aggregation) {
            (IntentType::Count, Some(Aggregation::CountTotal)) => Ok(()),
            (IntentType::Count, other) => Err(CompileError::Synthesis(format!(
                "count intent requires count_total aggregation, got {:?}",
                other.map(|a| a.as_str())
            ))),
            (_, Some(Aggregation::CountTotal)) => Err(CompileError::Synthesis(format!(
                "count_total aggregation is only valid for count intents, got {}",
                self.intent_type.as_str()
            ))),
            (IntentType::Aggregate, None) => Err(CompileError::Synthesis(
                "aggregate intent requires an aggregation".to_string(),
            )),
            (IntentType::Aggregate, Some(_)) => Ok(()),
            (IntentType::Filter | IntentType::Search, Some(a)) => {
                Err(CompileError::Synthesis(format!(
                    "{} intent cannot carry aggregation {}",
                    self.intent_type.as_str(),
                    a.as_str()
                )))
            }
            (IntentType::Filter | IntentType::Search, None) => Ok(()),
        }
    }
}

/// One complete, executable query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqlStatement(String);

impl SqlStatement {
    pub(crate) fn new(sql: String) -> Self {
        Self(sql)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for SqlStatement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_both_absent_is_none() {
        assert!(TimeRange::new(None, None).is_none());
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(TimeRange::new(Some(d), None), Some(TimeRange::starting(d)));
    }

    #[test]
    fn test_validate_rejects_mismatched_count() {
        let intent = Intent::new(IntentType::Count, None);
        assert!(matches!(intent.validate(), Err(CompileError::Synthesis(_))));

        let intent = Intent::new(IntentType::Filter, Some(Aggregation::CountTotal));
        assert!(intent.validate().is_err());

        let intent = Intent::new(IntentType::Aggregate, None);
        assert!(intent.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_numbers() {
        let mut intent = Intent::new(IntentType::Search, None);
        intent.filters.insert(FilterKey::RatingMin, FilterValue::Number(f64::NEG_INFINITY));
        assert!(matches!(intent.validate(), Err(CompileError::Synthesis(_))));
    }

    #[test]
    fn test_validate_accepts_known_shapes() {
        assert!(Intent::new(IntentType::Count, Some(Aggregation::CountTotal)).validate().is_ok());
        assert!(Intent::new(IntentType::Aggregate, Some(Aggregation::MostWatched)).validate().is_ok());
        assert!(Intent::new(IntentType::Search, None).validate().is_ok());
    }

    #[test]
    fn test_intent_serializes_snake_case() {
        let mut intent = Intent::new(IntentType::Aggregate, Some(Aggregation::HighestRated));
        intent.filters.insert(FilterKey::RatingMin, FilterValue::Number(8.0));
        intent.filters.insert(FilterKey::Genre, FilterValue::text("Drama"));

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["intent_type"], "aggregate");
        assert_eq!(json["aggregation"], "highest_rated");
        assert_eq!(json["filters"]["genre"], "Drama");
        assert_eq!(json["filters"]["rating_min"], 8.0);

        let back: Intent = serde_json::from_value(json).unwrap();
        assert_eq!(back, intent);
    }
}
