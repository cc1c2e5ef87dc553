//! Intent assembly - picks the query shape and folds in extracted pieces

use tracing::debug;

use crate::error::CompileError;
use crate::types::{Aggregation, ClassificationLabel, Filters, Intent, IntentType, TimeRange};

/// A phrase rule: any phrase present selects the intent type and aggregation
#[derive(Debug, Clone, Copy)]
pub struct IntentRule {
    pub phrases: &'static [&'static str],
    pub intent_type: IntentType,
    pub aggregation: Option<Aggregation>,
}

/// Checked in order; the first rule with a matching phrase wins
pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        phrases: &["how many", "count", "total number", "number of"],
        intent_type: IntentType::Count,
        aggregation: Some(Aggregation::CountTotal),
    },
    IntentRule {
        phrases: &["most watched", "popular", "trending"],
        intent_type: IntentType::Aggregate,
        aggregation: Some(Aggregation::MostWatched),
    },
    IntentRule {
        phrases: &["highest rated", "best rated", "top rated"],
        intent_type: IntentType::Aggregate,
        aggregation: Some(Aggregation::HighestRated),
    },
    IntentRule {
        phrases: &["find", "show", "get", "list"],
        intent_type: IntentType::Filter,
        aggregation: None,
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentAssembler;

impl IntentAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Infer `(intent_type, aggregation)` from text; defaults to a plain search
    pub fn infer_shape(&self, text: &str) -> (IntentType, Option<Aggregation>) {
        let text_lower = text.to_lowercase();
        INTENT_RULES
            .iter()
            .find(|rule| rule.phrases.iter().any(|p| text_lower.contains(p)))
            .map(|rule| (rule.intent_type, rule.aggregation))
            .unwrap_or((IntentType::Search, None))
    }

    /// Combine classifier, extractor and resolver output into an [`Intent`]
    pub fn assemble(
        &self,
        label: ClassificationLabel,
        text: &str,
        filters: Filters,
        entities: Vec<String>,
        time_range: Option<TimeRange>,
    ) -> Result<Intent, CompileError> {
        if label != ClassificationLabel::DatabaseRequest {
            return Err(CompileError::NotADatabaseRequest { label });
        }

        let (intent_type, aggregation) = self.infer_shape(text);

        if filters.is_empty() {
            debug!("no filters recognized");
        }
        if time_range.is_none() {
            debug!("no time range recognized");
        }

        Ok(Intent {
            intent_type,
            entities,
            filters,
            aggregation,
            time_range,
        })
    }
}
