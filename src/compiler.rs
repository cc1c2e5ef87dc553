//! Query compiler - text in, intent and SQL out
//!
//! Wires the classifier, extractor, time-range resolver, assembler and
//! synthesizer into one immutable value. It holds no mutable state and can be
//! shared across threads by reference.

use tracing::debug;

use crate::assembler::IntentAssembler;
use crate::classifier::UtteranceClassifier;
use crate::config::CompilerConfig;
use crate::entities::FilterExtractor;
use crate::error::{CompileError, Result};
use crate::sql::SqlSynthesizer;
use crate::time_range::TimeRangeResolver;
use crate::types::{ClassificationLabel, Intent, SqlStatement};

pub struct QueryCompiler {
    classifier: UtteranceClassifier,
    extractor: FilterExtractor,
    resolver: TimeRangeResolver,
    assembler: IntentAssembler,
    synthesizer: SqlSynthesizer,
}

impl QueryCompiler {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            classifier: UtteranceClassifier::with_short_utterance_words(
                config.max_short_utterance_words,
            ),
            extractor: FilterExtractor::new(),
            resolver: TimeRangeResolver::new(config.between_end_day, config.open_year_fallback),
            assembler: IntentAssembler::new(),
            synthesizer: SqlSynthesizer::new(config.list_limit, config.ranked_limit),
        }
    }

    pub fn classifier(&self) -> &UtteranceClassifier {
        &self.classifier
    }

    pub fn classify(&self, text: &str) -> ClassificationLabel {
        self.classifier.classify(text)
    }

    /// Parse a database request into an [`Intent`]
    ///
    /// Fails with [`CompileError::NotADatabaseRequest`] for conversational text.
    /// Missing filters or time ranges are not errors; those fields stay empty.
    pub fn compile(&self, text: &str) -> Result<Intent> {
        let label = self.classify(text);
        if label != ClassificationLabel::DatabaseRequest {
            debug!(%label, "utterance is conversational");
            return Err(CompileError::NotADatabaseRequest { label });
        }

        let filters = self.extractor.extract(text);
        let entities = self.extractor.extract_entities(text);
        let time_range = match self.resolver.try_resolve(text) {
            Ok(range) => Some(range),
            Err(e) => {
                debug!(error = %e, "continuing without time range");
                None
            }
        };

        let intent = self.assembler.assemble(label, text, filters, entities, time_range)?;
        debug!(
            intent_type = intent.intent_type.as_str(),
            aggregation = intent.aggregation.map(|a| a.as_str()),
            filters = intent.filters.len(),
            has_time_range = intent.time_range.is_some(),
            "compiled intent"
        );
        Ok(intent)
    }

    pub fn to_sql(&self, intent: &Intent) -> Result<SqlStatement> {
        self.synthesizer.synthesize(intent)
    }

    /// `compile` followed by `to_sql`
    pub fn compile_to_sql(&self, text: &str) -> Result<(Intent, SqlStatement)> {
        let intent = self.compile(text)?;
        let sql = self.to_sql(&intent)?;
        Ok((intent, sql))
    }
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(&CompilerConfig::default())
    }
}
