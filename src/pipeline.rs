//! Request pipeline - routes an utterance to a reply or an executed query
//!
//! Storage and the external language model are collaborators behind traits.
//! When a model is configured and returns a usable statement, that statement is
//! used as-is; the rule-based compiler is the fallback path.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::answer::format_answer;
use crate::compiler::QueryCompiler;
use crate::error::{ExecutionError, PipelineError};
use crate::responder::{ConversationalResponder, Reply};
use crate::types::{ClassificationLabel, Intent, Utterance};

/// One result row: column name to value, in column order
pub type Row = serde_json::Map<String, Value>;

/// Capability to run a SQL string against the movie store
pub trait SqlExecutor {
    fn execute(&self, sql: &str) -> Result<Vec<Row>, ExecutionError>;
}

/// External natural-language model that may produce SQL for a question
///
/// Returns the raw model output; [`ModelOutput::parse`] decides whether it is usable.
pub trait SqlModel {
    fn generate(&self, text: &str) -> Option<String>;
}

/// A usable statement produced by the external model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub sql: String,
    pub answer: Option<String>,
}

#[derive(Deserialize)]
struct RawModelOutput {
    sql_query: Option<String>,
    sql: Option<String>,
    answer: Option<String>,
}

impl ModelOutput {
    /// Accepts a JSON object with `sql_query` (or `sql`) and an optional `answer`,
    /// or a bare SQL string. Code fences are stripped. Anything that is not a
    /// read query is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let body = strip_code_fence(raw.trim());

        let (sql, answer) = if body.starts_with('{') {
            let parsed: RawModelOutput = match serde_json::from_str(body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "model returned malformed JSON");
                    return None;
                }
            };
            let non_blank = |s: &String| !s.trim().is_empty();
            let sql = parsed
                .sql_query
                .filter(non_blank)
                .or(parsed.sql.filter(non_blank))?;
            (sql, parsed.answer)
        } else {
            (body.to_string(), None)
        };

        let sql = sql.trim().trim_end_matches(';').trim().to_string();
        if !is_read_query(&sql) {
            warn!("model output is not a SELECT statement");
            return None;
        }

        Some(Self {
            sql,
            answer: answer.filter(|a| !a.trim().is_empty()),
        })
    }
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.trim_end().trim_end_matches("```");

    // Drop the info string ("sql", "json") after the opening fence, which may
    // sit on its own line or share a line with the body
    let tag_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let tag = &rest[..tag_end];
    if tag.chars().all(|c| c.is_ascii_alphanumeric()) && !is_read_keyword(tag) {
        rest[tag_end..].trim()
    } else {
        rest.trim()
    }
}

fn is_read_keyword(word: &str) -> bool {
    word.eq_ignore_ascii_case("select") || word.eq_ignore_ascii_case("with")
}

fn is_read_query(sql: &str) -> bool {
    sql.split_whitespace().next().is_some_and(is_read_keyword)
}

/// Where an executed statement came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlSource {
    Model,
    Compiler,
}

/// Result of handling one utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatResponse {
    Conversation(Reply),
    Query {
        sql: String,
        source: SqlSource,
        /// Present only when the compiler produced the statement
        intent: Option<Intent>,
        rows: Vec<Row>,
        answer: String,
        model_answer: Option<String>,
    },
}

pub struct QueryPipeline<E> {
    compiler: Arc<QueryCompiler>,
    responder: ConversationalResponder,
    executor: E,
    model: Option<Box<dyn SqlModel + Send + Sync>>,
}

impl<E: SqlExecutor> QueryPipeline<E> {
    pub fn new(compiler: Arc<QueryCompiler>, executor: E) -> Self {
        Self {
            compiler,
            responder: ConversationalResponder::new(),
            executor,
            model: None,
        }
    }

    pub fn with_model(mut self, model: Box<dyn SqlModel + Send + Sync>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn handle<R: Rng + ?Sized>(
        &self,
        utterance: &Utterance,
        rng: &mut R,
    ) -> Result<ChatResponse, PipelineError> {
        let label = self.compiler.classify(&utterance.text);
        if label != ClassificationLabel::DatabaseRequest {
            debug!(%label, "answering conversationally");
            return Ok(ChatResponse::Conversation(
                self.responder.respond_to(label, utterance, rng),
            ));
        }

        let (sql, source, intent, model_answer) = match self.model_output(&utterance.text) {
            Some(output) => (output.sql, SqlSource::Model, None, output.answer),
            None => {
                let (intent, sql) = self.compiler.compile_to_sql(&utterance.text)?;
                (sql.into_string(), SqlSource::Compiler, Some(intent), None)
            }
        };

        info!(?source, sql = %sql, "executing query");
        let rows = self.executor.execute(&sql)?;
        let answer = format_answer(&rows);

        Ok(ChatResponse::Query {
            sql,
            source,
            intent,
            rows,
            answer,
            model_answer,
        })
    }

    fn model_output(&self, text: &str) -> Option<ModelOutput> {
        let raw = self.model.as_ref()?.generate(text)?;
        let output = ModelOutput::parse(&raw);
        if output.is_none() {
            debug!("falling back to rule-based compiler");
        }
        output
    }
}
