//! Error types for the query compiler and its collaborators

use thiserror::Error;

use crate::types::ClassificationLabel;

/// Result type alias using [`CompileError`]
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised while compiling an utterance into SQL
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The utterance is conversational; route it to the responder instead
    #[error("not a database request (classified as {label})")]
    NotADatabaseRequest { label: ClassificationLabel },

    /// No rule matched for a sub-feature. Never fatal on the main path.
    #[error("no pattern recognized for {feature}")]
    UnrecognizedPattern { feature: &'static str },

    /// The intent carries a combination the synthesizer cannot express
    #[error("synthesis error: {0}")]
    Synthesis(String),
}

/// Failure reported by a [`crate::pipeline::SqlExecutor`]
#[derive(Error, Debug, Clone, PartialEq)]
#[error("execution error: {message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`crate::pipeline::QueryPipeline`]
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Invalid configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
