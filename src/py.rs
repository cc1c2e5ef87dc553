//! Python bindings for the query compiler using PyO3

use std::sync::LazyLock;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::compiler::QueryCompiler;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::responder::ConversationalResponder;
use crate::types::{ClassificationLabel, Intent};

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyValueError, _>(e.to_string())
}

/// Unknown labels map to the unclear reply family
fn parse_label(label: &str) -> ClassificationLabel {
    serde_json::from_value(serde_json::Value::String(label.to_string()))
        .unwrap_or(ClassificationLabel::Unclear)
}

/// Built once on first use; the compiler is immutable and `Sync`
static DEFAULT_COMPILER: LazyLock<QueryCompiler> = LazyLock::new(QueryCompiler::default);

/// Classify text with the shared default compiler (Python function)
#[pyfunction]
pub fn py_classify(text: &str) -> String {
    DEFAULT_COMPILER.classify(text).to_string()
}

/// Python wrapper for the query compiler
#[pyclass]
pub struct PyQueryCompiler {
    compiler: QueryCompiler,
}

#[pymethods]
impl PyQueryCompiler {
    /// Build from an optional JSON configuration document
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => CompilerConfig::from_json_str(json).map_err(value_error)?,
            None => CompilerConfig::default(),
        };
        Ok(Self {
            compiler: QueryCompiler::new(&config),
        })
    }

    fn classify(&self, text: &str) -> String {
        self.compiler.classify(text).to_string()
    }

    /// Compile text into an intent, returned as a JSON string
    fn compile(&self, text: &str) -> PyResult<String> {
        let intent = self.compiler.compile(text).map_err(value_error)?;
        serde_json::to_string(&intent).map_err(value_error)
    }

    /// Synthesize SQL from an intent JSON string
    fn to_sql(&self, intent_json: &str) -> PyResult<String> {
        let intent: Intent = serde_json::from_str(intent_json).map_err(value_error)?;
        let sql = self.compiler.to_sql(&intent).map_err(value_error)?;
        Ok(sql.into_string())
    }

    /// Classify and, for database requests, compile and synthesize in one call
    fn process<'py>(&self, text: &str, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new_bound(py);
        match self.compiler.compile_to_sql(text) {
            Ok((intent, sql)) => {
                let intent_json = serde_json::to_string(&intent).map_err(value_error)?;
                dict.set_item("type", ClassificationLabel::DatabaseRequest.as_str())?;
                dict.set_item("intent", intent_json)?;
                dict.set_item("sql", sql.into_string())?;
            }
            Err(CompileError::NotADatabaseRequest { label }) => {
                dict.set_item("type", label.as_str())?;
            }
            Err(e) => return Err(value_error(e)),
        }
        Ok(dict)
    }
}

/// Python wrapper for the conversational responder
#[pyclass]
pub struct PyConversationalResponder {
    responder: ConversationalResponder,
    rng: StdRng,
}

#[pymethods]
impl PyConversationalResponder {
    #[new]
    #[pyo3(signature = (seed=None))]
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            responder: ConversationalResponder::new(),
            rng,
        }
    }

    /// Reply for a classification label
    #[pyo3(signature = (label, speaker=None))]
    fn respond<'py>(
        &mut self,
        label: &str,
        speaker: Option<String>,
        py: Python<'py>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let reply = self
            .responder
            .respond(parse_label(label), speaker.as_deref(), &mut self.rng);

        let dict = PyDict::new_bound(py);
        dict.set_item("type", reply.kind.as_str())?;
        dict.set_item("message", reply.message)?;
        dict.set_item("suggestions", reply.suggestions)?;
        Ok(dict)
    }
}
