//! NQL core - deterministic compiler from movie questions to SQL
//!
//! Classifies free text as conversation or a database request, extracts
//! filters and time ranges with pattern rules, and synthesizes SQL against the
//! `movies` / `movie_viewership` schema. Everything here is pure and
//! synchronous; storage and language models are collaborators behind the
//! traits in [`pipeline`].

pub mod answer;
pub mod assembler;
pub mod classifier;
pub mod compiler;
pub mod config;
pub mod entities;
pub mod error;
pub mod pipeline;
pub mod responder;
pub mod sql;
pub mod time_range;
pub mod types;

pub use classifier::*;
pub use compiler::*;
pub use config::*;
pub use error::*;
pub use pipeline::*;
pub use responder::*;
pub use types::*;

// Python bindings
#[cfg(feature = "extension-module")]
pub mod py;

#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

#[cfg(feature = "extension-module")]
#[pymodule]
fn nql_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PyQueryCompiler>()?;
    m.add_class::<PyConversationalResponder>()?;
    m.add_function(wrap_pyfunction!(py_classify, m)?)?;
    Ok(())
}
