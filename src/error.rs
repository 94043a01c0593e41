use thiserror::Error;

use crate::semantics::diagnostics::Diagnostic;

pub type CompileResult<T> = Result<T, CompileError>;

/// Failures surfaced by the pipeline stages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("lexical error at {line}:{column}: unexpected character {ch:?}")]
    Lexical {
        ch: char,
        line: usize,
        column: usize,
    },

    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("{0}")]
    Semantic(Diagnostic),

    /// Internal consistency failure. Analysis rejects every input that would
    /// raise one, so it only appears when codegen runs on an unchecked AST.
    #[error("codegen error: {0}")]
    Codegen(String),

    #[error("{} errors occurred", .0.len())]
    Multiple(Vec<CompileError>),
}

impl CompileError {
    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::Codegen(message.into())
    }

    /// Flattens `Multiple` so callers can report every error on its own line.
    pub fn flatten(&self) -> Vec<&CompileError> {
        match self {
            CompileError::Multiple(errors) => errors.iter().flat_map(|e| e.flatten()).collect(),
            other => vec![other],
        }
    }
}
