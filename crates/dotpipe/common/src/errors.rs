// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error types for pipe construction and evaluation

use thiserror::Error;

/// Errors that can occur while building or evaluating a pipe
#[derive(Error, Debug)]
pub enum PipeError {
    #[error("A source must be provided to evaluate a pipe")]
    UnboundSource,

    #[error("Stage '{stage}' requested an unknown parameter type: '{param}'")]
    UnknownParameter { stage: String, param: String },

    #[error("Stage '{stage}' is a source and requested a prior result via '{param}'")]
    PriorRequested { stage: String, param: String },

    #[error("Stage '{stage}' read parameter {position} as '{requested}' but declared '{declared}'")]
    ParameterMismatch {
        stage: String,
        position: usize,
        declared: String,
        requested: String,
    },

    #[error("Stage '{stage}' requested {expected} and got {found}")]
    TypeMismatch {
        stage: String,
        expected: String,
        found: String,
    },

    #[error("Invalid arguments for '{op}': {reason}")]
    ArgumentShape { op: String, reason: String },

    #[error("{op} applied to empty input")]
    EmptyInput { op: String },

    #[error("{0}")]
    NotFound(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of [`PipeError`] for callers that branch on which
/// invariant broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnboundSource,
    ContractViolation,
    TypeMismatch,
    ArgumentShape,
    EmptyInput,
    NotFound,
    Io,
}

impl PipeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipeError::UnboundSource => ErrorKind::UnboundSource,
            PipeError::UnknownParameter { .. }
            | PipeError::PriorRequested { .. }
            | PipeError::ParameterMismatch { .. } => ErrorKind::ContractViolation,
            PipeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            PipeError::ArgumentShape { .. } => ErrorKind::ArgumentShape,
            PipeError::EmptyInput { .. } => ErrorKind::EmptyInput,
            PipeError::NotFound(_) => ErrorKind::NotFound,
            PipeError::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn type_mismatch(stage: impl Into<String>, expected: impl Into<String>, found: impl ToString) -> Self {
        PipeError::TypeMismatch {
            stage: stage.into(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    pub fn argument(op: impl Into<String>, reason: impl Into<String>) -> Self {
        PipeError::ArgumentShape {
            op: op.into(),
            reason: reason.into(),
        }
    }

    pub fn empty(op: impl Into<String>) -> Self {
        PipeError::EmptyInput { op: op.into() }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        PipeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for pipe operations
pub type PipeResult<T> = Result<T, PipeError>;
