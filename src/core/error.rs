// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for tablexpr
//!
//! Every error belongs to one [`ErrorCategory`] so callers can choose a
//! recovery strategy: construction errors are fixed by changing the query,
//! evaluation errors name the offending row, lock timeouts may be retried,
//! and contract violations are programming errors.

use thiserror::Error;

/// Result type alias for tablexpr operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Detected while building an expression tree, before any row is read
    Construction,
    /// Detected while evaluating a specific row
    Evaluation,
    /// Lock could not be obtained within the maximum wait (recoverable)
    LockTimeout,
    /// Failure of the lock medium or of the locking protocol (fatal)
    LockIo,
    /// Wrong accessor called for a node's shape class
    Contract,
    /// Storage, I/O and other failures
    Storage,
}

/// Main error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Construction errors
    // =========================================================================
    /// Column not found in the table
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Operand types cannot be combined by an operator
    #[error("incompatible operand types for '{op}': {left} and {right}")]
    IncompatibleOperands {
        op: String,
        left: String,
        right: String,
    },

    /// Number of index axes does not match the array dimensionality
    #[error("#indices mismatches array dimensionality: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Invalid constant index or index expression
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// Statically known array shapes differ
    #[error("array shapes {left} and {right} do not conform")]
    ShapeConformance { left: String, right: String },

    /// Invalid argument to a constructor
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // =========================================================================
    // Evaluation errors
    // =========================================================================
    /// Index value outside the actual array shape of a row
    #[error("row {row}: index {value} out of range [0, {length}) on axis {axis}")]
    IndexOutOfBounds {
        row: usize,
        axis: usize,
        value: i64,
        length: usize,
    },

    /// Slice end lies before its start
    #[error("row {row}: slice end {end} before start {start} on axis {axis}")]
    EmptySlice {
        row: usize,
        axis: usize,
        start: usize,
        end: usize,
    },

    /// Index value computed for a row is invalid
    #[error("row {row}: invalid index {what} {value} on axis {axis}")]
    InvalidRowIndex {
        row: usize,
        axis: usize,
        what: String,
        value: i64,
    },

    /// Array cell has no value in this row
    #[error("row {row}: array in column '{column}' is undefined")]
    UndefinedArray { column: String, row: usize },

    /// Array operand shapes differ in this row
    #[error("row {row}: array shapes {left} and {right} do not conform")]
    ArrayShapeMismatch {
        row: usize,
        left: String,
        right: String,
    },

    /// Row number beyond the end of the table
    #[error("row {row} out of range, table has {nrow} rows")]
    RowOutOfRange { row: usize, nrow: usize },

    /// Error raised while evaluating an expression, tagged with its text
    #[error("{source} (in expression {expr})")]
    InExpression { expr: String, source: Box<Error> },

    // =========================================================================
    // Lock errors
    // =========================================================================
    /// Lock not acquired within the maximum wait
    #[error("timeout acquiring {mode} lock on table '{table}' after {waited_ms} ms{}", holder_suffix(.holder))]
    LockTimeout {
        table: String,
        mode: String,
        waited_ms: u64,
        holder: Option<u32>,
    },

    /// Lock medium failure
    #[error("lock failure: {0}")]
    LockIo(String),

    /// Table accessed under user locking without holding a lock
    #[error("table '{0}' is not locked; user locking requires an explicit lock")]
    TableNotLocked(String),

    // =========================================================================
    // Contract violations
    // =========================================================================
    /// Scalar accessor called on an array node or vice versa
    #[error("shape contract violated: {called} called on {node}")]
    ShapeContract { called: String, node: String },

    // =========================================================================
    // Other errors
    // =========================================================================
    /// Operation not supported by a store
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Value type does not match a column
    #[error("type mismatch for column '{column}': expected {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: String,
        got: String,
    },

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error (wrapped)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

fn holder_suffix(holder: &Option<u32>) -> String {
    match holder {
        Some(pid) => format!(" (held by process {})", pid),
        None => String::new(),
    }
}

impl Error {
    /// Create a new IncompatibleOperands error
    pub fn incompatible(
        op: impl Into<String>,
        left: impl ToString,
        right: impl ToString,
    ) -> Self {
        Error::IncompatibleOperands {
            op: op.into(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Create a new InvalidIndex error
    pub fn invalid_index(message: impl Into<String>) -> Self {
        Error::InvalidIndex(message.into())
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create a new ShapeContract error
    pub fn shape_contract(called: impl Into<String>, node: impl ToString) -> Self {
        Error::ShapeContract {
            called: called.into(),
            node: node.to_string(),
        }
    }

    /// Create a new LockIo error
    pub fn lock_io(message: impl Into<String>) -> Self {
        Error::LockIo(message.into())
    }

    /// Create a new Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Error::Io {
            message: message.into(),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Tag an error with the expression it was raised in.
    ///
    /// Already tagged errors keep their innermost (most specific) expression.
    pub fn in_expression(self, expr: impl ToString) -> Self {
        match self {
            Error::InExpression { .. } => self,
            other => Error::InExpression {
                expr: expr.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through expression tags
    pub fn root(&self) -> &Error {
        match self {
            Error::InExpression { source, .. } => source.root(),
            other => other,
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ColumnNotFound(_)
            | Error::IncompatibleOperands { .. }
            | Error::DimensionMismatch { .. }
            | Error::InvalidIndex(_)
            | Error::ShapeConformance { .. }
            | Error::InvalidArgument(_) => ErrorCategory::Construction,
            Error::IndexOutOfBounds { .. }
            | Error::EmptySlice { .. }
            | Error::InvalidRowIndex { .. }
            | Error::UndefinedArray { .. }
            | Error::ArrayShapeMismatch { .. }
            | Error::RowOutOfRange { .. } => ErrorCategory::Evaluation,
            Error::InExpression { source, .. } => source.category(),
            Error::LockTimeout { .. } => ErrorCategory::LockTimeout,
            Error::LockIo(_) | Error::TableNotLocked(_) => ErrorCategory::LockIo,
            Error::ShapeContract { .. } => ErrorCategory::Contract,
            Error::NotSupported(_)
            | Error::TypeMismatch { .. }
            | Error::Parse(_)
            | Error::Io { .. }
            | Error::Internal { .. } => ErrorCategory::Storage,
        }
    }

    /// The row an evaluation error refers to
    pub fn row(&self) -> Option<usize> {
        match self.root() {
            Error::IndexOutOfBounds { row, .. }
            | Error::EmptySlice { row, .. }
            | Error::InvalidRowIndex { row, .. }
            | Error::UndefinedArray { row, .. }
            | Error::ArrayShapeMismatch { row, .. }
            | Error::RowOutOfRange { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// Check if this is a construction-time query error
    pub fn is_construction_error(&self) -> bool {
        self.category() == ErrorCategory::Construction
    }

    /// Check if this is an evaluation-time row error
    pub fn is_evaluation_error(&self) -> bool {
        self.category() == ErrorCategory::Evaluation
    }

    /// Check if this is a lock timeout
    pub fn is_lock_timeout(&self) -> bool {
        self.category() == ErrorCategory::LockTimeout
    }

    /// Check if this is a shape contract violation
    pub fn is_contract_violation(&self) -> bool {
        self.category() == ErrorCategory::Contract
    }

    /// Only lock timeouts may be retried as is
    pub fn is_recoverable(&self) -> bool {
        self.is_lock_timeout()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
        }
    }
}
