//! Diagnostics. `CompileError` is the structured `{message, file, line,
//! column}` payload the instance façade surfaces through `get_last_error`;
//! it is a plain enum/struct, not a boxed/opaque error, because callers
//! need those fields individually.

use std::fmt;

/// The two ways a compile-phase call can fail. `OK` is represented by
/// `Result::Ok` at call sites and has no corresponding variant here.
#[derive(Debug, Clone)]
pub enum CompileError {
    /// A memory allocation failed. Has no source location.
    Alloc,
    /// Any source-level violation, located at a file/line/column.
    Syntax(SyntaxError),
}

#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl CompileError {
    pub(crate) fn syntax(file: &str, line: usize, column: usize, message: impl Into<String>) -> CompileError {
        CompileError::Syntax(SyntaxError {
            message: message.into(),
            file: file.to_owned(),
            line,
            column,
        })
    }

    /// The human-readable message. `"allocation error"` for `Alloc`.
    pub fn message(&self) -> &str {
        match self {
            CompileError::Alloc => "allocation error",
            CompileError::Syntax(e) => &e.message,
        }
    }

    /// `(file, line, column)`, or `None` for `Alloc`, which carries no
    /// source location.
    pub fn location(&self) -> Option<(&str, usize, usize)> {
        match self {
            CompileError::Alloc => None,
            CompileError::Syntax(e) => Some((&e.file, e.line, e.column)),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Alloc => write!(f, "allocation error"),
            CompileError::Syntax(e) => write!(f, "{}:{}:{}: error: {}", e.file, e.line, e.column, e.message),
        }
    }
}

impl std::error::Error for CompileError {}

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// A script and a global share a name.
    NameCollision,
}

impl WarningKind {
    pub fn message(&self, name: &str) -> String {
        match self {
            WarningKind::NameCollision => {
                format!("'{name}' is the name of both a script and a global")
            }
        }
    }
}
