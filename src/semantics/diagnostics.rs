use std::fmt;

use crate::parser::ast::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Redeclaration,
    UndeclaredSymbol,
    WrongArity,
    TypeMismatch,
    InvalidOperator,
    MissingReturn,
    ReturnOutsideFunction,
    MissingMain,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Redeclaration => "redeclaration",
            ErrorKind::UndeclaredSymbol => "undeclared symbol",
            ErrorKind::WrongArity => "wrong arity",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::InvalidOperator => "invalid operator",
            ErrorKind::MissingReturn => "missing return",
            ErrorKind::ReturnOutsideFunction => "return outside function",
            ErrorKind::MissingMain => "missing main",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Position) -> Diagnostic {
        Diagnostic {
            kind,
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "semantic error ({}) at {}:{}: {}",
            self.kind, self.line, self.column, self.message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    ImplicitConversion,
    UnusedVariable,
}

/// Advisory diagnostic; never blocks a successful analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>, position: Position) -> Warning {
        Warning {
            kind,
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning at {}:{}: {}", self.line, self.column, self.message)
    }
}
