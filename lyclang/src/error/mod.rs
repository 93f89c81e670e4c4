use std::fmt;

use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// A position in the source text. Lines and columns are 1-based,
/// `offset` is the byte offset from the start of the input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 && self.column == 0 {
            write!(f, "<unknown>")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// An unrecognized character found while tokenizing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unrecognized character `{found}` at {span}")]
pub struct LexicalError {
    pub found: char,
    pub span: Span,
}

/// An unexpected token found while parsing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{expected} at {span}, found {found}")]
pub struct SyntaxError {
    pub expected: String,
    pub found: String,
    pub span: Span,
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("nothing to compile: input is empty")]
    EmptyInput,

    #[error("compilation produced no output")]
    EmptyOutput,

    #[error("{}", batch(.0))]
    Lexical(Vec<LexicalError>),

    #[error("{}", batch(.0))]
    Syntax(Vec<SyntaxError>),

    #[error("undefined variable `{name}` at {span}")]
    UndefinedVariable { name: String, span: Span },

    #[error("undefined mixin `{name}` at {span}")]
    UndefinedMixin { name: String, span: Span },

    #[error("`@include {name}` exceeded the expansion depth limit of {limit}")]
    RecursionLimit { name: String, limit: usize },
}

fn batch(errors: &[impl fmt::Display]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
