//! Core compiler for LYC, a CSS-superset stylesheet language with
//! variables, mixins, extends, layers, keyframes, media queries, nested
//! rules and arithmetic values.
//!
//! The pipeline is synchronous and free of I/O: tokenize, parse, optionally
//! validate, generate, assemble, minify. All state lives inside one
//! [`compile`] call, so concurrent compilations are fully independent.

pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use error::{CompileError, CompileResult};

use log::debug;

/// Compilation options.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Minify the assembled document. On by default.
    pub minify: bool,
    /// Run the strict-mode validator (undefined references become errors,
    /// unused globals warn).
    pub strict: bool,
    /// Reserved for source-map emission; currently has no effect.
    pub source_map: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            minify: true,
            strict: false,
            source_map: false,
        }
    }
}

/// Compiles LYC source text to CSS.
///
/// Lexical and syntax errors abort before generation, as do strict-mode
/// semantic errors. Unused-variable findings only warn (through `log`).
pub fn compile(source: &str, options: &CompileOptions) -> CompileResult<String> {
    if source.trim().is_empty() {
        return Err(CompileError::EmptyInput);
    }

    let tokens = lexer::tokenize(source)?;
    debug!("lexed {} token(s)", tokens.len());

    let stylesheet = parser::parse(&tokens)?;
    debug!("parsed {} top-level statement(s)", stylesheet.statements.len());

    if options.strict {
        for warning in semantic::validate(&stylesheet)? {
            log::warn!("{warning}");
        }
    }

    let document = codegen::generate(&stylesheet)?;
    if document.trim().is_empty() {
        return Err(CompileError::EmptyOutput);
    }

    if options.minify {
        Ok(codegen::minify::minify(&document))
    } else {
        Ok(document)
    }
}
