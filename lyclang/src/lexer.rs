use logos::Logos;

use crate::error::{CompileError, CompileResult, LexicalError, Span};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    #[token("@mixin")]
    AtMixin,
    #[token("@include")]
    AtInclude,
    #[token("@extend")]
    AtExtend,
    #[token("@layer")]
    AtLayer,
    #[token("@keyframes")]
    AtKeyframes,
    #[token("@media")]
    AtMedia,

    #[token("!important")]
    Important,

    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("&")]
    Ampersand,
    #[token("*")]
    Star,
    #[token(">")]
    Greater,
    #[token("~")]
    Tilde,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("/")]
    Slash,
    // bare `%` is the modulo operator; percentage literals match first
    #[token("%")]
    Percent,

    #[regex(r"--[a-zA-Z][a-zA-Z0-9-]*")]
    Variable,
    #[regex(r"\.[a-zA-Z_][a-zA-Z0-9_-]*")]
    ClassSelector,
    #[regex(r"#[a-zA-Z_][a-zA-Z0-9_-]*")]
    IdSelector,
    // outranks IdSelector so `#abc` reads as a color, not an id
    #[regex(r"#[0-9a-fA-F]{3,8}", priority = 10)]
    HexColor,
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r#"'([^'\\]|\\.)*'"#)]
    String,
    #[regex(r"[0-9]+(\.[0-9]+)?[a-zA-Z]+")]
    NumberUnit,
    #[regex(r"[0-9]+(\.[0-9]+)?%")]
    Percentage,
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Identifier,

    // Skip whitespace and comments
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    Whitespace,
}

/// A single lexed token with its source text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    /// Byte offset one past the end of this token's lexeme.
    pub fn end_offset(&self) -> usize {
        self.span.offset + self.lexeme.len()
    }
}

/// Tokenizes the whole input in one forward pass.
///
/// Unrecognized characters do not stop the scan; every one of them is
/// recorded and the batch is reported at the end, so a single run surfaces
/// all lexical errors of a file.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    let starts = line_starts(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = locate(&starts, range.start);
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                lexeme: lexer.slice().to_string(),
                span,
            }),
            Err(()) => {
                let found = source[range].chars().next().unwrap_or('\u{fffd}');
                errors.push(LexicalError { found, span });
            }
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(CompileError::Lexical(errors))
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn locate(starts: &[usize], offset: usize) -> Span {
    let line = starts.partition_point(|&s| s <= offset);
    Span {
        line,
        column: offset - starts[line - 1] + 1,
        offset,
    }
}
