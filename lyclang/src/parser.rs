//! Recursive-descent grammar over the token sequence produced by the lexer.
//!
//! Rule selection needs at most a few tokens of lookahead except for the
//! one genuinely ambiguous spot: a statement starting `IDENT ':' ...` can be
//! a declaration, a property-style nested block or a pseudo-class selector
//! rule. Those are told apart by scanning to the statement's first `;` or
//! `{` and, for the block forms, by whether the colon was written tight
//! against both neighbours (`a:hover`) or spaced (`transition: color`).
//!
//! On a mismatch the parser records the error and resynchronizes at the
//! next statement boundary, so one run reports every syntax error it can.

use crate::codegen::ast::{
    ExtendStmt, IncludeStmt, KeyframeBlock, KeyframesRule, LayerStmt, MediaRule, MixinDecl,
    Operator, Property, PropertyBlock, RuleItem, Selector, StyleRule, Stylesheet, Stmt, Value,
    VariableDecl, Atom,
};
use crate::error::{CompileError, CompileResult, SyntaxError};
use crate::lexer::{Token, TokenKind};

pub fn parse(tokens: &[Token]) -> CompileResult<Stylesheet> {
    Parser::new(tokens).run()
}

type ParseResult<T> = Result<T, SyntaxError>;

/// Statement shapes distinguishable only by lookahead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    /// `name: value;`
    Property,
    /// `selector { ... }`
    Rule,
    /// `name: value { ... }`
    Block,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> CompileResult<Stylesheet> {
        let mut statements = Vec::new();
        while !self.at_end() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            match self.statement(false) {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(Stylesheet { statements })
        } else {
            Err(CompileError::Syntax(self.errors))
        }
    }

    // --- statements ---

    fn statement(&mut self, allow_property: bool) -> ParseResult<Stmt> {
        let Some(kind) = self.peek_kind() else {
            return Err(self.error_here("expected a statement"));
        };

        match kind {
            TokenKind::Variable => Ok(Stmt::Variable(self.variable_decl()?)),
            TokenKind::AtMixin => Ok(Stmt::Mixin(self.mixin_decl()?)),
            TokenKind::AtInclude => Ok(Stmt::Include(self.include_stmt()?)),
            TokenKind::AtExtend => Ok(Stmt::Extend(self.extend_stmt()?)),
            TokenKind::AtLayer => Ok(Stmt::Layer(self.layer_stmt()?)),
            TokenKind::AtKeyframes => Ok(Stmt::Keyframes(self.keyframes_rule()?)),
            TokenKind::AtMedia => Ok(Stmt::Media(self.media_rule()?)),
            TokenKind::ClassSelector
            | TokenKind::IdSelector
            | TokenKind::HexColor
            | TokenKind::Star
            | TokenKind::Ampersand
            | TokenKind::Greater
            | TokenKind::Plus
            | TokenKind::Tilde
            | TokenKind::Colon => Ok(Stmt::Rule(self.style_rule()?)),
            TokenKind::Identifier => match self.statement_shape() {
                Shape::Rule => Ok(Stmt::Rule(self.style_rule()?)),
                Shape::Block => Ok(Stmt::Block(self.property_block()?)),
                Shape::Property if allow_property => Ok(Stmt::Property(self.property()?)),
                Shape::Property => {
                    Err(self.error_here("declarations are only allowed inside rule and mixin bodies"))
                }
            },
            _ => Err(self.error_here("expected a statement")),
        }
    }

    /// Scans to the statement's first `;` or `{` to pick among the three
    /// `IDENT`-led shapes. The colon-adjacency test separates pseudo-class
    /// selectors from property blocks.
    fn statement_shape(&self) -> Shape {
        let mut i = self.pos;
        let mut colon = None;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                TokenKind::Semicolon | TokenKind::RightBrace => return Shape::Property,
                TokenKind::LeftBrace => {
                    let Some(c) = colon else { return Shape::Rule };
                    if self.tight_pair(c - 1, c) && self.tight_pair(c, c + 1) {
                        return Shape::Rule;
                    }
                    return Shape::Block;
                }
                TokenKind::Colon if colon.is_none() => colon = Some(i),
                _ => {}
            }
            i += 1;
        }
        Shape::Property
    }

    fn variable_decl(&mut self) -> ParseResult<VariableDecl> {
        let name_tok = self.expect(TokenKind::Variable, "expected a variable name")?;
        self.expect(TokenKind::Colon, "expected `:` after the variable name")?;
        let value = self.value()?;
        self.expect(TokenKind::Semicolon, "expected `;` after the variable value")?;
        Ok(VariableDecl {
            name: name_tok.lexeme,
            value,
            span: name_tok.span,
        })
    }

    fn mixin_decl(&mut self) -> ParseResult<MixinDecl> {
        self.expect(TokenKind::AtMixin, "expected `@mixin`")?;
        let name_tok = self.expect(TokenKind::Identifier, "expected a mixin name after `@mixin`")?;
        self.expect(TokenKind::LeftBrace, "expected `{` to open the mixin body")?;
        let body = self.statements_until_brace(true)?;
        Ok(MixinDecl {
            name: name_tok.lexeme,
            body,
            span: name_tok.span,
        })
    }

    fn include_stmt(&mut self) -> ParseResult<IncludeStmt> {
        self.expect(TokenKind::AtInclude, "expected `@include`")?;
        let name_tok =
            self.expect(TokenKind::Identifier, "expected a mixin name after `@include`")?;
        let mut args = Vec::new();
        if self.eat(TokenKind::LeftParen).is_some() {
            if !self.check(TokenKind::RightParen) {
                loop {
                    args.push(self.value()?);
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RightParen, "expected `)` after the include arguments")?;
        }
        self.expect(TokenKind::Semicolon, "expected `;` after `@include`")?;
        Ok(IncludeStmt {
            name: name_tok.lexeme,
            args,
            span: name_tok.span,
        })
    }

    fn extend_stmt(&mut self) -> ParseResult<ExtendStmt> {
        let at_tok = self.expect(TokenKind::AtExtend, "expected `@extend`")?;
        let selector = self.selector(TokenKind::Semicolon)?;
        self.expect(TokenKind::Semicolon, "expected `;` after `@extend`")?;
        Ok(ExtendStmt {
            bases: selector.parts,
            span: at_tok.span,
        })
    }

    fn layer_stmt(&mut self) -> ParseResult<LayerStmt> {
        self.expect(TokenKind::AtLayer, "expected `@layer`")?;
        let name = if self.check(TokenKind::Identifier) {
            self.advance().map(|t| t.lexeme)
        } else {
            None
        };
        self.expect(TokenKind::LeftBrace, "expected `{` to open the layer body")?;
        let body = self.statements_until_brace(false)?;
        Ok(LayerStmt { name, body })
    }

    fn keyframes_rule(&mut self) -> ParseResult<KeyframesRule> {
        self.expect(TokenKind::AtKeyframes, "expected `@keyframes`")?;
        let name_tok = self.expect(
            TokenKind::Identifier,
            "expected an animation name after `@keyframes`",
        )?;
        self.expect(TokenKind::LeftBrace, "expected `{` to open the keyframes body")?;

        let mut blocks = Vec::new();
        loop {
            if self.eat(TokenKind::RightBrace).is_some() {
                break;
            }
            let Some(stage_tok) = self.peek().cloned() else {
                return Err(self.error_here("expected `}` to close `@keyframes`"));
            };
            match stage_tok.kind {
                TokenKind::Percentage | TokenKind::Identifier => {
                    self.advance();
                }
                _ => return Err(self.error_here("expected a keyframe stage like `0%` or `from`")),
            }
            self.expect(TokenKind::LeftBrace, "expected `{` after the keyframe stage")?;
            let properties = self.properties_until_brace()?;
            blocks.push(KeyframeBlock {
                stage: stage_tok.lexeme,
                properties,
            });
        }

        Ok(KeyframesRule {
            name: name_tok.lexeme,
            blocks,
        })
    }

    fn media_rule(&mut self) -> ParseResult<MediaRule> {
        self.expect(TokenKind::AtMedia, "expected `@media`")?;

        let mut query_tokens = Vec::new();
        while let Some(kind) = self.peek_kind() {
            if kind == TokenKind::LeftBrace {
                break;
            }
            query_tokens.push(self.advance().unwrap());
        }
        if query_tokens.is_empty() {
            return Err(self.error_here("expected a media query after `@media`"));
        }
        self.expect(TokenKind::LeftBrace, "expected `{` after the media query")?;
        let body = self.statements_until_brace(false)?;

        Ok(MediaRule {
            query: join_tokens(&query_tokens),
            body,
        })
    }

    fn style_rule(&mut self) -> ParseResult<StyleRule> {
        let selector = self.selector(TokenKind::LeftBrace)?;
        self.expect(TokenKind::LeftBrace, "expected `{` after the selector")?;
        let items = self.rule_items()?;
        Ok(StyleRule { selector, items })
    }

    fn rule_items(&mut self) -> ParseResult<Vec<RuleItem>> {
        let mut items = Vec::new();
        loop {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            let Some(kind) = self.peek_kind() else {
                return Err(self.error_here("expected `}` to close the rule"));
            };
            match kind {
                TokenKind::RightBrace => {
                    self.advance();
                    return Ok(items);
                }
                TokenKind::Variable => items.push(RuleItem::Variable(self.variable_decl()?)),
                TokenKind::AtInclude => items.push(RuleItem::Include(self.include_stmt()?)),
                TokenKind::AtExtend => items.push(RuleItem::Extend(self.extend_stmt()?)),
                TokenKind::ClassSelector
                | TokenKind::IdSelector
                | TokenKind::HexColor
                | TokenKind::Star
                | TokenKind::Ampersand
                | TokenKind::Greater
                | TokenKind::Plus
                | TokenKind::Tilde
                | TokenKind::Colon => items.push(RuleItem::Nested(self.style_rule()?)),
                TokenKind::Identifier => match self.statement_shape() {
                    Shape::Property => items.push(RuleItem::Property(self.property()?)),
                    Shape::Rule => items.push(RuleItem::Nested(self.style_rule()?)),
                    Shape::Block => items.push(RuleItem::Block(self.property_block()?)),
                },
                _ => return Err(self.error_here("expected a declaration or a nested rule")),
            }
        }
    }

    fn property(&mut self) -> ParseResult<Property> {
        let name_tok = self.expect(TokenKind::Identifier, "expected a property name")?;
        self.expect(TokenKind::Colon, "expected `:` after the property name")?;
        let value = self.value()?;
        let important = self.eat(TokenKind::Important).is_some();
        self.expect(TokenKind::Semicolon, "expected `;` after the declaration")?;
        Ok(Property {
            name: name_tok.lexeme,
            value,
            important,
            span: name_tok.span,
        })
    }

    fn property_block(&mut self) -> ParseResult<PropertyBlock> {
        let name_tok = self.expect(TokenKind::Identifier, "expected a property name")?;
        self.expect(TokenKind::Colon, "expected `:` after the property name")?;
        let value = self.value()?;
        self.expect(TokenKind::LeftBrace, "expected `{` to open the block")?;
        let properties = self.properties_until_brace()?;
        Ok(PropertyBlock {
            name: name_tok.lexeme,
            value,
            properties,
        })
    }

    fn properties_until_brace(&mut self) -> ParseResult<Vec<Property>> {
        let mut properties = Vec::new();
        loop {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            if self.eat(TokenKind::RightBrace).is_some() {
                return Ok(properties);
            }
            if self.at_end() {
                return Err(self.error_here("expected `}` to close the block"));
            }
            properties.push(self.property()?);
        }
    }

    fn statements_until_brace(&mut self, allow_property: bool) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            if self.eat(TokenKind::RightBrace).is_some() {
                return Ok(body);
            }
            if self.at_end() {
                return Err(self.error_here("expected `}` to close the body"));
            }
            body.push(self.statement(allow_property)?);
        }
    }

    // --- selectors ---

    fn selector(&mut self, stop: TokenKind) -> ParseResult<Selector> {
        let mut parts = Vec::new();
        let mut current: Vec<Token> = Vec::new();

        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(self.error_here("unterminated selector"));
            };
            if token.kind == stop {
                break;
            }
            match token.kind {
                TokenKind::Comma => {
                    if current.is_empty() {
                        return Err(self.error_here("expected a selector before `,`"));
                    }
                    parts.push(join_tokens(&current));
                    current.clear();
                    self.advance();
                }
                TokenKind::Identifier
                | TokenKind::ClassSelector
                | TokenKind::IdSelector
                | TokenKind::HexColor
                | TokenKind::Star
                | TokenKind::Ampersand
                | TokenKind::Greater
                | TokenKind::Plus
                | TokenKind::Tilde
                | TokenKind::Colon
                // pseudo-class arguments, e.g. `:nth-child(2n+1)`
                | TokenKind::LeftParen
                | TokenKind::RightParen
                | TokenKind::Number
                | TokenKind::NumberUnit
                | TokenKind::Minus => {
                    current.push(token);
                    self.advance();
                }
                _ => return Err(self.error_here("unexpected token in selector")),
            }
        }

        if current.is_empty() {
            return Err(self.error_here("expected a selector"));
        }
        parts.push(join_tokens(&current));
        Ok(Selector { parts })
    }

    // --- values ---

    fn value(&mut self) -> ParseResult<Value> {
        let first = self.primary()?;

        if let Value::Atom(atom) = &first {
            if let Some(op) = self.operator_ahead() {
                self.advance();
                let right = self.value()?;
                return Ok(Value::Operation {
                    left: atom.clone(),
                    op,
                    right: Box::new(right),
                });
            }
        }

        let mut items = vec![first];
        while self.value_continues() {
            items.push(self.primary()?);
        }
        Ok(if items.len() == 1 {
            items.pop().unwrap()
        } else {
            Value::List(items)
        })
    }

    fn primary(&mut self) -> ParseResult<Value> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error_here("expected a value"));
        };

        let atom = match token.kind {
            TokenKind::Minus => {
                // tight minus before a number is a sign, not an operator
                let Some(next) = self.tokens.get(self.pos + 1).cloned() else {
                    return Err(self.error_here("expected a value"));
                };
                if !self.tight_pair(self.pos, self.pos + 1) {
                    return Err(self.error_here("expected a value"));
                }
                self.advance();
                self.advance();
                let lexeme = format!("-{}", next.lexeme);
                match next.kind {
                    TokenKind::Number => Atom::Number(lexeme),
                    TokenKind::NumberUnit => Atom::NumberUnit(lexeme),
                    TokenKind::Percentage => Atom::Percentage(lexeme),
                    _ => return Err(self.error_here("expected a number after `-`")),
                }
            }
            TokenKind::String => {
                self.advance();
                Atom::String(token.lexeme)
            }
            TokenKind::Number => {
                self.advance();
                Atom::Number(token.lexeme)
            }
            TokenKind::NumberUnit => {
                self.advance();
                Atom::NumberUnit(token.lexeme)
            }
            TokenKind::Percentage => {
                self.advance();
                Atom::Percentage(token.lexeme)
            }
            TokenKind::HexColor => {
                self.advance();
                Atom::HexColor(token.lexeme)
            }
            TokenKind::Variable => {
                self.advance();
                Atom::Variable(token.lexeme)
            }
            TokenKind::Identifier => {
                if self.kind_at(1) == Some(TokenKind::LeftParen)
                    && self.tight_pair(self.pos, self.pos + 1)
                {
                    return self.function_value(token.lexeme);
                }
                self.advance();
                Atom::Ident(token.lexeme)
            }
            _ => return Err(self.error_here("expected a value")),
        };

        Ok(Value::Atom(atom))
    }

    fn function_value(&mut self, name: String) -> ParseResult<Value> {
        self.advance(); // function name
        self.advance(); // `(`
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.value()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "expected `)` after the function arguments")?;

        // normalize `var(--x)` so variable references have one representation
        if name == "var"
            && args.len() == 1
            && matches!(args.first(), Some(Value::Atom(Atom::Variable(_))))
        {
            return Ok(args.pop().unwrap());
        }
        Ok(Value::Function { name, args })
    }

    fn operator_ahead(&self) -> Option<Operator> {
        let op = match self.peek_kind()? {
            TokenKind::Plus => Operator::Add,
            TokenKind::Minus => Operator::Sub,
            TokenKind::Star => Operator::Mul,
            TokenKind::Slash => Operator::Div,
            TokenKind::Percent => Operator::Mod,
            _ => return None,
        };

        // `10px -5px` is a list with a negative element, not a subtraction
        if op == Operator::Sub
            && self.tight_pair(self.pos, self.pos + 1)
            && !self.tight_pair(self.pos - 1, self.pos)
            && matches!(
                self.kind_at(1),
                Some(TokenKind::Number | TokenKind::NumberUnit | TokenKind::Percentage)
            )
        {
            return None;
        }
        Some(op)
    }

    fn value_continues(&self) -> bool {
        match self.peek_kind() {
            Some(
                TokenKind::String
                | TokenKind::Number
                | TokenKind::NumberUnit
                | TokenKind::Percentage
                | TokenKind::HexColor
                | TokenKind::Variable
                | TokenKind::Identifier,
            ) => true,
            Some(TokenKind::Minus) => {
                self.tight_pair(self.pos, self.pos + 1)
                    && matches!(
                        self.kind_at(1),
                        Some(TokenKind::Number | TokenKind::NumberUnit | TokenKind::Percentage)
                    )
            }
            _ => false,
        }
    }

    // --- plumbing ---

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn kind_at(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| t.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) { self.advance() } else { None }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance().unwrap())
        } else {
            Err(self.error_here(expected))
        }
    }

    /// True when the two tokens were written with no whitespace between them.
    fn tight_pair(&self, left: usize, right: usize) -> bool {
        match (self.tokens.get(left), self.tokens.get(right)) {
            (Some(a), Some(b)) => b.span.offset == a.end_offset(),
            _ => false,
        }
    }

    fn error_here(&self, expected: &str) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError {
                expected: expected.to_string(),
                found: format!("`{}`", token.lexeme),
                span: token.span,
            },
            None => SyntaxError {
                expected: expected.to_string(),
                found: "end of input".to_string(),
                span: self.tokens.last().map(|t| t.span).unwrap_or_default(),
            },
        }
    }

    /// Skips forward to the next statement boundary after an error.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => {
                    if depth <= 1 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Semicolon if depth == 0 => return,
                _ => {}
            }
        }
    }
}

/// Joins token lexemes back to text, preserving the source's own spacing:
/// tokens written adjacently stay adjacent, everything else gets one space.
fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && tokens[i - 1].end_offset() != token.span.offset {
            out.push(' ');
        }
        out.push_str(&token.lexeme);
    }
    out
}
