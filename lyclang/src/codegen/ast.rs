use crate::error::Span;

/// A fully parsed LYC stylesheet.
#[derive(Clone, Debug, PartialEq)]
pub struct Stylesheet {
    /// Top-level statements in source order.
    pub statements: Vec<Stmt>,
}

/// A statement, as found at top level and in mixin, layer and media bodies.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// Variable declaration (`--name: value;`).
    Variable(VariableDecl),
    /// Mixin declaration (`@mixin name { ... }`).
    Mixin(MixinDecl),
    /// Mixin expansion (`@include name(...);`).
    Include(IncludeStmt),
    /// Selector merge request (`@extend selector;`).
    Extend(ExtendStmt),
    /// Layer bucket (`@layer name { ... }`).
    Layer(LayerStmt),
    /// Animation definition (`@keyframes name { ... }`).
    Keyframes(KeyframesRule),
    /// Media query block (`@media query { ... }`).
    Media(MediaRule),
    /// An ordinary selector rule.
    Rule(StyleRule),
    /// Property-style nested rule (`name: value { ... }`).
    Block(PropertyBlock),
    /// A bare declaration, legal inside mixin bodies.
    Property(Property),
}

/// Variable declaration. Global at top level, scoped inside a rule body.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDecl {
    /// Variable name including the `--` prefix.
    pub name: String,
    /// Declared value, resolved at generation time.
    pub value: Value,
    pub span: Span,
}

/// A named, reusable block of statements.
#[derive(Clone, Debug, PartialEq)]
pub struct MixinDecl {
    /// Mixin name.
    pub name: String,
    /// Body statements, re-walked at each include site.
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Expansion site of a mixin, with optional positional arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct IncludeStmt {
    /// Name of the mixin to expand.
    pub name: String,
    /// Positional arguments, bound as `--param-1`, `--param-2`, ...
    pub args: Vec<Value>,
    pub span: Span,
}

/// Request that the enclosing rule's declarations also apply to the listed
/// base selectors.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtendStmt {
    /// Base selectors to merge into the matching rule's selector list.
    pub bases: Vec<String>,
    pub span: Span,
}

/// A `@layer` aggregation bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStmt {
    /// Layer name (`None` for an anonymous layer).
    pub name: Option<String>,
    /// Body statements.
    pub body: Vec<Stmt>,
}

/// A `@keyframes` animation definition.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframesRule {
    /// Animation name.
    pub name: String,
    /// Keyframe blocks in source order.
    pub blocks: Vec<KeyframeBlock>,
}

/// One stage of a keyframes rule (`0% { ... }`, `from { ... }`).
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeBlock {
    /// Stage selector: a percentage or an identifier like `from`/`to`.
    pub stage: String,
    /// Declarations for this stage.
    pub properties: Vec<Property>,
}

/// A `@media` rule. Its content is deferred to the end of the document.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRule {
    /// Query text as written, e.g. `screen and (max-width: 600px)`.
    pub query: String,
    /// Body statements.
    pub body: Vec<Stmt>,
}

/// An ordinary selector rule.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleRule {
    /// The rule's own selector (comma-separated list).
    pub selector: Selector,
    /// Body items in source order.
    pub items: Vec<RuleItem>,
}

/// Anything that may appear in a style rule body.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleItem {
    /// A declaration.
    Property(Property),
    /// A rule-scoped variable, also emitted inline as a custom property.
    Variable(VariableDecl),
    /// A mixin expansion.
    Include(IncludeStmt),
    /// A selector merge request keyed by the enclosing rule.
    Extend(ExtendStmt),
    /// A nested selector rule.
    Nested(StyleRule),
    /// A property-style nested block.
    Block(PropertyBlock),
}

/// Property-style nesting: `transition: color { ... }` lowers to a rule
/// whose selector gains the `name:value` suffix.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyBlock {
    /// Property name before the colon.
    pub name: String,
    /// Value after the colon, resolved when the selector suffix is built.
    pub value: Value,
    /// Declarations inside the block.
    pub properties: Vec<Property>,
}

/// A selector list. Each part is one single selector, already rendered to
/// text with the source's own spacing.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    pub parts: Vec<String>,
}

impl Selector {
    /// The selector list as written, comma-joined.
    pub fn text(&self) -> String {
        self.parts.join(", ")
    }
}

/// A single CSS declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Declared value.
    pub value: Value,
    /// Whether the declaration carried `!important`.
    pub important: bool,
    pub span: Span,
}

/// A value expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A single atomic value.
    Atom(Atom),
    /// Function call value, e.g. `rgba(0, 0, 0, 0.5)`.
    Function {
        /// Function name.
        name: String,
        /// Comma-separated arguments.
        args: Vec<Value>,
    },
    /// Arithmetic operation. The grammar is right-recursive, so chains
    /// nest into the right operand.
    Operation {
        left: Atom,
        op: Operator,
        right: Box<Value>,
    },
    /// Space-separated value list, e.g. `1px solid red`.
    List(Vec<Value>),
}

/// An atomic value, kept as its source lexeme.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    /// Quoted string, quotes included.
    String(String),
    /// Unitless number.
    Number(String),
    /// Number with a unit suffix, e.g. `10px`.
    NumberUnit(String),
    /// Percentage, e.g. `50%`.
    Percentage(String),
    /// Hex color, e.g. `#ff0000`.
    HexColor(String),
    /// Variable reference by name (including the `--` prefix).
    Variable(String),
    /// Bare keyword, e.g. `solid`.
    Ident(String),
}

/// Arithmetic operator usable in a value position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Operator {
    /// The operator as written in source and output.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
        }
    }
}
