//! Strict-mode semantic validation.
//!
//! Two passes over the tree: the collect pass registers declared global
//! variables and mixins, the check pass verifies that every `var()`
//! reference and every `@include` target resolves. A third pass computes
//! which globals were never referenced and reports them as non-fatal
//! warnings. The tree is never mutated.

use std::collections::HashSet;

use crate::codegen::ast::{Atom, IncludeStmt, Property, RuleItem, Stmt, Stylesheet, Value};
use crate::error::{CompileError, CompileResult, Span};

/// Validates the stylesheet, returning unused-variable warnings on success.
pub fn validate(stylesheet: &Stylesheet) -> CompileResult<Vec<String>> {
    let mut checker = Checker::default();
    checker.collect(&stylesheet.statements);
    let locals = HashSet::new();
    checker.check_statements(&stylesheet.statements, &locals, false)?;

    let warnings = checker
        .globals
        .iter()
        .filter(|name| !checker.used.contains(*name))
        .map(|name| format!("unused variable `{name}`"))
        .collect();
    Ok(warnings)
}

#[derive(Default)]
struct Checker {
    /// Declared global variables, in declaration order.
    globals: Vec<String>,
    mixins: HashSet<String>,
    used: HashSet<String>,
}

impl Checker {
    /// Collect pass: registers global variable and mixin names, recursing
    /// into layer and media bodies where declarations still bind globally.
    fn collect(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            match stmt {
                Stmt::Variable(decl) => {
                    if !self.globals.contains(&decl.name) {
                        self.globals.push(decl.name.clone());
                    }
                }
                Stmt::Mixin(decl) => {
                    self.mixins.insert(decl.name.clone());
                }
                Stmt::Layer(layer) => self.collect(&layer.body),
                Stmt::Media(media) => self.collect(&media.body),
                _ => {}
            }
        }
    }

    fn check_statements(
        &mut self,
        statements: &[Stmt],
        locals: &HashSet<String>,
        params_ok: bool,
    ) -> CompileResult<()> {
        for stmt in statements {
            match stmt {
                Stmt::Variable(decl) => {
                    self.check_value(&decl.value, locals, params_ok, decl.span)?;
                }
                Stmt::Mixin(decl) => {
                    // parameters only exist inside mixin bodies
                    self.check_statements(&decl.body, &HashSet::new(), true)?;
                }
                Stmt::Include(include) => self.check_include(include, locals, params_ok)?,
                Stmt::Extend(_) => {}
                Stmt::Layer(layer) => self.check_statements(&layer.body, locals, params_ok)?,
                Stmt::Media(media) => self.check_statements(&media.body, locals, params_ok)?,
                Stmt::Keyframes(rule) => {
                    for block in &rule.blocks {
                        self.check_properties(&block.properties, locals, params_ok)?;
                    }
                }
                Stmt::Rule(rule) => self.check_rule_items(&rule.items, locals, params_ok)?,
                Stmt::Block(block) => {
                    self.check_value(&block.value, locals, params_ok, Span::default())?;
                    self.check_properties(&block.properties, locals, params_ok)?;
                }
                Stmt::Property(property) => {
                    self.check_value(&property.value, locals, params_ok, property.span)?;
                }
            }
        }
        Ok(())
    }

    fn check_rule_items(
        &mut self,
        items: &[RuleItem],
        locals: &HashSet<String>,
        params_ok: bool,
    ) -> CompileResult<()> {
        // rule-scoped declarations shadow globals for the rest of the body
        let mut scope = locals.clone();
        for item in items {
            match item {
                RuleItem::Property(property) => {
                    self.check_value(&property.value, &scope, params_ok, property.span)?;
                }
                RuleItem::Variable(decl) => {
                    self.check_value(&decl.value, &scope, params_ok, decl.span)?;
                    scope.insert(decl.name.clone());
                }
                RuleItem::Include(include) => self.check_include(include, &scope, params_ok)?,
                RuleItem::Extend(_) => {}
                RuleItem::Nested(rule) => self.check_rule_items(&rule.items, &scope, params_ok)?,
                RuleItem::Block(block) => {
                    self.check_value(&block.value, &scope, params_ok, Span::default())?;
                    self.check_properties(&block.properties, &scope, params_ok)?;
                }
            }
        }
        Ok(())
    }

    fn check_properties(
        &mut self,
        properties: &[Property],
        locals: &HashSet<String>,
        params_ok: bool,
    ) -> CompileResult<()> {
        for property in properties {
            self.check_value(&property.value, locals, params_ok, property.span)?;
        }
        Ok(())
    }

    fn check_include(
        &mut self,
        include: &IncludeStmt,
        locals: &HashSet<String>,
        params_ok: bool,
    ) -> CompileResult<()> {
        if !self.mixins.contains(&include.name) {
            return Err(CompileError::UndefinedMixin {
                name: include.name.clone(),
                span: include.span,
            });
        }
        for arg in &include.args {
            self.check_value(arg, locals, params_ok, include.span)?;
        }
        Ok(())
    }

    fn check_value(
        &mut self,
        value: &Value,
        locals: &HashSet<String>,
        params_ok: bool,
        span: Span,
    ) -> CompileResult<()> {
        match value {
            Value::Atom(atom) => self.check_atom(atom, locals, params_ok, span),
            Value::Function { args, .. } => {
                for arg in args {
                    self.check_value(arg, locals, params_ok, span)?;
                }
                Ok(())
            }
            Value::Operation { left, right, .. } => {
                self.check_atom(left, locals, params_ok, span)?;
                self.check_value(right, locals, params_ok, span)
            }
            Value::List(items) => {
                for item in items {
                    self.check_value(item, locals, params_ok, span)?;
                }
                Ok(())
            }
        }
    }

    fn check_atom(
        &mut self,
        atom: &Atom,
        locals: &HashSet<String>,
        params_ok: bool,
        span: Span,
    ) -> CompileResult<()> {
        let Atom::Variable(name) = atom else {
            return Ok(());
        };
        self.used.insert(name.clone());
        let defined = self.globals.contains(name)
            || locals.contains(name)
            || (params_ok && name.starts_with("--param-"));
        if defined {
            Ok(())
        } else {
            Err(CompileError::UndefinedVariable {
                name: name.clone(),
                span,
            })
        }
    }
}
