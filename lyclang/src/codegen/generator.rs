//! Tree walk that lowers the syntax tree to CSS text.
//!
//! One recursive, depth-first pass threads four pieces of context downward:
//! the variable environment (locals over globals), the selector prefix, the
//! active media query and the active layer. Layers, keyframes and media
//! blocks never emit inline; their content is collected into the deferred
//! collections and serialized by the aggregator in a fixed order.

use std::collections::HashMap;

use log::debug;

use super::assemble;
use super::ast::{
    ExtendStmt, IncludeStmt, KeyframesRule, LayerStmt, MediaRule, MixinDecl, Property,
    PropertyBlock, RuleItem, Selector, Stmt, StyleRule, Stylesheet, VariableDecl,
};
use super::optimize;
use super::scope::{Bindings, MixinRegistry, Scope};
use super::value;
use crate::error::{CompileError, CompileResult};

/// Bound on transitive mixin expansion depth, so a self-including mixin
/// fails with a structured error instead of exhausting the stack.
const MAX_INCLUDE_DEPTH: usize = 64;

/// Generates the assembled (not yet minified) CSS document.
pub fn generate(stylesheet: &Stylesheet) -> CompileResult<String> {
    let mut generator = Generator::default();
    let mut ctx = Context::default();
    let root = generator.statements(&stylesheet.statements, &mut ctx)?;
    let root = optimize::merge_rules(&root);
    debug!(
        "generated {} layer(s), {} keyframes block(s), {} media block(s)",
        generator.layers.len(),
        generator.keyframes.len(),
        generator.media_blocks.len()
    );
    Ok(assemble::assemble(
        &generator.globals,
        &root,
        &generator.layers,
        &generator.keyframes,
        &generator.media_blocks,
    ))
}

/// All mutable generation state for one compilation. Created per call and
/// discarded with it; nothing here outlives or is shared between runs.
#[derive(Default)]
struct Generator {
    globals: Bindings,
    mixins: MixinRegistry,
    extends: HashMap<String, Vec<String>>,
    /// Layer name -> accumulated CSS, in first-seen order.
    layers: Vec<(String, String)>,
    keyframes: Vec<String>,
    media_blocks: Vec<String>,
    depth: usize,
}

/// Context threaded down the recursive walk. Cloned on every scope entry,
/// so sibling expansions never observe each other's local bindings.
#[derive(Clone, Debug, Default)]
struct Context {
    locals: Bindings,
    selector: String,
    media: String,
    layer: String,
}

impl Generator {
    fn scope<'a>(&'a self, ctx: &'a Context) -> Scope<'a> {
        Scope {
            globals: &self.globals,
            locals: &ctx.locals,
        }
    }

    fn statements(&mut self, stmts: &[Stmt], ctx: &mut Context) -> CompileResult<String> {
        let mut out = String::new();
        for stmt in stmts {
            out.push_str(&self.statement(stmt, ctx)?);
        }
        Ok(out)
    }

    fn statement(&mut self, stmt: &Stmt, ctx: &mut Context) -> CompileResult<String> {
        match stmt {
            Stmt::Variable(decl) => Ok(self.variable(decl, ctx)),
            Stmt::Mixin(decl) => {
                self.mixin(decl, ctx);
                Ok(String::new())
            }
            Stmt::Include(include) => self.include(include, ctx),
            Stmt::Extend(extend) => {
                self.extend(extend, ctx);
                Ok(String::new())
            }
            Stmt::Layer(layer) => self.layer(layer, ctx),
            Stmt::Keyframes(rule) => self.keyframes_rule(rule, ctx),
            Stmt::Media(rule) => self.media(rule, ctx),
            Stmt::Rule(rule) => self.rule(rule, ctx),
            Stmt::Block(block) => self.property_block(block, ctx),
            Stmt::Property(property) => Ok(self.property(property, ctx)),
        }
    }

    /// Global variables bind silently; rule-scoped ones also emit an inline
    /// custom property so the cascade sees them.
    fn variable(&mut self, decl: &VariableDecl, ctx: &mut Context) -> String {
        let value = value::resolve(&decl.value, &self.scope(ctx));
        if ctx.selector.is_empty() {
            self.globals.define(&decl.name, value);
            String::new()
        } else {
            let line = format!("  {}: {};\n", decl.name, value);
            ctx.locals.define(&decl.name, value);
            line
        }
    }

    /// Registers the mixin body with a snapshot of everything visible at
    /// the declaration site.
    fn mixin(&mut self, decl: &MixinDecl, ctx: &Context) {
        let mut captured = self.globals.clone();
        for (name, value) in ctx.locals.iter() {
            captured.define(name, value.to_string());
        }
        self.mixins.define(&decl.name, decl.body.clone(), captured);
    }

    fn include(&mut self, include: &IncludeStmt, ctx: &mut Context) -> CompileResult<String> {
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(CompileError::RecursionLimit {
                name: include.name.clone(),
                limit: MAX_INCLUDE_DEPTH,
            });
        }
        let Some(mixin) = self.mixins.lookup(&include.name) else {
            // unknown mixins expand to nothing; strict mode reports them
            debug!("skipping include of unknown mixin `{}`", include.name);
            return Ok(String::new());
        };
        let mixin = mixin.clone();

        // arguments are resolved in the caller's environment, then bound
        // over the captured one
        let args: Vec<String> = include
            .args
            .iter()
            .map(|arg| value::resolve(arg, &self.scope(ctx)))
            .collect();

        let mut child = ctx.clone();
        child.locals = mixin.captured;
        for (index, arg) in args.into_iter().enumerate() {
            child.locals.define(&format!("--param-{}", index + 1), arg);
        }

        self.depth += 1;
        let expanded = self.statements(&mixin.body, &mut child);
        self.depth -= 1;
        expanded
    }

    /// Records the extend under the selector active at this point. A rule
    /// whose own selector matches the key is later emitted with the bases
    /// merged into its selector list.
    fn extend(&mut self, extend: &ExtendStmt, ctx: &Context) {
        if ctx.selector.is_empty() {
            debug!("`@extend` outside a rule has nothing to attach to");
        }
        let entry = self.extends.entry(ctx.selector.clone()).or_default();
        for base in &extend.bases {
            if !entry.contains(base) {
                entry.push(base.clone());
            }
        }
    }

    fn layer(&mut self, layer: &LayerStmt, ctx: &mut Context) -> CompileResult<String> {
        let name = layer.name.clone().unwrap_or_default();
        let mut child = ctx.clone();
        child.layer = name.clone();
        let body = self.statements(&layer.body, &mut child)?;
        // rules bucket themselves during the walk; anything left over
        // (inline custom properties) joins the same bucket
        if !body.is_empty() {
            self.append_layer(&name, &body);
        }
        Ok(String::new())
    }

    fn keyframes_rule(&mut self, rule: &KeyframesRule, ctx: &Context) -> CompileResult<String> {
        let mut child = ctx.clone();
        child.selector = String::new();
        let mut body = String::new();
        for block in &rule.blocks {
            let mut lines = String::new();
            for property in &block.properties {
                lines.push_str(&self.property(property, &child));
            }
            body.push_str(&format!("{} {{\n{}}}\n", block.stage, lines));
        }
        self.keyframes
            .push(format!("@keyframes {} {{\n{}}}\n", rule.name, body));
        Ok(String::new())
    }

    fn media(&mut self, rule: &MediaRule, ctx: &mut Context) -> CompileResult<String> {
        let mut child = ctx.clone();
        child.media = rule.query.clone();
        let body = self.statements(&rule.body, &mut child)?;
        if !body.is_empty() {
            self.media_blocks
                .push(format!("@media {} {{\n{}}}\n", rule.query, body));
        }
        Ok(String::new())
    }

    fn rule(&mut self, rule: &StyleRule, ctx: &mut Context) -> CompileResult<String> {
        let prefix = ctx.selector.clone();
        let own = rule.selector.text();
        let full_parts = join_selector(&prefix, &rule.selector);
        let full = full_parts.join(", ");

        let mut child = ctx.clone();
        child.selector = full.clone();

        let mut lines = String::new();
        let mut trailing = String::new();
        for item in &rule.items {
            match item {
                RuleItem::Property(property) => {
                    lines.push_str(&self.property(property, &child));
                }
                RuleItem::Variable(decl) => lines.push_str(&self.variable(decl, &mut child)),
                RuleItem::Include(include) => lines.push_str(&self.include(include, &mut child)?),
                RuleItem::Extend(extend) => self.extend(extend, &child),
                RuleItem::Nested(nested) => trailing.push_str(&self.rule(nested, &mut child)?),
                RuleItem::Block(block) => {
                    trailing.push_str(&self.property_block(block, &mut child)?);
                }
            }
        }

        let emitted_selector = match self.extends.get(&own) {
            Some(bases) => {
                let mut merged = bases.clone();
                for part in &full_parts {
                    if !merged.contains(part) {
                        merged.push(part.clone());
                    }
                }
                merged.join(", ")
            }
            None => full,
        };

        let mut text = format!("{} {{\n{}}}\n", emitted_selector, lines);
        text.push_str(&trailing);

        // an outermost rule under an active layer belongs to that layer's
        // bucket; under an active media query the enclosing walk collects it
        if prefix.is_empty() && ctx.media.is_empty() && !ctx.layer.is_empty() {
            self.append_layer(&ctx.layer, &text);
            return Ok(String::new());
        }
        Ok(text)
    }

    /// Property-style nesting lowers to a rule whose selector carries a
    /// `name:value` suffix.
    fn property_block(&mut self, block: &PropertyBlock, ctx: &mut Context) -> CompileResult<String> {
        let prefix = ctx.selector.clone();
        let resolved = value::resolve(&block.value, &self.scope(ctx));
        let suffix = format!("{}:{}", block.name, resolved);
        let full = if prefix.is_empty() {
            suffix
        } else {
            format!("{prefix} {suffix}")
        };

        let mut lines = String::new();
        for property in &block.properties {
            lines.push_str(&self.property(property, ctx));
        }
        let text = format!("{} {{\n{}}}\n", full, lines);

        if prefix.is_empty() && ctx.media.is_empty() && !ctx.layer.is_empty() {
            self.append_layer(&ctx.layer, &text);
            return Ok(String::new());
        }
        Ok(text)
    }

    fn property(&self, property: &Property, ctx: &Context) -> String {
        let value = value::resolve(&property.value, &self.scope(ctx));
        let important = if property.important { " !important" } else { "" };
        format!("  {}: {}{};\n", property.name, value, important)
    }

    fn append_layer(&mut self, name: &str, text: &str) {
        if let Some((_, bucket)) = self.layers.iter_mut().find(|(n, _)| n == name) {
            bucket.push_str(text);
        } else {
            self.layers.push((name.to_string(), text.to_string()));
        }
    }
}

/// Joins the active prefix with a rule's own selector list. A `&` in a
/// part splices the prefix in place of descendant nesting.
fn join_selector(prefix: &str, selector: &Selector) -> Vec<String> {
    selector
        .parts
        .iter()
        .map(|part| {
            if part.contains('&') {
                part.replace('&', prefix)
            } else if prefix.is_empty() {
                part.clone()
            } else {
                format!("{prefix} {part}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn generate_source(source: &str) -> String {
        let tokens = tokenize(source).expect("tokenize failed");
        let sheet = parse(&tokens).expect("parse failed");
        generate(&sheet).expect("generate failed")
    }

    #[test]
    fn global_variables_surface_as_a_root_block() {
        let css = generate_source("--c: red;\na { color: var(--c); }");
        assert!(css.contains(":root {\n  --c: red;\n}"), "{css}");
        assert!(css.contains("a {\n  color: red;\n}"), "{css}");
    }

    #[test]
    fn unknown_variables_pass_through() {
        let css = generate_source("a { color: var(--missing); }");
        assert!(css.contains("color: var(--missing);"), "{css}");
    }

    #[test]
    fn mixin_expansion_inlines_the_body() {
        let css = generate_source("@mixin m { color: red; }\na { @include m; }");
        assert!(css.contains("a {\n  color: red;\n}"), "{css}");
    }

    #[test]
    fn mixin_arguments_bind_positionally() {
        let css = generate_source(
            "@mixin pad { padding: var(--param-1) var(--param-2); }\na { @include pad(4px, 8px); }",
        );
        assert!(css.contains("padding: 4px 8px;"), "{css}");
    }

    #[test]
    fn mixin_capture_snapshots_the_declaration_site() {
        let css = generate_source(
            "--c: red;\n@mixin tint { color: var(--c); }\n--c: blue;\na { @include tint; }",
        );
        // the mixin saw --c while it was still red
        assert!(css.contains("a {\n  color: red;\n}"), "{css}");
        assert!(css.contains("--c: blue;"), "{css}");
    }

    #[test]
    fn unknown_mixin_expands_to_nothing() {
        let css = generate_source("a { color: red; @include ghost; }");
        assert!(css.contains("a {\n  color: red;\n}"), "{css}");
    }

    #[test]
    fn self_including_mixin_hits_the_depth_limit() {
        let tokens = tokenize("@mixin m { @include m; }\na { @include m; }").unwrap();
        let sheet = parse(&tokens).unwrap();
        match generate(&sheet) {
            Err(CompileError::RecursionLimit { name, limit }) => {
                assert_eq!(name, "m");
                assert_eq!(limit, MAX_INCLUDE_DEPTH);
            }
            other => panic!("expected a recursion limit error, got {other:?}"),
        }
    }

    #[test]
    fn media_rules_defer_to_the_end_and_never_emit_inline() {
        let css = generate_source("@media screen { a { color: red; } }\nb { color: blue; }");
        let media_at = css.find("@media screen").expect("media block missing");
        // exactly one copy of the rule, inside the media block
        assert_eq!(css.matches("a {").count(), 1, "{css}");
        assert!(css.find("a {").unwrap() > media_at, "{css}");
        assert!(css.find("b {").unwrap() < media_at, "{css}");
    }

    #[test]
    fn layers_collect_their_rules_into_one_bucket() {
        let css = generate_source(
            "@layer base { a { color: red; } }\n@layer base { b { color: blue; } }",
        );
        assert_eq!(css.matches("@layer base {").count(), 1, "{css}");
        let layer_at = css.find("@layer base").unwrap();
        assert!(css.find("a {").unwrap() > layer_at, "{css}");
        assert!(css.find("b {").unwrap() > layer_at, "{css}");
    }

    #[test]
    fn keyframes_defer_with_their_stages() {
        let css = generate_source("@keyframes fade { from { opacity: 0; } to { opacity: 1; } }");
        assert!(css.contains("@keyframes fade {"), "{css}");
        assert!(css.contains("from {\n  opacity: 0;\n}"), "{css}");
    }

    #[test]
    fn category_order_is_fixed_regardless_of_source_order() {
        let css = generate_source(
            "@media screen { m { color: red; } }\n@keyframes k { from { opacity: 0; } }\n@layer l { x { color: blue; } }\nbody { margin: 0; }\n--g: 1;",
        );
        let root_vars = css.find(":root").unwrap();
        let body = css.find("body {").unwrap();
        let layer = css.find("@layer l").unwrap();
        let keyframes = css.find("@keyframes k").unwrap();
        let media = css.find("@media screen").unwrap();
        assert!(root_vars < body, "{css}");
        assert!(body < layer, "{css}");
        assert!(layer < keyframes, "{css}");
        assert!(keyframes < media, "{css}");
    }

    #[test]
    fn nested_rules_join_selectors_with_the_prefix() {
        let css = generate_source("nav { color: black; a { color: blue; } }");
        assert!(css.contains("nav a {\n  color: blue;\n}"), "{css}");
    }

    #[test]
    fn ampersand_splices_the_parent_selector() {
        let css = generate_source(".card { &:hover { border: 0; } }");
        assert!(css.contains(".card:hover {"), "{css}");
    }

    #[test]
    fn extends_merge_base_selectors_into_the_rule() {
        let css = generate_source(".child { @extend .base; color: red; }");
        assert!(css.contains(".base, .child {\n  color: red;\n}"), "{css}");
    }

    #[test]
    fn rule_scoped_variables_emit_inline_and_shadow_globals() {
        let css = generate_source("--c: red;\na { --c: blue; color: var(--c); }");
        assert!(css.contains("a {\n  --c: blue;\n  color: blue;\n}"), "{css}");
        assert!(css.contains(":root {\n  --c: red;\n}"), "{css}");
    }

    #[test]
    fn property_blocks_lower_to_suffixed_selectors() {
        let css = generate_source("transition: color { duration: 150ms; }");
        assert!(css.contains("transition:color {\n  duration: 150ms;\n}"), "{css}");
    }

    #[test]
    fn duplicate_declarations_merge_per_selector() {
        let css = generate_source("a { color: red; }\na { color: red; margin: 0; }");
        assert_eq!(css.matches("a {").count(), 1, "{css}");
        assert_eq!(css.matches("color: red;").count(), 1, "{css}");
        assert!(css.contains("margin: 0;"), "{css}");
    }
}
