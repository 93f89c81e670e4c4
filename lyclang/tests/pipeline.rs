use lyclang::codegen::minify::minify;
use lyclang::{CompileError, CompileOptions, compile};

fn minified(source: &str) -> String {
    compile(source, &CompileOptions::default()).expect("compile failed")
}

#[test]
fn top_level_variables_substitute_and_surface_in_root() {
    let css = minified("--c: red;\na { color: var(--c); }");
    assert_eq!(css, ":root{--c:red}a{color:red}");
}

#[test]
fn minification_is_idempotent_for_plain_rules() {
    let css = minified("--c: red;\na { color: var(--c); margin: 0px auto; }\nb { opacity: 0.5; }");
    assert_eq!(minify(&css), css);
}

#[test]
fn unitless_arithmetic_evaluates_and_united_falls_back() {
    let css = minified("a { z-index: 2 + 3; width: 10px + 5; }");
    assert!(css.contains("z-index:5"), "{css}");
    assert!(css.contains("width:10px+5"), "{css}");
}

#[test]
fn strictness_decides_the_fate_of_unknown_variables() {
    let strict = CompileOptions {
        strict: true,
        ..CompileOptions::default()
    };
    let err = compile("a { color: var(--missing); }", &strict).unwrap_err();
    assert!(matches!(err, CompileError::UndefinedVariable { .. }));

    let css = minified("a { color: var(--missing); }");
    assert_eq!(css, "a{color:var(--missing)}");
}

#[test]
fn mixins_expand_at_their_include_site() {
    let css = minified("@mixin m { color: red; }\na { @include m; }");
    assert_eq!(css, "a{color:red}");
}

#[test]
fn media_content_appears_exactly_once_at_the_end() {
    let css = minified("@media print { .page { margin: 0; } }\n.screen { margin: 1px; }");
    assert_eq!(css.matches(".page{").count(), 1, "{css}");
    let media_at = css.find("@media print").unwrap();
    assert!(css.find(".page{").unwrap() > media_at, "{css}");
    assert!(css.find(".screen{").unwrap() < media_at, "{css}");
}

#[test]
fn output_categories_keep_their_fixed_order() {
    let css = minified(
        "@media screen { .m { color: red; } }\n\
         @keyframes spin { from { opacity: 0; } }\n\
         @layer base { .l { color: blue; } }\n\
         .r { margin: 0; }\n\
         --g: 1;",
    );
    let root_vars = css.find(":root").unwrap();
    let rule = css.find(".r{").unwrap();
    let layer = css.find("@layer base").unwrap();
    let keyframes = css.find("@keyframes spin").unwrap();
    let media = css.find("@media screen").unwrap();
    assert!(root_vars < rule && rule < layer && layer < keyframes && keyframes < media, "{css}");
}

#[test]
fn minified_output_reparses_as_balanced_css() {
    let css = minified(
        "--c: #fff;\n\
         @mixin pad { padding: var(--param-1); }\n\
         .a { @include pad(4px); color: var(--c); .b { margin: 0; } }\n\
         @layer ui { .c { border: 1px solid var(--c); } }\n\
         @keyframes fade { 0% { opacity: 0; } 100% { opacity: 1; } }\n\
         @media screen { .d { width: 50%; } }",
    );
    let mut depth = 0i32;
    for c in css.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                assert!(depth >= 0, "unbalanced braces in {css}");
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0, "unbalanced braces in {css}");
    assert!(!css.contains(";;"), "{css}");
    assert!(!css.contains(";}"), "{css}");
}
