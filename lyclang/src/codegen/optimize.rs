//! Root-stream optimization: rules sharing a selector are merged into one
//! block and duplicate declarations are dropped, keeping first-seen order.
//!
//! This is a text-level pass over the generated root CSS only; layer,
//! keyframes and media buckets are assembled as collected. Text that is not
//! part of a `selector { ... }` block (stray declarations from a top-level
//! include) passes through untouched.

/// Merges same-selector rules and deduplicates their declarations.
pub fn merge_rules(css: &str) -> String {
    let mut rules: Vec<(String, Vec<String>)> = Vec::new();
    let mut passthrough = String::new();

    let mut rest = css;
    while let Some(open) = rest.find('{') {
        let mut selector = rest[..open].trim();
        // anything ending in `;` before the selector is not part of it
        if let Some(semi) = selector.rfind(';') {
            passthrough.push_str(selector[..=semi].trim());
            passthrough.push('\n');
            selector = selector[semi + 1..].trim();
        }
        let Some(close) = rest[open + 1..].find('}') else {
            break;
        };
        let body = &rest[open + 1..open + 1 + close];
        rest = &rest[open + 1 + close + 1..];

        if selector.is_empty() {
            continue;
        }

        let index = match rules.iter().position(|(s, _)| s == selector) {
            Some(index) => index,
            None => {
                rules.push((selector.to_string(), Vec::new()));
                rules.len() - 1
            }
        };
        let declarations = &mut rules[index].1;
        for fragment in body.split(';') {
            let declaration = fragment.trim();
            if !declaration.is_empty() && !declarations.iter().any(|d| d == declaration) {
                declarations.push(declaration.to_string());
            }
        }
    }
    let tail = rest.trim();
    if !tail.is_empty() {
        passthrough.push_str(tail);
        passthrough.push('\n');
    }

    let mut out = String::new();
    for (selector, declarations) in &rules {
        out.push_str(selector);
        out.push_str(" {\n");
        for declaration in declarations {
            out.push_str("  ");
            out.push_str(declaration);
            out.push_str(";\n");
        }
        out.push_str("}\n");
    }
    out.push_str(&passthrough);
    out
}
