//! Final document assembly in a fixed category order: the `:root` globals
//! block, root-level rules, layers, keyframes, then media blocks. Empty
//! sections contribute nothing.

use super::scope::Bindings;

pub fn assemble(
    globals: &Bindings,
    root: &str,
    layers: &[(String, String)],
    keyframes: &[String],
    media_blocks: &[String],
) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !globals.is_empty() {
        let mut block = String::from(":root {\n");
        for (name, value) in globals.iter() {
            block.push_str(&format!("  {name}: {value};\n"));
        }
        block.push_str("}\n");
        sections.push(block);
    }

    if !root.trim().is_empty() {
        sections.push(root.to_string());
    }

    for (name, content) in layers {
        let header = if name.is_empty() {
            "@layer".to_string()
        } else {
            format!("@layer {name}")
        };
        sections.push(format!("{header} {{\n{content}}}\n"));
    }

    for block in keyframes {
        sections.push(block.clone());
    }
    for block in media_blocks {
        sections.push(block.clone());
    }

    sections.join("\n")
}
