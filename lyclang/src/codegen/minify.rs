//! Text-level minification of the assembled document.
//!
//! Strictly textual: comments are stripped, whitespace collapses to single
//! spaces, spaces next to `{ } : ; ,` and around the `+ > ~` combinators
//! disappear, a `;` before `}` is dropped, `0.5` loses its leading zero and
//! zero lengths lose their unit. Quoted strings pass through untouched.
//! Running the pass over its own output changes nothing.

/// Characters that never keep a space next to them.
const TIGHT: &[char] = &['{', '}', ':', ';', ',', '>', '+', '~'];

/// Length, time and angle units a zero may shed. `%` stays: a `0%`
/// keyframe stage must survive minification.
const ZERO_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "ch", "vw", "vh", "vmin", "vmax", "cm", "mm", "q", "in", "pt", "pc",
    "fr", "s", "ms", "deg", "rad", "grad", "turn",
];

pub fn minify(css: &str) -> String {
    let stripped = strip_comments(css);
    let collapsed = collapse(&stripped);
    compress_numbers(&collapsed).trim().to_string()
}

fn strip_comments(css: &str) -> String {
    let chars: Vec<char> = css.chars().collect();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            quote @ ('"' | '\'') => i = copy_string(&chars, i, quote, &mut out),
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Collapses whitespace runs, removes spaces next to tight punctuation and
/// drops a trailing `;` before `}`.
fn collapse(css: &str) -> String {
    let chars: Vec<char> = css.chars().collect();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;
    let mut pending_space = false;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            i += 1;
            continue;
        }
        if pending_space {
            let prev = out.chars().last();
            if !TIGHT.contains(&c) && !prev.is_some_and(|p| TIGHT.contains(&p)) {
                out.push(' ');
            }
            pending_space = false;
        }
        match c {
            quote @ ('"' | '\'') => {
                i = copy_string(&chars, i, quote, &mut out);
                continue;
            }
            '}' => {
                if out.ends_with(';') {
                    out.pop();
                }
                out.push('}');
            }
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Drops the leading zero of a decimal fraction and the unit of a zero
/// length.
fn compress_numbers(css: &str) -> String {
    let chars: Vec<char> = css.chars().collect();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            quote @ ('"' | '\'') => {
                i = copy_string(&chars, i, quote, &mut out);
                continue;
            }
            '0' if !out.chars().last().is_some_and(|p| p.is_ascii_digit() || p == '.') => {
                // `0.5` -> `.5`
                if chars.get(i + 1) == Some(&'.')
                    && chars.get(i + 2).is_some_and(|d| d.is_ascii_digit())
                {
                    out.push('.');
                    i += 2;
                    continue;
                }
                // `0px` -> `0`
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_ascii_alphabetic() {
                    j += 1;
                }
                let unit: String = chars[i + 1..j].iter().collect();
                let boundary = chars
                    .get(j)
                    .is_none_or(|&d| !d.is_ascii_alphanumeric() && d != '%' && d != '-');
                if !unit.is_empty() && boundary && ZERO_UNITS.contains(&unit.to_lowercase().as_str())
                {
                    out.push('0');
                    i = j;
                    continue;
                }
                out.push('0');
            }
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Copies a quoted string verbatim, honoring backslash escapes. Returns the
/// index just past the closing quote.
fn copy_string(chars: &[char], start: usize, quote: char, out: &mut String) -> usize {
    out.push(chars[start]);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' && i < chars.len() {
            out.push(chars[i]);
            i += 1;
        } else if c == quote {
            break;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_punctuation() {
        let css = "a {\n  color: red;\n  margin: 0 auto;\n}\n";
        assert_eq!(minify(css), "a{color:red;margin:0 auto}");
    }

    #[test]
    fn drops_the_semicolon_before_a_closing_brace() {
        assert_eq!(minify("a { color: red; }"), "a{color:red}");
    }

    #[test]
    fn strips_comments() {
        assert_eq!(minify("a { /* note */ color: red; }"), "a{color:red}");
    }

    #[test]
    fn tightens_selector_combinators() {
        assert_eq!(minify("a > b + c ~ d { margin: 0; }"), "a>b+c~d{margin:0}");
    }

    #[test]
    fn drops_leading_zero_of_decimal_fractions() {
        assert_eq!(minify("a { opacity: 0.5; }"), "a{opacity:.5}");
        assert_eq!(minify("a { width: 10.5px; }"), "a{width:10.5px}");
    }

    #[test]
    fn zero_lengths_lose_their_unit() {
        assert_eq!(minify("a { margin: 0px 0em 0rem; }"), "a{margin:0 0 0}");
        assert_eq!(minify("a { width: 10px; }"), "a{width:10px}");
    }

    #[test]
    fn zero_percent_keyframe_stages_survive() {
        let css = "@keyframes k {\n0% {\n  opacity: 0;\n}\n}\n";
        assert_eq!(minify(css), "@keyframes k{0%{opacity:0}}");
    }

    #[test]
    fn quoted_strings_are_untouched() {
        let css = "a { font-family: \"Helvetica  Neue\", sans-serif; }";
        assert_eq!(minify(css), "a{font-family:\"Helvetica  Neue\",sans-serif}");
    }

    #[test]
    fn minification_is_idempotent() {
        let css = "a {\n  color: red;\n}\n\n@media screen {\nb {\n  margin: 0px;\n}\n}\n";
        let once = minify(css);
        assert_eq!(minify(&once), once);
    }

    #[test]
    fn hex_colors_are_not_mistaken_for_zero_lengths() {
        assert_eq!(minify("a { color: #0a0e0f; }"), "a{color:#0a0e0f}");
    }
}
