//! Pure resolution of value expressions to literal CSS text.

use super::ast::{Atom, Operator, Value};
use super::scope::Scope;

/// Resolves a value subtree against the environment. Never fails: unknown
/// variables degrade to a `var(--name)` passthrough.
pub fn resolve(value: &Value, scope: &Scope) -> String {
    match value {
        Value::Atom(atom) => resolve_atom(atom, scope),
        Value::Function { name, args } => {
            let args: Vec<String> = args.iter().map(|arg| resolve(arg, scope)).collect();
            format!("{}({})", name, args.join(", "))
        }
        Value::Operation { left, op, right } => {
            let left = resolve_atom(left, scope);
            let right = resolve(right, scope);
            match evaluate(&left, *op, &right) {
                Some(result) => result,
                None => format!("{} {} {}", left, op.symbol(), right),
            }
        }
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(|item| resolve(item, scope)).collect();
            items.join(" ")
        }
    }
}

fn resolve_atom(atom: &Atom, scope: &Scope) -> String {
    match atom {
        Atom::Variable(name) => match scope.lookup(name) {
            Some(value) => value.to_string(),
            None => format!("var({name})"),
        },
        Atom::String(text)
        | Atom::Number(text)
        | Atom::NumberUnit(text)
        | Atom::Percentage(text)
        | Atom::HexColor(text)
        | Atom::Ident(text) => text.clone(),
    }
}

/// Applies the operator when both operands are pure numerals. Anything
/// carrying a unit, and division or modulo by zero, falls back to `None`
/// so the caller emits the literal join instead.
fn evaluate(left: &str, op: Operator, right: &str) -> Option<String> {
    if !is_numeral(left) || !is_numeral(right) {
        return None;
    }
    let a: f64 = left.parse().ok()?;
    let b: f64 = right.parse().ok()?;
    let result = match op {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div => {
            if b == 0.0 {
                return None;
            }
            a / b
        }
        Operator::Mod => {
            if b == 0.0 {
                return None;
            }
            a % b
        }
    };
    Some(format_number(result))
}

/// Optional sign, digits, optional decimal part. No unit suffix.
fn is_numeral(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() {
        return false;
    }
    let mut parts = digits.splitn(2, '.');
    let int = parts.next().unwrap_or("");
    let frac = parts.next();
    !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::scope::Bindings;

    fn empty_scope() -> (Bindings, Bindings) {
        (Bindings::new(), Bindings::new())
    }

    fn resolve_with(value: &Value, globals: &Bindings, locals: &Bindings) -> String {
        resolve(value, &Scope { globals, locals })
    }

    fn num(text: &str) -> Atom {
        Atom::Number(text.into())
    }

    #[test]
    fn unitless_arithmetic_is_evaluated() {
        let (globals, locals) = empty_scope();
        let value = Value::Operation {
            left: num("2"),
            op: Operator::Add,
            right: Box::new(Value::Atom(num("3"))),
        };
        assert_eq!(resolve_with(&value, &globals, &locals), "5");
    }

    #[test]
    fn unit_operands_fall_back_to_the_literal_join() {
        let (globals, locals) = empty_scope();
        let value = Value::Operation {
            left: Atom::NumberUnit("10px".into()),
            op: Operator::Add,
            right: Box::new(Value::Atom(num("5"))),
        };
        assert_eq!(resolve_with(&value, &globals, &locals), "10px + 5");
    }

    #[test]
    fn division_by_zero_is_not_evaluated() {
        let (globals, locals) = empty_scope();
        let value = Value::Operation {
            left: num("4"),
            op: Operator::Div,
            right: Box::new(Value::Atom(num("0"))),
        };
        assert_eq!(resolve_with(&value, &globals, &locals), "4 / 0");
    }

    #[test]
    fn chained_operations_evaluate_right_to_left() {
        let (globals, locals) = empty_scope();
        // 8 - 2 - 1 nests as 8 - (2 - 1)
        let value = Value::Operation {
            left: num("8"),
            op: Operator::Sub,
            right: Box::new(Value::Operation {
                left: num("2"),
                op: Operator::Sub,
                right: Box::new(Value::Atom(num("1"))),
            }),
        };
        assert_eq!(resolve_with(&value, &globals, &locals), "7");
    }

    #[test]
    fn fractional_results_keep_their_decimal_part() {
        let (globals, locals) = empty_scope();
        let value = Value::Operation {
            left: num("5"),
            op: Operator::Div,
            right: Box::new(Value::Atom(num("2"))),
        };
        assert_eq!(resolve_with(&value, &globals, &locals), "2.5");
    }

    #[test]
    fn bound_variables_substitute_their_value() {
        let (mut globals, locals) = empty_scope();
        globals.define("--accent", "#ff0000".into());
        let value = Value::Atom(Atom::Variable("--accent".into()));
        assert_eq!(resolve_with(&value, &globals, &locals), "#ff0000");
    }

    #[test]
    fn unknown_variables_pass_through_as_var() {
        let (globals, locals) = empty_scope();
        let value = Value::Atom(Atom::Variable("--missing".into()));
        assert_eq!(resolve_with(&value, &globals, &locals), "var(--missing)");
    }

    #[test]
    fn function_arguments_resolve_recursively() {
        let (mut globals, locals) = empty_scope();
        globals.define("--alpha", "0.5".into());
        let value = Value::Function {
            name: "rgba".into(),
            args: vec![
                Value::Atom(num("0")),
                Value::Atom(num("0")),
                Value::Atom(num("0")),
                Value::Atom(Atom::Variable("--alpha".into())),
            ],
        };
        assert_eq!(resolve_with(&value, &globals, &locals), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn lists_join_with_single_spaces() {
        let (globals, locals) = empty_scope();
        let value = Value::List(vec![
            Value::Atom(Atom::NumberUnit("1px".into())),
            Value::Atom(Atom::Ident("solid".into())),
            Value::Atom(Atom::HexColor("#000".into())),
        ]);
        assert_eq!(resolve_with(&value, &globals, &locals), "1px solid #000");
    }
}
