use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named template helper.
///
/// Helpers receive already-evaluated argument values and return a value to be
/// spliced into the output. Errors are plain messages; the evaluator attaches
/// the call site's position.
pub type HelperFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// Render a value the way it appears in template output.
///
/// `null` (and missing paths, which evaluate to `null`) renders as the empty
/// string; compound values render as compact JSON.
pub(crate) fn display_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn single_string(name: &str, args: &[Value]) -> Result<String, String> {
    match args {
        [v] => Ok(display_value(v)),
        _ => Err(format!("{name} expects exactly one argument")),
    }
}

/// The built-in helper set every compiler produced by the factory carries:
/// case conversion (`uppercase`, `lowercase`) and string-equality branching
/// (`eq a b then [else]`).
pub fn builtin_helpers() -> BTreeMap<String, HelperFn> {
    let mut m: BTreeMap<String, HelperFn> = BTreeMap::new();

    m.insert(
        "uppercase".to_owned(),
        Arc::new(|args: &[Value]| {
            Ok(Value::String(single_string("uppercase", args)?.to_uppercase()))
        }),
    );

    m.insert(
        "lowercase".to_owned(),
        Arc::new(|args: &[Value]| {
            Ok(Value::String(single_string("lowercase", args)?.to_lowercase()))
        }),
    );

    m.insert(
        "eq".to_owned(),
        Arc::new(|args: &[Value]| {
            if args.len() < 3 || args.len() > 4 {
                return Err("eq expects (a, b, then[, else]) arguments".to_owned());
            }
            let hit = display_value(&args[0]) == display_value(&args[1]);
            Ok(if hit {
                args[2].clone()
            } else {
                args.get(3).cloned().unwrap_or(Value::Null)
            })
        }),
    );

    m
}
