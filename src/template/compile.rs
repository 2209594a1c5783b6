use crate::foundation::error::{PlatenError, PlatenResult};
use crate::scene::model::{Asset, DataRow};
use crate::template::error::TemplateError;
use crate::template::helpers::{HelperFn, builtin_helpers, display_value};
use crate::template::parser::{Expr, PathRoot, PathSeg, Segment, parse_template};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The reserved context key under which the bound data row is exposed.
pub const ROW_KEY: &str = "$$";

/// Compiles layer fragment templates against one bound data row and a fixed
/// helper set.
///
/// Binding data is fixed at construction time. Compilation and evaluation are
/// synchronous and referentially transparent: the same template plus the same
/// merged context always yields the same output.
pub struct TemplateCompiler {
    context: Map<String, Value>,
    helpers: BTreeMap<String, HelperFn>,
}

impl TemplateCompiler {
    /// Bind one data row (exposed as `$$`) and a helper set.
    ///
    /// `helpers` is taken as-is; [`compiler_for_asset`] is the constructor
    /// that layers an asset's helpers over the built-ins.
    pub fn new(row: DataRow, helpers: BTreeMap<String, HelperFn>) -> Self {
        let mut context = Map::new();
        context.insert(ROW_KEY.to_owned(), Value::Array(row));
        Self { context, helpers }
    }

    /// Parse a template into an evaluatable form bound to this compiler.
    pub fn compile(&self, template: &str) -> PlatenResult<CompiledTemplate<'_>> {
        let segments =
            parse_template(template).map_err(|e| PlatenError::template(e.to_string()))?;
        Ok(CompiledTemplate {
            segments,
            compiler: self,
        })
    }
}

impl std::fmt::Debug for TemplateCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCompiler")
            .field("context", &self.context)
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A parsed template ready for evaluation against its compiler's bindings.
#[derive(Debug)]
pub struct CompiledTemplate<'c> {
    segments: Vec<Segment>,
    compiler: &'c TemplateCompiler,
}

impl CompiledTemplate<'_> {
    /// Evaluate the template.
    ///
    /// `extra` is merged over the bound context; caller-supplied keys win on
    /// conflict (including the reserved `$$` key). Missing paths render as
    /// the empty string; an undefined helper is an error.
    pub fn render(&self, extra: Option<&Map<String, Value>>) -> PlatenResult<String> {
        let merged;
        let context = match extra {
            None => &self.compiler.context,
            Some(extra) => {
                let mut m = self.compiler.context.clone();
                for (k, v) in extra {
                    m.insert(k.clone(), v.clone());
                }
                merged = m;
                &merged
            }
        };

        eval_segments(&self.segments, context, &self.compiler.helpers)
            .map_err(|e| PlatenError::template(e.to_string()))
    }
}

fn eval_segments(
    segments: &[Segment],
    context: &Map<String, Value>,
    helpers: &BTreeMap<String, HelperFn>,
) -> Result<String, TemplateError> {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Text(t) => out.push_str(t),
            Segment::Expr(e) => out.push_str(&display_value(&eval_expr(e, context, helpers)?)),
        }
    }
    Ok(out)
}

fn eval_expr(
    expr: &Expr,
    context: &Map<String, Value>,
    helpers: &BTreeMap<String, HelperFn>,
) -> Result<Value, TemplateError> {
    match expr {
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Number(n) => Ok(number_value(*n)),
        Expr::Path(path) => {
            // A bare name that is not bound in the context but is a registered
            // helper is a zero-argument helper call.
            if let PathRoot::Name(name) = &path.root
                && path.segs.is_empty()
                && !context.contains_key(name)
                && let Some(helper) = helpers.get(name)
            {
                return helper(&[]).map_err(|msg| TemplateError::new(path.offset, msg));
            }

            let root = match &path.root {
                PathRoot::Row => context.get(ROW_KEY),
                PathRoot::Name(name) => context.get(name),
            };
            let mut cur = match root {
                Some(v) => v,
                None => return Ok(Value::Null),
            };
            for seg in &path.segs {
                let next = match seg {
                    PathSeg::Field(f) => cur.get(f),
                    PathSeg::Index(i) => cur.get(i),
                };
                match next {
                    Some(v) => cur = v,
                    None => return Ok(Value::Null),
                }
            }
            Ok(cur.clone())
        }
        Expr::Call { name, offset, args } => {
            let helper = helpers
                .get(name)
                .ok_or_else(|| TemplateError::new(*offset, format!("unknown helper '{name}'")))?;
            let argv = args
                .iter()
                .map(|a| eval_expr(a, context, helpers))
                .collect::<Result<Vec<_>, _>>()?;
            helper(&argv).map_err(|msg| TemplateError::new(*offset, msg))
        }
    }
}

/// Integer-valued literals display without a fractional part, matching how
/// integer row values display.
fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= i64::MAX as f64 {
        Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Build a template compiler for one asset and one row of its data source.
///
/// Resolves the asset's data source (`Ok(None)` when there is none), fetches
/// its rows, and binds the row at `row_index` (`Ok(None)` when out of range)
/// together with the asset's helpers layered over the built-ins. Every call
/// produces an independent compiler; asset and helper state may have changed
/// between calls, so nothing is cached.
pub fn compiler_for_asset(
    asset: &dyn Asset,
    row_index: usize,
) -> PlatenResult<Option<TemplateCompiler>> {
    let Some(source) = asset.data() else {
        return Ok(None);
    };
    let mut rows = source.fetch_rows()?;
    if row_index >= rows.len() {
        return Ok(None);
    }
    let row = rows.swap_remove(row_index);

    let mut helpers = builtin_helpers();
    helpers.extend(asset.helpers());
    Ok(Some(TemplateCompiler::new(row, helpers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn compiler(row: DataRow) -> TemplateCompiler {
        TemplateCompiler::new(row, builtin_helpers())
    }

    #[test]
    fn binds_row_under_reserved_key() {
        let c = compiler(vec![json!("x")]);
        let t = c.compile("{{$$.[0]}}").unwrap();
        assert_eq!(t.render(None).unwrap(), "x");
    }

    #[test]
    fn extra_merge_prefers_caller_keys() {
        let c = compiler(vec![json!("x")]);
        let t = c.compile("{{$$.[0]}}").unwrap();

        // Non-reserved extra keys leave the bound row untouched.
        let mut extra = Map::new();
        extra.insert("other".to_owned(), json!(["y"]));
        assert_eq!(t.render(Some(&extra)).unwrap(), "x");

        // Overriding the reserved key explicitly wins.
        let mut extra = Map::new();
        extra.insert(ROW_KEY.to_owned(), json!(["y"]));
        assert_eq!(t.render(Some(&extra)).unwrap(), "y");
    }

    #[test]
    fn repeated_evaluation_is_byte_identical() {
        let c = compiler(vec![json!("ace"), json!(7)]);
        let src = "n={{$$.[1]}} {{uppercase $$.[0]}}!";
        let a = c.compile(src).unwrap().render(None).unwrap();
        let b = c.compile(src).unwrap().render(None).unwrap();
        assert_eq!(a, "n=7 ACE!");
        assert_eq!(a, b);
    }

    #[test]
    fn missing_paths_render_empty() {
        let c = compiler(vec![json!("x")]);
        let t = c.compile("[{{$$.[9]}}|{{nope.deep}}]").unwrap();
        assert_eq!(t.render(None).unwrap(), "[|]");
    }

    #[test]
    fn unknown_helper_is_an_error() {
        let c = compiler(vec![json!("x")]);
        let t = c.compile("{{shout $$.[0]}}").unwrap();
        let err = t.render(None).unwrap_err();
        assert!(err.to_string().contains("unknown helper 'shout'"));
    }

    #[test]
    fn helper_errors_propagate_with_position() {
        let c = compiler(vec![json!("x")]);
        let err = c
            .compile("pad {{uppercase}}")
            .unwrap()
            .render(None)
            .unwrap_err();
        assert!(err.to_string().contains("exactly one argument"));
        assert!(err.to_string().contains("byte 6"));
    }

    #[test]
    fn parse_errors_surface_from_compile() {
        let c = compiler(vec![]);
        assert!(c.compile("{{$$.[0]").is_err());
    }

    #[test]
    fn eq_helper_branches_in_templates() {
        let c = compiler(vec![json!("ace")]);
        let t = c
            .compile(r#"{{eq $$.[0] "ace" "ACE CARD" "other"}}"#)
            .unwrap();
        assert_eq!(t.render(None).unwrap(), "ACE CARD");
    }

    #[test]
    fn asset_helpers_layer_over_builtins() {
        use crate::scene::model::{Asset, DataSource};

        struct Card;
        impl DataSource for Card {
            fn fetch_rows(&self) -> PlatenResult<Vec<DataRow>> {
                Ok(vec![vec![json!("x")]])
            }
        }
        impl Asset for Card {
            fn layers(&self) -> Vec<Box<dyn crate::scene::model::Layer>> {
                Vec::new()
            }
            fn width(&self) -> u32 {
                1
            }
            fn height(&self) -> u32 {
                1
            }
            fn data(&self) -> Option<&dyn DataSource> {
                Some(self)
            }
            fn helpers(&self) -> BTreeMap<String, HelperFn> {
                let mut m: BTreeMap<String, HelperFn> = BTreeMap::new();
                m.insert(
                    "bang".to_owned(),
                    Arc::new(|args: &[Value]| -> Result<Value, String> {
                        Ok(Value::String(format!("{}!", display_value(&args[0]))))
                    }),
                );
                m
            }
        }

        let c = compiler_for_asset(&Card, 0).unwrap().unwrap();
        let t = c.compile("{{bang $$.[0]}}").unwrap();
        assert_eq!(t.render(None).unwrap(), "x!");
    }

    #[test]
    fn factory_yields_none_without_a_data_source() {
        use crate::scene::model::{Asset, DataSource, Layer};

        struct NoData;
        impl Asset for NoData {
            fn layers(&self) -> Vec<Box<dyn Layer>> {
                Vec::new()
            }
            fn width(&self) -> u32 {
                1
            }
            fn height(&self) -> u32 {
                1
            }
            fn data(&self) -> Option<&dyn DataSource> {
                None
            }
        }

        assert!(compiler_for_asset(&NoData, 0).unwrap().is_none());
    }
}
