//! `tostring` for script values.
//!
//! Tables (maps and arrays) print as an indented block:
//!
//! ```text
//! {
//!   name = "probe",
//!   pos = {
//!     x = 1,
//!   },
//! }
//! ```
//!
//! A map with a `__tostring` function field is printed by calling it. Shared
//! tables are tracked by identity: a table that contains one of its own
//! ancestors prints `@self` there, and a table already printed elsewhere in
//! the same call prints `@table`.

use std::collections::HashSet;

use rhai::{Array, Dynamic, EvalAltResult, ImmutableString, Map, NativeCallContext};

use crate::script_introspection::{function_field, primitive_type_name};

pub const TOSTRING_FIELD: &str = "__tostring";

const INDENT: &str = "  ";

/// Format `value` for display. `ctx` is needed to call `__tostring` methods;
/// without it they are ignored.
pub fn to_display_string(value: &Dynamic, ctx: Option<&NativeCallContext>) -> Result<String, Box<EvalAltResult>> {
    TableWalk {
        ctx,
        ancestors: Vec::new(),
        printed: HashSet::new(),
    }
    .value(value, 0, false)
}

struct TableWalk<'a, 'c> {
    ctx: Option<&'a NativeCallContext<'c>>,
    ancestors: Vec<usize>,
    printed: HashSet<usize>,
}

enum Entries<'v> {
    Map(&'v Map),
    Array(&'v Array),
}

impl TableWalk<'_, '_> {
    fn value(&mut self, value: &Dynamic, depth: usize, nested: bool) -> Result<String, Box<EvalAltResult>> {
        if let Some(text) = self.custom(value)? {
            return Ok(text);
        }
        if let Some(map) = value.read_lock::<Map>() {
            return self.table(value.is_shared().then(|| &*map as *const Map as usize), Entries::Map(&*map), depth);
        }
        if let Some(array) = value.read_lock::<Array>() {
            return self.table(
                value.is_shared().then(|| &*array as *const Array as usize),
                Entries::Array(&*array),
                depth,
            );
        }
        Ok(scalar(value, nested))
    }

    fn custom(&mut self, value: &Dynamic) -> Result<Option<String>, Box<EvalAltResult>> {
        let Some(ctx) = self.ctx else {
            return Ok(None);
        };
        let method = match value.read_lock::<Map>() {
            Some(map) => function_field(&map, TOSTRING_FIELD),
            None => None,
        };
        let Some(method) = method else {
            return Ok(None);
        };
        let result: Dynamic = method.call_within_context(ctx, (value.clone(),))?;
        let text = match result.read_lock::<ImmutableString>() {
            Some(s) => s.to_string(),
            None => scalar(&result, false),
        };
        Ok(Some(text))
    }

    fn table(&mut self, identity: Option<usize>, entries: Entries<'_>, depth: usize) -> Result<String, Box<EvalAltResult>> {
        if let Some(id) = identity {
            if self.ancestors.contains(&id) {
                return Ok("@self".to_string());
            }
            if !self.printed.insert(id) {
                return Ok("@table".to_string());
            }
            self.ancestors.push(id);
        }

        let mut lines = Vec::new();
        match entries {
            Entries::Map(map) => {
                for (key, item) in map.iter() {
                    lines.push((key.to_string(), self.value(item, depth + 1, true)?));
                }
            }
            Entries::Array(array) => {
                for (i, item) in array.iter().enumerate() {
                    lines.push((format!("[{}]", i + 1), self.value(item, depth + 1, true)?));
                }
            }
        }

        if identity.is_some() {
            self.ancestors.pop();
        }

        if lines.is_empty() {
            return Ok("{}".to_string());
        }
        let inner = INDENT.repeat(depth + 1);
        let mut out = String::from("{\n");
        for (key, text) in lines {
            out.push_str(&format!("{}{} = {},\n", inner, key, text));
        }
        out.push_str(&INDENT.repeat(depth));
        out.push('}');
        Ok(out)
    }
}

/// Non-table values. Strings are quoted when nested inside a table.
fn scalar(value: &Dynamic, nested: bool) -> String {
    if let Some(s) = value.read_lock::<ImmutableString>() {
        return if nested { format!("\"{}\"", s.as_str()) } else { s.to_string() };
    }
    if let Ok(c) = value.as_char() {
        return if nested { format!("\"{}\"", c) } else { c.to_string() };
    }
    match primitive_type_name(value) {
        "nil" => "nil".to_string(),
        "function" => format!("function: {}", value),
        "table" => "table".to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Dynamic)]) -> Map {
        entries
            .iter()
            .map(|(k, v)| ((*k).into(), v.clone()))
            .collect()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(to_display_string(&Dynamic::UNIT, None).unwrap(), "nil");
        assert_eq!(to_display_string(&Dynamic::from(42_i64), None).unwrap(), "42");
        assert_eq!(to_display_string(&Dynamic::from("plain"), None).unwrap(), "plain");
        assert_eq!(to_display_string(&Dynamic::from(false), None).unwrap(), "false");
    }

    #[test]
    fn test_nested_table_layout() {
        let inner = map(&[("x", Dynamic::from(1_i64))]);
        let outer = map(&[
            ("name", Dynamic::from("probe")),
            ("pos", Dynamic::from_map(inner)),
        ]);
        let text = to_display_string(&Dynamic::from_map(outer), None).unwrap();
        assert_eq!(text, "{\n  name = \"probe\",\n  pos = {\n    x = 1,\n  },\n}");
    }

    #[test]
    fn test_arrays_are_one_based() {
        let array = vec![Dynamic::from(10_i64), Dynamic::from(20_i64)];
        let text = to_display_string(&Dynamic::from_array(array), None).unwrap();
        assert_eq!(text, "{\n  [1] = 10,\n  [2] = 20,\n}");
        assert_eq!(to_display_string(&Dynamic::from_array(vec![]), None).unwrap(), "{}");
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut table = Dynamic::from_map(map(&[("a", Dynamic::from(1_i64))])).into_shared();
        let alias = table.clone();
        if let Some(mut guard) = table.write_lock::<Map>() {
            guard.insert("me".into(), alias);
        }

        let text = to_display_string(&table, None).unwrap();
        assert!(text.contains("me = @self"), "{text}");
        assert!(text.contains("a = 1"));
    }

    #[test]
    fn test_repeated_table_is_abbreviated() {
        let shared = Dynamic::from_map(map(&[("v", Dynamic::from(1_i64))])).into_shared();
        let outer = map(&[("first", shared.clone()), ("second", shared)]);
        let text = to_display_string(&Dynamic::from_map(outer), None).unwrap();
        assert!(text.contains("first = {"), "{text}");
        assert!(text.contains("second = @table"), "{text}");
    }
}
