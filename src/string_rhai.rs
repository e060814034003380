//! `string` namespace. Positions are 1-based and count characters.

use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, INT};

use crate::script_introspection::{int_arg, string_arg};

#[derive(Debug, Clone, Copy, Default)]
pub struct StringApi;

/// Character at a 1-based position, if any.
fn char_at(s: &str, position: INT) -> Option<char> {
    let index = usize::try_from(position.checked_sub(1)?).ok()?;
    s.chars().nth(index)
}

/// Inclusive 1-based slice. Negative positions count back from the end
/// (-1 is the last character). Both ends are clamped to the string.
pub fn slice(s: &str, start: INT, end: INT) -> String {
    let length = s.chars().count() as INT;
    let resolve = |position: INT| if position < 0 { length + position + 1 } else { position };
    let start = resolve(start).max(1);
    let end = resolve(end).min(length);
    if start > end {
        return String::new();
    }
    s.chars()
        .skip((start - 1) as usize)
        .take((end - start + 1) as usize)
        .collect()
}

fn byte(s: &Dynamic, position: INT) -> Result<Dynamic, Box<EvalAltResult>> {
    let s = string_arg(s, 1, "byte")?;
    Ok(char_at(&s, position).map_or(Dynamic::UNIT, |c| Dynamic::from(c as INT)))
}

pub fn register_string_api(engine: &mut Engine) {
    engine.register_type_with_name::<StringApi>("string");

    engine
        .register_fn("byte", |_: StringApi, s: Dynamic| byte(&s, 1))
        .register_fn("byte", |_: StringApi, s: Dynamic, i: Dynamic| -> Result<Dynamic, Box<EvalAltResult>> {
            byte(&s, int_arg(&i, 2, "byte")?)
        })
        .register_fn("char", |_: StringApi, s: Dynamic, i: Dynamic| -> Result<Dynamic, Box<EvalAltResult>> {
            let s = string_arg(&s, 1, "char")?;
            let position = int_arg(&i, 2, "char")?;
            Ok(char_at(&s, position).map_or(Dynamic::UNIT, |c| Dynamic::from(c.to_string())))
        })
        .register_fn("length", |_: StringApi, s: Dynamic| -> Result<INT, Box<EvalAltResult>> {
            Ok(string_arg(&s, 1, "length")?.chars().count() as INT)
        })
        .register_fn("lower", |_: StringApi, s: Dynamic| -> Result<ImmutableString, Box<EvalAltResult>> {
            Ok(string_arg(&s, 1, "lower")?.to_lowercase().into())
        })
        .register_fn("upper", |_: StringApi, s: Dynamic| -> Result<ImmutableString, Box<EvalAltResult>> {
            Ok(string_arg(&s, 1, "upper")?.to_uppercase().into())
        })
        .register_fn("slice", |_: StringApi, s: Dynamic| -> Result<ImmutableString, Box<EvalAltResult>> {
            Ok(string_arg(&s, 1, "slice")?)
        })
        .register_fn(
            "slice",
            |_: StringApi, s: Dynamic, start: Dynamic| -> Result<ImmutableString, Box<EvalAltResult>> {
                let s = string_arg(&s, 1, "slice")?;
                Ok(slice(&s, int_arg(&start, 2, "slice")?, INT::MAX).into())
            },
        )
        .register_fn(
            "slice",
            |_: StringApi, s: Dynamic, start: Dynamic, end: Dynamic| -> Result<ImmutableString, Box<EvalAltResult>> {
                let s = string_arg(&s, 1, "slice")?;
                let start = if start.is_unit() { 1 } else { int_arg(&start, 2, "slice")? };
                Ok(slice(&s, start, int_arg(&end, 3, "slice")?).into())
            },
        );
}
