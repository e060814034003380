//! Global functions: `sleep`, `type`, `check`, `tostring`, `tonumber`,
//! `pairs`, `ipairs`, `next`, `unpack`.
//!
//! Iteration helpers return arrays of `[key, value]` pairs. Strings iterate
//! character by character with 1-based positions, the same as arrays.

use std::rc::Rc;

use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, NativeCallContext, FLOAT, INT};

use crate::scripting::{halt_error, SharedConsole};
use crate::script_introspection::{bad_argument, check_type, int_arg, script_type_name, string_arg};
use crate::table_format::to_display_string;

fn pair(key: impl Into<Dynamic>, value: Dynamic) -> Dynamic {
    Dynamic::from_array(vec![key.into(), value])
}

/// Every `[key, value]` of a table or string, in iteration order.
fn entries(function: &str, value: &Dynamic) -> Result<Vec<Dynamic>, Box<EvalAltResult>> {
    if let Some(map) = value.read_lock::<Map>() {
        return Ok(map
            .iter()
            .map(|(k, v)| pair(ImmutableString::from(k.as_str()), v.clone()))
            .collect());
    }
    if let Some(array) = value.read_lock::<Array>() {
        return Ok(array
            .iter()
            .enumerate()
            .map(|(i, v)| pair(i as INT + 1, v.clone()))
            .collect());
    }
    if let Some(s) = value.read_lock::<ImmutableString>() {
        return Ok(s
            .chars()
            .enumerate()
            .map(|(i, c)| pair(i as INT + 1, Dynamic::from(c.to_string())))
            .collect());
    }
    Err(bad_argument(1, function, "table", value))
}

pub fn pairs(value: &Dynamic) -> Result<Array, Box<EvalAltResult>> {
    entries("pairs", value)
}

/// Positional entries from 1 up to the first missing or nil value. Maps are
/// probed with the keys "1", "2", ...
pub fn ipairs(value: &Dynamic) -> Result<Array, Box<EvalAltResult>> {
    if let Some(map) = value.read_lock::<Map>() {
        let mut out = Array::new();
        for i in 1.. {
            match map.get(i.to_string().as_str()) {
                Some(v) if !v.is_unit() => out.push(pair(i as INT, v.clone())),
                _ => break,
            }
        }
        return Ok(out);
    }
    let mut out = entries("ipairs", value)?;
    if let Some(end) = out.iter().position(|p| {
        p.read_lock::<Array>()
            .map_or(false, |kv| kv.get(1).map_or(true, Dynamic::is_unit))
    }) {
        out.truncate(end);
    }
    Ok(out)
}

/// The entry after `key`, or the first one when `key` is nil.
/// Returns nil past the end or when `key` is not present.
pub fn next(value: &Dynamic, key: &Dynamic) -> Result<Dynamic, Box<EvalAltResult>> {
    let all = entries("next", value)?;
    if key.is_unit() {
        return Ok(all.into_iter().next().unwrap_or(Dynamic::UNIT));
    }
    let key_text = to_display_string(key, None)?;
    let found = all.iter().position(|p| {
        p.read_lock::<Array>()
            .and_then(|kv| kv.first().map(|k| to_display_string(k, None).ok() == Some(key_text.clone())))
            .unwrap_or(false)
    });
    Ok(found
        .and_then(|i| all.get(i + 1).cloned())
        .unwrap_or(Dynamic::UNIT))
}

/// Elements `i..=j` (1-based) of an array, clamped to its bounds.
pub fn unpack(array: &Array, i: INT, j: INT) -> Array {
    let start = i.max(1);
    let end = j.min(array.len() as INT);
    if start > end {
        return Array::new();
    }
    array[(start - 1) as usize..end as usize].to_vec()
}

/// Numbers pass through; strings are parsed (decimal, or hex with `0x`);
/// anything else is nil.
pub fn tonumber(value: &Dynamic) -> Dynamic {
    if value.is_int() || value.is_float() {
        return value.clone();
    }
    let Some(text) = value.read_lock::<ImmutableString>().map(|s| s.trim().to_string()) else {
        return Dynamic::UNIT;
    };
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        return match INT::from_str_radix(hex, 16) {
            Ok(n) => Dynamic::from(if negative { -n } else { n }),
            Err(_) => Dynamic::UNIT,
        };
    }
    if let Ok(n) = text.parse::<INT>() {
        return Dynamic::from(n);
    }
    match text.parse::<FLOAT>() {
        Ok(f) => Dynamic::from(f),
        Err(_) => Dynamic::UNIT,
    }
}

fn array_arg(value: &Dynamic, position: usize, function: &str) -> Result<Array, Box<EvalAltResult>> {
    value
        .read_lock::<Array>()
        .map(|a| a.clone())
        .ok_or_else(|| bad_argument(position, function, "table", value))
}

fn sleep_frames(console: &SharedConsole, frames: INT) -> Result<(), Box<EvalAltResult>> {
    let result = console.borrow_mut().sleep(frames);
    result.map_err(halt_error)
}

pub fn register_base_api(engine: &mut Engine, console: SharedConsole) {
    // Typed overloads so integer and float counts never resolve elsewhere;
    // the `Dynamic` form only reports bad arguments.
    let frames_console = Rc::clone(&console);
    let float_console = Rc::clone(&console);
    engine
        .register_fn("sleep", move |frames: INT| -> Result<(), Box<EvalAltResult>> {
            sleep_frames(&frames_console, frames)
        })
        .register_fn("sleep", move |frames: FLOAT| -> Result<(), Box<EvalAltResult>> {
            sleep_frames(&float_console, frames as INT)
        })
        .register_fn("sleep", move |frames: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let frames = int_arg(&frames, 1, "sleep")?;
            sleep_frames(&console, frames)
        });

    engine
        .register_fn("type", |value: Dynamic| script_type_name(&value))
        .register_fn("check", |value: Dynamic, expected: Dynamic| -> Result<Dynamic, Box<EvalAltResult>> {
            let expected = string_arg(&expected, 2, "check")?;
            check_type(value, &expected)
        })
        .register_fn("tostring", |ctx: NativeCallContext, value: Dynamic| -> Result<ImmutableString, Box<EvalAltResult>> {
            Ok(to_display_string(&value, Some(&ctx))?.into())
        })
        .register_fn("tonumber", |value: Dynamic| tonumber(&value))
        .register_fn("pairs", |value: Dynamic| pairs(&value))
        .register_fn("ipairs", |value: Dynamic| ipairs(&value))
        .register_fn("next", |value: Dynamic| next(&value, &Dynamic::UNIT))
        .register_fn("next", |value: Dynamic, key: Dynamic| next(&value, &key))
        .register_fn("unpack", |value: Dynamic| -> Result<Array, Box<EvalAltResult>> {
            let array = array_arg(&value, 1, "unpack")?;
            Ok(unpack(&array, 1, INT::MAX))
        })
        .register_fn("unpack", |value: Dynamic, i: Dynamic| -> Result<Array, Box<EvalAltResult>> {
            let array = array_arg(&value, 1, "unpack")?;
            Ok(unpack(&array, int_arg(&i, 2, "unpack")?, INT::MAX))
        })
        .register_fn(
            "unpack",
            |value: Dynamic, i: Dynamic, j: Dynamic| -> Result<Array, Box<EvalAltResult>> {
                let array = array_arg(&value, 1, "unpack")?;
                Ok(unpack(&array, int_arg(&i, 2, "unpack")?, int_arg(&j, 3, "unpack")?))
            },
        );
}
