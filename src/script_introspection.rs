//! Type inspection and argument validation for script values.
//!
//! Scripts see a small set of kinds: `nil`, `number`, `string`, `boolean`,
//! `table` and `function`. A map carrying a string `__type` field reports that
//! name instead, which is how scripts get nominal types without classes.

use rhai::{Dynamic, EvalAltResult, FnPtr, ImmutableString, Map, Position, FLOAT, INT};

use crate::audio_rhai::AudioApi;
use crate::graphics_rhai::GraphicsApi;
use crate::input_rhai::InputApi;
use crate::math_rhai::MathApi;
use crate::string_rhai::StringApi;
use crate::system_rhai::SystemApi;

/// Name of the field that overrides `type()` on a map.
pub const TYPE_FIELD: &str = "__type";

fn is_namespace(value: &Dynamic) -> bool {
    value.is::<GraphicsApi>()
        || value.is::<AudioApi>()
        || value.is::<InputApi>()
        || value.is::<SystemApi>()
        || value.is::<StringApi>()
        || value.is::<MathApi>()
}

/// The primitive kind of a value, ignoring `__type`.
pub fn primitive_type_name(value: &Dynamic) -> &'static str {
    if value.is_unit() {
        "nil"
    } else if value.is_int() || value.is_float() {
        "number"
    } else if value.is_string() || value.is_char() {
        "string"
    } else if value.is_bool() {
        "boolean"
    } else if value.is_map() || value.is_array() || is_namespace(value) {
        "table"
    } else if value.is_fnptr() {
        "function"
    } else {
        "userdata"
    }
}

/// `type(value)`: the `__type` marker if present, else the primitive kind.
pub fn script_type_name(value: &Dynamic) -> ImmutableString {
    if let Some(map) = value.read_lock::<Map>() {
        if let Some(marker) = map.get(TYPE_FIELD).and_then(|v| v.read_lock::<ImmutableString>()) {
            return marker.clone();
        }
    }
    primitive_type_name(value).into()
}

/// `check(value, expected)`: the value itself, or a catchable error naming
/// both types.
pub fn check_type(value: Dynamic, expected: &str) -> Result<Dynamic, Box<EvalAltResult>> {
    let actual = script_type_name(&value);
    if actual == expected {
        Ok(value)
    } else {
        Err(runtime_error(format!("{} expected, got {}", expected, actual)))
    }
}

pub fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(Dynamic::from(message.into()), Position::NONE).into()
}

/// `bad argument #n to 'function' (expected expected, got actual)`.
pub fn bad_argument(position: usize, function: &str, expected: &str, value: &Dynamic) -> Box<EvalAltResult> {
    runtime_error(format!(
        "bad argument #{} to '{}' ({} expected, got {})",
        position,
        function,
        expected,
        script_type_name(value)
    ))
}

/// Accept an integer or float.
pub fn number_arg(value: &Dynamic, position: usize, function: &str) -> Result<FLOAT, Box<EvalAltResult>> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as FLOAT);
    }
    Err(bad_argument(position, function, "number", value))
}

/// Accept an integer or float; floats truncate toward zero.
pub fn int_arg(value: &Dynamic, position: usize, function: &str) -> Result<INT, Box<EvalAltResult>> {
    if let Ok(i) = value.as_int() {
        return Ok(i);
    }
    if let Ok(f) = value.as_float() {
        return Ok(f as INT);
    }
    Err(bad_argument(position, function, "number", value))
}

pub fn string_arg(value: &Dynamic, position: usize, function: &str) -> Result<ImmutableString, Box<EvalAltResult>> {
    if let Some(s) = value.read_lock::<ImmutableString>() {
        return Ok(s.clone());
    }
    if let Ok(c) = value.as_char() {
        return Ok(c.to_string().into());
    }
    Err(bad_argument(position, function, "string", value))
}

pub fn function_field(map: &Map, name: &str) -> Option<FnPtr> {
    map.get(name).and_then(|v| v.read_lock::<FnPtr>().map(|f| f.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(kind: &str) -> Dynamic {
        let mut map = Map::new();
        map.insert(TYPE_FIELD.into(), Dynamic::from(kind.to_string()));
        map.insert("x".into(), Dynamic::from(1_i64));
        Dynamic::from_map(map)
    }

    #[test]
    fn test_primitive_kinds() {
        assert_eq!(script_type_name(&Dynamic::UNIT), "nil");
        assert_eq!(script_type_name(&Dynamic::from(1_i64)), "number");
        assert_eq!(script_type_name(&Dynamic::from(1.5 as FLOAT)), "number");
        assert_eq!(script_type_name(&Dynamic::from("s")), "string");
        assert_eq!(script_type_name(&Dynamic::from('c')), "string");
        assert_eq!(script_type_name(&Dynamic::from(true)), "boolean");
        assert_eq!(script_type_name(&Dynamic::from_array(vec![])), "table");
        assert_eq!(script_type_name(&Dynamic::from_map(Map::new())), "table");
        assert_eq!(script_type_name(&Dynamic::from(StringApi)), "table");
    }

    #[test]
    fn test_type_marker_wins() {
        assert_eq!(script_type_name(&marked("Vector")), "Vector");
        assert_eq!(script_type_name(&marked("Vector").into_shared()), "Vector");

        // Non-string markers are ignored.
        let mut map = Map::new();
        map.insert(TYPE_FIELD.into(), Dynamic::from(3_i64));
        assert_eq!(script_type_name(&Dynamic::from_map(map)), "table");
    }

    #[test]
    fn test_check_honors_marker() {
        assert!(check_type(marked("Vector"), "Vector").is_ok());
        let err = check_type(marked("Vector"), "table").unwrap_err();
        assert!(err.to_string().contains("table expected, got Vector"));
        let err = check_type(Dynamic::UNIT, "number").unwrap_err();
        assert!(err.to_string().contains("number expected, got nil"));
    }

    #[test]
    fn test_number_arguments() {
        assert_eq!(number_arg(&Dynamic::from(2_i64), 1, "move").unwrap(), 2.0);
        assert_eq!(int_arg(&Dynamic::from(2.9 as FLOAT), 1, "sleep").unwrap(), 2);
        let err = number_arg(&Dynamic::from("x"), 2, "move").unwrap_err();
        assert!(err
            .to_string()
            .contains("bad argument #2 to 'move' (number expected, got string)"));
    }
}
