//! `math` namespace.

use std::any::TypeId;

use rhai::{Array, Dynamic, Engine, EvalAltResult, NativeCallContext, FLOAT, INT};

use crate::script_introspection::{int_arg, number_arg, runtime_error};

/// `math.max` / `math.min` take up to this many numbers.
const MAX_EXTREMUM_ARGS: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct MathApi;

/// Split `x` into a mantissa in [0.5, 1) and a power of two.
pub fn frexp(x: FLOAT) -> (FLOAT, INT) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let x = x as f64;
    let mut exponent = x.abs().log2().floor() as i32 + 1;
    let mut mantissa = x / 2f64.powi(exponent);
    if mantissa.abs() >= 1.0 {
        mantissa /= 2.0;
        exponent += 1;
    } else if mantissa.abs() < 0.5 {
        mantissa *= 2.0;
        exponent -= 1;
    }
    (mantissa as FLOAT, exponent as INT)
}

pub fn ldexp(mantissa: FLOAT, exponent: INT) -> FLOAT {
    let exponent = exponent.clamp(i32::MIN as INT, i32::MAX as INT) as i32;
    (mantissa as f64 * 2f64.powi(exponent)) as FLOAT
}

/// Fold `math.max`/`math.min` arguments. A single array argument is
/// expanded into its elements.
fn extremum(
    function: &str,
    args: &[&mut Dynamic],
    pick: fn(FLOAT, FLOAT) -> FLOAT,
) -> Result<FLOAT, Box<EvalAltResult>> {
    let values: Vec<FLOAT> = match args {
        [single] if single.is_array() => {
            let array = single.read_lock::<Array>().map(|a| a.clone()).unwrap_or_default();
            array
                .iter()
                .enumerate()
                .map(|(i, v)| number_arg(v, i + 1, function))
                .collect::<Result<_, _>>()?
        }
        _ => args
            .iter()
            .enumerate()
            .map(|(i, v)| number_arg(v, i + 1, function))
            .collect::<Result<_, _>>()?,
    };
    values
        .into_iter()
        .reduce(pick)
        .ok_or_else(|| runtime_error(format!("bad argument #1 to '{}' (number expected, got no value)", function)))
}

pub fn register_math_api(engine: &mut Engine) {
    engine.register_type_with_name::<MathApi>("math");

    engine
        .register_get("PI", |_: &mut MathApi| std::f64::consts::PI as FLOAT)
        .register_get("HUGE", |_: &mut MathApi| FLOAT::INFINITY);

    let unary: [(&'static str, fn(FLOAT) -> FLOAT); 15] = [
        ("abs", FLOAT::abs),
        ("acos", FLOAT::acos),
        ("asin", FLOAT::asin),
        ("atan", FLOAT::atan),
        ("ceil", FLOAT::ceil),
        ("cos", FLOAT::cos),
        ("cosh", FLOAT::cosh),
        ("exp", FLOAT::exp),
        ("log", FLOAT::ln),
        ("log10", FLOAT::log10),
        ("sin", FLOAT::sin),
        ("sinh", FLOAT::sinh),
        ("sqrt", FLOAT::sqrt),
        ("tan", FLOAT::tan),
        ("tanh", FLOAT::tanh),
    ];
    for (name, op) in unary {
        engine.register_fn(name, move |_: MathApi, x: Dynamic| -> Result<FLOAT, Box<EvalAltResult>> {
            Ok(op(number_arg(&x, 1, name)?))
        });
    }

    engine
        .register_fn("atan2", |_: MathApi, y: Dynamic, x: Dynamic| -> Result<FLOAT, Box<EvalAltResult>> {
            Ok(number_arg(&y, 1, "atan2")?.atan2(number_arg(&x, 2, "atan2")?))
        })
        .register_fn("floor", |_: MathApi, x: Dynamic| -> Result<INT, Box<EvalAltResult>> {
            Ok(number_arg(&x, 1, "floor")?.floor() as INT)
        })
        .register_fn("int", |_: MathApi, x: Dynamic| -> Result<INT, Box<EvalAltResult>> {
            int_arg(&x, 1, "int")
        })
        .register_fn("frexp", |_: MathApi, x: Dynamic| -> Result<Array, Box<EvalAltResult>> {
            let (mantissa, exponent) = frexp(number_arg(&x, 1, "frexp")?);
            Ok(vec![Dynamic::from(mantissa), Dynamic::from(exponent)])
        })
        .register_fn("ldexp", |_: MathApi, m: Dynamic, e: Dynamic| -> Result<FLOAT, Box<EvalAltResult>> {
            Ok(ldexp(number_arg(&m, 1, "ldexp")?, int_arg(&e, 2, "ldexp")?))
        });

    for (name, pick) in [("max", FLOAT::max as fn(FLOAT, FLOAT) -> FLOAT), ("min", FLOAT::min)] {
        for arity in 1..=MAX_EXTREMUM_ARGS {
            let mut arg_types = vec![TypeId::of::<MathApi>()];
            arg_types.extend(std::iter::repeat(TypeId::of::<Dynamic>()).take(arity));
            engine.register_raw_fn(
                name,
                arg_types,
                move |_ctx: NativeCallContext, args: &mut [&mut Dynamic]| -> Result<FLOAT, Box<EvalAltResult>> {
                    extremum(name, &args[1..], pick)
                },
            );
        }
    }
}
