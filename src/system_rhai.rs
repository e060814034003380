//! `system` namespace: logging, panic, exit and clocks.

use std::any::TypeId;

use rhai::{Dynamic, Engine, EvalAltResult, NativeCallContext, INT};

use crate::scripting::{halt_error, SharedConsole};
use crate::script_introspection::{int_arg, runtime_error};
use crate::script_log::{script_log, LogLevel};
use crate::table_format::to_display_string;

/// Most values one `system.log/warn/error` call accepts.
pub const MAX_LOG_ARGS: usize = 16;

#[derive(Clone)]
pub struct SystemApi {
    console: SharedConsole,
}

impl SystemApi {
    pub fn new(console: SharedConsole) -> Self {
        Self { console }
    }

    fn exit(&self, code: INT) -> Box<EvalAltResult> {
        let code = code.clamp(i32::MIN as INT, i32::MAX as INT) as i32;
        let halt = self.console.borrow_mut().exit(code);
        halt_error(halt)
    }
}

pub fn register_system_api(engine: &mut Engine) {
    engine.register_type_with_name::<SystemApi>("system");

    // One line per value, each through tostring.
    for (name, level) in [("log", LogLevel::Info), ("warn", LogLevel::Warn), ("error", LogLevel::Error)] {
        for arity in 0..=MAX_LOG_ARGS {
            let mut arg_types = vec![TypeId::of::<SystemApi>()];
            arg_types.extend(std::iter::repeat(TypeId::of::<Dynamic>()).take(arity));

            engine.register_raw_fn(
                name,
                arg_types,
                move |ctx: NativeCallContext, args: &mut [&mut Dynamic]| -> Result<(), Box<EvalAltResult>> {
                    let lines = args[1..]
                        .iter()
                        .map(|value| to_display_string(value, Some(&ctx)))
                        .collect::<Result<Vec<_>, _>>()?;
                    for line in lines {
                        script_log(level, &line);
                    }
                    Ok(())
                },
            );
        }
    }

    engine
        .register_fn(
            "panic",
            |ctx: NativeCallContext, _api: SystemApi, value: Dynamic| -> Result<(), Box<EvalAltResult>> {
                let message = to_display_string(&value, Some(&ctx))?;
                Err(runtime_error(message))
            },
        )
        .register_fn("exit", |api: SystemApi| -> Result<(), Box<EvalAltResult>> { Err(api.exit(0)) })
        .register_fn("exit", |api: SystemApi, code: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let code = int_arg(&code, 1, "exit")?;
            Err(api.exit(code))
        })
        .register_fn("tick", |api: SystemApi| -> INT { api.console.borrow().tick() as INT })
        .register_fn("time", |_api: SystemApi| -> INT { chrono::Utc::now().timestamp() as INT });
}
