//! Rhai script host for the console.
//!
//! The engine is built from an allow-list: a raw engine, the arithmetic,
//! logic, iterator, function-pointer, string, array, map and math packages,
//! and the host globals and namespaces registered here. Rhai's language-core package is left out, so
//! its wall-clock `sleep` and `exit` are unreachable. `eval` is disabled,
//! modules and custom syntax are compiled out, and stock `print`/`debug` go
//! through the script logger.
//!
//! Globals:
//! - `sleep(frames)` - Yield to the frame scheduler `frames` times
//! - `type(v)`, `check(v, name)` - Primitive kinds, honouring a `__type` field
//! - `tostring(v)`, `tonumber(v)`
//! - `pairs(t)`, `ipairs(t)`, `next(t, key)`, `unpack(t, i, j)`
//!
//! Namespaces (visible inside script functions; a script variable with the
//! same name shadows them):
//! - `graphics` - Turtle drawing: `clear color move plot draw width height aspect count`
//! - `audio` - `blip(channel, #{ Semitone, Volume, Duration })`
//! - `input` - `pressed tapped grab`
//! - `system` - `log warn error panic exit tick time`
//! - `string`, `math`
//!
//! Closing the window and `system.exit` halt the script. Halts travel as
//! `ErrorTerminated`, which `try`/`catch` cannot intercept.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use rhai::packages::{
    ArithmeticPackage, BasicArrayPackage, BasicFnPackage, BasicIteratorPackage, BasicMapPackage,
    BasicMathPackage, BasicStringPackage, LogicPackage, MoreStringPackage, Package,
};
use rhai::{Dynamic, Engine, EvalAltResult, Position, AST};

use crate::audio_rhai::{register_audio_api, AudioApi};
use crate::base_rhai::register_base_api;
use crate::console::Console;
use crate::error::ConsoleError;
use crate::graphics_rhai::{register_graphics_api, GraphicsApi};
use crate::input_rhai::{register_input_api, InputApi};
use crate::math_rhai::{register_math_api, MathApi};
use crate::scheduler::Halt;
use crate::script_diagnostics::{from_eval_error, from_parse_error, ScriptDiagnostic};
use crate::script_log::{script_log, LogLevel};
use crate::string_rhai::{register_string_api, StringApi};
use crate::system_rhai::{register_system_api, SystemApi};

/// The console as seen by script callbacks. Each call borrows it only for
/// its own duration.
pub type SharedConsole = Rc<RefCell<Console>>;

/// Keep a bounded queue so repeated failures don't grow without limit.
const MAX_DIAGNOSTICS: usize = 32;

/// Wrap a halt so it unwinds the whole script.
pub fn halt_error(halt: Halt) -> Box<EvalAltResult> {
    EvalAltResult::ErrorTerminated(Dynamic::from(halt), Position::NONE).into()
}

fn find_halt(err: &EvalAltResult) -> Option<Halt> {
    match err {
        EvalAltResult::ErrorTerminated(token, _) => Some(token.clone().try_cast::<Halt>().unwrap_or(Halt::Close)),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => find_halt(inner),
        _ => None,
    }
}

/// How a script run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Ran to the end.
    Finished,
    /// Stopped by a close request or `system.exit`.
    Halted(Halt),
    /// Failed to compile, or raised an error nothing caught.
    Failed(ScriptDiagnostic),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Finished => 0,
            RunOutcome::Halted(halt) => halt.exit_code(),
            RunOutcome::Failed(_) => 1,
        }
    }
}

pub struct ScriptHost {
    engine: Engine,
    console: SharedConsole,
    /// Structured diagnostics for the host.
    diagnostics: Vec<ScriptDiagnostic>,
}

impl ScriptHost {
    /// Build a sandboxed engine bound to `console`.
    pub fn new(console: SharedConsole) -> Self {
        let mut engine = Engine::new_raw();
        engine
            .register_global_module(ArithmeticPackage::new().as_shared_module())
            .register_global_module(LogicPackage::new().as_shared_module())
            .register_global_module(BasicIteratorPackage::new().as_shared_module())
            .register_global_module(BasicFnPackage::new().as_shared_module())
            .register_global_module(BasicStringPackage::new().as_shared_module())
            .register_global_module(MoreStringPackage::new().as_shared_module())
            .register_global_module(BasicArrayPackage::new().as_shared_module())
            .register_global_module(BasicMapPackage::new().as_shared_module())
            .register_global_module(BasicMathPackage::new().as_shared_module());

        let limits = console.borrow().config().sandbox.clone();
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);

        engine.disable_symbol("eval");

        engine
            .on_print(|text| script_log(LogLevel::Info, text))
            .on_debug(|text, _source, pos| {
                if pos.is_none() {
                    script_log(LogLevel::Info, text);
                } else {
                    script_log(LogLevel::Info, &format!("{:?} | {}", pos, text));
                }
            });

        register_graphics_api(&mut engine);
        register_audio_api(&mut engine);
        register_input_api(&mut engine);
        register_system_api(&mut engine);
        register_string_api(&mut engine);
        register_math_api(&mut engine);
        register_base_api(&mut engine, Rc::clone(&console));

        let namespaces = Rc::clone(&console);
        #[allow(deprecated)]
        engine.on_var(move |name, _index, ctx| {
            if ctx.scope().contains(name) {
                return Ok(None);
            }
            let console = Rc::clone(&namespaces);
            Ok(match name {
                "graphics" => Some(Dynamic::from(GraphicsApi::new(console))),
                "audio" => Some(Dynamic::from(AudioApi::new(console))),
                "input" => Some(Dynamic::from(InputApi::new(console))),
                "system" => Some(Dynamic::from(SystemApi::new(console))),
                "string" => Some(Dynamic::from(StringApi)),
                "math" => Some(Dynamic::from(MathApi)),
                _ => None,
            })
        });

        Self {
            engine,
            console,
            diagnostics: Vec::new(),
        }
    }

    pub fn console(&self) -> &SharedConsole {
        &self.console
    }

    /// Evaluate a snippet and return its value. Errors, halts included,
    /// come back untouched.
    pub fn eval<T: std::any::Any + Clone>(&mut self, script: &str) -> Result<T, Box<EvalAltResult>> {
        self.engine.eval::<T>(script)
    }

    fn push_diagnostic(&mut self, diag: ScriptDiagnostic) {
        self.diagnostics.push(diag);
        if self.diagnostics.len() > MAX_DIAGNOSTICS {
            let excess = self.diagnostics.len() - MAX_DIAGNOSTICS;
            self.diagnostics.drain(0..excess);
        }
    }

    fn compile(&mut self, script: &str) -> Result<AST, ScriptDiagnostic> {
        self.engine.compile(script).map_err(|err| {
            let diag = from_parse_error(&err);
            log::error!("Script parse error: {}", diag.summary());
            self.push_diagnostic(diag.clone());
            diag
        })
    }

    /// Compile and run a whole script.
    pub fn run_script(&mut self, script: &str) -> RunOutcome {
        let ast = match self.compile(script) {
            Ok(ast) => ast,
            Err(diag) => return RunOutcome::Failed(diag),
        };

        match self.engine.run_ast(&ast) {
            Ok(()) => {
                log::debug!("Script finished at tick {}", self.console.borrow().tick());
                RunOutcome::Finished
            }
            Err(err) => match find_halt(&err) {
                Some(halt) => {
                    log::info!("Script halted: {:?}", halt);
                    RunOutcome::Halted(halt)
                }
                None => {
                    let diag = from_eval_error(&err);
                    log::error!("Script error: {}", diag.summary());
                    self.push_diagnostic(diag.clone());
                    RunOutcome::Failed(diag)
                }
            },
        }
    }

    /// Read and run the entry script at `path`.
    pub fn run_file(&mut self, path: &Path) -> Result<RunOutcome, ConsoleError> {
        let script = std::fs::read_to_string(path).map_err(|source| ConsoleError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Running {}", path.display());
        Ok(self.run_script(&script))
    }

    /// Drain and return all pending diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<ScriptDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Drop the script environment, then tear the console down.
    pub fn shutdown(self) {
        let ScriptHost { engine, console, .. } = self;
        drop(engine);
        console.borrow_mut().teardown();
    }
}
