//! `input` namespace.
//!
//! Buttons are addressed by 1-based number or by name. Numbers outside
//! 1..12 read as released; unknown names are an error.

use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, Map, INT};

use crate::input::{Button, BUTTON_COUNT};
use crate::scripting::SharedConsole;
use crate::script_introspection::{bad_argument, int_arg, runtime_error};

#[derive(Clone)]
pub struct InputApi {
    console: SharedConsole,
}

impl InputApi {
    pub fn new(console: SharedConsole) -> Self {
        Self { console }
    }

    fn query(
        &self,
        function: &str,
        button: &Dynamic,
        controller: INT,
        held: bool,
    ) -> Result<bool, Box<EvalAltResult>> {
        let console = self.console.borrow();
        let input = console.input();
        if let Some(name) = button.read_lock::<ImmutableString>() {
            let button = Button::from_name(name.as_str()).ok_or_else(|| {
                runtime_error(format!("bad argument #1 to '{}' (unknown button '{}')", function, name.as_str()))
            })?;
            return Ok(if held {
                input.button_pressed(button, controller)
            } else {
                input.button_tapped(button, controller)
            });
        }
        if button.is_int() || button.is_float() {
            let index = int_arg(button, 1, function)?.saturating_sub(1);
            return Ok(if held {
                input.pressed(index, controller)
            } else {
                input.tapped(index, controller)
            });
        }
        Err(bad_argument(1, function, "number or string", button))
    }

    fn grab(&self, controller: INT) -> Map {
        let console = self.console.borrow();
        let mut state = Map::new();
        for (button, held) in console.input().grab(controller) {
            state.insert(button.name().into(), Dynamic::from(held));
        }
        debug_assert_eq!(state.len(), BUTTON_COUNT);
        state
    }
}

pub fn register_input_api(engine: &mut Engine) {
    engine.register_type_with_name::<InputApi>("input");

    engine
        .register_fn("pressed", |api: InputApi, button: Dynamic| api.query("pressed", &button, 1, true))
        .register_fn(
            "pressed",
            |api: InputApi, button: Dynamic, controller: Dynamic| -> Result<bool, Box<EvalAltResult>> {
                let controller = int_arg(&controller, 2, "pressed")?;
                api.query("pressed", &button, controller, true)
            },
        )
        .register_fn("tapped", |api: InputApi, button: Dynamic| api.query("tapped", &button, 1, false))
        .register_fn(
            "tapped",
            |api: InputApi, button: Dynamic, controller: Dynamic| -> Result<bool, Box<EvalAltResult>> {
                let controller = int_arg(&controller, 2, "tapped")?;
                api.query("tapped", &button, controller, false)
            },
        )
        .register_fn("grab", |api: InputApi| api.grab(1))
        .register_fn("grab", |api: InputApi, controller: Dynamic| -> Result<Map, Box<EvalAltResult>> {
            Ok(api.grab(int_arg(&controller, 1, "grab")?))
        });
}
