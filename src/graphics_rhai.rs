//! `graphics` namespace.
//!
//! Coordinates are normalized: (0, 0) is the bottom-left corner of the
//! window and (1, 1) the top-right. Nothing is drawn until `graphics.draw()`.

use rhai::{Dynamic, Engine, EvalAltResult, FLOAT, INT};

use crate::scripting::{halt_error, SharedConsole};
use crate::script_introspection::{int_arg, number_arg};

#[derive(Clone)]
pub struct GraphicsApi {
    console: SharedConsole,
}

impl GraphicsApi {
    pub fn new(console: SharedConsole) -> Self {
        Self { console }
    }
}

pub fn register_graphics_api(engine: &mut Engine) {
    engine.register_type_with_name::<GraphicsApi>("graphics");

    engine
        .register_fn("clear", |api: GraphicsApi| {
            api.console.borrow_mut().graphics_mut().clear();
        })
        .register_fn("color", |api: GraphicsApi, index: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let index = int_arg(&index, 1, "color")?;
            api.console.borrow_mut().graphics_mut().set_color(index);
            Ok(())
        })
        .register_fn(
            "move",
            |api: GraphicsApi, x: Dynamic, y: Dynamic| -> Result<(), Box<EvalAltResult>> {
                let (x, y) = (number_arg(&x, 1, "move")?, number_arg(&y, 2, "move")?);
                api.console.borrow_mut().graphics_mut().move_to(x as f32, y as f32);
                Ok(())
            },
        )
        .register_fn(
            "plot",
            |api: GraphicsApi, x: Dynamic, y: Dynamic| -> Result<(), Box<EvalAltResult>> {
                let (x, y) = (number_arg(&x, 1, "plot")?, number_arg(&y, 2, "plot")?);
                api.console.borrow_mut().graphics_mut().line_to(x as f32, y as f32);
                Ok(())
            },
        )
        .register_fn("draw", |api: GraphicsApi| -> Result<(), Box<EvalAltResult>> {
            let result = api.console.borrow_mut().draw();
            result.map(|_| ()).map_err(halt_error)
        })
        .register_fn("width", |api: GraphicsApi| -> INT {
            api.console.borrow().surface_size().width as INT
        })
        .register_fn("height", |api: GraphicsApi| -> INT {
            api.console.borrow().surface_size().height as INT
        })
        .register_fn("aspect", |api: GraphicsApi| -> FLOAT {
            api.console.borrow().surface_size().aspect() as FLOAT
        })
        .register_fn("count", |api: GraphicsApi| -> INT {
            api.console.borrow().graphics().pending_count() as INT
        });
}

#[cfg(test)]
mod tests {
    use crate::graphics::{DrawCommand, PaletteColor};
    use crate::scripting::tests::harness;

    #[test]
    fn test_commands_are_queued_until_draw() {
        let (mut host, _handle) = harness();
        host.eval::<()>("graphics.clear(); graphics.color(3); graphics.move(0, 0); graphics.plot(1, 1);")
            .unwrap();

        let console = host.console();
        let console = console.borrow();
        let pending: Vec<DrawCommand> = console.graphics().pending().copied().collect();
        assert_eq!(
            pending,
            vec![
                DrawCommand::Clear,
                DrawCommand::SetColor(3),
                DrawCommand::MoveTo(0.0, 0.0),
                DrawCommand::LineTo(1.0, 1.0),
            ]
        );
    }

    #[test]
    fn test_draw_flushes_and_yields() {
        let (mut host, handle) = harness();
        let count: i64 = host
            .eval("graphics.color(3); graphics.plot(1, 1); graphics.draw(); graphics.count()")
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(handle.presented(), 1);

        let console = host.console();
        let turtle = console.borrow().graphics().turtle();
        assert_eq!((turtle.x, turtle.y), (1.0, 1.0));
        assert_eq!(turtle.color, PaletteColor::Orange);
    }

    #[test]
    fn test_surface_queries() {
        let (mut host, _handle) = harness();
        assert_eq!(host.eval::<i64>("graphics.width()").unwrap(), 64);
        assert_eq!(host.eval::<i64>("graphics.height()").unwrap(), 48);
        let aspect: f32 = host.eval("graphics.aspect()").unwrap();
        assert!((aspect - 64.0 / 48.0).abs() < 1e-5);
    }

    #[test]
    fn test_bad_argument_is_catchable() {
        let (mut host, _handle) = harness();
        let message: String = host
            .eval(r#"let m = ""; try { graphics.move("left", 0); } catch (e) { m = e; } m"#)
            .unwrap();
        assert_eq!(message, "bad argument #1 to 'move' (number expected, got string)");
    }
}
