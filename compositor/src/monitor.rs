//! A monitor floating in the spatial compositor.
//!
//! The monitor is a cuboid window whose front face is a screen showing one output. Rays pointing at the screen
//! become the pointer of the output, rays missing it leave the output. Pressing a button while pointing past the
//! screen grabs the monitor itself, which lets the user move it around.
//!
//! The screen lies in the `z = 0` plane of the window and spans the window's half size in `x` and `y`. Output
//! coordinates grow right and down while the window's `y` axis points up.

use cgmath::{Point2, Point3, Vector2, Vector3};
use zmonitors_backend::{ButtonState, CuboidWindow, InputEvent};

use crate::{output::OutputId, seat::Modifiers, ui::UiBase, Compositor};

/// Millimeters per unit of the spatial compositor.
const MM_PER_UNIT: f32 = 1000.0;

#[derive(Debug)]
pub struct Monitor {
    output: OutputId,
    /// Output size in pixels.
    resolution: Vector2<f32>,
    /// Half size of the screen, known once the window is set up.
    screen: Option<Vector2<f32>>,
    /// Whether the ray points at the screen.
    inside: bool,
    /// Time of the last ray event.
    time: u32,
}

impl Monitor {
    pub fn new(output: OutputId, resolution: Vector2<f32>) -> Self {
        Self {
            output,
            resolution,
            screen: None,
            inside: false,
            time: 0,
        }
    }

    pub fn output(&self) -> OutputId {
        self.output
    }

    fn ray_motion(&mut self, ctx: &mut Compositor, origin: Point3<f32>, direction: Vector3<f32>) {
        let hit = self
            .screen
            .and_then(|screen| project(origin, direction, screen, self.resolution));

        match hit {
            Some(position) => {
                self.inside = true;
                ctx.seat
                    .notify_pointer_motion_abs(&mut ctx.views, self.output, position, self.time);
            }

            None => self.leave(ctx),
        }
    }

    fn leave(&mut self, ctx: &mut Compositor) {
        if self.inside {
            self.inside = false;
            ctx.seat.notify_pointer_leave(&mut ctx.views);
        }
    }

    fn button(&mut self, ctx: &mut Compositor, window: &CuboidWindow, serial: u32, button: u32, state: ButtonState) {
        if !self.inside {
            if state == ButtonState::Pressed && window.start_move(serial) {
                tracing::debug!(id = ?window.id(), "Moving monitor");
            }

            return;
        }

        let serial = ctx.seat.next_serial();
        ctx.seat
            .notify_pointer_button(&mut ctx.views, self.time, button, state, serial);

        if state == ButtonState::Pressed {
            // Clicking a window gives it the keyboard.
            if let Some(focus) = ctx.seat.pointer().and_then(|pointer| pointer.focus()) {
                ctx.views.raise(focus);
            }

            ctx.seat.notify_keyboard_enter(&ctx.views);
        }
    }
}

impl UiBase<Compositor> for Monitor {
    fn setup(&mut self, ctx: &mut Compositor, window: &mut CuboidWindow) {
        let half_size = window.half_size();
        let screen = Vector2::new(half_size.x, half_size.y);
        self.screen = Some(screen);

        let physical_size = (
            (screen.x * 2.0 * MM_PER_UNIT).round() as i32,
            (screen.y * 2.0 * MM_PER_UNIT).round() as i32,
        );
        ctx.outputs.set_physical_size(self.output, physical_size);

        tracing::debug!(id = ?window.id(), ?screen, "Monitor ready");
    }

    fn reconfigure(&mut self, _ctx: &mut Compositor, window: &mut CuboidWindow) {
        let half_size = window.half_size();
        self.screen = Some(Vector2::new(half_size.x, half_size.y));

        // Rays are projected with the new screen size from now on, so show it right away.
        window.commit();
    }

    fn input(&mut self, ctx: &mut Compositor, window: &mut CuboidWindow, event: InputEvent) {
        match event {
            InputEvent::RayEnter { origin, direction, .. } => self.ray_motion(ctx, origin, direction),

            InputEvent::RayMotion {
                time,
                origin,
                direction,
            } => {
                self.time = time;
                self.ray_motion(ctx, origin, direction);
            }

            InputEvent::RayLeave { .. } => self.leave(ctx),

            InputEvent::RayButton {
                serial,
                time,
                button,
                state,
            } => {
                self.time = time;
                self.button(ctx, window, serial, button, state);
            }

            // Keyboard focus follows clicks instead.
            InputEvent::KeyboardEnter { .. } => {}

            InputEvent::KeyboardLeave { .. } => ctx.seat.notify_keyboard_leave(&ctx.views),

            InputEvent::KeyboardKey { time, key, state, .. } => {
                ctx.seat.notify_keyboard_key(&ctx.views, time, key, state);
            }

            InputEvent::KeyboardModifiers {
                depressed,
                latched,
                locked,
                group,
                ..
            } => {
                let modifiers = Modifiers {
                    depressed,
                    latched,
                    locked,
                    group,
                };
                ctx.seat.notify_keyboard_modifiers(&ctx.views, modifiers);
            }
        }
    }
}

/// Projects a ray onto the screen.
///
/// Returns the position in output coordinates the ray points at, or `None` if it misses the screen.
pub fn project(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    screen: Vector2<f32>,
    resolution: Vector2<f32>,
) -> Option<Point2<f32>> {
    if direction.z == 0.0 || screen.x <= 0.0 || screen.y <= 0.0 {
        return None;
    }

    let t = -origin.z / direction.z;

    if t < 0.0 {
        return None;
    }

    let hit = origin + direction * t;

    if hit.x.abs() > screen.x || hit.y.abs() > screen.y {
        return None;
    }

    let x = (hit.x + screen.x) / (2.0 * screen.x) * resolution.x;
    let y = (screen.y - hit.y) / (2.0 * screen.y) * resolution.y;

    // The far edges belong to the next pixel, which does not exist.
    Some(Point2::new(
        x.min(resolution.x - 1.0).max(0.0),
        y.min(resolution.y - 1.0).max(0.0),
    ))
}
