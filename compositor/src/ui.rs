//! The root of a user interface shown in a cuboid window.
//!
//! [`Root`] drives the window: the first configure runs the one-time setup of the interface and then commits.
//! Later configures only update the proposed geometry, the interface commits whenever it wants to apply it.

use zmonitors_backend::{CuboidWindow, CuboidWindowHandler, InputEvent};

/// A user interface hosted by a [`Root`].
pub trait UiBase<D> {
    /// Prepares the interface for the first configured geometry.
    ///
    /// Runs exactly once, before the window is committed for the first time.
    fn setup(&mut self, ctx: &mut D, window: &mut CuboidWindow);

    /// The window was configured again.
    ///
    /// The new geometry is only proposed until the window is committed.
    fn reconfigure(&mut self, _ctx: &mut D, _window: &mut CuboidWindow) {}

    fn input(&mut self, ctx: &mut D, window: &mut CuboidWindow, event: InputEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FirstConfigure,
    Steady,
}

#[derive(Debug)]
pub struct Root<B> {
    base: B,
    phase: Phase,
}

impl<B> Root<B> {
    pub fn new(base: B) -> Self {
        Self {
            base,
            phase: Phase::FirstConfigure,
        }
    }

    pub fn base(&self) -> &B {
        &self.base
    }
}

impl<D, B: UiBase<D>> CuboidWindowHandler<D> for Root<B> {
    fn configured(&mut self, ctx: &mut D, window: &mut CuboidWindow) {
        match self.phase {
            Phase::FirstConfigure => {
                self.base.setup(ctx, window);
                window.commit();
                self.phase = Phase::Steady;
            }

            Phase::Steady => self.base.reconfigure(ctx, window),
        }
    }

    fn moved(&mut self, _ctx: &mut D, window: &mut CuboidWindow, face_direction: cgmath::Vector3<f32>) {
        tracing::trace!(id = ?window.id(), ?face_direction, "Window moved");
    }

    fn input(&mut self, ctx: &mut D, window: &mut CuboidWindow, event: InputEvent) {
        self.base.input(ctx, window, event);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, os::fd::OwnedFd, rc::Rc};

    use cgmath::{Quaternion, Vector3};
    use zmonitors_backend::{Backend, BackendHandler, CuboidWindow, Geometry, InputEvent};

    use super::{Root, UiBase};

    #[derive(Debug, Default)]
    struct Ctx;

    impl BackendHandler for Ctx {
        fn gain_ray_capability(&mut self) {}

        fn lose_ray_capability(&mut self) {}

        fn gain_keyboard_capability(&mut self) {}

        fn lose_keyboard_capability(&mut self) {}

        fn keyboard_keymap(&mut self, _format: u32, _fd: OwnedFd, _size: u32) {}
    }

    #[derive(Debug, Default)]
    struct Counts {
        setups: Cell<u32>,
        reconfigures: Cell<u32>,
        committed_before_setup: Cell<bool>,
    }

    #[derive(Debug, Default)]
    struct Counting(Rc<Counts>);

    impl UiBase<Ctx> for Counting {
        fn setup(&mut self, _ctx: &mut Ctx, window: &mut CuboidWindow) {
            self.0.setups.set(self.0.setups.get() + 1);
            self.0.committed_before_setup.set(window.committed().is_some());
        }

        fn reconfigure(&mut self, _ctx: &mut Ctx, _window: &mut CuboidWindow) {
            self.0.reconfigures.set(self.0.reconfigures.get() + 1);
        }

        fn input(&mut self, _ctx: &mut Ctx, _window: &mut CuboidWindow, _event: InputEvent) {}
    }

    fn geometry(x: f32) -> Geometry {
        Geometry {
            half_size: Vector3::new(x, 0.5, 0.01),
            quaternion: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        }
    }

    #[test]
    fn setup_runs_once_before_the_first_commit() {
        let (mut backend, _server) = Backend::<Ctx>::offline().unwrap();
        let mut ctx = Ctx;
        let counting = Counting::default();
        let counts = counting.0.clone();
        let id = backend.create_cuboid_window(geometry(0.5), Root::new(counting)).unwrap();

        // Nothing to acknowledge yet.
        assert!(backend.commit(id));
        assert_eq!(backend.cuboid_window(id).unwrap().committed(), None);
        assert_eq!(counts.setups.get(), 0);

        backend.queue_configure(id, 1, geometry(1.0));
        backend.dispatch_pending(&mut ctx).unwrap();

        assert_eq!(counts.setups.get(), 1);
        assert!(!counts.committed_before_setup.get());
        assert_eq!(backend.cuboid_window(id).unwrap().committed(), Some(geometry(1.0)));
    }

    #[test]
    fn steady_configure_only_proposes_geometry() {
        let (mut backend, _server) = Backend::<Ctx>::offline().unwrap();
        let mut ctx = Ctx;
        let counting = Counting::default();
        let counts = counting.0.clone();
        let id = backend.create_cuboid_window(geometry(0.5), Root::new(counting)).unwrap();

        backend.queue_configure(id, 1, geometry(1.0));
        backend.queue_configure(id, 2, geometry(2.0));
        backend.dispatch_pending(&mut ctx).unwrap();

        assert_eq!(counts.setups.get(), 1);
        assert_eq!(counts.reconfigures.get(), 1);

        let window = backend.cuboid_window(id).unwrap();
        assert_eq!(window.half_size(), Vector3::new(2.0, 0.5, 0.01));
        assert_eq!(window.committed(), Some(geometry(1.0)));

        // The owner applies it when it commits.
        assert!(backend.commit(id));
        assert_eq!(backend.cuboid_window(id).unwrap().committed(), Some(geometry(2.0)));
    }
}
