//! Pointer grabs
//!
//! A grab decides where pointer events go. Interactive operations such as moving a window take over the pointer
//! by replacing the grab and hand it back by unsetting it.
//!
//! A grab which is cancelled must unset itself, the pointer resets its own state afterwards.

use cgmath::Point2;

use crate::{
    output::OutputId,
    serial::Serials,
    view::{ViewId, Views},
};

use super::{pointer::PointerState, ButtonState, Protocol};

pub trait PointerGrab<P: Protocol> {
    /// The pointer moved to `position` on `output`.
    ///
    /// The pointer position has already been updated.
    fn motion_abs(&mut self, handle: &mut PointerHandle<'_, P>, output: OutputId, position: Point2<f32>, time: u32);

    /// A button changed state.
    ///
    /// The button count, and for the first press the grab position and serial, have already been updated.
    fn button(&mut self, handle: &mut PointerHandle<'_, P>, time: u32, button: u32, state: ButtonState, serial: u32);

    /// The pointer left the output.
    fn cancel(&mut self, handle: &mut PointerHandle<'_, P>);
}

/// Access to the pointer from within a grab.
pub struct PointerHandle<'a, P: Protocol> {
    state: &'a mut PointerState<P>,
    views: &'a mut Views<P>,
    serials: &'a Serials,
    unset: bool,
}

impl<'a, P: Protocol> PointerHandle<'a, P> {
    pub(super) fn new(state: &'a mut PointerState<P>, views: &'a mut Views<P>, serials: &'a Serials) -> Self {
        Self {
            state,
            views,
            serials,
            unset: false,
        }
    }

    pub fn state(&self) -> &PointerState<P> {
        self.state
    }

    pub fn views(&self) -> &Views<P> {
        self.views
    }

    pub fn views_mut(&mut self) -> &mut Views<P> {
        self.views
    }

    pub fn set_focus(&mut self, view: Option<ViewId>) {
        self.state.set_focus(self.views, self.serials, view);
    }

    pub fn send_motion(&self, time: u32) {
        self.state.send_motion(self.views, time);
    }

    pub fn send_button(&self, serial: u32, time: u32, button: u32, state: ButtonState) {
        self.state.send_button(self.views, serial, time, button, state);
    }

    /// Restores the default grab once the current event is handled.
    pub fn unset_grab(&mut self) {
        self.unset = true;
    }

    pub(super) fn grab_unset(&self) -> bool {
        self.unset
    }
}

/// Delivers events to the view under the pointer.
#[derive(Debug)]
pub struct DefaultGrab;

impl<P: Protocol> PointerGrab<P> for DefaultGrab {
    fn motion_abs(&mut self, handle: &mut PointerHandle<'_, P>, output: OutputId, position: Point2<f32>, time: u32) {
        let view = handle.views().pick(output, position);
        handle.set_focus(view);
        handle.send_motion(time);
    }

    fn button(&mut self, handle: &mut PointerHandle<'_, P>, time: u32, button: u32, state: ButtonState, serial: u32) {
        handle.send_button(serial, time, button, state);
    }

    fn cancel(&mut self, _handle: &mut PointerHandle<'_, P>) {}
}

/// Moves a view with the pointer until every button is released.
#[derive(Debug)]
pub struct MoveGrab {
    view: ViewId,
    /// Pointer position when the move started.
    anchor: Point2<f32>,
    /// View position when the move started.
    initial: Point2<f32>,
}

impl MoveGrab {
    pub fn new(view: ViewId, anchor: Point2<f32>, initial: Point2<f32>) -> Self {
        Self { view, anchor, initial }
    }
}

impl<P: Protocol> PointerGrab<P> for MoveGrab {
    fn motion_abs(&mut self, handle: &mut PointerHandle<'_, P>, _output: OutputId, position: Point2<f32>, _time: u32) {
        let offset = position - self.anchor;

        match handle.views_mut().get_mut(self.view) {
            Some(view) => view.position = self.initial + offset,
            None => handle.unset_grab(),
        }
    }

    fn button(
        &mut self,
        handle: &mut PointerHandle<'_, P>,
        _time: u32,
        _button: u32,
        _state: ButtonState,
        _serial: u32,
    ) {
        if handle.state().button_count() == 0 {
            tracing::trace!(view = ?self.view, "Move finished");
            handle.unset_grab();
        }
    }

    fn cancel(&mut self, handle: &mut PointerHandle<'_, P>) {
        handle.unset_grab();
    }
}
