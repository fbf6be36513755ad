use std::fmt;

use cgmath::Point2;

use crate::{
    output::OutputId,
    serial::Serials,
    view::{ViewId, Views},
};

use super::{
    grab::{DefaultGrab, PointerGrab, PointerHandle},
    junction::Junctions,
    ButtonState, PointerResource, Protocol,
};

/// The pointer of a seat.
///
/// Pointer events go to the active grab, which decides what clients see. Unless an interactive operation is in
/// progress the grab is [`DefaultGrab`], which delivers events to the view under the pointer.
pub struct Pointer<P: Protocol> {
    state: PointerState<P>,
    grab: Box<dyn PointerGrab<P>>,
}

impl<P: Protocol> Pointer<P> {
    pub(super) fn new() -> Self {
        Self {
            state: PointerState {
                resources: Junctions::new(),
                focus: None,
                output: None,
                position: Point2::new(0.0, 0.0),
                button_count: 0,
                grab_position: Point2::new(0.0, 0.0),
                grab_serial: 0,
            },
            grab: Box::new(DefaultGrab),
        }
    }

    pub fn state(&self) -> &PointerState<P> {
        &self.state
    }

    pub fn focus(&self) -> Option<ViewId> {
        self.state.focus
    }

    pub fn position(&self) -> Point2<f32> {
        self.state.position
    }

    pub fn button_count(&self) -> u32 {
        self.state.button_count
    }

    pub fn grab_position(&self) -> Point2<f32> {
        self.state.grab_position
    }

    pub fn grab_serial(&self) -> u32 {
        self.state.grab_serial
    }

    /// Replaces the active grab.
    pub fn set_grab<G>(&mut self, grab: G)
    where
        G: PointerGrab<P> + 'static,
    {
        self.grab = Box::new(grab);
    }

    pub fn unset_grab(&mut self) {
        self.grab = Box::new(DefaultGrab);
    }

    pub(super) fn add_resource(&mut self, client: &P::ClientId, resource: P::Pointer) {
        let junction = self.state.resources.ensure(client);
        self.state.resources.resource_create(junction, resource);
    }

    pub(super) fn remove_resource<F>(&mut self, client: &P::ClientId, f: F)
    where
        F: FnMut(&P::Pointer) -> bool,
    {
        self.state.resources.remove_resource(client, f);
    }

    pub(super) fn motion_abs(
        &mut self,
        views: &mut Views<P>,
        serials: &Serials,
        output: OutputId,
        position: Point2<f32>,
        time: u32,
    ) {
        self.state.output = Some(output);
        self.state.position = position;

        self.with_grab(views, serials, |grab, handle| {
            grab.motion_abs(handle, output, position, time);
        });
    }

    pub(super) fn button(
        &mut self,
        views: &mut Views<P>,
        serials: &Serials,
        time: u32,
        button: u32,
        state: ButtonState,
        serial: u32,
    ) {
        match state {
            ButtonState::Pressed => {
                if self.state.button_count == 0 {
                    self.state.grab_position = self.state.position;
                    self.state.grab_serial = serial;
                }

                self.state.button_count += 1;
            }

            ButtonState::Released => {
                self.state.button_count = self.state.button_count.saturating_sub(1);
            }
        }

        self.with_grab(views, serials, |grab, handle| {
            grab.button(handle, time, button, state, serial);
        });
    }

    pub(super) fn leave(&mut self, views: &mut Views<P>, serials: &Serials) {
        self.with_grab(views, serials, |grab, handle| grab.cancel(handle));

        self.state.set_focus(views, serials, None);
        self.state.output = None;
        self.state.button_count = 0;
        self.state.grab_serial = 0;
    }

    fn with_grab<F>(&mut self, views: &mut Views<P>, serials: &Serials, f: F)
    where
        F: FnOnce(&mut dyn PointerGrab<P>, &mut PointerHandle<'_, P>),
    {
        let mut handle = PointerHandle::new(&mut self.state, views, serials);
        f(&mut *self.grab, &mut handle);

        if handle.grab_unset() {
            self.grab = Box::new(DefaultGrab);
        }
    }
}

impl<P: Protocol> fmt::Debug for Pointer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointer").field("state", &self.state).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct PointerState<P: Protocol> {
    resources: Junctions<P::ClientId, P::Pointer>,
    focus: Option<ViewId>,
    output: Option<OutputId>,
    /// Position in output coordinates.
    position: Point2<f32>,
    button_count: u32,
    /// Position of the pointer when the held buttons were first pressed.
    grab_position: Point2<f32>,
    /// Serial of the press which started the held buttons.
    grab_serial: u32,
}

impl<P: Protocol> PointerState<P> {
    pub fn focus(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn output(&self) -> Option<OutputId> {
        self.output
    }

    pub fn position(&self) -> Point2<f32> {
        self.position
    }

    pub fn button_count(&self) -> u32 {
        self.button_count
    }

    pub fn grab_position(&self) -> Point2<f32> {
        self.grab_position
    }

    pub fn resources(&self) -> &Junctions<P::ClientId, P::Pointer> {
        &self.resources
    }

    /// Moves the focus to `view`, sending leave and enter events.
    ///
    /// A view which no longer exists is treated as no view.
    pub(super) fn set_focus(&mut self, views: &Views<P>, serials: &Serials, view: Option<ViewId>) {
        let view = view.filter(|&id| views.get(id).is_some());

        if self.focus == view {
            return;
        }

        if let Some(old) = self.focus.take().and_then(|id| views.get(id)) {
            let serial = serials.next();

            for resource in self.resources.resources(&old.client) {
                resource.send_leave(serial, &old.surface);
                resource.send_frame();
            }
        }

        self.focus = view;

        if let Some(new) = view.and_then(|id| views.get(id)) {
            let serial = serials.next();
            let local = new.to_local(self.position);

            for resource in self.resources.resources(&new.client) {
                resource.send_enter(serial, &new.surface, local);
                resource.send_frame();
            }
        }
    }

    pub(super) fn send_motion(&self, views: &Views<P>, time: u32) {
        let Some(view) = self.focus.and_then(|id| views.get(id)) else {
            return;
        };
        let local = view.to_local(self.position);

        for resource in self.resources.resources(&view.client) {
            resource.send_motion(time, local);
            resource.send_frame();
        }
    }

    pub(super) fn send_button(&self, views: &Views<P>, serial: u32, time: u32, button: u32, state: ButtonState) {
        let Some(view) = self.focus.and_then(|id| views.get(id)) else {
            return;
        };

        for resource in self.resources.resources(&view.client) {
            resource.send_button(serial, time, button, state);
            resource.send_frame();
        }
    }
}
