use crate::{
    serial::Serials,
    view::{ViewId, Views},
};

use super::{junction::Junctions, KeyState, KeyboardResource, Keymap, Modifiers, Protocol};

/// The keyboard of a seat.
///
/// Keys go to the client of the focused view. The keymap is sent to every keyboard resource when it changes
/// and to new resources when they are created.
#[derive(Debug)]
pub struct Keyboard<P: Protocol> {
    resources: Junctions<P::ClientId, P::Keyboard>,
    focus: Option<ViewId>,
    keymap: Option<Keymap>,
    modifiers: Modifiers,
}

impl<P: Protocol> Keyboard<P> {
    pub(super) fn new() -> Self {
        Self {
            resources: Junctions::new(),
            focus: None,
            keymap: None,
            modifiers: Modifiers::default(),
        }
    }

    pub fn focus(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn keymap(&self) -> Option<&Keymap> {
        self.keymap.as_ref()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn resources(&self) -> &Junctions<P::ClientId, P::Keyboard> {
        &self.resources
    }

    pub(super) fn add_resource(&mut self, client: &P::ClientId, resource: P::Keyboard) {
        if let Some(keymap) = self.keymap.as_ref() {
            resource.send_keymap(keymap);
        }

        let junction = self.resources.ensure(client);
        self.resources.resource_create(junction, resource);
    }

    pub(super) fn remove_resource<F>(&mut self, client: &P::ClientId, f: F)
    where
        F: FnMut(&P::Keyboard) -> bool,
    {
        self.resources.remove_resource(client, f);
    }

    pub(super) fn set_focus(&mut self, views: &Views<P>, serials: &Serials, view: Option<ViewId>) {
        let view = view.filter(|&id| views.get(id).is_some());

        if self.focus == view {
            return;
        }

        if let Some(old) = self.focus.take().and_then(|id| views.get(id)) {
            let serial = serials.next();

            for resource in self.resources.resources(&old.client) {
                resource.send_leave(serial, &old.surface);
            }
        }

        self.focus = view;

        if let Some(new) = view.and_then(|id| views.get(id)) {
            let serial = serials.next();

            for resource in self.resources.resources(&new.client) {
                resource.send_enter(serial, &new.surface, &[]);
                resource.send_modifiers(serial, self.modifiers);
            }
        }
    }

    pub(super) fn send_key(&self, views: &Views<P>, serial: u32, time: u32, key: u32, state: KeyState) {
        let Some(view) = self.focus.and_then(|id| views.get(id)) else {
            return;
        };

        for resource in self.resources.resources(&view.client) {
            resource.send_key(serial, time, key, state);
        }
    }

    pub(super) fn send_modifiers(&mut self, views: &Views<P>, serial: u32, modifiers: Modifiers) {
        self.modifiers = modifiers;

        let Some(view) = self.focus.and_then(|id| views.get(id)) else {
            return;
        };

        for resource in self.resources.resources(&view.client) {
            resource.send_modifiers(serial, modifiers);
        }
    }

    pub(super) fn set_keymap(&mut self, keymap: Keymap) {
        for resource in self.resources.all_resources() {
            resource.send_keymap(&keymap);
        }

        tracing::debug!(format = keymap.format, size = keymap.size, "Keymap updated");
        self.keymap = Some(keymap);
    }
}
