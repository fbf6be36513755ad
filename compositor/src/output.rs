//! Outputs are the screens clients are shown on.
//!
//! Every monitor in the spatial compositor provides one output. The output size is in pixels.

use slotmap::{new_key_type, SlotMap};
use wayland_server::{backend::GlobalId, protocol::wl_output::WlOutput, DisplayHandle, Resource};

use crate::{wayland::output::send_output, Compositor};

new_key_type! {
    pub struct OutputId;
}

#[derive(Debug)]
pub struct Output {
    pub name: String,
    pub width: i32,
    pub height: i32,
    /// Refresh rate in mHz.
    pub refresh: i32,
    /// Physical size in millimeters, zero until known.
    pub physical_size: (i32, i32),
    pub(crate) global: Option<GlobalId>,
    pub(crate) resources: Vec<WlOutput>,
}

#[derive(Debug, Default)]
pub struct Outputs {
    outputs: SlotMap<OutputId, Output>,
}

impl Outputs {
    /// Adds an output and advertises it to clients.
    pub fn create(&mut self, display: &DisplayHandle, name: String, width: i32, height: i32) -> OutputId {
        let id = self.outputs.insert(Output {
            name,
            width,
            height,
            refresh: 60_000,
            physical_size: (0, 0),
            global: None,
            resources: Vec::new(),
        });

        let global = display.create_global::<Compositor, WlOutput, _>(4, id);
        if let Some(output) = self.outputs.get_mut(id) {
            tracing::debug!(?id, name = %output.name, width, height, "Created output");
            output.global = Some(global);
        }

        id
    }

    pub fn remove(&mut self, display: &DisplayHandle, id: OutputId) -> Option<Output> {
        let mut output = self.outputs.remove(id)?;

        if let Some(global) = output.global.take() {
            display.remove_global::<Compositor>(global);
        }

        Some(output)
    }

    pub fn get(&self, id: OutputId) -> Option<&Output> {
        self.outputs.get(id)
    }

    pub fn get_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.outputs.get_mut(id)
    }

    /// Updates the physical size and tells clients about it.
    pub fn set_physical_size(&mut self, id: OutputId, size: (i32, i32)) {
        let Some(output) = self.outputs.get_mut(id) else {
            return;
        };

        if output.physical_size == size {
            return;
        }

        output.physical_size = size;

        for resource in &output.resources {
            send_output(resource, output);
        }
    }

    /// The output new windows are placed on.
    pub fn primary(&self) -> Option<OutputId> {
        self.outputs.keys().next()
    }

    /// Outputs bound by the client which owns `resource`.
    pub fn resources_for<'a, R: Resource>(
        &'a self,
        id: OutputId,
        resource: &'a R,
    ) -> impl Iterator<Item = &'a WlOutput> {
        let client = resource.client().map(|client| client.id());

        self.outputs
            .get(id)
            .into_iter()
            .flat_map(|output| output.resources.iter())
            .filter(move |output| output.client().map(|c| c.id()) == client)
    }
}
