use wayland_server::{
    backend::ClientId,
    protocol::wl_output::{self, WlOutput},
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use crate::{
    output::{Output, OutputId},
    Compositor,
};

const MAKE: &str = "zmonitors";

/// Sends the description of `output` to `resource`.
pub(crate) fn send_output(resource: &WlOutput, output: &Output) {
    let (physical_width, physical_height) = output.physical_size;

    resource.geometry(
        0,
        0,
        physical_width,
        physical_height,
        wl_output::Subpixel::Unknown,
        MAKE.to_owned(),
        output.name.clone(),
        wl_output::Transform::Normal,
    );
    resource.mode(
        wl_output::Mode::Current | wl_output::Mode::Preferred,
        output.width,
        output.height,
        output.refresh,
    );

    if resource.version() >= 2 {
        resource.scale(1);
    }

    if resource.version() >= 4 {
        resource.name(output.name.clone());
        resource.description(format!("{MAKE} monitor {}", output.name));
    }

    if resource.version() >= 2 {
        resource.done();
    }
}

impl GlobalDispatch<WlOutput, OutputId> for Compositor {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlOutput>,
        global_data: &OutputId,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let resource = data_init.init(resource, *global_data);

        // The global may outlive the output for a short time after removal.
        let Some(output) = state.outputs.get_mut(*global_data) else {
            return;
        };

        send_output(&resource, output);
        output.resources.push(resource);
    }
}

impl Dispatch<WlOutput, OutputId> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlOutput,
        request: wl_output::Request,
        _data: &OutputId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_output::Request::Release => {}
            _ => tracing::warn!(?request, "Unhandled wl_output request"),
        }
    }

    fn destroyed(state: &mut Self, _client: ClientId, resource: &WlOutput, data: &OutputId) {
        if let Some(output) = state.outputs.get_mut(*data) {
            output.resources.retain(|output| output != resource);
        }
    }
}
