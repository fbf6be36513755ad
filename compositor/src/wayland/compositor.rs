use wayland_server::{
    backend::ClientId,
    protocol::{
        wl_callback::WlCallback,
        wl_compositor::{self, WlCompositor},
        wl_region::{self, WlRegion},
        wl_surface::{self, WlSurface},
    },
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New,
};

use crate::{surface::SurfaceId, Compositor};

impl GlobalDispatch<WlCompositor, ()> for Compositor {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlCompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<WlCompositor, ()> for Compositor {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &WlCompositor,
        request: wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_compositor::Request::CreateSurface { id } => {
                let surface = state.surfaces.insert_with(|surface| data_init.init(id, surface));
                tracing::trace!(?surface, "Created surface");
            }

            wl_compositor::Request::CreateRegion { id } => {
                data_init.init(id, ());
            }

            _ => tracing::warn!(?request, "Unhandled wl_compositor request"),
        }
    }
}

impl Dispatch<WlSurface, SurfaceId> for Compositor {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &WlSurface,
        request: wl_surface::Request,
        data: &SurfaceId,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let id = *data;

        match request {
            wl_surface::Request::Attach { buffer, .. } => {
                if let Some(surface) = state.surfaces.get_mut(id) {
                    surface.attach(buffer);
                }
            }

            wl_surface::Request::Frame { callback } => {
                let callback = data_init.init(callback, ());

                if let Some(surface) = state.surfaces.get_mut(id) {
                    surface.frame(callback);
                }
            }

            wl_surface::Request::Commit => state.commit_surface(id),

            // Nothing is rendered here.
            wl_surface::Request::Damage { .. }
            | wl_surface::Request::DamageBuffer { .. }
            | wl_surface::Request::SetOpaqueRegion { .. }
            | wl_surface::Request::SetInputRegion { .. }
            | wl_surface::Request::SetBufferTransform { .. }
            | wl_surface::Request::SetBufferScale { .. } => {}

            wl_surface::Request::Destroy => {}

            _ => tracing::warn!(?request, "Unhandled wl_surface request"),
        }
    }

    fn destroyed(state: &mut Self, _client: ClientId, _resource: &WlSurface, data: &SurfaceId) {
        state.destroy_surface(*data);
    }
}

impl Dispatch<WlRegion, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlRegion,
        request: wl_region::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_region::Request::Add { .. } | wl_region::Request::Subtract { .. } | wl_region::Request::Destroy => {}
            _ => tracing::warn!(?request, "Unhandled wl_region request"),
        }
    }
}

impl Dispatch<WlCallback, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlCallback,
        _request: <WlCallback as wayland_server::Resource>::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}
