//! Data devices
//!
//! Clients expect the data device manager to exist. Resources are created so clients keep working, but neither
//! selections nor drag and drop are implemented.

use wayland_server::{
    protocol::{
        wl_data_device::{self, WlDataDevice},
        wl_data_device_manager::{self, WlDataDeviceManager},
        wl_data_source::{self, WlDataSource},
    },
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New,
};

use crate::Compositor;

impl GlobalDispatch<WlDataDeviceManager, ()> for Compositor {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlDataDeviceManager>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<WlDataDeviceManager, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlDataDeviceManager,
        request: wl_data_device_manager::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_data_device_manager::Request::CreateDataSource { id } => {
                data_init.init(id, ());
            }

            wl_data_device_manager::Request::GetDataDevice { id, .. } => {
                data_init.init(id, ());
            }

            _ => tracing::warn!(?request, "Unhandled wl_data_device_manager request"),
        }
    }
}

impl Dispatch<WlDataSource, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlDataSource,
        request: wl_data_source::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_data_source::Request::Offer { mime_type } => tracing::trace!(%mime_type, "Data source offer"),
            wl_data_source::Request::SetActions { .. } | wl_data_source::Request::Destroy => {}
            _ => tracing::warn!(?request, "Unhandled wl_data_source request"),
        }
    }
}

impl Dispatch<WlDataDevice, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlDataDevice,
        request: wl_data_device::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_data_device::Request::StartDrag { serial, .. } => {
                tracing::warn!(serial, "Drag and drop is not implemented");
            }

            wl_data_device::Request::SetSelection { serial, .. } => {
                tracing::warn!(serial, "Selections are not implemented");
            }

            wl_data_device::Request::Release => {}

            _ => tracing::warn!(?request, "Unhandled wl_data_device request"),
        }
    }
}
