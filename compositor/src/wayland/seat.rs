use wayland_server::{
    backend::ClientId,
    protocol::{
        wl_keyboard::{self, WlKeyboard},
        wl_pointer::{self, WlPointer},
        wl_seat::{self, WlSeat},
        wl_touch::{self, WlTouch},
    },
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use crate::Compositor;

impl GlobalDispatch<WlSeat, ()> for Compositor {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        client: &Client,
        resource: New<WlSeat>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let seat = data_init.init(resource, ());
        state.seat.bind(client.id(), seat);
    }
}

impl Dispatch<WlSeat, ()> for Compositor {
    fn request(
        state: &mut Self,
        client: &Client,
        _resource: &WlSeat,
        request: wl_seat::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_seat::Request::GetPointer { id } => {
                let pointer = data_init.init(id, ());

                if !state.seat.get_pointer(&client.id(), pointer) {
                    tracing::debug!(client = ?client.id(), "Created inert pointer, the seat has no pointer");
                }
            }

            wl_seat::Request::GetKeyboard { id } => {
                let keyboard = data_init.init(id, ());

                if !state.seat.get_keyboard(&client.id(), keyboard) {
                    tracing::debug!(client = ?client.id(), "Created inert keyboard, the seat has no keyboard");
                }
            }

            wl_seat::Request::GetTouch { id } => {
                data_init.init(id, ());
                tracing::warn!(client = ?client.id(), "Touch is not supported");
            }

            wl_seat::Request::Release => {}

            _ => tracing::warn!(?request, "Unhandled wl_seat request"),
        }
    }

    fn destroyed(state: &mut Self, client: ClientId, resource: &WlSeat, _data: &()) {
        state.seat.unbind(&client, |seat| seat == resource);
    }
}

impl Dispatch<WlPointer, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlPointer,
        request: wl_pointer::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            // The cursor is drawn by the spatial compositor.
            wl_pointer::Request::SetCursor { .. } => {}
            wl_pointer::Request::Release => {}
            _ => tracing::warn!(?request, "Unhandled wl_pointer request"),
        }
    }

    fn destroyed(state: &mut Self, client: ClientId, resource: &WlPointer, _data: &()) {
        state.seat.remove_pointer(&client, |pointer| pointer == resource);
    }
}

impl Dispatch<WlKeyboard, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlKeyboard,
        request: wl_keyboard::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_keyboard::Request::Release => {}
            _ => tracing::warn!(?request, "Unhandled wl_keyboard request"),
        }
    }

    fn destroyed(state: &mut Self, client: ClientId, resource: &WlKeyboard, _data: &()) {
        state.seat.remove_keyboard(&client, |keyboard| keyboard == resource);
    }
}

impl Dispatch<WlTouch, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &WlTouch,
        request: wl_touch::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_touch::Request::Release => {}
            _ => tracing::warn!(?request, id = ?resource.id(), "Unhandled wl_touch request"),
        }
    }
}
