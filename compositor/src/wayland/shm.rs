//! Shared memory buffers
//!
//! The pool keeps the client's file descriptor alive for the lifetime of its buffers. Buffers only record their
//! layout since their contents are never read here.

use std::{
    os::fd::OwnedFd,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
};

use wayland_server::{
    protocol::{
        wl_buffer::{self, WlBuffer},
        wl_shm::{self, WlShm},
        wl_shm_pool::{self, WlShmPool},
    },
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource, WEnum,
};

use crate::Compositor;

const BYTES_PER_PIXEL: i32 = 4;

#[derive(Debug)]
pub struct ShmPool {
    #[allow(dead_code)]
    fd: OwnedFd,
    size: AtomicI32,
}

#[derive(Debug)]
pub struct BufferData {
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub offset: i32,
    pub format: wl_shm::Format,
    pub pool: Arc<ShmPool>,
}

/// Whether a buffer with this layout fits in a pool of `pool_size` bytes.
fn buffer_fits(pool_size: i32, offset: i32, width: i32, height: i32, stride: i32) -> bool {
    if offset < 0 || width <= 0 || height <= 0 {
        return false;
    }

    let Some(row) = width.checked_mul(BYTES_PER_PIXEL) else {
        return false;
    };

    if stride < row {
        return false;
    }

    stride
        .checked_mul(height)
        .and_then(|size| size.checked_add(offset))
        .map_or(false, |end| end <= pool_size)
}

impl GlobalDispatch<WlShm, ()> for Compositor {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlShm>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let shm = data_init.init(resource, ());
        shm.format(wl_shm::Format::Argb8888);
        shm.format(wl_shm::Format::Xrgb8888);
    }
}

impl Dispatch<WlShm, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &WlShm,
        request: wl_shm::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_shm::Request::CreatePool { id, fd, size } => {
                if size <= 0 {
                    resource.post_error(wl_shm::Error::InvalidStride, format!("invalid pool size {size}"));
                    return;
                }

                let pool = ShmPool {
                    fd,
                    size: AtomicI32::new(size),
                };
                data_init.init(id, Arc::new(pool));
            }

            _ => tracing::warn!(?request, "Unhandled wl_shm request"),
        }
    }
}

impl Dispatch<WlShmPool, Arc<ShmPool>> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &WlShmPool,
        request: wl_shm_pool::Request,
        data: &Arc<ShmPool>,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_shm_pool::Request::CreateBuffer {
                id,
                offset,
                width,
                height,
                stride,
                format,
            } => {
                let format = match format {
                    WEnum::Value(format @ (wl_shm::Format::Argb8888 | wl_shm::Format::Xrgb8888)) => format,
                    _ => {
                        resource.post_error(wl_shm::Error::InvalidFormat, format!("unsupported format {format:?}"));
                        return;
                    }
                };

                if !buffer_fits(data.size.load(Ordering::Relaxed), offset, width, height, stride) {
                    resource.post_error(
                        wl_shm::Error::InvalidStride,
                        format!("invalid buffer layout {width}x{height}, stride {stride}, offset {offset}"),
                    );
                    return;
                }

                data_init.init(
                    id,
                    BufferData {
                        width,
                        height,
                        stride,
                        offset,
                        format,
                        pool: data.clone(),
                    },
                );
            }

            wl_shm_pool::Request::Resize { size } => {
                // Pools may only grow.
                if size < data.size.load(Ordering::Relaxed) {
                    resource.post_error(wl_shm::Error::InvalidStride, format!("cannot shrink pool to {size}"));
                    return;
                }

                data.size.store(size, Ordering::Relaxed);
            }

            wl_shm_pool::Request::Destroy => {}

            _ => tracing::warn!(?request, "Unhandled wl_shm_pool request"),
        }
    }
}

impl Dispatch<WlBuffer, BufferData> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlBuffer,
        request: wl_buffer::Request,
        _data: &BufferData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_buffer::Request::Destroy => {}
            _ => tracing::warn!(?request, "Unhandled wl_buffer request"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::buffer_fits;

    #[test]
    fn buffer_layout() {
        assert!(buffer_fits(400 * 100, 0, 100, 100, 400));
        assert!(buffer_fits(400 * 100 + 16, 16, 100, 100, 400));

        // Stride too small for the width.
        assert!(!buffer_fits(400 * 100, 0, 100, 100, 399));
        // Past the end of the pool.
        assert!(!buffer_fits(400 * 100, 4, 100, 100, 400));
        assert!(!buffer_fits(400 * 100, -1, 100, 100, 400));
        assert!(!buffer_fits(400 * 100, 0, 0, 100, 400));
        assert!(!buffer_fits(i32::MAX, 0, 100, i32::MAX, 400));
    }
}
