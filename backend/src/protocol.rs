//! Generated bindings for the zigen protocol and helpers for its array encoded vectors.

use cgmath::{Quaternion, Vector3};

pub mod client {
    use wayland_client;

    pub mod __interfaces {
        use wayland_client::backend as wayland_backend;
        use wayland_client::protocol::__interfaces::*;
        wayland_scanner::generate_interfaces!("../protocols/zigen.xml");
    }
    use self::__interfaces::*;
    use wayland_client::protocol::*;

    wayland_scanner::generate_client_code!("../protocols/zigen.xml");
}

pub fn encode_vec3(v: Vector3<f32>) -> Vec<u8> {
    encode(&[v.x, v.y, v.z])
}

/// Quaternions go over the wire as `(x, y, z, w)`.
pub fn encode_quaternion(q: Quaternion<f32>) -> Vec<u8> {
    encode(&[q.v.x, q.v.y, q.v.z, q.s])
}

/// Decodes a vector, returning `None` if the array has the wrong length.
pub fn decode_vec3(bytes: &[u8]) -> Option<Vector3<f32>> {
    match decode(bytes)?[..] {
        [x, y, z] => Some(Vector3::new(x, y, z)),
        _ => None,
    }
}

pub fn decode_quaternion(bytes: &[u8]) -> Option<Quaternion<f32>> {
    match decode(bytes)?[..] {
        [x, y, z, w] => Some(Quaternion::new(w, x, y, z)),
        _ => None,
    }
}

/// Keys in a keyboard enter event are an array of `u32`.
pub fn decode_keys(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn encode(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

fn decode(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }

    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}
