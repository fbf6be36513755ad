//! One-shot callbacks invoked when the spatial compositor presents a virtual object.
//!
//! Any number of callbacks may wait on the same virtual object, but only one frame request is in flight per
//! object. When the frame is done every waiting callback fires once, in the order they were registered.

use std::fmt;

use slotmap::{new_key_type, SlotMap};

use crate::virtual_object::VirtualObjectId;

new_key_type! {
    pub struct FrameCallbackId;
}

type Callback<D> = Box<dyn FnOnce(&mut D, u32)>;

struct Pending<D> {
    object: VirtualObjectId,
    callback: Callback<D>,
}

pub(crate) struct FrameCallbacks<D> {
    pending: SlotMap<FrameCallbackId, Pending<D>>,
}

impl<D> FrameCallbacks<D> {
    pub fn new() -> Self {
        Self {
            pending: SlotMap::with_key(),
        }
    }

    pub fn insert(&mut self, object: VirtualObjectId, callback: Callback<D>) -> FrameCallbackId {
        self.pending.insert(Pending { object, callback })
    }

    /// Removes a callback without invoking it, returning the object it was waiting on.
    pub fn remove(&mut self, id: FrameCallbackId) -> Option<VirtualObjectId> {
        self.pending.remove(id).map(|pending| pending.object)
    }

    /// Removes a callback so it can be invoked.
    pub fn take(&mut self, id: FrameCallbackId) -> Option<Callback<D>> {
        self.pending.remove(id).map(|pending| pending.callback)
    }

    pub fn contains(&self, id: FrameCallbackId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl<D> fmt::Debug for FrameCallbacks<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCallbacks").field("pending", &self.pending.len()).finish()
    }
}
