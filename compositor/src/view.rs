//! Views are the focusable instances of client content placed on an output.
//!
//! The view arena is owned by the compositor. Anything else refers to a view by [`ViewId`], which stays invalid
//! once the view is removed, so a stale focus is detected instead of followed.

use cgmath::{Point2, Vector2};
use slotmap::{new_key_type, SlotMap};

use crate::{output::OutputId, seat::Protocol};

new_key_type! {
    pub struct ViewId;
}

#[derive(Debug)]
pub struct View<P: Protocol> {
    pub client: P::ClientId,
    pub surface: P::Surface,
    pub output: OutputId,
    /// Top left corner in output coordinates.
    pub position: Point2<f32>,
    pub size: Vector2<f32>,
}

impl<P: Protocol> View<P> {
    pub fn contains(&self, point: Point2<f32>) -> bool {
        let local = point - self.position;
        local.x >= 0.0 && local.y >= 0.0 && local.x < self.size.x && local.y < self.size.y
    }

    /// Converts a point in output coordinates to view local coordinates.
    pub fn to_local(&self, point: Point2<f32>) -> Point2<f32> {
        Point2::new(point.x - self.position.x, point.y - self.position.y)
    }
}

#[derive(Debug)]
pub struct Views<P: Protocol> {
    views: SlotMap<ViewId, View<P>>,
    /// Bottom to top.
    stack: Vec<ViewId>,
}

impl<P: Protocol> Views<P> {
    pub fn new() -> Self {
        Self {
            views: SlotMap::with_key(),
            stack: Vec::new(),
        }
    }

    /// Inserts a view on top of the stack.
    pub fn insert(&mut self, view: View<P>) -> ViewId {
        let id = self.views.insert(view);
        self.stack.push(id);
        id
    }

    pub fn remove(&mut self, id: ViewId) -> Option<View<P>> {
        let view = self.views.remove(id)?;
        self.stack.retain(|&other| other != id);
        Some(view)
    }

    pub fn get(&self, id: ViewId) -> Option<&View<P>> {
        self.views.get(id)
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut View<P>> {
        self.views.get_mut(id)
    }

    pub fn raise(&mut self, id: ViewId) {
        if self.views.contains_key(id) {
            self.stack.retain(|&other| other != id);
            self.stack.push(id);
        }
    }

    /// The topmost view on `output` containing `point`.
    pub fn pick(&self, output: OutputId, point: Point2<f32>) -> Option<ViewId> {
        self.stack.iter().rev().copied().find(|&id| {
            self.views
                .get(id)
                .map_or(false, |view| view.output == output && view.contains(point))
        })
    }

    /// Views from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = (ViewId, &View<P>)> {
        self.stack.iter().filter_map(|&id| self.views.get(id).map(|view| (id, view)))
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl<P: Protocol> Default for Views<P> {
    fn default() -> Self {
        Self::new()
    }
}
