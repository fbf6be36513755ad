//! Per-client device junctions.
//!
//! A client may create any number of resources for one device. The junction groups the resources a client
//! created for a device so events for a focused client can be delivered to exactly that client's resources.
//! Junctions are created lazily and removed once their last resource is gone.

use std::{fmt, hash::Hash};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct JunctionId;
}

/// Resources a single client created for a device.
#[derive(Debug)]
pub struct Junction<C, R> {
    client: C,
    resources: Vec<R>,
}

impl<C, R> Junction<C, R> {
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn resources(&self) -> &[R] {
        &self.resources
    }
}

pub struct Junctions<C, R> {
    junctions: SlotMap<JunctionId, Junction<C, R>>,
    by_client: FxHashMap<C, JunctionId>,
}

impl<C, R> Junctions<C, R>
where
    C: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            junctions: SlotMap::with_key(),
            by_client: FxHashMap::default(),
        }
    }

    /// Returns the junction of `client`, creating it if needed.
    pub fn ensure(&mut self, client: &C) -> JunctionId {
        if let Some(&id) = self.by_client.get(client) {
            return id;
        }

        let id = self.junctions.insert(Junction {
            client: client.clone(),
            resources: Vec::new(),
        });
        self.by_client.insert(client.clone(), id);
        id
    }

    /// Attaches a resource to a junction.
    ///
    /// Returns `false` if the junction no longer exists.
    pub fn resource_create(&mut self, id: JunctionId, resource: R) -> bool {
        match self.junctions.get_mut(id) {
            Some(junction) => {
                junction.resources.push(resource);
                true
            }

            None => false,
        }
    }

    pub fn get(&self, id: JunctionId) -> Option<&Junction<C, R>> {
        self.junctions.get(id)
    }

    pub fn find(&self, client: &C) -> Option<&Junction<C, R>> {
        self.by_client.get(client).and_then(|&id| self.junctions.get(id))
    }

    /// Resources of `client`, empty if the client has none.
    pub fn resources(&self, client: &C) -> &[R] {
        self.find(client).map(Junction::resources).unwrap_or_default()
    }

    /// Removes the first resource of `client` matching `f`.
    ///
    /// The junction is removed with its last resource. Other resources, including those of the same client, are
    /// not affected.
    pub fn remove_resource<F>(&mut self, client: &C, f: F) -> bool
    where
        F: FnMut(&R) -> bool,
    {
        let Some(&id) = self.by_client.get(client) else {
            return false;
        };
        let Some(junction) = self.junctions.get_mut(id) else {
            return false;
        };
        let Some(index) = junction.resources.iter().position(f) else {
            return false;
        };

        junction.resources.remove(index);

        if junction.resources.is_empty() {
            self.junctions.remove(id);
            self.by_client.remove(client);
        }

        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Junction<C, R>> {
        self.junctions.values()
    }

    /// Every resource of every client.
    pub fn all_resources(&self) -> impl Iterator<Item = &R> {
        self.junctions.values().flat_map(|junction| junction.resources.iter())
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }
}

impl<C, R> Default for Junctions<C, R>
where
    C: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C: fmt::Debug, R: fmt::Debug> fmt::Debug for Junctions<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.junctions.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Junctions;

    #[test]
    fn ensure_is_get_or_create() {
        let mut junctions = Junctions::<u32, &str>::new();

        let a = junctions.ensure(&1);
        assert_eq!(junctions.ensure(&1), a);

        let b = junctions.ensure(&2);
        assert_ne!(a, b);
        assert_eq!(junctions.len(), 2);
    }

    /// Removing one resource leaves the siblings alone, the last one takes the junction with it.
    #[test]
    fn remove_resource_prunes_empty_junction() {
        let mut junctions = Junctions::<u32, &str>::new();
        let id = junctions.ensure(&1);
        assert!(junctions.resource_create(id, "first"));
        assert!(junctions.resource_create(id, "second"));

        assert!(junctions.remove_resource(&1, |r| *r == "first"));
        assert_eq!(junctions.resources(&1), ["second"]);
        assert!(!junctions.remove_resource(&1, |r| *r == "first"));

        assert!(junctions.remove_resource(&1, |r| *r == "second"));
        assert!(junctions.is_empty());
        assert!(junctions.get(id).is_none());
        assert!(!junctions.resource_create(id, "stale"));

        // A fresh junction for the same client.
        assert_ne!(junctions.ensure(&1), id);
    }

    #[test]
    fn resources_are_per_client() {
        let mut junctions = Junctions::<u32, &str>::new();
        let a = junctions.ensure(&1);
        let b = junctions.ensure(&2);
        junctions.resource_create(a, "a");
        junctions.resource_create(b, "b");

        assert_eq!(junctions.resources(&1), ["a"]);
        assert_eq!(junctions.resources(&2), ["b"]);
        assert!(junctions.resources(&3).is_empty());
        assert_eq!(junctions.all_resources().count(), 2);
    }
}
