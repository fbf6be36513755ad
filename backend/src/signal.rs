//! Destroy notification primitive.
//!
//! A [`Signal`] is owned by the object that emits it. Anything that needs to know when that object goes away
//! connects a callback and keeps the returned [`Listener`]. Dropping the listener disconnects it, so a
//! subscriber that dies first never gets called.
//!
//! Emission is re-entrant: a callback may connect or disconnect listeners (including itself) while the signal is
//! being emitted. Only listeners registered when the emission started are invoked, each exactly once.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct ListenerKey;
}

type Callback<T> = Box<dyn FnMut(&T)>;

/// Listeners of one signal.
///
/// A slot holds `None` while its callback is being invoked.
struct Slots<T> {
    listeners: SlotMap<ListenerKey, Option<Callback<T>>>,
}

pub struct Signal<T> {
    slots: Rc<RefCell<Slots<T>>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                listeners: SlotMap::with_key(),
            })),
        }
    }

    /// Registers a callback, returning the handle which keeps it connected.
    pub fn connect<F>(&self, callback: F) -> Listener<T>
    where
        F: FnMut(&T) + 'static,
    {
        let key = self.slots.borrow_mut().listeners.insert(Some(Box::new(callback)));

        Listener {
            slots: Rc::downgrade(&self.slots),
            key,
        }
    }

    /// Invokes every listener registered at the time of the call with `value`.
    ///
    /// Listeners are invoked in slot order, which is stable for the lifetime of the registrations.
    pub fn emit(&self, value: &T) {
        let keys = self.slots.borrow().listeners.keys().collect::<Vec<_>>();

        for key in keys {
            // Take the callback out so the registry is not borrowed while it runs.
            let callback = match self.slots.borrow_mut().listeners.get_mut(key) {
                Some(slot) => slot.take(),
                None => continue,
            };

            let Some(mut callback) = callback else {
                // Already running further up the stack.
                continue;
            };

            callback(value);

            // The listener may have been disconnected by its own callback.
            if let Some(slot) = self.slots.borrow_mut().listeners.get_mut(key) {
                *slot = Some(callback);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("listeners", &self.len()).finish()
    }
}

/// A connection to a [`Signal`].
///
/// The callback stays connected until the listener is dropped or [`Listener::disconnect`] is called. A listener
/// may outlive its signal, in which case dropping it does nothing.
#[must_use = "dropping a Listener disconnects it"]
pub struct Listener<T> {
    slots: Weak<RefCell<Slots<T>>>,
    key: ListenerKey,
}

impl<T> Listener<T> {
    pub fn disconnect(self) {}

    /// Whether the signal this listener is connected to still exists.
    pub fn is_connected(&self) -> bool {
        self.slots
            .upgrade()
            .map_or(false, |slots| slots.borrow().listeners.contains_key(self.key))
    }
}

impl<T> Drop for Listener<T> {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            slots.borrow_mut().listeners.remove(self.key);
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::Signal;

    #[test]
    fn emit_reaches_every_listener_once() {
        let signal = Signal::<u32>::new();
        let calls = Rc::new(RefCell::new(Vec::new()));

        let a = {
            let calls = calls.clone();
            signal.connect(move |v| calls.borrow_mut().push(("a", *v)))
        };
        let b = {
            let calls = calls.clone();
            signal.connect(move |v| calls.borrow_mut().push(("b", *v)))
        };

        signal.emit(&7);

        let calls = calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&("a", 7)));
        assert!(calls.contains(&("b", 7)));
        drop((a, b));
    }

    /// A dropped listener is never invoked again.
    #[test]
    fn dropped_listener_is_disconnected() {
        let signal = Signal::<()>::new();
        let count = Rc::new(RefCell::new(0));

        let listener = {
            let count = count.clone();
            signal.connect(move |_| *count.borrow_mut() += 1)
        };

        signal.emit(&());
        listener.disconnect();
        signal.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert!(signal.is_empty());
    }

    /// A listener removing itself while the signal is emitted.
    #[test]
    fn listener_disconnects_itself_during_emit() {
        let signal = Signal::<()>::new();
        let slot = Rc::new(RefCell::new(None));
        let count = Rc::new(RefCell::new(0));

        let listener = {
            let slot = slot.clone();
            let count = count.clone();
            signal.connect(move |_| {
                *count.borrow_mut() += 1;
                slot.borrow_mut().take();
            })
        };
        *slot.borrow_mut() = Some(listener);

        signal.emit(&());
        signal.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert!(signal.is_empty());
    }

    /// Listeners connected during an emission are not invoked by that emission.
    #[test]
    fn listener_connected_during_emit_waits_for_next_emit() {
        let signal = Rc::new(Signal::<()>::new());
        let late = Rc::new(RefCell::new(Vec::new()));
        let count = Rc::new(RefCell::new(0));

        let _first = {
            let weak = Rc::downgrade(&signal);
            let late = late.clone();
            let count = count.clone();

            signal.connect(move |_| {
                let Some(signal) = weak.upgrade() else { return };

                if late.borrow().is_empty() {
                    let count = count.clone();
                    let listener = signal.connect(move |_| *count.borrow_mut() += 1);
                    late.borrow_mut().push(listener);
                }
            })
        };

        signal.emit(&());
        assert_eq!(*count.borrow(), 0);
        assert_eq!(late.borrow().len(), 1);

        signal.emit(&());
        assert_eq!(*count.borrow(), 1);
    }

    /// Removing another, not yet invoked, listener prevents it from being called.
    #[test]
    fn listener_disconnects_sibling_during_emit() {
        let signal = Signal::<()>::new();
        let victims = Rc::new(RefCell::new(Vec::new()));
        let count = Rc::new(RefCell::new(0));

        let first = {
            let victims = victims.clone();
            let count = count.clone();
            signal.connect(move |_| {
                *count.borrow_mut() += 1;
                victims.borrow_mut().clear();
            })
        };
        let second = {
            let victims = victims.clone();
            let count = count.clone();
            signal.connect(move |_| {
                *count.borrow_mut() += 1;
                victims.borrow_mut().clear();
            })
        };
        victims.borrow_mut().push(first);
        victims.borrow_mut().push(second);

        signal.emit(&());

        // Whichever ran first removed the other.
        assert_eq!(*count.borrow(), 1);
        assert!(signal.is_empty());
    }

    #[test]
    fn listener_outlives_signal() {
        let signal = Signal::<()>::new();
        let listener = signal.connect(|_| {});
        assert!(listener.is_connected());

        drop(signal);
        assert!(!listener.is_connected());
        drop(listener);
    }
}
