//! Single-threaded event emitter
//!
//! The broker runs entirely on the host editor's extension thread, so the
//! listener list is `Rc<RefCell<..>>` owned state with no locking. Each
//! `subscribe` hands back a [`Subscription`] that detaches the listener on
//! `dispose()` or drop.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// A registered listener that can be detached.
///
/// Dropping the handle detaches the listener as well, so consumers keep
/// the handle alive for as long as they want to receive events.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a detach action. Host implementations of
    /// [`crate::host::CommandHost`] use this to tie command
    /// unregistration to the returned handle.
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A subscription that detaches nothing. Used for listeners that were
    /// rejected (e.g. registered on a disposed facade).
    pub fn noop() -> Self {
        Self { detach: None }
    }

    /// Detach the listener. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

type Listener<T> = Rc<dyn Fn(&T)>;

/// Fan-out point for one event type.
pub struct Emitter<T> {
    listeners: Rc<RefCell<Vec<(u64, Listener<T>)>>>,
    next_id: Cell<u64>,
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Register a listener. The returned subscription detaches it.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));

        let listeners: Weak<RefCell<Vec<(u64, Listener<T>)>>> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Emit `value` to every listener, in subscription order.
    ///
    /// The listener list is snapshotted first so a listener that
    /// subscribes or detaches re-entrantly does not invalidate iteration.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(value);
        }
    }

    /// Detach every listener at once. Used on facade disposal.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_listeners_in_subscription_order() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let seen = Rc::clone(&seen);
            emitter.subscribe(move |value| seen.borrow_mut().push(("first", *value)))
        };
        let second = {
            let seen = Rc::clone(&seen);
            emitter.subscribe(move |value| seen.borrow_mut().push(("second", *value)))
        };

        emitter.emit(&7);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);

        drop(first);
        drop(second);
    }

    #[test]
    fn test_dispose_detaches_listener() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Rc::new(Cell::new(0));

        let mut subscription = {
            let seen = Rc::clone(&seen);
            emitter.subscribe(move |value| seen.set(seen.get() + *value))
        };
        emitter.emit(&1);
        subscription.dispose();
        subscription.dispose(); // idempotent
        emitter.emit(&1);

        assert_eq!(seen.get(), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_drop_detaches_listener() {
        let emitter: Emitter<u32> = Emitter::new();
        {
            let _subscription = emitter.subscribe(|_| {});
            assert_eq!(emitter.listener_count(), 1);
        }
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_clear_detaches_everything() {
        let emitter: Emitter<u32> = Emitter::new();
        let _first = emitter.subscribe(|_| {});
        let _second = emitter.subscribe(|_| {});
        emitter.clear();
        assert_eq!(emitter.listener_count(), 0);
    }
}
