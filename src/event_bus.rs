//! Named pub/sub event bus (C1).
//!
//! The façade (`facade::Viewer`) and the orchestrator communicate with an
//! embedding host exclusively through named topics on an `EventBus`
//! rather than a module-level global, per the constructor-threaded
//! reference pattern adopted for this crate (see DESIGN.md).

use std::panic::{self, AssertUnwindSafe};

use rustc_hash::FxHashMap;

/// Opaque identity of a registered listener, returned by [`EventBus::on`]
/// and accepted by [`EventBus::off`] for targeted removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Any value an event carries, boxed so the bus can stay non-generic.
pub type EventPayload = Box<dyn std::any::Any>;

type Listener = Box<dyn FnMut(&EventPayload)>;

struct Entry {
    id: ListenerId,
    callback: Listener,
}

/// Ordered, named-topic pub/sub bus with panic-isolated dispatch.
///
/// Listeners for a given event name run in registration order. A listener
/// that panics is caught at the dispatch boundary and logged; the
/// remaining listeners for that event still run (spec §7 item 7).
#[derive(Default)]
pub struct EventBus {
    topics: FxHashMap<String, Vec<Entry>>,
    next_id: u64,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener on `event`. Returns an id usable with
    /// [`EventBus::off`] to remove this specific listener.
    pub fn on(
        &mut self,
        event: impl Into<String>,
        callback: impl FnMut(&EventPayload) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.topics
            .entry(event.into())
            .or_default()
            .push(Entry {
                id,
                callback: Box::new(callback),
            });
        id
    }

    /// Remove a single listener by the id returned from [`EventBus::on`].
    /// Returns `true` if a listener was removed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        for entries in self.topics.values_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    /// Remove every listener registered for `event`. Returns the number
    /// of listeners removed.
    pub fn off_event(&mut self, event: &str) -> usize {
        self.topics.remove(event).map_or(0, |v| v.len())
    }

    /// Dispatch `payload` to every listener registered for `event`, in
    /// registration order. A panicking listener is caught and logged;
    /// dispatch continues with the remaining listeners.
    pub fn emit(&mut self, event: &str, payload: EventPayload) {
        let Some(entries) = self.topics.get_mut(event) else {
            return;
        };

        for entry in entries.iter_mut() {
            let callback = AssertUnwindSafe(&mut entry.callback);
            let payload_ref = &payload;
            let result = panic::catch_unwind(move || {
                (callback.0)(payload_ref);
            });
            if let Err(panic_payload) = result {
                let message = panic_message(&panic_payload);
                log::error!("event listener for \"{event}\" panicked: {message}");
            }
        }
    }

    /// Number of listeners currently registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.topics.get(event).map_or(0, Vec::len)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_fire_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let o1 = order.clone();
        bus.on("tick", move |_| o1.borrow_mut().push(1));
        let o2 = order.clone();
        bus.on("tick", move |_| o2.borrow_mut().push(2));

        bus.emit("tick", Box::new(()));

        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn off_removes_only_the_targeted_listener() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let o1 = order.clone();
        let id1 = bus.on("tick", move |_| o1.borrow_mut().push(1));
        let o2 = order.clone();
        bus.on("tick", move |_| o2.borrow_mut().push(2));

        bus.off(id1);
        bus.emit("tick", Box::new(()));

        assert_eq!(*order.borrow(), vec![2]);
    }

    #[test]
    fn off_event_clears_every_listener_for_that_topic() {
        let mut bus = EventBus::new();
        bus.on("tick", |_| {});
        bus.on("tick", |_| {});
        assert_eq!(bus.off_event("tick"), 2);
        assert_eq!(bus.listener_count("tick"), 0);
    }

    #[test]
    fn emit_to_unknown_event_is_a_silent_no_op() {
        let mut bus = EventBus::new();
        bus.emit("nothing-subscribes-to-this", Box::new(()));
    }

    #[test]
    fn a_panicking_listener_does_not_prevent_later_listeners_from_running() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        bus.on("tick", |_| panic!("boom"));
        let o = order.clone();
        bus.on("tick", move |_| o.borrow_mut().push("survived"));

        bus.emit("tick", Box::new(()));

        assert_eq!(*order.borrow(), vec!["survived"]);
    }
}
