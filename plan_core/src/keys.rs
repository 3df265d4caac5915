use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Keyboard surface the grid reacts to, already decoded from the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Enter,
    F2,
    Delete,
    Backspace,
    Escape,
    Char(char),
    Copy,
    Paste,
    ToggleHelp,
    /// Focus left the grid (click-away)
    Blur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<RefCell<dyn FnMut(GridKey) -> bool>>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

/// Single-threaded key listener registry.
///
/// Listeners live exactly as long as the [`KeySubscription`] returned by
/// [`KeyBus::subscribe`]; dropping the guard deregisters the listener.
#[derive(Clone, Default)]
pub struct KeyBus {
    inner: Rc<RefCell<BusInner>>,
}

impl KeyBus {
    pub fn new() -> Self {
        KeyBus::default()
    }

    pub fn subscribe(&self, listener: impl FnMut(GridKey) -> bool + 'static) -> KeySubscription {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        let listener: Listener = Rc::new(RefCell::new(listener));
        inner.listeners.push((id, listener));
        log::debug!("key listener {id:?} registered");

        KeySubscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Deliver a key to every live listener. Returns whether any of them
    /// handled it. Listeners may subscribe or unsubscribe while handling.
    pub fn dispatch(&self, key: GridKey) -> bool {
        let listeners: Vec<(ListenerId, Listener)> = self.inner.borrow().listeners.clone();
        let mut handled = false;
        for (id, listener) in listeners {
            // skip listeners removed by an earlier one during this dispatch
            let live = self.inner.borrow().listeners.iter().any(|(l, _)| *l == id);
            if !live {
                continue;
            }
            if let Ok(mut f) = listener.try_borrow_mut() {
                handled |= (&mut *f)(key);
            }
        }
        handled
    }
}

/// Registration guard; the listener is removed when this is dropped
#[must_use = "dropping the subscription removes the listener immediately"]
pub struct KeySubscription {
    id: ListenerId,
    bus: Weak<RefCell<BusInner>>,
}

impl KeySubscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
            log::debug!("key listener {:?} removed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_reaches_listener() {
        let bus = KeyBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = bus.subscribe(move |key| {
            sink.borrow_mut().push(key);
            true
        });

        assert!(bus.dispatch(GridKey::Down));
        assert!(bus.dispatch(GridKey::Char('x')));
        assert_eq!(*seen.borrow(), vec![GridKey::Down, GridKey::Char('x')]);
    }

    #[test]
    fn test_drop_removes_listener() {
        let bus = KeyBus::new();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let sub = bus.subscribe(move |_| {
            *c.borrow_mut() += 1;
            true
        });
        bus.dispatch(GridKey::Up);
        drop(sub);

        assert_eq!(bus.listener_count(), 0);
        assert!(!bus.dispatch(GridKey::Up));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe_during_dispatch() {
        let bus = KeyBus::new();
        let slot: Rc<RefCell<Option<KeySubscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(RefCell::new(0));

        let s = slot.clone();
        let first = bus.subscribe(move |_| {
            drop(s.borrow_mut().take());
            true
        });
        let h = hits.clone();
        *slot.borrow_mut() = Some(bus.subscribe(move |_| {
            *h.borrow_mut() += 1;
            true
        }));

        assert!(bus.dispatch(GridKey::Enter));
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(bus.listener_count(), 1);
        drop(first);
    }

    #[test]
    fn test_subscription_outliving_bus() {
        let bus = KeyBus::new();
        let sub = bus.subscribe(|_| true);
        drop(bus);
        drop(sub);
    }
}
