use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryAction {
    Push,
    Pop,
}

/// One history entry. `key` is unique per push, even for repeated paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub key: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub action: HistoryAction,
    pub from: Location,
    pub to: Location,
}

type Listener = Rc<RefCell<dyn FnMut(&Transition)>>;

struct HistoryInner {
    entries: Vec<Location>,
    index: usize,
    next_key: u64,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
}

impl HistoryInner {
    fn location(&mut self, path: String) -> Location {
        let key = format!("{:06x}", self.next_key);
        self.next_key += 1;
        Location { key, path }
    }
}

/// Push/back/forward history whose listeners hear about a transition before it lands.
#[derive(Clone)]
pub struct NavigationHistory {
    inner: Rc<RefCell<HistoryInner>>,
}

impl NavigationHistory {
    pub fn new(initial_path: impl Into<String>) -> Self {
        let mut inner = HistoryInner {
            entries: Vec::new(),
            index: 0,
            next_key: 1,
            listeners: Vec::new(),
            next_listener: 1,
        };
        let first = inner.location(initial_path.into());
        inner.entries.push(first);
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn current(&self) -> Location {
        let inner = self.inner.borrow();
        inner.entries[inner.index].clone()
    }

    pub fn can_go_back(&self) -> bool {
        self.inner.borrow().index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        let inner = self.inner.borrow();
        inner.index + 1 < inner.entries.len()
    }

    pub fn push(&self, path: impl Into<String>) -> Location {
        let (from, to) = {
            let mut inner = self.inner.borrow_mut();
            let to = inner.location(path.into());
            (inner.entries[inner.index].clone(), to)
        };
        self.notify(&Transition {
            action: HistoryAction::Push,
            from,
            to: to.clone(),
        });

        let mut inner = self.inner.borrow_mut();
        let keep = inner.index + 1;
        inner.entries.truncate(keep);
        inner.entries.push(to.clone());
        inner.index = keep;
        to
    }

    pub fn back(&self) -> Option<Location> {
        self.go(-1)
    }

    pub fn forward(&self) -> Option<Location> {
        self.go(1)
    }

    fn go(&self, delta: isize) -> Option<Location> {
        let (from, to, target) = {
            let inner = self.inner.borrow();
            let target = inner.index.checked_add_signed(delta)?;
            let to = inner.entries.get(target)?.clone();
            (inner.entries[inner.index].clone(), to, target)
        };
        self.notify(&Transition {
            action: HistoryAction::Pop,
            from,
            to: to.clone(),
        });
        self.inner.borrow_mut().index = target;
        Some(to)
    }

    pub fn subscribe(&self, listener: impl FnMut(&Transition) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener;
        inner.next_listener += 1;
        let listener: Listener = Rc::new(RefCell::new(listener));
        inner.listeners.push((id, listener));
        Subscription {
            history: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn notify(&self, transition: &Transition) {
        let listeners = self.inner.borrow().listeners.clone();
        for (id, listener) in listeners {
            // A listener may have been dropped by an earlier one in this same pass.
            let registered = self
                .inner
                .borrow()
                .listeners
                .iter()
                .any(|(other, _)| *other == id);
            if !registered {
                continue;
            }
            if let Ok(mut listener) = listener.try_borrow_mut() {
                (&mut *listener)(transition);
            }
        }
    }
}

/// Keeps a history listener registered until dropped.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct Subscription {
    history: Weak<RefCell<HistoryInner>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(history) = self.history.upgrade() else {
            return;
        };
        if let Ok(mut inner) = history.try_borrow_mut() {
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
