//! Observer lists and subscriptions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub(crate) type Slot<T> = Arc<Mutex<T>>;

struct ObserverList<T: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Slot<T>)>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Callbacks notified in subscription order.
pub(crate) struct Observers<T: ?Sized> {
    list: Arc<Mutex<ObserverList<T>>>,
}

impl<T: ?Sized + Send + 'static> Observers<T> {
    pub fn new() -> Self {
        Self {
            list: Arc::new(Mutex::new(ObserverList {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, slot: Slot<T>) -> Subscription {
        let id = {
            let mut list = lock(&self.list);
            let id = list.next_id;
            list.next_id += 1;
            list.entries.push((id, slot));
            id
        };

        let list: Weak<Mutex<ObserverList<T>>> = Arc::downgrade(&self.list);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(list) = list.upgrade() {
                    lock(&list).entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Calls `f` with every callback, in subscription order.
    ///
    /// The list lock is released first, so callbacks may unsubscribe.
    pub fn notify(&self, mut f: impl FnMut(&mut T)) {
        let slots: Vec<Slot<T>> = lock(&self.list)
            .entries
            .iter()
            .map(|(_, slot)| Arc::clone(slot))
            .collect();
        for slot in slots {
            f(&mut *lock(&slot));
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.list).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a callback subscribed until dropped or
/// [`unsubscribe`](Self::unsubscribe)d.
#[must_use = "dropping a subscription unsubscribes it"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Removes the callback.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
