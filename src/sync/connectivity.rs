//! Connectivity observation
//!
//! The orchestrator never talks to the environment's network signals
//! directly; it consumes a [`ConnectivityPort`] so tests can simulate going
//! on- and offline deterministically. [`ConnectivityWatcher`] is the
//! concrete implementation: hosts feed it transitions (netlink events, a
//! probe loop, a browser bridge) via [`ConnectivityWatcher::set_online`] and
//! subscribers are notified of each change.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Injected view of the environment's connectivity signal
pub trait ConnectivityPort: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Callbacks invoked on connectivity transitions
pub struct SyncListener {
    pub on_online: Box<dyn Fn() + Send + Sync>,
    pub on_offline: Box<dyn Fn() + Send + Sync>,
}

/// Handle returned by `subscribe`; pass back to `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Connectivity state with a set of independent subscribers
///
/// A panic inside one subscriber's callback is caught and logged so the
/// remaining subscribers are still notified.
pub struct ConnectivityWatcher {
    online: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Arc<SyncListener>>>,
}

impl ConnectivityWatcher {
    pub fn new(initially_online: bool) -> Self {
        Self {
            online: AtomicBool::new(initially_online),
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Register a listener; returns its subscription handle
    pub fn subscribe(&self, listener: SyncListener) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .insert(id, Arc::new(listener));
        SubscriptionId(id)
    }

    /// Remove a previously registered listener
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .remove(&id.0);
    }

    /// Record a connectivity transition and notify subscribers
    ///
    /// Notification only fires on an actual change of state.
    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return;
        }

        if online {
            tracing::info!("connectivity restored");
        } else {
            tracing::info!("connectivity lost, cached data will be used");
        }

        let listeners: Vec<Arc<SyncListener>> = {
            let guard = self.listeners.lock().expect("listener registry poisoned");
            guard.values().cloned().collect()
        };

        for listener in listeners {
            let callback = if online {
                &listener.on_online
            } else {
                &listener.on_offline
            };
            if catch_unwind(AssertUnwindSafe(callback)).is_err() {
                tracing::error!("connectivity listener panicked");
            }
        }
    }
}

impl ConnectivityPort for ConnectivityWatcher {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Port that always reports the same status; useful for tests and for
/// environments without a connectivity signal
pub struct StaticConnectivity(pub bool);

impl ConnectivityPort for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(counter: Arc<AtomicUsize>) -> SyncListener {
        let on = Arc::clone(&counter);
        let off = counter;
        SyncListener {
            on_online: Box::new(move || {
                on.fetch_add(1, Ordering::SeqCst);
            }),
            on_offline: Box::new(move || {
                off.fetch_add(100, Ordering::SeqCst);
            }),
        }
    }

    #[test]
    fn test_notifies_on_transition_only() {
        let watcher = ConnectivityWatcher::new(true);
        let count = Arc::new(AtomicUsize::new(0));
        watcher.subscribe(counting_listener(Arc::clone(&count)));

        watcher.set_online(true); // no transition
        assert_eq!(count.load(Ordering::SeqCst), 0);

        watcher.set_online(false);
        assert_eq!(count.load(Ordering::SeqCst), 100);
        assert!(!watcher.is_online());

        watcher.set_online(true);
        assert_eq!(count.load(Ordering::SeqCst), 101);
        assert!(watcher.is_online());
    }

    #[test]
    fn test_multiple_subscribers() {
        let watcher = ConnectivityWatcher::new(false);
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        watcher.subscribe(counting_listener(Arc::clone(&a)));
        watcher.subscribe(counting_listener(Arc::clone(&b)));

        watcher.set_online(true);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let watcher = ConnectivityWatcher::new(false);
        let count = Arc::new(AtomicUsize::new(0));
        let id = watcher.subscribe(counting_listener(Arc::clone(&count)));

        watcher.unsubscribe(id);
        watcher.set_online(true);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_starve_others() {
        let watcher = ConnectivityWatcher::new(false);
        watcher.subscribe(SyncListener {
            on_online: Box::new(|| panic!("listener bug")),
            on_offline: Box::new(|| {}),
        });
        let count = Arc::new(AtomicUsize::new(0));
        watcher.subscribe(counting_listener(Arc::clone(&count)));

        watcher.set_online(true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
