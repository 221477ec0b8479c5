//! Identity collaborator.
//!
//! Sign-in itself happens elsewhere. This module only tracks the current
//! principal and fans auth events out to subscribers. Events are queued and
//! delivered when the owner calls [`SessionHub::dispatch_pending`], so
//! callbacks never run inside the publisher's call stack.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock, Weak};

use tokio::sync::mpsc;
use tracing::debug;

/// The authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub email_confirmed: bool,
}

/// Change in authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Principal),
    SignedOut,
    EmailConfirmed,
}

type Callback = Arc<dyn Fn(&AuthEvent) + Send + Sync>;
type Registry = Mutex<BTreeMap<u64, Callback>>;

/// Holds the current principal and the subscriber list.
pub struct SessionHub {
    current: RwLock<Option<Principal>>,
    subscribers: Arc<Registry>,
    next_id: Mutex<u64>,
    sender: mpsc::UnboundedSender<AuthEvent>,
    receiver: Mutex<mpsc::UnboundedReceiver<AuthEvent>>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            current: RwLock::new(None),
            subscribers: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Mutex::new(0),
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// The signed-in principal, if any.
    pub fn current(&self) -> Option<Principal> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Queue an event for the next dispatch.
    pub fn publish(&self, event: AuthEvent) {
        // The receiver lives as long as `self`, so sending cannot fail here.
        let _ = self.sender.send(event);
    }

    /// Register a callback. It stays registered until the returned handle is
    /// cancelled or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
            *next += 1;
            *next
        };
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(callback));
        debug!(subscription = id, "auth subscriber registered");

        Subscription {
            id,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Apply and deliver every queued event, in publish order.
    ///
    /// Returns the number of events delivered.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        loop {
            let event = {
                let mut receiver = self.receiver.lock().unwrap_or_else(|e| e.into_inner());
                match receiver.try_recv() {
                    Ok(event) => event,
                    Err(_) => break,
                }
            };

            self.apply(&event);

            // Snapshot so callbacks may subscribe or cancel without deadlocking.
            let callbacks: Vec<Callback> = self
                .subscribers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .values()
                .cloned()
                .collect();
            for callback in callbacks {
                callback(&event);
            }
            delivered += 1;
        }
        delivered
    }

    fn apply(&self, event: &AuthEvent) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        match event {
            AuthEvent::SignedIn(principal) => *current = Some(principal.clone()),
            AuthEvent::SignedOut => *current = None,
            AuthEvent::EmailConfirmed => {
                if let Some(principal) = current.as_mut() {
                    principal.email_confirmed = true;
                }
            }
        }
    }
}

/// Cancellation handle returned by [`SessionHub::subscribe`].
#[must_use = "dropping a subscription unregisters it"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Unregister the callback.
    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&self.id);
            debug!(subscription = self.id, "auth subscriber removed");
        }
    }
}
