//! Per-unit event subscription registry.
//!
//! Architecture:
//! - One callback per event name; subscribe() replaces, unsubscribe() clears
//! - Callbacks carry their bound context (the host's `this`), captured at subscribe()
//! - fire() invokes synchronously on the caller's thread and reports a missing
//!   binding as `AdError::MissingSubscriber` instead of failing
//!
//! Each `AdUnit` owns its own registry; there is no process-wide state, so
//! independent units can run side by side (one per test, one per thread).
//!
//! Insertion order is kept so control binding walks subscriptions in the order
//! the host made them. Unsubscribed names stay as keys mapped to `None`.
//!
//! Keys are canonical: `Custom("AdSizeChange")` and `SizeChange` are one entry.

use crate::core::error::AdError;
use crate::entities::{AdEvent, EventArgs};
use indexmap::IndexMap;
use log::trace;
use std::fmt;
use std::sync::Arc;

/// Type-erased callback with its context already bound
pub type Callback = Arc<dyn Fn(&EventArgs) + Send + Sync>;

#[derive(Default)]
pub struct EventRegistry {
    bindings: IndexMap<AdEvent, Option<Callback>>,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("subscribed", &self.subscribed().map(|e| e.as_str()).collect::<Vec<_>>())
            .field("keys", &self.bindings.len())
            .finish()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self { bindings: IndexMap::new() }
    }

    /// Bind `callback` to `context` and store it under `event`, replacing any
    /// previous binding.
    ///
    /// # Example
    /// ```ignore
    /// let seen = Arc::new(AtomicUsize::new(0));
    /// registry.subscribe(|seen: &Arc<AtomicUsize>, _args| {
    ///     seen.fetch_add(1, Ordering::SeqCst);
    /// }, AdEvent::Loaded, Arc::clone(&seen));
    /// ```
    pub fn subscribe<C, F>(&mut self, callback: F, event: AdEvent, context: C)
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &EventArgs) + Send + Sync + 'static,
    {
        trace!("subscribe({})", event);
        let bound: Callback = Arc::new(move |args: &EventArgs| callback(&context, args));
        self.bindings.insert(event.canonical(), Some(bound));
    }

    /// Clear the binding for `event`. Unknown or already-cleared names are a no-op.
    pub fn unsubscribe(&mut self, event: &AdEvent) {
        trace!("unsubscribe({})", event);
        if let Some(slot) = self.bindings.get_mut(&key(event)) {
            *slot = None;
        }
    }

    pub fn is_subscribed(&self, event: &AdEvent) -> bool {
        matches!(self.bindings.get(&key(event)), Some(Some(_)))
    }

    /// Whether `event` was ever subscribed, bound or not.
    pub fn contains_key(&self, event: &AdEvent) -> bool {
        self.bindings.contains_key(&key(event))
    }

    /// Invoke the callback for `event` with `args`.
    pub fn fire(&self, event: &AdEvent, args: &EventArgs) -> Result<(), AdError> {
        match self.bindings.get(&key(event)) {
            Some(Some(cb)) => {
                trace!("fire({}{})", event, args);
                cb(args);
                Ok(())
            }
            _ => Err(AdError::MissingSubscriber { event: event.clone() }),
        }
    }

    /// Currently bound events, in subscription order.
    pub fn subscribed(&self) -> impl Iterator<Item = &AdEvent> {
        self.bindings
            .iter()
            .filter(|(_, cb)| cb.is_some())
            .map(|(event, _)| event)
    }

    pub fn len(&self) -> usize {
        self.subscribed().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(event: &AdEvent) -> AdEvent {
    event.clone().canonical()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn counter_cb(counter: &Arc<AtomicUsize>, _args: &EventArgs) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_subscribe_fire_immediate() {
        let mut registry = EventRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.subscribe(counter_cb, AdEvent::Started, Arc::clone(&counter));

        registry.fire(&AdEvent::Started, &EventArgs::None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        registry.fire(&AdEvent::Started, &EventArgs::None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fire_unsubscribed_reports_missing() {
        let registry = EventRegistry::new();
        let err = registry.fire(&AdEvent::Paused, &EventArgs::None).unwrap_err();
        assert_eq!(err, AdError::MissingSubscriber { event: AdEvent::Paused });
    }

    #[test]
    fn test_subscribe_replaces_previous() {
        let mut registry = EventRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        registry.subscribe(counter_cb, AdEvent::Stopped, Arc::clone(&first));
        registry.subscribe(counter_cb, AdEvent::Stopped, Arc::clone(&second));

        registry.fire(&AdEvent::Stopped, &EventArgs::None).unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unsubscribe_keeps_key_absent() {
        let mut registry = EventRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.subscribe(counter_cb, AdEvent::Playing, Arc::clone(&counter));
        registry.unsubscribe(&AdEvent::Playing);
        assert!(!registry.is_subscribed(&AdEvent::Playing));
        assert!(registry.contains_key(&AdEvent::Playing));

        // Second unsubscribe and unknown names are harmless
        registry.unsubscribe(&AdEvent::Playing);
        registry.unsubscribe(&AdEvent::Custom("never".into()));
        assert!(!registry.contains_key(&AdEvent::Custom("never".into())));

        assert!(registry.fire(&AdEvent::Playing, &EventArgs::None).is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_context_is_bound() {
        let mut registry = EventRegistry::new();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe(
            |ctx: &(String, Arc<Mutex<Vec<String>>>), args| {
                ctx.1.lock().unwrap().push(format!("{}{}", ctx.0, args));
            },
            AdEvent::Error,
            ("player-a".to_string(), Arc::clone(&seen)),
        );

        registry
            .fire(&AdEvent::Error, &EventArgs::Error { message: "boom".into() })
            .unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), ["player-a(boom)"]);
    }

    #[test]
    fn test_custom_names_accepted() {
        let mut registry = EventRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let custom = AdEvent::from("VendorHeartbeat");

        registry.subscribe(counter_cb, custom.clone(), Arc::clone(&counter));
        registry.fire(&custom, &EventArgs::None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_protocol_name_spelled_as_custom_shares_key() {
        let mut registry = EventRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.subscribe(counter_cb, AdEvent::Custom("AdSizeChange".into()), Arc::clone(&counter));
        assert!(registry.is_subscribed(&AdEvent::SizeChange));
        registry.fire(&AdEvent::SizeChange, &EventArgs::None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        registry.unsubscribe(&AdEvent::Custom("AdSizeChange".into()));
        assert!(!registry.is_subscribed(&AdEvent::SizeChange));
        assert_eq!(registry.subscribed().count(), 0);
    }

    #[test]
    fn test_subscription_order_kept() {
        let mut registry = EventRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for event in [AdEvent::Error, AdEvent::Loaded, AdEvent::Impression] {
            registry.subscribe(counter_cb, event, Arc::clone(&counter));
        }
        registry.unsubscribe(&AdEvent::Loaded);

        let order: Vec<_> = registry.subscribed().cloned().collect();
        assert_eq!(order, vec![AdEvent::Error, AdEvent::Impression]);
    }
}
