//! Debug listeners.
//!
//! A queue can fan out human-readable trace messages to any number of
//! registered [`DebugListener`]s: one per put, take, uncached get and remove,
//! plus one per bucket-count change or bin-width change. When no listener is
//! registered the messages are never formatted.
//!
//! ```
//! use std::sync::Arc;
//!
//! use calqueue::comparator::F64Comparator;
//! use calqueue::debug::{DebugListener, RecorderListener};
//! use calqueue::queue::CalendarQueue;
//!
//! let recorder = Arc::new(RecorderListener::new());
//! let mut queue = CalendarQueue::new(F64Comparator::new());
//! queue.add_debug_listener(recorder.clone());
//!
//! queue.put(1.5);
//! queue.take().unwrap();
//!
//! assert_eq!(
//!     recorder.messages(),
//!     vec!["+++ putting in queue: 1.5", "--- taking from queue: 1.5"]
//! );
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

/// Receiver of queue trace messages.
///
/// Listeners only ever see the formatted text, never the queue.
pub trait DebugListener: Send + Sync {
    /// Handles one message.
    fn message(&self, message: &str);
}

/// Ordered set of listeners, unique by pointer identity.
#[derive(Default, Clone)]
pub struct DebugListeners {
    listeners: Vec<Arc<dyn DebugListener>>,
}

impl DebugListeners {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`. Returns `false` if it was already registered.
    pub fn add(&mut self, listener: Arc<dyn DebugListener>) -> bool {
        if self.position(&listener).is_some() {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Unregisters `listener`. Returns `false` if it was not registered.
    pub fn remove(&mut self, listener: &Arc<dyn DebugListener>) -> bool {
        match self.position(listener) {
            Some(idx) => {
                self.listeners.remove(idx);
                true
            },
            None => false,
        }
    }

    fn position(&self, listener: &Arc<dyn DebugListener>) -> Option<usize> {
        self.listeners
            .iter()
            .position(|l| std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)))
    }

    /// Returns `true` if at least one listener is registered.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Number of registered listeners.
    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if no listener is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Formats `args` once and hands it to every listener in registration
    /// order.
    pub fn notify(&self, args: fmt::Arguments<'_>) {
        if self.listeners.is_empty() {
            return;
        }
        let message = args.to_string();
        for listener in &self.listeners {
            listener.message(&message);
        }
    }
}

impl fmt::Debug for DebugListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// Listener that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecorderListener {
    messages: Mutex<Vec<String>>,
}

impl RecorderListener {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the messages received so far.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drops all recorded messages.
    pub fn clear(&self) {
        match self.messages.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl DebugListener for RecorderListener {
    fn message(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(message.to_owned()),
            Err(poisoned) => poisoned.into_inner().push(message.to_owned()),
        }
    }
}

/// Listener that forwards messages as `tracing` debug events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl DebugListener for TracingListener {
    fn message(&self, message: &str) {
        tracing::debug!(target: "calqueue::debug", "{}", message);
    }
}
