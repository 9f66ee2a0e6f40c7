//! Ordered handler registry.

use std::sync::{Arc, Mutex};

use crate::http::request::RecordedRequest;
use crate::routing::handler::Handler;

/// Ordered collection of registered handlers, newest first.
///
/// At most one handler executes per request: the first stored handler whose
/// criteria accept the request wins, and later handlers are not evaluated.
pub(crate) struct HandlerRegistry {
    handlers: Mutex<Vec<Arc<Handler>>>,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Apply registration-time defaults and prepend the handler, so newer
    /// registrations shadow older ones with equal criteria.
    pub(crate) fn register(&self, handler: Handler) {
        let handler = handler.normalize();
        tracing::debug!(handler = ?handler, "handler registered");

        let mut handlers = self.handlers.lock().expect("handler registry mutex poisoned");
        handlers.insert(0, Arc::new(handler));
    }

    /// Return the first handler matching the request, if any.
    pub(crate) fn find_match(&self, request: &RecordedRequest) -> Option<Arc<Handler>> {
        let handlers = self.handlers.lock().expect("handler registry mutex poisoned");
        handlers.iter().find(|h| h.matches(request)).cloned()
    }

    /// Drop every registered handler.
    pub(crate) fn clear(&self) {
        self.handlers
            .lock()
            .expect("handler registry mutex poisoned")
            .clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handlers.lock().expect("handler registry mutex poisoned").len()
    }
}
