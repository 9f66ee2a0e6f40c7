//! Append-only request log.

use std::sync::{Arc, Mutex};

use crate::http::request::{RecordedRequest, RequestFilter, SharedRequest};

/// Append-only log of every request that reached the engine.
///
/// Recording happens before body decoding; the returned handle is the same
/// object the pipeline mutates, so decoded fields become visible through
/// the log.
pub(crate) struct RequestRecorder {
    log: Mutex<Vec<SharedRequest>>,
}

impl RequestRecorder {
    pub(crate) fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
        }
    }

    /// Append a request and return the shared handle used downstream.
    pub(crate) fn record(&self, request: RecordedRequest) -> SharedRequest {
        let shared = Arc::new(Mutex::new(request));
        self.log
            .lock()
            .expect("request log mutex poisoned")
            .push(Arc::clone(&shared));
        shared
    }

    /// Snapshot the entries accepted by the filter, in arrival order.
    pub(crate) fn snapshot(&self, filter: &RequestFilter) -> Vec<RecordedRequest> {
        self.log
            .lock()
            .expect("request log mutex poisoned")
            .iter()
            .filter_map(|entry| {
                let request = entry.lock().expect("recorded request mutex poisoned");
                filter.accepts(&request).then(|| request.clone())
            })
            .collect()
    }

    /// Empty the log.
    pub(crate) fn clear(&self) {
        self.log.lock().expect("request log mutex poisoned").clear();
    }
}
