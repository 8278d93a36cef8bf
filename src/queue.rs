//! Async task contract for deferred rendition generation.
//!
//! Long-running work (variation generation for large images) can be handed
//! off to an external queue instead of running inline. The contract is
//! fire-and-forget: [`TaskQueue::enqueue`] returns nothing and the core
//! never awaits a result. Callers that need synchronous guarantees simply
//! don't configure a queue.
//!
//! The original blob write always completes before anything is enqueued;
//! every rendition task reads the original.

use std::sync::Mutex;

/// Fire-and-forget task hand-off.
pub trait TaskQueue: Sync {
    /// Enqueue `operation` for the resource stored at `resource_path`,
    /// covering the named variations.
    fn enqueue(&self, operation: &str, resource_path: &str, variations: &[String]);
}

/// One recorded enqueue call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTask {
    pub operation: String,
    pub resource_path: String,
    pub variations: Vec<String>,
}

/// Queue that records tasks without running anything. The reference
/// implementation for tests and for hosts that drain tasks themselves.
#[derive(Default)]
pub struct RecordingQueue {
    tasks: Mutex<Vec<QueuedTask>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> Vec<QueuedTask> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }
}

impl TaskQueue for RecordingQueue {
    fn enqueue(&self, operation: &str, resource_path: &str, variations: &[String]) {
        self.tasks.lock().unwrap().push(QueuedTask {
            operation: operation.to_string(),
            resource_path: resource_path.to_string(),
            variations: variations.to_vec(),
        });
    }
}
