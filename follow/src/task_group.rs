use std::future::Future;
use tokio::task::JoinHandle;

/// Tracks spawned tasks so they can be awaited or abandoned together.
pub struct TaskGroup {
    handles: Vec<JoinHandle<()>>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    pub fn spawn<F>(&mut self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.push(tokio::spawn(fut));
    }

    /// Forget tasks that already finished.
    pub fn reap(&mut self) {
        self.handles.retain(|h| !h.is_finished());
    }

    /// Number of tasks not yet reaped.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every task to finish on its own.
    pub async fn join(mut self) {
        for h in self.handles.drain(..) {
            let _ = h.await;
        }
    }

    /// Abort every task and wait for the aborts to land.
    pub async fn shutdown(mut self) {
        for h in &self.handles {
            h.abort();
        }
        for h in self.handles.drain(..) {
            let _ = h.await;
        }
    }
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskGroup {
    fn drop(&mut self) {
        for h in &self.handles {
            h.abort();
        }
    }
}
