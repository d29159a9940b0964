//! Shutdown Signaler.
//!
//! A shutdown request travels over a `watch` channel into the dashboard's
//! run loop instead of as a signal to the whole process. [`ShutdownHandle::stop`]
//! returns immediately; the host observes actual termination when the serve
//! future completes.

use std::sync::Arc;

use tokio::sync::watch;

/// Create a connected handle/listener pair.
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownListener) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx: Arc::new(tx) }, ShutdownListener { rx })
}

/// Requests shutdown. Cheap to clone; every clone drives the same listeners.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Request a graceful shutdown.
    ///
    /// Fire-and-forget: does not wait, never fails. Calling it again, or
    /// before anything is serving, is a no-op beyond the first request.
    pub fn stop(&self) {
        let first = self.tx.send_if_modified(|requested| !std::mem::replace(requested, true));
        if first {
            tracing::info!("Shutdown requested");
        }
    }

    /// Whether a shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// New listener observing this handle.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener { rx: self.tx.subscribe() }
    }
}

/// Observes shutdown requests.
#[derive(Clone, Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Wait until shutdown is requested.
    ///
    /// Returns immediately if it already was. If every handle is dropped
    /// without a request this never returns: nothing can ask for shutdown
    /// any more.
    pub async fn wait(&mut self) {
        let closed = self.rx.wait_for(|requested| *requested).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }

    /// Whether a shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn stop_wakes_listener() {
        let (handle, mut listener) = shutdown_channel();

        let waiter = tokio::spawn(async move { listener.wait().await });
        handle.stop();

        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(handle.is_requested());
    }

    #[tokio::test]
    async fn stop_before_wait_is_not_lost() {
        let (handle, mut listener) = shutdown_channel();
        handle.stop();

        tokio::time::timeout(Duration::from_secs(1), listener.wait()).await.unwrap();
    }

    #[tokio::test]
    async fn repeated_stop_notifies_once() {
        let (handle, listener) = shutdown_channel();
        let mut rx = listener.rx.clone();

        handle.stop();
        handle.stop();
        handle.stop();

        rx.changed().await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn stop_without_listeners_is_fine() {
        let (handle, listener) = shutdown_channel();
        drop(listener);

        handle.stop();

        assert!(handle.is_requested());
        assert!(handle.listener().is_requested());
    }
}
