// Shutdown signalling for background loops

use tokio::sync::watch;

/// Held by background tasks; resolves once shutdown is requested
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes immediately if shutdown was already requested
    pub async fn wait(&mut self) {
        // Sender dropped also counts as shutdown
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Held by the composition root
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
