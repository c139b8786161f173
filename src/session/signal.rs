use tokio::sync::mpsc;

/// Pending redraws held before further signals are dropped.
pub const REDRAW_CAPACITY: usize = 100;

/// Tells the render loop that something on screen changed.
///
/// Sending never blocks. When the loop is already behind by
/// [`REDRAW_CAPACITY`] signals the new one is dropped, since one pending
/// repaint covers any number of changes.
#[derive(Debug, Clone)]
pub struct RedrawSignal {
    tx: mpsc::Sender<()>,
}

impl RedrawSignal {
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(REDRAW_CAPACITY);
        (Self { tx }, rx)
    }

    pub fn notify(&self) {
        if let Err(mpsc::error::TrySendError::Closed(_)) = self.tx.try_send(()) {
            tracing::trace!("redraw receiver gone");
        }
    }
}
