use std::future::Future;
use std::sync::Mutex;

use briefing_core::ProgressEvent;
use briefing_logging::{briefing_debug, briefing_error};
use bytes::Bytes;
use tokio::sync::mpsc::{channel, Receiver, Sender};

/// Frames held for a slow reader before `emit` waits for it.
pub const EVENT_BUFFER: usize = 16;

/// Receives progress events in emission order.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: ProgressEvent);
}

/// Frames events as `data: <json>\n\n` onto a channel feeding the response body.
///
/// The channel holds at most [`EVENT_BUFFER`] frames; past that, emitting
/// waits until the reader catches up. It is closed right after the first
/// terminal event and anything emitted later is dropped.
pub struct EventStreamEmitter {
    tx: Mutex<Option<Sender<Bytes>>>,
}

impl EventStreamEmitter {
    pub fn channel() -> (Self, Receiver<Bytes>) {
        let (tx, rx) = channel(EVENT_BUFFER);
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// True once a terminal event went out or the receiver was dropped.
    pub fn is_closed(&self) -> bool {
        self.sender().map_or(true, |tx| tx.is_closed())
    }

    /// Resolves to `true` when the receiving side goes away, or at once to
    /// `false` if the stream was already finished when this was called.
    ///
    /// The returned future keeps the channel open while it waits; drop it
    /// once the job is over so the stream can end.
    pub fn closed(&self) -> impl Future<Output = bool> + Send + 'static {
        let sender = self.sender();
        async move {
            match sender {
                Some(tx) => {
                    tx.closed().await;
                    true
                }
                None => false,
            }
        }
    }

    fn sender(&self) -> Option<Sender<Bytes>> {
        self.tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn close(&self) {
        *self
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

#[async_trait::async_trait]
impl ProgressSink for EventStreamEmitter {
    async fn emit(&self, event: ProgressEvent) {
        let Some(tx) = self.sender() else {
            briefing_debug!("Dropping event after stream close: {:?}", event);
            return;
        };

        match event.to_frame() {
            Ok(frame) => {
                if tx.send(Bytes::from(frame)).await.is_err() {
                    briefing_debug!("Caller disconnected; event not delivered");
                }
            }
            Err(err) => briefing_error!("Failed to encode progress event: {}", err),
        }

        if event.is_terminal() {
            self.close();
        }
    }
}
