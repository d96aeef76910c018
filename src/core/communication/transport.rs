use crate::domain::{config::LinkSettings, error::ReplComResult};
use tokio::sync::mpsc;

/// Identifier of one connect/disconnect cycle
pub type SessionId = String;

/// Push notification produced by an open transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A complete line, delimiter stripped
    Line { session_id: SessionId, line: String },
    /// The transport can no longer read or write
    Failed { session_id: SessionId, message: String },
}

impl TransportEvent {
    pub fn session_id(&self) -> &str {
        match self {
            TransportEvent::Line { session_id, .. } => session_id,
            TransportEvent::Failed { session_id, .. } => session_id,
        }
    }
}

/// Handle a transport uses to push events back to its owner.
///
/// Every event is tagged with the session that opened the transport so the
/// owner can drop stragglers from a transport it already closed.
#[derive(Debug, Clone)]
pub struct LineSink {
    session_id: SessionId,
    sender: mpsc::UnboundedSender<TransportEvent>,
}

impl LineSink {
    pub fn new(session_id: SessionId, sender: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self { session_id, sender }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns false once the owner has gone away.
    pub fn line(&self, line: String) -> bool {
        self.sender
            .send(TransportEvent::Line {
                session_id: self.session_id.clone(),
                line,
            })
            .is_ok()
    }

    pub fn failed(&self, message: String) -> bool {
        self.sender
            .send(TransportEvent::Failed {
                session_id: self.session_id.clone(),
                message,
            })
            .is_ok()
    }
}

/// An open, exclusively owned byte pipe to one device.
///
/// Both methods return without waiting on the device: writes are queued and
/// performed in call order, close signals the background workers and returns.
pub trait Transport: Send {
    /// Queue one write. Each call reaches the device as a separate write.
    fn write(&self, data: Vec<u8>) -> ReplComResult<()>;

    /// Release the device. Writes queued before the call are still flushed.
    fn close(self: Box<Self>);
}

/// Factory for transports, injected into the session manager
pub trait TransportOpener: Send + Sync {
    fn open(
        &self,
        device_path: &str,
        settings: &LinkSettings,
        sink: LineSink,
    ) -> ReplComResult<Box<dyn Transport>>;
}
