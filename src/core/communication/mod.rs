// Communication module - Transport contract, wire messages and the event bridge
pub mod bridge;
pub mod message;
pub mod transport;

pub use bridge::{BridgeHandle, EventBridge, EventSink, EventStream};
pub use message::{Command, Event};
pub use transport::{LineSink, SessionId, Transport, TransportEvent, TransportOpener};
