use crate::core::communication::{
    message::{Command, Event},
    transport::{TransportEvent, TransportOpener},
};
use crate::core::session::SessionManager;
use crate::domain::error::{ReplComError, ReplComResult};
use crate::infrastructure::serial::discovery::DeviceEnumerator;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Publishing side of the event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: broadcast::Sender<Event>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Deliver an event to every current observer, returning how many received it
    pub fn emit(&self, event: Event) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(observers) => observers,
            Err(_) => {
                debug!("No observers for '{}' event", name);
                0
            }
        }
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }

    #[cfg(test)]
    pub(crate) fn subscribe_raw(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// One observer's view of the event channel, starting at the moment it subscribed
pub struct EventStream {
    receiver: broadcast::Receiver<Event>,
}

impl EventStream {
    /// Next event, or `None` once the bridge has shut down.
    ///
    /// An observer that falls behind loses the oldest events and keeps going.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Observer lagged behind, {} events dropped", missed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Cloneable observer handle: send commands, subscribe to events
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: EventSink,
}

impl BridgeHandle {
    /// Queue a command. Commands from one handle are applied in send order.
    pub fn send(&self, command: Command) -> ReplComResult<()> {
        self.commands.send(command).map_err(|e| ReplComError::Transport {
            message: format!("Session task has stopped, '{}' not delivered", e.0),
        })
    }

    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }
}

/// Runs the session manager on its own task and connects it to observers
pub struct EventBridge;

impl EventBridge {
    /// Spawn the owner task.
    ///
    /// The task runs until every [`BridgeHandle`] is dropped, then closes any
    /// open session.
    pub fn spawn(
        opener: Arc<dyn TransportOpener>,
        enumerator: Arc<dyn DeviceEnumerator>,
        event_capacity: usize,
    ) -> (BridgeHandle, JoinHandle<()>) {
        let events = EventSink::new(event_capacity);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();

        let manager = SessionManager::new(opener, enumerator, events.clone(), transport_tx);
        let task = tokio::spawn(run(manager, command_rx, transport_rx));

        let handle = BridgeHandle {
            commands: command_tx,
            events,
        };
        (handle, task)
    }
}

async fn run(
    mut manager: SessionManager,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut transport_events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    info!("Session task started");
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => {
                    let name = command.name();
                    if let Err(e) = manager.dispatch(command) {
                        warn!("Command '{}' failed: {}", name, e);
                    }
                }
                None => break,
            },
            Some(event) = transport_events.recv() => manager.handle_transport_event(event),
        }
    }
    manager.disconnect();
    info!("Session task stopped");
}
