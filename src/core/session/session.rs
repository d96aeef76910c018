use crate::core::communication::transport::{LineSink, SessionId, Transport, TransportEvent, TransportOpener};
use crate::core::session::{
    registry::{HandlerRegistry, SessionHandler},
    state::ConnectionState,
};
use crate::domain::{config::LinkSettings, error::ReplComResult};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// The live binding between the manager and one open transport
pub struct Session {
    id: SessionId,
    state: ConnectionState,
    transport: Box<dyn Transport>,
    registry: HandlerRegistry,
    /// Names registered at open, removed again on close
    registered: Vec<&'static str>,
}

impl Session {
    /// Open the transport, then register the session handlers.
    ///
    /// Nothing is registered unless the transport opened, so a failed open
    /// leaves nothing behind.
    pub fn open(
        device_path: &str,
        opener: &dyn TransportOpener,
        settings: &LinkSettings,
        transport_events: mpsc::UnboundedSender<TransportEvent>,
    ) -> ReplComResult<Self> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let sink = LineSink::new(id.clone(), transport_events);
        let transport = opener.open(device_path, settings, sink)?;

        let mut registry = HandlerRegistry::new();
        let mut registered = Vec::with_capacity(SessionHandler::ALL.len());
        for handler in SessionHandler::ALL {
            if registry.register(handler) {
                registered.push(handler.command_name());
            }
        }
        debug!("Session '{}' registered handlers: {:?}", id, registered);

        Ok(Self {
            id,
            state: ConnectionState::connected(device_path),
            transport,
            registry,
            registered,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn device_name(&self) -> &str {
        self.state.device_name().unwrap_or_default()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Queue one write on the transport
    pub fn write(&self, data: Vec<u8>) -> ReplComResult<()> {
        debug!("Session '{}' writing {}", self.id, hex::encode(&data));
        self.transport.write(data)
    }

    /// Deregister this session's handlers and release the transport.
    ///
    /// Returns the command names that were removed.
    pub fn close(mut self) -> Vec<&'static str> {
        let removed: Vec<&'static str> = self
            .registered
            .drain(..)
            .filter(|name| self.registry.deregister(name).is_some())
            .collect();
        debug_assert!(self.registry.is_empty());

        self.transport.close();
        info!("Session '{}' on '{}' closed", self.id, self.state.device_name().unwrap_or_default());
        removed
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
