use std::collections::HashMap;

/// Session-scoped command handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionHandler {
    SendCommand,
    EnterRepl,
    ExitRepl,
    CheckConnected,
}

impl SessionHandler {
    /// Handlers every session registers on connect
    pub const ALL: [SessionHandler; 4] = [
        SessionHandler::SendCommand,
        SessionHandler::EnterRepl,
        SessionHandler::ExitRepl,
        SessionHandler::CheckConnected,
    ];

    /// Command name the handler answers to
    pub fn command_name(&self) -> &'static str {
        match self {
            SessionHandler::SendCommand => "send-command",
            SessionHandler::EnterRepl => "enter-repl",
            SessionHandler::ExitRepl => "exit-repl",
            SessionHandler::CheckConnected => "check-connected",
        }
    }
}

/// Mapping from command name to the handler serving it
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, SessionHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a handler for the same command was already registered
    pub fn register(&mut self, handler: SessionHandler) -> bool {
        self.handlers.insert(handler.command_name(), handler).is_none()
    }

    pub fn deregister(&mut self, command_name: &str) -> Option<SessionHandler> {
        self.handlers.remove(command_name)
    }

    pub fn resolve(&self, command_name: &str) -> Option<SessionHandler> {
        self.handlers.get(command_name).copied()
    }

    /// Registered command names, sorted
    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
