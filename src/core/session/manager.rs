use crate::core::communication::{
    bridge::EventSink,
    message::{Command, Event},
    transport::{TransportEvent, TransportOpener},
};
use crate::core::session::{registry::SessionHandler, session::Session, state::ConnectionState};
use crate::domain::{
    config::LinkSettings,
    error::{ReplComError, ReplComResult},
};
use crate::infrastructure::serial::{
    discovery::{format_device_list, DeviceEnumerator},
    line_parser::LINE_DELIMITER,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Interrupt byte, leaves the running program and enters the REPL
pub const ENTER_REPL_BYTE: u8 = 0x03;
/// End-of-transmission byte, leaves the REPL
pub const EXIT_REPL_BYTE: u8 = 0x04;
/// Sent after each control byte to complete the handshake
pub const HANDSHAKE_SUFFIX: &[u8] = b"a\r\n";

/// Owner of the single serial session.
///
/// All operations return as soon as their effect is issued. Writes while
/// disconnected and a second connect while connected are no-ops.
pub struct SessionManager {
    opener: Arc<dyn TransportOpener>,
    enumerator: Arc<dyn DeviceEnumerator>,
    settings: LinkSettings,
    session: Option<Session>,
    events: EventSink,
    transport_events: mpsc::UnboundedSender<TransportEvent>,
}

impl SessionManager {
    /// Create a disconnected manager.
    ///
    /// Transports opened by the manager push their events into
    /// `transport_events`; the owner feeds them back through
    /// [`SessionManager::handle_transport_event`].
    pub fn new(
        opener: Arc<dyn TransportOpener>,
        enumerator: Arc<dyn DeviceEnumerator>,
        events: EventSink,
        transport_events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            opener,
            enumerator,
            settings: LinkSettings::FIXED,
            session: None,
            events,
            transport_events,
        }
    }

    /// Open a session on `device_path` unless one is already open
    pub fn connect(&mut self, device_path: &str) -> ReplComResult<()> {
        if device_path.trim().is_empty() {
            return Err(ReplComError::InvalidInput(
                "Device path must not be empty".to_string(),
            ));
        }

        if let Some(session) = &self.session {
            debug!(
                "Already connected to '{}', ignoring connect to '{}'",
                session.device_name(),
                device_path
            );
            return Ok(());
        }

        let session = Session::open(
            device_path,
            self.opener.as_ref(),
            &self.settings,
            self.transport_events.clone(),
        )
        .map_err(|e| {
            warn!("Failed to connect to '{}': {}", device_path, e);
            e
        })?;

        info!("Connected to '{}' (session '{}')", device_path, session.id());
        self.session = Some(session);
        Ok(())
    }

    /// Close the open session, if any
    pub fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            debug!("Disconnect requested while disconnected");
            return;
        };

        let device_name = session.device_name().to_string();
        let removed = session.close();
        info!(
            "Disconnected from '{}', deregistered {:?}",
            device_name, removed
        );
    }

    /// Send one line of text, terminated with `\r\n`
    pub fn send_message(&self, text: &str) {
        let mut data = Vec::with_capacity(text.len() + LINE_DELIMITER.len());
        data.extend_from_slice(text.as_bytes());
        data.extend_from_slice(LINE_DELIMITER);
        self.write(data);
    }

    /// Switch the device into its REPL
    pub fn enter_repl(&self) {
        self.handshake(ENTER_REPL_BYTE);
    }

    /// Switch the device back to command mode
    pub fn exit_repl(&self) {
        self.handshake(EXIT_REPL_BYTE);
    }

    pub fn query_status(&self) -> ConnectionState {
        self.session
            .as_ref()
            .map(|session| session.state().clone())
            .unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Handlers registered by the open session, sorted; empty when disconnected
    pub fn registered_commands(&self) -> Vec<&'static str> {
        self.session
            .as_ref()
            .map(|session| session.registry().command_names())
            .unwrap_or_default()
    }

    /// Route one inbound command.
    ///
    /// Session commands only run through a handler registered by the open
    /// session; without one they do nothing.
    pub fn dispatch(&mut self, command: Command) -> ReplComResult<()> {
        debug!("Dispatching '{}'", command);
        match command {
            Command::ConnectDevice(device_path) => self.connect(&device_path),
            Command::DisconnectDevice => {
                self.disconnect();
                Ok(())
            }
            Command::GetUsbDevices => {
                self.request_devices();
                Ok(())
            }
            command => {
                let handler = self
                    .session
                    .as_ref()
                    .and_then(|session| session.registry().resolve(command.name()));

                match (handler, command) {
                    (Some(SessionHandler::SendCommand), Command::SendCommand(text)) => {
                        self.send_message(&text)
                    }
                    (Some(SessionHandler::EnterRepl), Command::EnterRepl) => self.enter_repl(),
                    (Some(SessionHandler::ExitRepl), Command::ExitRepl) => self.exit_repl(),
                    (Some(SessionHandler::CheckConnected), Command::CheckConnected) => {
                        self.report_status()
                    }
                    // Disconnected is a state too, so status requests are always answered.
                    (_, Command::CheckConnected) => {
                        debug!("Answering status request without a session");
                        self.report_status()
                    }
                    (_, command) => debug!("No handler registered for '{}'", command),
                }
                Ok(())
            }
        }
    }

    /// Accept one notification pushed by a transport
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        let Some(session) = &self.session else {
            debug!("Dropping transport event while disconnected");
            return;
        };
        if session.id() != event.session_id() {
            debug!("Dropping event from closed session '{}'", event.session_id());
            return;
        }

        match event {
            TransportEvent::Line { line, .. } => {
                self.events.emit(Event::TerminalData(line));
            }
            TransportEvent::Failed { message, .. } => {
                error!("Transport for '{}' failed: {}", session.device_name(), message);
            }
        }
    }

    fn report_status(&self) {
        self.events.emit(Event::CheckConnected(self.query_status()));
    }

    /// Enumerate devices off the owner task and publish the result
    fn request_devices(&self) {
        let enumerator = Arc::clone(&self.enumerator);
        let events = self.events.clone();
        tokio::spawn(async move {
            match enumerator.list_devices().await {
                Ok(devices) => {
                    events.emit(Event::SendUsbDevices(format_device_list(&devices)));
                }
                Err(e) => error!("Failed to list USB devices: {}", e),
            }
        });
    }

    fn handshake(&self, control: u8) {
        if self.session.is_none() {
            debug!("Ignoring REPL handshake while disconnected");
            return;
        }
        self.write(vec![control]);
        self.write(HANDSHAKE_SUFFIX.to_vec());
    }

    fn write(&self, data: Vec<u8>) {
        let Some(session) = &self.session else {
            debug!("Ignoring write of {} bytes while disconnected", data.len());
            return;
        };
        if let Err(e) = session.write(data) {
            warn!("Write to '{}' failed: {}", session.device_name(), e);
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("SessionManager dropped while connected, closing session");
            self.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::communication::transport::{LineSink, Transport};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::SystemTime;
    use tokio::sync::broadcast;

    #[derive(Default)]
    struct Recorder {
        writes: Mutex<Vec<Vec<u8>>>,
        sinks: Mutex<Vec<LineSink>>,
        opened: Mutex<Vec<String>>,
        closed: Mutex<usize>,
    }

    struct MockTransport {
        recorder: Arc<Recorder>,
    }

    impl Transport for MockTransport {
        fn write(&self, data: Vec<u8>) -> ReplComResult<()> {
            self.recorder.writes.lock().unwrap().push(data);
            Ok(())
        }

        fn close(self: Box<Self>) {
            *self.recorder.closed.lock().unwrap() += 1;
        }
    }

    struct MockOpener {
        recorder: Arc<Recorder>,
    }

    impl TransportOpener for MockOpener {
        fn open(
            &self,
            device_path: &str,
            settings: &LinkSettings,
            sink: LineSink,
        ) -> ReplComResult<Box<dyn Transport>> {
            assert_eq!(settings.baud_rate, 9600);
            if device_path.contains("missing") {
                return Err(ReplComError::Serial(serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    "no such device",
                )));
            }
            self.recorder.opened.lock().unwrap().push(device_path.to_string());
            self.recorder.sinks.lock().unwrap().push(sink);
            Ok(Box::new(MockTransport {
                recorder: Arc::clone(&self.recorder),
            }))
        }
    }

    struct FixedEnumerator(Vec<String>);

    #[async_trait]
    impl DeviceEnumerator for FixedEnumerator {
        async fn list_devices(&self) -> ReplComResult<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct Harness {
        manager: SessionManager,
        recorder: Arc<Recorder>,
        events: broadcast::Receiver<Event>,
        transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    }

    fn harness() -> Harness {
        let recorder = Arc::new(Recorder::default());
        let sink = EventSink::new(16);
        let events = sink.subscribe_raw();
        let (transport_tx, transport_events) = mpsc::unbounded_channel();
        let manager = SessionManager::new(
            Arc::new(MockOpener {
                recorder: Arc::clone(&recorder),
            }),
            Arc::new(FixedEnumerator(vec![
                "/dev/ttyACM0".to_string(),
                "/dev/ttyACM1".to_string(),
            ])),
            sink,
            transport_tx,
        );
        Harness {
            manager,
            recorder,
            events,
            transport_events,
        }
    }

    fn writes(recorder: &Recorder) -> Vec<Vec<u8>> {
        recorder.writes.lock().unwrap().clone()
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let h = harness();
        assert_eq!(h.manager.query_status(), ConnectionState::Disconnected);
        assert!(h.manager.registered_commands().is_empty());
    }

    #[test]
    fn test_connect_opens_session() {
        let mut h = harness();
        let before = SystemTime::now();
        h.manager.connect("/dev/ttyX").unwrap();
        let after = SystemTime::now();

        match h.manager.query_status() {
            ConnectionState::Connected {
                device_name,
                connected_at,
            } => {
                assert_eq!(device_name, "/dev/ttyX");
                assert!(connected_at >= before && connected_at <= after);
            }
            ConnectionState::Disconnected => panic!("expected connected state"),
        }
        assert_eq!(
            h.manager.registered_commands(),
            vec!["check-connected", "enter-repl", "exit-repl", "send-command"]
        );
    }

    #[test]
    fn test_connect_while_connected_keeps_original_device() {
        let mut h = harness();
        h.manager.connect("/dev/ttyA").unwrap();
        h.manager.connect("/dev/ttyB").unwrap();
        h.manager.connect("/dev/ttyA").unwrap();

        assert_eq!(h.manager.query_status().device_name(), Some("/dev/ttyA"));
        assert_eq!(*h.recorder.opened.lock().unwrap(), vec!["/dev/ttyA"]);
    }

    #[test]
    fn test_connect_rejects_empty_path() {
        let mut h = harness();
        let result = h.manager.connect("  ");
        assert!(matches!(result, Err(ReplComError::InvalidInput(_))));
        assert!(h.recorder.opened.lock().unwrap().is_empty());
        assert!(!h.manager.is_connected());
    }

    #[test]
    fn test_failed_open_leaves_nothing_behind() {
        let mut h = harness();
        let result = h.manager.connect("/dev/missing0");

        assert!(result.unwrap_err().is_resource_error());
        assert_eq!(h.manager.query_status(), ConnectionState::Disconnected);
        assert!(h.manager.registered_commands().is_empty());

        // the manager is still usable afterwards
        h.manager.connect("/dev/ttyACM0").unwrap();
        assert!(h.manager.is_connected());
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();
        h.manager.disconnect();
        h.manager.disconnect();

        assert_eq!(h.manager.query_status(), ConnectionState::Disconnected);
        assert_eq!(*h.recorder.closed.lock().unwrap(), 1);
        assert!(h.manager.registered_commands().is_empty());
    }

    #[test]
    fn test_send_message_appends_delimiter() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();
        h.manager.send_message("PING");

        assert_eq!(writes(&h.recorder), vec![b"PING\r\n".to_vec()]);
    }

    #[test]
    fn test_repl_handshakes_are_two_ordered_writes() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();

        h.manager.enter_repl();
        assert_eq!(writes(&h.recorder), vec![vec![0x03], b"a\r\n".to_vec()]);

        h.recorder.writes.lock().unwrap().clear();
        h.manager.exit_repl();
        assert_eq!(writes(&h.recorder), vec![vec![0x04], b"a\r\n".to_vec()]);
    }

    #[test]
    fn test_writes_while_disconnected_are_noops() {
        let mut h = harness();
        h.manager.send_message("PING");
        h.manager.enter_repl();
        h.manager.exit_repl();
        h.manager.disconnect();

        assert!(writes(&h.recorder).is_empty());
        assert_eq!(h.manager.query_status(), ConnectionState::Disconnected);
        assert_eq!(*h.recorder.closed.lock().unwrap(), 0);
    }

    #[test]
    fn test_session_commands_after_disconnect_do_not_write() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();
        h.manager.disconnect();

        h.manager.dispatch(Command::SendCommand("PING".to_string())).unwrap();
        h.manager.dispatch(Command::EnterRepl).unwrap();
        h.manager.dispatch(Command::ExitRepl).unwrap();

        assert!(writes(&h.recorder).is_empty());
    }

    #[test]
    fn test_dispatch_routes_session_commands() {
        let mut h = harness();
        h.manager
            .dispatch(Command::ConnectDevice("/dev/ttyX".to_string()))
            .unwrap();
        h.manager.dispatch(Command::SendCommand("ls".to_string())).unwrap();
        h.manager.dispatch(Command::EnterRepl).unwrap();

        assert_eq!(
            writes(&h.recorder),
            vec![b"ls\r\n".to_vec(), vec![0x03], b"a\r\n".to_vec()]
        );

        h.manager.dispatch(Command::DisconnectDevice).unwrap();
        assert!(!h.manager.is_connected());
    }

    #[test]
    fn test_check_connected_reports_state() {
        let mut h = harness();
        h.manager.dispatch(Command::CheckConnected).unwrap();
        assert_eq!(
            h.events.try_recv().unwrap(),
            Event::CheckConnected(ConnectionState::Disconnected)
        );

        h.manager.connect("/dev/ttyX").unwrap();
        h.manager.dispatch(Command::CheckConnected).unwrap();
        match h.events.try_recv().unwrap() {
            Event::CheckConnected(state) => assert_eq!(state.device_name(), Some("/dev/ttyX")),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_status_handler_follows_session_lifetime() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();
        assert!(h.manager.registered_commands().contains(&"check-connected"));

        h.manager.disconnect();
        assert!(!h.manager.registered_commands().contains(&"check-connected"));
        h.manager.dispatch(Command::CheckConnected).unwrap();
        assert_eq!(
            h.events.try_recv().unwrap(),
            Event::CheckConnected(ConnectionState::Disconnected)
        );
    }

    #[test]
    fn test_lines_are_forwarded_in_order() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();
        let sink = h.recorder.sinks.lock().unwrap()[0].clone();

        sink.line("hello".to_string());
        sink.line("world".to_string());
        while let Ok(event) = h.transport_events.try_recv() {
            h.manager.handle_transport_event(event);
        }

        assert_eq!(h.events.try_recv().unwrap(), Event::TerminalData("hello".to_string()));
        assert_eq!(h.events.try_recv().unwrap(), Event::TerminalData("world".to_string()));
        assert!(h.events.try_recv().is_err());
    }

    #[test]
    fn test_lines_from_closed_session_are_dropped() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();
        let stale = h.recorder.sinks.lock().unwrap()[0].clone();
        h.manager.disconnect();
        h.manager.connect("/dev/ttyX").unwrap();

        stale.line("late".to_string());
        let event = h.transport_events.try_recv().unwrap();
        h.manager.handle_transport_event(event);

        assert!(h.events.try_recv().is_err());
    }

    #[test]
    fn test_transport_failure_is_not_a_transition() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();
        let sink = h.recorder.sinks.lock().unwrap()[0].clone();

        sink.failed("unplugged".to_string());
        let event = h.transport_events.try_recv().unwrap();
        h.manager.handle_transport_event(event);

        assert!(h.manager.is_connected());
        assert!(h.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_get_usb_devices_replies_with_list() {
        let mut h = harness();
        h.manager.dispatch(Command::GetUsbDevices).unwrap();

        let event = h.events.recv().await.unwrap();
        assert_eq!(
            event,
            Event::SendUsbDevices("/dev/ttyACM0\n/dev/ttyACM1".to_string())
        );
    }

    #[test]
    fn test_drop_closes_open_session() {
        let mut h = harness();
        h.manager.connect("/dev/ttyX").unwrap();
        let recorder = Arc::clone(&h.recorder);
        drop(h);

        assert_eq!(*recorder.closed.lock().unwrap(), 1);
    }
}
