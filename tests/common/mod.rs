#![allow(dead_code)]

use async_trait::async_trait;
use replcom::{
    DeviceEnumerator, LineSink, LinkSettings, ReplComError, ReplComResult, Transport,
    TransportOpener,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Everything the mock transports observed
#[derive(Default)]
pub struct Recorder {
    pub writes: Mutex<Vec<Vec<u8>>>,
    pub sinks: Mutex<Vec<LineSink>>,
    pub opened: Mutex<Vec<String>>,
    pub closed: Mutex<usize>,
    failing_writes: AtomicUsize,
}

impl Recorder {
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closed(&self) -> usize {
        *self.closed.lock().unwrap()
    }

    /// Make the next `count` writes fail without being recorded
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Sink of the most recently opened transport
    pub fn last_sink(&self) -> LineSink {
        self.sinks.lock().unwrap().last().cloned().expect("no transport opened")
    }
}

struct MockTransport {
    recorder: Arc<Recorder>,
}

impl Transport for MockTransport {
    fn write(&self, data: Vec<u8>) -> ReplComResult<()> {
        let failing = self
            .recorder
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ReplComError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device stopped accepting data",
            )));
        }
        self.recorder.writes.lock().unwrap().push(data);
        Ok(())
    }

    fn close(self: Box<Self>) {
        *self.recorder.closed.lock().unwrap() += 1;
    }
}

/// Opens mock transports; any path containing "busy" fails like a port in use
pub struct MockOpener {
    pub recorder: Arc<Recorder>,
}

impl TransportOpener for MockOpener {
    fn open(
        &self,
        device_path: &str,
        _settings: &LinkSettings,
        sink: LineSink,
    ) -> ReplComResult<Box<dyn Transport>> {
        if device_path.contains("busy") {
            return Err(ReplComError::Serial(serialport::Error::new(
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied),
                "port is already in use",
            )));
        }
        self.recorder.opened.lock().unwrap().push(device_path.to_string());
        self.recorder.sinks.lock().unwrap().push(sink);
        Ok(Box::new(MockTransport {
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

pub struct StaticEnumerator(pub Vec<String>);

#[async_trait]
impl DeviceEnumerator for StaticEnumerator {
    async fn list_devices(&self) -> ReplComResult<Vec<String>> {
        Ok(self.0.clone())
    }
}

pub fn mock_stack() -> (Arc<Recorder>, Arc<MockOpener>, Arc<StaticEnumerator>) {
    let recorder = Arc::new(Recorder::default());
    let opener = Arc::new(MockOpener {
        recorder: Arc::clone(&recorder),
    });
    let enumerator = Arc::new(StaticEnumerator(vec!["/dev/tty.usbmodem1101".to_string()]));
    (recorder, opener, enumerator)
}
