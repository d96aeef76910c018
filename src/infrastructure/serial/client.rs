use crate::core::communication::transport::{LineSink, Transport, TransportOpener};
use crate::domain::{
    config::LinkSettings,
    error::{ReplComError, ReplComResult},
};
use crate::infrastructure::serial::line_parser::LineParser;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Serial port transport backed by two worker threads.
///
/// The writer drains a FIFO queue so writes reach the port in call order. The
/// reader polls with the link read timeout and pushes parsed lines to the sink.
/// Each thread owns one handle on the port, and the port lock is held until
/// both have exited.
pub struct SerialTransport {
    device_path: String,
    tx_sender: mpsc::UnboundedSender<Vec<u8>>,
    stop: Arc<AtomicBool>,
    tx_handle: JoinHandle<()>,
    rx_handle: JoinHandle<()>,
}

impl SerialTransport {
    pub fn open(device_path: &str, settings: &LinkSettings, sink: LineSink) -> ReplComResult<Self> {
        let port = serialport::new(device_path, settings.baud_rate)
            .data_bits(settings.data_bits)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits)
            .flow_control(settings.flow_control)
            .timeout(settings.read_timeout)
            .open()?;
        let reader = port.try_clone()?;

        info!("Serial port '{}' opened at {} baud", device_path, settings.baud_rate);

        let (tx_sender, tx_receiver) = mpsc::unbounded_channel::<Vec<u8>>();
        let stop = Arc::new(AtomicBool::new(false));

        let tx_sink = sink.clone();
        let tx_handle = std::thread::Builder::new()
            .name(format!("replcom-tx-{}", sink.session_id()))
            .spawn(move || write_loop(port, tx_receiver, tx_sink))?;

        let rx_stop = Arc::clone(&stop);
        let rx_handle = std::thread::Builder::new()
            .name(format!("replcom-rx-{}", sink.session_id()))
            .spawn(move || read_loop(reader, rx_stop, sink))?;

        Ok(Self {
            device_path: device_path.to_string(),
            tx_sender,
            stop,
            tx_handle,
            rx_handle,
        })
    }
}

fn join_worker(handle: JoinHandle<()>, device_path: &str) {
    let name = handle.thread().name().unwrap_or("serial worker").to_string();
    if handle.join().is_err() {
        warn!("{} for '{}' panicked", name, device_path);
    }
}

impl Transport for SerialTransport {
    fn write(&self, data: Vec<u8>) -> ReplComResult<()> {
        self.tx_sender.send(data).map_err(|e| ReplComError::Transport {
            message: format!("Serial writer for '{}' has stopped: {}", self.device_path, e),
        })
    }

    /// Flush queued writes, stop both workers and wait until the port is released.
    ///
    /// Returns after at most the queued writes plus one read timeout.
    fn close(self: Box<Self>) {
        let SerialTransport {
            device_path,
            tx_sender,
            stop,
            tx_handle,
            rx_handle,
        } = *self;

        stop.store(true, Ordering::SeqCst);
        drop(tx_sender);
        join_worker(tx_handle, &device_path);
        join_worker(rx_handle, &device_path);
        info!("Serial port '{}' closed", device_path);
    }
}

fn write_loop(
    mut port: Box<dyn SerialPort>,
    mut tx_receiver: mpsc::UnboundedReceiver<Vec<u8>>,
    sink: LineSink,
) {
    while let Some(data) = tx_receiver.blocking_recv() {
        match port.write_all(&data).and_then(|_| port.flush()) {
            Ok(()) => debug!("Sent {} bytes over serial", data.len()),
            Err(e) => {
                warn!("Failed to write to serial port: {}", e);
                sink.failed(format!("write failed: {}", e));
            }
        }
    }
    debug!("Serial writer for session '{}' exited", sink.session_id());
}

fn read_loop(mut reader: Box<dyn SerialPort>, stop: Arc<AtomicBool>, sink: LineSink) {
    let mut parser = LineParser::new();
    let mut buffer = vec![0u8; 1024];

    while !stop.load(Ordering::SeqCst) {
        match reader.read(&mut buffer) {
            Ok(0) => continue,
            Ok(n) => {
                debug!("Received {} bytes over serial", n);
                for line in parser.push(&buffer[..n]) {
                    if !sink.line(line) {
                        return;
                    }
                }
            }
            Err(ref e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {
                continue;
            }
            Err(e) => {
                if !stop.load(Ordering::SeqCst) {
                    error!("Failed to read from serial port: {}", e);
                    sink.failed(format!("read failed: {}", e));
                }
                break;
            }
        }
    }
    debug!("Serial reader for session '{}' exited", sink.session_id());
}

/// Opens real serial ports
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialTransportOpener;

impl TransportOpener for SerialTransportOpener {
    fn open(
        &self,
        device_path: &str,
        settings: &LinkSettings,
        sink: LineSink,
    ) -> ReplComResult<Box<dyn Transport>> {
        let transport = SerialTransport::open(device_path, settings, sink)?;
        Ok(Box::new(transport))
    }
}
