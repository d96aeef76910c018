use crate::cli::args::{Args, Command as CliCommand, ConfigCommand, ConnectArgs};
use crate::cli::input::{parse_input, InputAction, INPUT_HELP};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::communication::{BridgeHandle, Command, Event, EventBridge, EventStream};
use crate::core::session::ConnectionState;
use crate::domain::config::ReplComConfig;
use crate::domain::error::{ReplComError, ReplComResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::{DeviceEnumerator, SerialPortEnumerator, SerialTransportOpener};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Execute CLI command
pub async fn execute_command(args: Args) -> ReplComResult<()> {
    let writer = ConsoleWriter::new(args.output);

    let config_manager = ConfigManager::new();
    let config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };

    if !args.quiet {
        init_logging(&config.global.log_level, args.verbose);
    }

    match args.command {
        CliCommand::Devices => {
            let enumerator = SerialPortEnumerator::new(config.discovery.clone());
            let devices = enumerator.list_devices().await?;
            writer.write_devices(&devices)?;
            Ok(())
        }
        CliCommand::Connect(connect_args) => run_session(connect_args, &config, &writer).await,
        CliCommand::Config(config_args) => match config_args.command {
            ConfigCommand::Show => {
                writer.write_config(&config)?;
                Ok(())
            }
            ConfigCommand::Init { path } => {
                let dir = match path {
                    Some(path) => PathBuf::from(path),
                    None => std::env::current_dir()?,
                };
                let written = config_manager.init_project_config(&dir)?;
                writer.write_message(&format!("Created {}", written.display()))?;
                Ok(())
            }
        },
        CliCommand::Version => {
            writer.write_message(&format!("replcom {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

/// Interactive session: stdin lines go to the device, events go to stdout
async fn run_session(
    args: ConnectArgs,
    config: &ReplComConfig,
    writer: &ConsoleWriter,
) -> ReplComResult<()> {
    let (bridge, task) = EventBridge::spawn(
        Arc::new(SerialTransportOpener),
        Arc::new(SerialPortEnumerator::new(config.discovery.clone())),
        config.global.event_capacity,
    );
    let mut events = bridge.subscribe();

    let state = connect_and_confirm(&bridge, &mut events, &args.device, writer).await?;
    if !state.is_connected() {
        drop(bridge);
        let _ = task.await;
        return Err(ReplComError::Transport {
            message: format!("Could not connect to '{}'", args.device),
        });
    }
    writer.write_status(&state)?;
    writer.write_message(INPUT_HELP)?;

    if args.repl {
        bridge.send(Command::EnterRepl)?;
    }

    let mut lines = spawn_stdin_reader();
    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => match parse_input(&line) {
                    InputAction::Forward(command) => bridge.send(command)?,
                    InputAction::Quit => break,
                    InputAction::Unknown(directive) => {
                        writer.write_error(&format!("Unknown directive ':{}' ({})", directive, INPUT_HELP))?;
                    }
                },
                None => break,
            },
            event = events.recv() => match event {
                Some(event) => writer.write_event(&event)?,
                None => break,
            },
        }
    }

    if let Err(e) = bridge.send(Command::DisconnectDevice) {
        warn!("Failed to request disconnect: {}", e);
    }
    drop(bridge);
    task.await.map_err(|e| ReplComError::Transport {
        message: format!("Session task failed: {}", e),
    })?;
    Ok(())
}

/// Read stdin on a dedicated thread; a pending blocking read must not hold up shutdown
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (sender, receiver) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

/// Request a connect and wait for the status reply that follows it.
///
/// Connect failures are only logged by the session task, so the status
/// reply is what tells the caller whether the device opened.
async fn connect_and_confirm(
    bridge: &BridgeHandle,
    events: &mut EventStream,
    device: &str,
    writer: &ConsoleWriter,
) -> ReplComResult<ConnectionState> {
    bridge.send(Command::ConnectDevice(device.to_string()))?;
    bridge.send(Command::CheckConnected)?;

    while let Some(event) = events.recv().await {
        match event {
            Event::CheckConnected(state) => return Ok(state),
            other => {
                debug!("Event before connect confirmation: {}", other);
                writer.write_event(&other)?;
            }
        }
    }

    Err(ReplComError::Transport {
        message: "Session task stopped before confirming the connection".to_string(),
    })
}
