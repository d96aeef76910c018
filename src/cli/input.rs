use crate::core::communication::Command;

/// What a line typed by the operator asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Forward a command to the session
    Forward(Command),
    /// Leave the interactive session
    Quit,
    /// A `:` directive that is not recognised
    Unknown(String),
}

/// Interpret one line of operator input.
///
/// Lines starting with `:` are directives, `::` escapes a literal colon,
/// anything else is sent to the device as-is.
pub fn parse_input(line: &str) -> InputAction {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(escaped) = line.strip_prefix("::") {
        return InputAction::Forward(Command::SendCommand(format!(":{}", escaped)));
    }

    let Some(directive) = line.strip_prefix(':') else {
        return InputAction::Forward(Command::SendCommand(line.to_string()));
    };

    match directive.trim() {
        "q" | "quit" => InputAction::Quit,
        "repl" => InputAction::Forward(Command::EnterRepl),
        "normal" | "exit-repl" => InputAction::Forward(Command::ExitRepl),
        "status" => InputAction::Forward(Command::CheckConnected),
        "devices" => InputAction::Forward(Command::GetUsbDevices),
        "disconnect" => InputAction::Forward(Command::DisconnectDevice),
        other => InputAction::Unknown(other.to_string()),
    }
}

/// Help text for the interactive session
pub const INPUT_HELP: &str = ":repl enter REPL, :normal leave REPL, :status, :devices, :disconnect, :quit";
