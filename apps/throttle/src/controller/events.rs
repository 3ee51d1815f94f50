//! Line commands typed at the throttle prompt and their parsing into UI events.

use shared::{
    domain::{FunctionIndex, LocoAddress},
    error::DomainError,
};
use thiserror::Error;

pub const HELP: &str = "commands: power | select <addr> | speed <0-1000> | stop | emergency | \
halt | dir | fn <0-9> | refresh | status | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    TogglePower,
    Select(LocoAddress),
    Speed(i64),
    Stop,
    Emergency,
    Halt,
    ToggleDirection,
    ToggleFunction(FunctionIndex),
    Refresh,
    Status,
    Help,
    Quit,
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TogglePower => "toggle_power",
            Self::Select(_) => "select_locomotive",
            Self::Speed(_) => "set_speed",
            Self::Stop => "stop",
            Self::Emergency => "emergency_stop",
            Self::Halt => "system_halt",
            Self::ToggleDirection => "toggle_direction",
            Self::ToggleFunction(_) => "toggle_function",
            Self::Refresh => "refresh_display",
            Self::Status => "status",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEventError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("'{command}' needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("'{0}' is not a speed")]
    InvalidSpeed(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Parses one input line; blank lines yield `None`.
pub fn parse_event(line: &str) -> Result<Option<UiEvent>, ParseEventError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let event = match command.to_ascii_lowercase().as_str() {
        "power" | "p" => UiEvent::TogglePower,
        "select" | "sel" | "loco" => {
            let raw = argument.ok_or(ParseEventError::MissingArgument {
                command: "select",
                what: "an address",
            })?;
            UiEvent::Select(raw.parse()?)
        }
        "speed" | "v" => {
            let raw = argument.ok_or(ParseEventError::MissingArgument {
                command: "speed",
                what: "a value between 0 and 1000",
            })?;
            let value = raw
                .parse::<i64>()
                .map_err(|_| ParseEventError::InvalidSpeed(raw.to_string()))?;
            UiEvent::Speed(value)
        }
        "stop" | "s" => UiEvent::Stop,
        "emergency" | "estop" | "e" => UiEvent::Emergency,
        "halt" => UiEvent::Halt,
        "dir" | "direction" | "d" => UiEvent::ToggleDirection,
        "fn" | "f" | "function" => {
            let raw = argument.ok_or(ParseEventError::MissingArgument {
                command: "fn",
                what: "a function number between 0 and 9",
            })?;
            UiEvent::ToggleFunction(raw.parse()?)
        }
        "refresh" | "r" => UiEvent::Refresh,
        "status" => UiEvent::Status,
        "help" | "?" => UiEvent::Help,
        "quit" | "exit" | "q" => UiEvent::Quit,
        other => return Err(ParseEventError::Unknown(other.to_string())),
    };
    Ok(Some(event))
}
