use crate::{
    domain::{FunctionIndex, LocoAddress, Speed},
    error::DomainError,
};

/// Address the bridge expects for a broadcast system halt.
pub const SYSTEM_HALT_ADDRESS: &str = "0x0000";

/// One POST request understood by the control server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    TogglePower,
    Stop {
        address: LocoAddress,
    },
    Emergency {
        address: Option<LocoAddress>,
    },
    SystemHalt,
    ToggleDirection {
        address: LocoAddress,
    },
    SetSpeed {
        address: LocoAddress,
        speed: Speed,
    },
    SelectAddress {
        address: LocoAddress,
    },
    SetFunction {
        address: LocoAddress,
        function: FunctionIndex,
        on: bool,
    },
}

impl ControlCommand {
    pub fn path(&self) -> &'static str {
        match self {
            Self::TogglePower => "/setPower",
            Self::Stop { .. } => "/setStop",
            Self::Emergency { .. } => "/setEmergency",
            Self::SystemHalt => "/setSystemHalt",
            Self::ToggleDirection { .. } => "/setDirection",
            Self::SetSpeed { .. } => "/setSpeed",
            Self::SelectAddress { .. } => "/setAddress",
            Self::SetFunction { .. } => "/setFunction",
        }
    }

    /// Query parameters in the order the bridge documents them.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::TogglePower => Vec::new(),
            Self::Stop { address }
            | Self::ToggleDirection { address }
            | Self::SelectAddress { address } => vec![("address", address.to_string())],
            Self::Emergency { address } => address
                .iter()
                .map(|address| ("address", address.to_string()))
                .collect(),
            Self::SystemHalt => vec![("address", SYSTEM_HALT_ADDRESS.to_string())],
            Self::SetSpeed { address, speed } => vec![
                ("address", address.to_string()),
                ("speed", speed.to_string()),
            ],
            Self::SetFunction {
                address,
                function,
                on,
            } => vec![
                ("address", address.to_string()),
                ("function", u8::from(*function).to_string()),
                ("power", if *on { "1" } else { "0" }.to_string()),
            ],
        }
    }

    pub fn address(&self) -> Option<&LocoAddress> {
        match self {
            Self::TogglePower | Self::SystemHalt => None,
            Self::Emergency { address } => address.as_ref(),
            Self::Stop { address }
            | Self::ToggleDirection { address }
            | Self::SetSpeed { address, .. }
            | Self::SelectAddress { address }
            | Self::SetFunction { address, .. } => Some(address),
        }
    }
}

/// Interprets the `/setPower` response body.
pub fn parse_power_state(body: &str) -> Result<bool, DomainError> {
    match body.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(DomainError::UnrecognizedPowerState(other.to_string())),
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
