//! Command identifiers and the CAN forwarding envelope
//!
//! Byte 0 of every payload is a command id. A payload may instead start with
//! [`CommandId::ForwardCan`] and a CAN controller id, in which case the
//! controller on the UART relays the rest of the payload to that device.

/// Command ids understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandId {
    /// Firmware version query
    FwVersion,
    /// Full telemetry snapshot
    GetValues,
    /// Duty cycle setpoint
    SetDuty,
    /// Motor current setpoint
    SetCurrent,
    /// Brake current setpoint
    SetCurrentBrake,
    /// Electrical RPM setpoint
    SetRpm,
    /// Position setpoint (degrees)
    SetPos,
    /// Handbrake current
    SetHandbrake,
    /// Reboot the controller
    Reboot,
    /// Keep-alive, resets the controller's command timeout
    Alive,
    /// CAN forwarding envelope
    ForwardCan,
    /// Nunchuck (chuk) remote input
    SetChuckData,
    /// Telemetry restricted to a field mask
    GetValuesSelective,
}

// Wire format values
const COMM_FW_VERSION: u8 = 0;
const COMM_GET_VALUES: u8 = 4;
const COMM_SET_DUTY: u8 = 5;
const COMM_SET_CURRENT: u8 = 6;
const COMM_SET_CURRENT_BRAKE: u8 = 7;
const COMM_SET_RPM: u8 = 8;
const COMM_SET_POS: u8 = 9;
const COMM_SET_HANDBRAKE: u8 = 10;
const COMM_REBOOT: u8 = 29;
const COMM_ALIVE: u8 = 30;
const COMM_FORWARD_CAN: u8 = 34;
const COMM_SET_CHUCK_DATA: u8 = 35;
const COMM_GET_VALUES_SELECTIVE: u8 = 50;

impl CommandId {
    /// Parse a command id from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            COMM_FW_VERSION => Some(CommandId::FwVersion),
            COMM_GET_VALUES => Some(CommandId::GetValues),
            COMM_SET_DUTY => Some(CommandId::SetDuty),
            COMM_SET_CURRENT => Some(CommandId::SetCurrent),
            COMM_SET_CURRENT_BRAKE => Some(CommandId::SetCurrentBrake),
            COMM_SET_RPM => Some(CommandId::SetRpm),
            COMM_SET_POS => Some(CommandId::SetPos),
            COMM_SET_HANDBRAKE => Some(CommandId::SetHandbrake),
            COMM_REBOOT => Some(CommandId::Reboot),
            COMM_ALIVE => Some(CommandId::Alive),
            COMM_FORWARD_CAN => Some(CommandId::ForwardCan),
            COMM_SET_CHUCK_DATA => Some(CommandId::SetChuckData),
            COMM_GET_VALUES_SELECTIVE => Some(CommandId::GetValuesSelective),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            CommandId::FwVersion => COMM_FW_VERSION,
            CommandId::GetValues => COMM_GET_VALUES,
            CommandId::SetDuty => COMM_SET_DUTY,
            CommandId::SetCurrent => COMM_SET_CURRENT,
            CommandId::SetCurrentBrake => COMM_SET_CURRENT_BRAKE,
            CommandId::SetRpm => COMM_SET_RPM,
            CommandId::SetPos => COMM_SET_POS,
            CommandId::SetHandbrake => COMM_SET_HANDBRAKE,
            CommandId::Reboot => COMM_REBOOT,
            CommandId::Alive => COMM_ALIVE,
            CommandId::ForwardCan => COMM_FORWARD_CAN,
            CommandId::SetChuckData => COMM_SET_CHUCK_DATA,
            CommandId::GetValuesSelective => COMM_GET_VALUES_SELECTIVE,
        }
    }
}

/// Destination of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// The controller on the UART
    #[default]
    Local,
    /// A controller on the CAN bus, relayed by the local one
    Can(u8),
}

/// Split a payload into its routing target and the command it carries
///
/// A forwarding envelope without a command behind it is returned as
/// `(Target::Local, payload)` unchanged, leaving the decision to the caller.
pub fn split_envelope(payload: &[u8]) -> (Target, &[u8]) {
    match payload {
        [COMM_FORWARD_CAN, can_id, rest @ ..] if !rest.is_empty() => (Target::Can(*can_id), rest),
        _ => (Target::Local, payload),
    }
}
