//! Request and response payloads
//!
//! A [`Request`] encodes to a payload ready for framing, optionally wrapped
//! in the CAN forwarding envelope. [`Response::parse`] dispatches a received
//! payload on its command id.

use crate::buffer::{BufferError, BufferReader, BufferWriter};
use crate::commands::{CommandId, Target};
use crate::frame::{FrameError, Payload};
use crate::values::{SelectiveValues, Telemetry, ValuesLayout};
use heapless::{String, Vec};

/// Largest request payload, envelope included
const MAX_REQUEST_SIZE: usize = 16;

/// Longest hardware name kept from a firmware version reply
pub const HW_NAME_MAX: usize = 32;

/// Errors from building or parsing command payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Payload has no command id
    Empty,
    /// Command id is unknown or never answered
    UnknownCommand(u8),
    /// Payload ended before all fields were read
    Truncated(BufferError),
    /// Framing failed
    Frame(FrameError),
}

impl From<BufferError> for CommandError {
    fn from(e: BufferError) -> Self {
        CommandError::Truncated(e)
    }
}

impl From<FrameError> for CommandError {
    fn from(e: FrameError) -> Self {
        CommandError::Frame(e)
    }
}

/// Nunchuck remote state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChuckData {
    /// Joystick X, 127 is centered
    pub joystick_x: u8,
    /// Joystick Y, 127 is centered
    pub joystick_y: u8,
    pub lower_button: bool,
    pub upper_button: bool,
    pub acc_x: i16,
    pub acc_y: i16,
    pub acc_z: i16,
}

impl Default for ChuckData {
    fn default() -> Self {
        Self {
            joystick_x: 127,
            joystick_y: 127,
            lower_button: false,
            upper_button: false,
            acc_x: 0,
            acc_y: 0,
            acc_z: 0,
        }
    }
}

impl ChuckData {
    fn encode(&self, w: &mut BufferWriter<'_>) -> Result<(), BufferError> {
        w.append_u8(self.joystick_x)?;
        w.append_u8(self.joystick_y)?;
        w.append_bool(self.lower_button)?;
        w.append_bool(self.upper_button)?;
        w.append_i16(self.acc_x)?;
        w.append_i16(self.acc_y)?;
        w.append_i16(self.acc_z)
    }
}

/// Commands sent to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    FwVersion,
    GetValues,
    GetValuesSelective { mask: u32 },
    /// Duty cycle, -1.0 to 1.0
    SetDuty(f32),
    /// Motor current (A)
    SetCurrent(f32),
    /// Brake current (A)
    SetCurrentBrake(f32),
    /// Electrical RPM
    SetRpm(i32),
    /// Position (degrees)
    SetPos(f32),
    /// Handbrake current (A)
    SetHandbrake(f32),
    SetChuck(ChuckData),
    Alive,
    Reboot,
}

impl Request {
    /// Command id this request is sent with
    pub fn command_id(&self) -> CommandId {
        match self {
            Request::FwVersion => CommandId::FwVersion,
            Request::GetValues => CommandId::GetValues,
            Request::GetValuesSelective { .. } => CommandId::GetValuesSelective,
            Request::SetDuty(_) => CommandId::SetDuty,
            Request::SetCurrent(_) => CommandId::SetCurrent,
            Request::SetCurrentBrake(_) => CommandId::SetCurrentBrake,
            Request::SetRpm(_) => CommandId::SetRpm,
            Request::SetPos(_) => CommandId::SetPos,
            Request::SetHandbrake(_) => CommandId::SetHandbrake,
            Request::SetChuck(_) => CommandId::SetChuckData,
            Request::Alive => CommandId::Alive,
            Request::Reboot => CommandId::Reboot,
        }
    }

    /// Encode into a payload addressed to `target`
    pub fn encode(&self, target: Target) -> Result<Payload, CommandError> {
        let mut buf = [0u8; MAX_REQUEST_SIZE];
        let mut w = BufferWriter::new(&mut buf);

        if let Target::Can(can_id) = target {
            w.append_u8(CommandId::ForwardCan.to_byte())?;
            w.append_u8(can_id)?;
        }
        w.append_u8(self.command_id().to_byte())?;

        match *self {
            Request::FwVersion | Request::GetValues | Request::Alive | Request::Reboot => {}
            Request::GetValuesSelective { mask } => w.append_u32(mask)?,
            Request::SetDuty(duty) => w.append_float32(duty, 100000.0)?,
            Request::SetCurrent(amps) => w.append_float32(amps, 1000.0)?,
            Request::SetCurrentBrake(amps) => w.append_float32(amps, 1000.0)?,
            Request::SetRpm(rpm) => w.append_i32(rpm)?,
            Request::SetPos(degrees) => w.append_float32(degrees, 1000000.0)?,
            Request::SetHandbrake(amps) => w.append_float32(amps, 1000.0)?,
            Request::SetChuck(ref chuck) => chuck.encode(&mut w)?,
        }

        Vec::from_slice(w.written()).map_err(|_| CommandError::Frame(FrameError::OversizedPayload))
    }
}

/// Firmware version reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FwVersion {
    pub major: u8,
    pub minor: u8,
    /// Hardware name, empty if absent or not UTF-8
    pub hw_name: String<HW_NAME_MAX>,
}

impl FwVersion {
    /// Decode from the data following the command id
    pub fn decode(r: &mut BufferReader<'_>) -> Result<Self, BufferError> {
        let major = r.get_u8()?;
        let minor = r.get_u8()?;

        // NUL-terminated, followed by fields this crate does not use
        let rest = r.rest();
        let name = rest.split(|&b| b == 0).next().unwrap_or(&[]);
        let name = &name[..name.len().min(HW_NAME_MAX)];
        let hw_name = core::str::from_utf8(name)
            .ok()
            .and_then(|s| String::try_from(s).ok())
            .unwrap_or_default();

        Ok(Self {
            major,
            minor,
            hw_name,
        })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FwVersion {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}.{} ({})", self.major, self.minor, self.hw_name.as_str())
    }
}

/// Replies from the controller
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    FwVersion(FwVersion),
    Values(Telemetry),
    SelectiveValues(SelectiveValues),
}

impl Response {
    /// Parse a received payload
    ///
    /// `layout` selects how a `COMM_GET_VALUES` reply is read.
    pub fn parse(payload: &[u8], layout: ValuesLayout) -> Result<Self, CommandError> {
        let (&id, data) = payload.split_first().ok_or(CommandError::Empty)?;
        let mut r = BufferReader::new(data);

        match CommandId::from_byte(id) {
            Some(CommandId::FwVersion) => Ok(Response::FwVersion(FwVersion::decode(&mut r)?)),
            Some(CommandId::GetValues) => Ok(Response::Values(Telemetry::decode(&mut r, layout)?)),
            Some(CommandId::GetValuesSelective) => {
                Ok(Response::SelectiveValues(SelectiveValues::decode(&mut r)?))
            }
            _ => Err(CommandError::UnknownCommand(id)),
        }
    }

    /// Command id of this reply
    pub fn command_id(&self) -> CommandId {
        match self {
            Response::FwVersion(_) => CommandId::FwVersion,
            Response::Values(_) => CommandId::GetValues,
            Response::SelectiveValues(_) => CommandId::GetValuesSelective,
        }
    }
}
