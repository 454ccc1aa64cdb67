//! Telemetry records returned by `COMM_GET_VALUES` and
//! `COMM_GET_VALUES_SELECTIVE`
//!
//! Both responses share one field order, described by [`VALUE_FIELDS`]. The
//! full response carries every field; the selective response carries a
//! `u32` mask followed by only the fields whose bit is set, always in
//! ascending bit order.

use crate::buffer::{BufferError, BufferReader, BufferWriter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Telemetry fields, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueField {
    TempMosfet,
    TempMotor,
    AvgMotorCurrent,
    AvgInputCurrent,
    AvgId,
    AvgIq,
    DutyCycle,
    Rpm,
    InputVoltage,
    AmpHours,
    AmpHoursCharged,
    WattHours,
    WattHoursCharged,
    Tachometer,
    TachometerAbs,
    FaultCode,
    PidPos,
    ControllerId,
}

/// Wire encoding of one field
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldKind {
    /// Scaled value in a signed 16-bit integer
    Float16(f32),
    /// Scaled value in a signed 32-bit integer
    Float32(f32),
    Int32,
    Uint8,
}

impl FieldKind {
    /// Bytes occupied on the wire
    pub const fn width(&self) -> usize {
        match self {
            FieldKind::Float16(_) => 2,
            FieldKind::Float32(_) | FieldKind::Int32 => 4,
            FieldKind::Uint8 => 1,
        }
    }

    fn read(&self, r: &mut BufferReader<'_>) -> Result<FieldValue, BufferError> {
        Ok(match *self {
            FieldKind::Float16(scale) => FieldValue::Float(r.get_float16(scale)?),
            FieldKind::Float32(scale) => FieldValue::Float(r.get_float32(scale)?),
            FieldKind::Int32 => FieldValue::Int(r.get_i32()?),
            FieldKind::Uint8 => FieldValue::Byte(r.get_u8()?),
        })
    }

    fn write(&self, w: &mut BufferWriter<'_>, value: FieldValue) -> Result<(), BufferError> {
        match *self {
            FieldKind::Float16(scale) => w.append_float16(value.as_f32(), scale),
            FieldKind::Float32(scale) => w.append_float32(value.as_f32(), scale),
            FieldKind::Int32 => w.append_i32(value.as_i32()),
            FieldKind::Uint8 => w.append_u8(value.as_i32() as u8),
        }
    }
}

/// A decoded field value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldValue {
    Float(f32),
    Int(i32),
    Byte(u8),
}

impl FieldValue {
    fn as_f32(self) -> f32 {
        match self {
            FieldValue::Float(v) => v,
            FieldValue::Int(v) => v as f32,
            FieldValue::Byte(v) => v as f32,
        }
    }

    fn as_i32(self) -> i32 {
        match self {
            FieldValue::Float(v) => v as i32,
            FieldValue::Int(v) => v,
            FieldValue::Byte(v) => v as i32,
        }
    }
}

/// One entry of the telemetry layout
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldDescriptor {
    /// Bit in the selective mask
    pub bit: u8,
    pub field: ValueField,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    const fn new(bit: u8, field: ValueField, kind: FieldKind) -> Self {
        Self { bit, field, kind }
    }

    /// Mask bit for this field
    pub const fn mask(&self) -> u32 {
        1 << self.bit
    }
}

/// Telemetry layout in ascending bit order
pub const VALUE_FIELDS: [FieldDescriptor; 18] = [
    FieldDescriptor::new(0, ValueField::TempMosfet, FieldKind::Float16(10.0)),
    FieldDescriptor::new(1, ValueField::TempMotor, FieldKind::Float16(10.0)),
    FieldDescriptor::new(2, ValueField::AvgMotorCurrent, FieldKind::Float32(100.0)),
    FieldDescriptor::new(3, ValueField::AvgInputCurrent, FieldKind::Float32(100.0)),
    FieldDescriptor::new(4, ValueField::AvgId, FieldKind::Float32(100.0)),
    FieldDescriptor::new(5, ValueField::AvgIq, FieldKind::Float32(100.0)),
    FieldDescriptor::new(6, ValueField::DutyCycle, FieldKind::Float16(1000.0)),
    FieldDescriptor::new(7, ValueField::Rpm, FieldKind::Float32(1.0)),
    FieldDescriptor::new(8, ValueField::InputVoltage, FieldKind::Float16(10.0)),
    FieldDescriptor::new(9, ValueField::AmpHours, FieldKind::Float32(10000.0)),
    FieldDescriptor::new(10, ValueField::AmpHoursCharged, FieldKind::Float32(10000.0)),
    FieldDescriptor::new(11, ValueField::WattHours, FieldKind::Float32(10000.0)),
    FieldDescriptor::new(12, ValueField::WattHoursCharged, FieldKind::Float32(10000.0)),
    FieldDescriptor::new(13, ValueField::Tachometer, FieldKind::Int32),
    FieldDescriptor::new(14, ValueField::TachometerAbs, FieldKind::Int32),
    FieldDescriptor::new(15, ValueField::FaultCode, FieldKind::Uint8),
    FieldDescriptor::new(16, ValueField::PidPos, FieldKind::Float32(1000000.0)),
    FieldDescriptor::new(17, ValueField::ControllerId, FieldKind::Uint8),
];

/// Mask selecting every field in [`VALUE_FIELDS`]
pub const ALL_FIELDS_MASK: u32 = (1 << VALUE_FIELDS.len()) - 1;

/// Descriptor for a field
pub fn descriptor(field: ValueField) -> &'static FieldDescriptor {
    // Table is indexed by the enum discriminant
    &VALUE_FIELDS[field as usize]
}

/// Full telemetry record
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorValues {
    /// MOSFET temperature (°C)
    pub temp_mosfet: f32,
    /// Motor temperature (°C)
    pub temp_motor: f32,
    /// Average motor current (A)
    pub avg_motor_current: f32,
    /// Average battery current (A)
    pub avg_input_current: f32,
    pub avg_id: f32,
    pub avg_iq: f32,
    /// Duty cycle (-1.0 to 1.0)
    pub duty_cycle: f32,
    /// Electrical RPM
    pub rpm: f32,
    /// Battery voltage (V)
    pub input_voltage: f32,
    pub amp_hours: f32,
    pub amp_hours_charged: f32,
    pub watt_hours: f32,
    pub watt_hours_charged: f32,
    pub tachometer: i32,
    pub tachometer_abs: i32,
    pub fault_code: u8,
    /// PID position (degrees)
    pub pid_pos: f32,
    pub controller_id: u8,
}

impl MotorValues {
    /// Read one field
    pub fn get(&self, field: ValueField) -> FieldValue {
        match field {
            ValueField::TempMosfet => FieldValue::Float(self.temp_mosfet),
            ValueField::TempMotor => FieldValue::Float(self.temp_motor),
            ValueField::AvgMotorCurrent => FieldValue::Float(self.avg_motor_current),
            ValueField::AvgInputCurrent => FieldValue::Float(self.avg_input_current),
            ValueField::AvgId => FieldValue::Float(self.avg_id),
            ValueField::AvgIq => FieldValue::Float(self.avg_iq),
            ValueField::DutyCycle => FieldValue::Float(self.duty_cycle),
            ValueField::Rpm => FieldValue::Float(self.rpm),
            ValueField::InputVoltage => FieldValue::Float(self.input_voltage),
            ValueField::AmpHours => FieldValue::Float(self.amp_hours),
            ValueField::AmpHoursCharged => FieldValue::Float(self.amp_hours_charged),
            ValueField::WattHours => FieldValue::Float(self.watt_hours),
            ValueField::WattHoursCharged => FieldValue::Float(self.watt_hours_charged),
            ValueField::Tachometer => FieldValue::Int(self.tachometer),
            ValueField::TachometerAbs => FieldValue::Int(self.tachometer_abs),
            ValueField::FaultCode => FieldValue::Byte(self.fault_code),
            ValueField::PidPos => FieldValue::Float(self.pid_pos),
            ValueField::ControllerId => FieldValue::Byte(self.controller_id),
        }
    }

    /// Store one field
    pub fn set(&mut self, field: ValueField, value: FieldValue) {
        match field {
            ValueField::TempMosfet => self.temp_mosfet = value.as_f32(),
            ValueField::TempMotor => self.temp_motor = value.as_f32(),
            ValueField::AvgMotorCurrent => self.avg_motor_current = value.as_f32(),
            ValueField::AvgInputCurrent => self.avg_input_current = value.as_f32(),
            ValueField::AvgId => self.avg_id = value.as_f32(),
            ValueField::AvgIq => self.avg_iq = value.as_f32(),
            ValueField::DutyCycle => self.duty_cycle = value.as_f32(),
            ValueField::Rpm => self.rpm = value.as_f32(),
            ValueField::InputVoltage => self.input_voltage = value.as_f32(),
            ValueField::AmpHours => self.amp_hours = value.as_f32(),
            ValueField::AmpHoursCharged => self.amp_hours_charged = value.as_f32(),
            ValueField::WattHours => self.watt_hours = value.as_f32(),
            ValueField::WattHoursCharged => self.watt_hours_charged = value.as_f32(),
            ValueField::Tachometer => self.tachometer = value.as_i32(),
            ValueField::TachometerAbs => self.tachometer_abs = value.as_i32(),
            ValueField::FaultCode => self.fault_code = value.as_i32() as u8,
            ValueField::PidPos => self.pid_pos = value.as_f32(),
            ValueField::ControllerId => self.controller_id = value.as_i32() as u8,
        }
    }

    /// Decode the fields selected by `mask`, in ascending bit order
    ///
    /// Unselected fields are left at zero.
    pub fn decode_masked(r: &mut BufferReader<'_>, mask: u32) -> Result<Self, BufferError> {
        let mut values = Self::default();
        for desc in VALUE_FIELDS.iter().filter(|d| mask & d.mask() != 0) {
            let value = desc.kind.read(r)?;
            values.set(desc.field, value);
        }
        Ok(values)
    }

    /// Encode the fields selected by `mask`, in ascending bit order
    pub fn encode_masked(&self, w: &mut BufferWriter<'_>, mask: u32) -> Result<(), BufferError> {
        for desc in VALUE_FIELDS.iter().filter(|d| mask & d.mask() != 0) {
            desc.kind.write(w, self.get(desc.field))?;
        }
        Ok(())
    }
}

/// The nine-field telemetry subset read at fixed offsets
///
/// Temperatures, d/q currents and watt-hours are skipped; the trailing
/// fault/position/id fields are not read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BasicValues {
    pub avg_motor_current: f32,
    pub avg_input_current: f32,
    pub duty_cycle: f32,
    pub rpm: i32,
    pub input_voltage: f32,
    pub amp_hours: f32,
    pub amp_hours_charged: f32,
    pub tachometer: i32,
    pub tachometer_abs: i32,
}

impl BasicValues {
    /// Bytes read after the command id
    pub const WIRE_SIZE: usize = 52;

    /// Decode from the data following the command id
    pub fn decode(r: &mut BufferReader<'_>) -> Result<Self, BufferError> {
        r.skip(4)?; // temperatures
        let avg_motor_current = r.get_float32(100.0)?;
        let avg_input_current = r.get_float32(100.0)?;
        r.skip(8)?; // d/q currents
        let duty_cycle = r.get_float16(1000.0)?;
        let rpm = r.get_i32()?;
        let input_voltage = r.get_float16(10.0)?;
        let amp_hours = r.get_float32(10000.0)?;
        let amp_hours_charged = r.get_float32(10000.0)?;
        r.skip(8)?; // watt-hours
        let tachometer = r.get_i32()?;
        let tachometer_abs = r.get_i32()?;

        Ok(Self {
            avg_motor_current,
            avg_input_current,
            duty_cycle,
            rpm,
            input_voltage,
            amp_hours,
            amp_hours_charged,
            tachometer,
            tachometer_abs,
        })
    }
}

/// Which `COMM_GET_VALUES` record to decode, chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValuesLayout {
    /// Every field of [`VALUE_FIELDS`]
    #[default]
    Full,
    /// [`BasicValues`] only
    Basic,
}

/// Decoded `COMM_GET_VALUES` response
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Telemetry {
    Full(MotorValues),
    Basic(BasicValues),
}

impl Telemetry {
    /// Decode from the data following the command id
    pub fn decode(r: &mut BufferReader<'_>, layout: ValuesLayout) -> Result<Self, BufferError> {
        match layout {
            ValuesLayout::Full => Ok(Telemetry::Full(MotorValues::decode_masked(
                r,
                ALL_FIELDS_MASK,
            )?)),
            ValuesLayout::Basic => Ok(Telemetry::Basic(BasicValues::decode(r)?)),
        }
    }

    pub fn rpm(&self) -> f32 {
        match self {
            Telemetry::Full(v) => v.rpm,
            Telemetry::Basic(v) => v.rpm as f32,
        }
    }

    pub fn input_voltage(&self) -> f32 {
        match self {
            Telemetry::Full(v) => v.input_voltage,
            Telemetry::Basic(v) => v.input_voltage,
        }
    }
}

/// Decoded `COMM_GET_VALUES_SELECTIVE` response
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelectiveValues {
    /// Fields present, as echoed by the controller
    pub mask: u32,
    pub values: MotorValues,
}

impl SelectiveValues {
    /// Decode the echoed mask and the fields it selects
    pub fn decode(r: &mut BufferReader<'_>) -> Result<Self, BufferError> {
        let mask = r.get_u32()?;
        let values = MotorValues::decode_masked(r, mask)?;
        Ok(Self { mask, values })
    }

    /// Returns true if `field` was sent
    pub fn contains(&self, field: ValueField) -> bool {
        self.mask & descriptor(field).mask() != 0
    }

    /// Value of `field`, if it was sent
    pub fn get(&self, field: ValueField) -> Option<FieldValue> {
        self.contains(field).then(|| self.values.get(field))
    }
}
