//! VESC motor controller driver
//!
//! Typed commands and telemetry on top of a [`Transactor`]. Setpoint
//! commands are fire-and-forget; queries wait for the matching reply up to
//! the configured request timeout.
//!
//! # Keep-alive
//!
//! The controller stops the motor when it has not received a command within
//! its own timeout. Callers holding a setpoint should call
//! [`VescUart::send_alive`] (or repeat the setpoint) periodically.

use vescuart_hal::{Clock, Uart};
use vescuart_protocol::{
    ChuckData, CommandError, FrameError, FrameObserver, FwVersion, NoopObserver, Request,
    Response, SelectiveValues, Target, Telemetry,
};

use crate::config::LinkConfig;
use crate::transactor::{LinkError, Transactor};

/// VESC driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VescError<E> {
    /// Transport or framing failure
    Link(LinkError<E>),
    /// Payload could not be built or parsed
    Command(CommandError),
    /// Reply carried a different command id than the request
    UnexpectedResponse(u8),
}

impl<E> From<LinkError<E>> for VescError<E> {
    fn from(e: LinkError<E>) -> Self {
        VescError::Link(e)
    }
}

impl<E> From<CommandError> for VescError<E> {
    fn from(e: CommandError) -> Self {
        VescError::Command(e)
    }
}

impl<E> From<FrameError> for VescError<E> {
    fn from(e: FrameError) -> Self {
        VescError::Link(LinkError::Frame(e))
    }
}

/// Driver for one VESC, directly on the UART or behind it on CAN
pub struct VescUart<U, C, O = NoopObserver> {
    link: Transactor<U, C, O>,
    config: LinkConfig,
}

impl<U: Uart, C: Clock> VescUart<U, C> {
    pub fn new(uart: U, clock: C, config: LinkConfig) -> Self {
        Self {
            link: Transactor::new(uart, clock),
            config,
        }
    }
}

impl<U: Uart, C: Clock, O: FrameObserver> VescUart<U, C, O> {
    /// Create a driver that reports link events to `observer`
    pub fn with_observer(uart: U, clock: C, observer: O, config: LinkConfig) -> Self {
        Self {
            link: Transactor::with_observer(uart, clock, observer),
            config,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Route subsequent requests to `target`
    pub fn set_target(&mut self, target: Target) {
        self.config.target = target;
    }

    /// Access the underlying transactor
    pub fn link(&self) -> &Transactor<U, C, O> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut Transactor<U, C, O> {
        &mut self.link
    }

    /// Fetch the telemetry record in the configured layout
    pub fn get_values(&mut self) -> Result<Telemetry, VescError<U::Error>> {
        match self.query(Request::GetValues)? {
            Response::Values(values) => Ok(values),
            other => Err(VescError::UnexpectedResponse(other.command_id().to_byte())),
        }
    }

    /// Fetch only the telemetry fields selected by `mask`
    ///
    /// Bit `n` of the mask selects entry `n` of
    /// [`VALUE_FIELDS`](vescuart_protocol::VALUE_FIELDS).
    pub fn get_values_selective(
        &mut self,
        mask: u32,
    ) -> Result<SelectiveValues, VescError<U::Error>> {
        match self.query(Request::GetValuesSelective { mask })? {
            Response::SelectiveValues(values) => Ok(values),
            other => Err(VescError::UnexpectedResponse(other.command_id().to_byte())),
        }
    }

    pub fn get_fw_version(&mut self) -> Result<FwVersion, VescError<U::Error>> {
        match self.query(Request::FwVersion)? {
            Response::FwVersion(version) => Ok(version),
            other => Err(VescError::UnexpectedResponse(other.command_id().to_byte())),
        }
    }

    /// Set duty cycle (-1.0 to 1.0)
    pub fn set_duty(&mut self, duty: f32) -> Result<(), VescError<U::Error>> {
        self.command(Request::SetDuty(duty))
    }

    /// Set motor current (A)
    pub fn set_current(&mut self, amps: f32) -> Result<(), VescError<U::Error>> {
        self.command(Request::SetCurrent(amps))
    }

    /// Set brake current (A)
    pub fn set_brake_current(&mut self, amps: f32) -> Result<(), VescError<U::Error>> {
        self.command(Request::SetCurrentBrake(amps))
    }

    /// Set electrical RPM
    pub fn set_rpm(&mut self, rpm: i32) -> Result<(), VescError<U::Error>> {
        self.command(Request::SetRpm(rpm))
    }

    /// Set handbrake current (A)
    pub fn set_handbrake(&mut self, amps: f32) -> Result<(), VescError<U::Error>> {
        self.command(Request::SetHandbrake(amps))
    }

    /// Set position (degrees)
    pub fn set_position(&mut self, degrees: f32) -> Result<(), VescError<U::Error>> {
        self.command(Request::SetPos(degrees))
    }

    /// Send nunchuck remote state
    pub fn set_chuck(&mut self, data: &ChuckData) -> Result<(), VescError<U::Error>> {
        self.command(Request::SetChuck(*data))
    }

    pub fn send_alive(&mut self) -> Result<(), VescError<U::Error>> {
        self.command(Request::Alive)
    }

    pub fn reboot(&mut self) -> Result<(), VescError<U::Error>> {
        self.command(Request::Reboot)
    }

    fn command(&mut self, request: Request) -> Result<(), VescError<U::Error>> {
        let payload = request.encode(self.config.target)?;
        self.link.send(&payload)?;
        Ok(())
    }

    fn query(&mut self, request: Request) -> Result<Response, VescError<U::Error>> {
        let payload = request.encode(self.config.target)?;
        let reply = self
            .link
            .request(&payload, self.config.request_timeout_ms)?;

        let expected = request.command_id().to_byte();
        match reply.first() {
            Some(&id) if id == expected => {}
            Some(&id) => return Err(VescError::UnexpectedResponse(id)),
            None => return Err(VescError::Command(CommandError::Empty)),
        }

        Ok(Response::parse(&reply, self.config.values_layout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClock, MockUart};
    use vescuart_protocol::{
        encode_frame, BufferWriter, MotorValues, ValueField, ValuesLayout, ALL_FIELDS_MASK,
        MAX_FRAME_SIZE,
    };

    fn encoded(payload: &[u8]) -> std::vec::Vec<u8> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(payload, &mut buf).unwrap();
        buf[..len].to_vec()
    }

    fn values_reply(values: &MotorValues) -> std::vec::Vec<u8> {
        let mut buf = [0u8; 64];
        let mut w = BufferWriter::new(&mut buf);
        w.append_u8(4).unwrap();
        values.encode_masked(&mut w, ALL_FIELDS_MASK).unwrap();
        w.written().to_vec()
    }

    fn sample() -> MotorValues {
        MotorValues {
            avg_motor_current: 8.25,
            duty_cycle: 0.3,
            rpm: 9000.0,
            input_voltage: 36.6,
            tachometer: 5000,
            tachometer_abs: 7000,
            ..Default::default()
        }
    }

    #[test]
    fn test_get_values_full() {
        let mut uart = MockUart::new();
        uart.queue_frame(&values_reply(&sample()));
        let clock = MockClock::new(1);
        let mut vesc = VescUart::new(uart, &clock, LinkConfig::default());

        let values = match vesc.get_values().unwrap() {
            Telemetry::Full(v) => v,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(values.rpm, 9000.0);
        assert!((values.avg_motor_current - 8.25).abs() < 0.01);
        assert!((values.input_voltage - 36.6).abs() < 0.1);
        assert_eq!(values.tachometer_abs, 7000);
        assert_eq!(vesc.link().uart().tx, encoded(&[4]));
    }

    #[test]
    fn test_get_values_basic() {
        let mut uart = MockUart::new();
        uart.queue_frame(&values_reply(&sample()));
        let clock = MockClock::new(1);
        let config = LinkConfig {
            values_layout: ValuesLayout::Basic,
            ..Default::default()
        };
        let mut vesc = VescUart::new(uart, &clock, config);

        match vesc.get_values().unwrap() {
            Telemetry::Basic(v) => {
                assert_eq!(v.rpm, 9000);
                assert!((v.duty_cycle - 0.3).abs() < 0.001);
                assert_eq!(v.tachometer, 5000);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_get_values_selective() {
        let mask: u32 = (1 << 7) | (1 << 8);
        let mut reply = std::vec![50];
        reply.extend_from_slice(&mask.to_be_bytes());
        reply.extend_from_slice(&(-1500i32).to_be_bytes()); // rpm
        reply.extend_from_slice(&(480i16).to_be_bytes()); // 48.0 V

        let mut uart = MockUart::new();
        uart.queue_frame(&reply);
        let clock = MockClock::new(1);
        let mut vesc = VescUart::new(uart, &clock, LinkConfig::default());

        let sel = vesc.get_values_selective(mask).unwrap();
        assert!(sel.contains(ValueField::Rpm));
        assert!(sel.contains(ValueField::InputVoltage));
        assert_eq!(sel.values.rpm, -1500.0);
        assert!((sel.values.input_voltage - 48.0).abs() < 0.01);

        let mut request = std::vec![50];
        request.extend_from_slice(&mask.to_be_bytes());
        assert_eq!(vesc.link().uart().tx, encoded(&request));
    }

    #[test]
    fn test_get_fw_version() {
        let mut uart = MockUart::new();
        uart.queue_frame(&[0, 5, 3, b'H', b'W', b'6', 0]);
        let clock = MockClock::new(1);
        let mut vesc = VescUart::new(uart, &clock, LinkConfig::default());

        let fw = vesc.get_fw_version().unwrap();
        assert_eq!((fw.major, fw.minor), (5, 3));
        assert_eq!(fw.hw_name.as_str(), "HW6");
    }

    #[test]
    fn test_unexpected_response() {
        let mut uart = MockUart::new();
        uart.queue_frame(&[0, 5, 3]);
        let clock = MockClock::new(1);
        let mut vesc = VescUart::new(uart, &clock, LinkConfig::default());

        assert_eq!(
            vesc.get_values().unwrap_err(),
            VescError::UnexpectedResponse(0)
        );
    }

    #[test]
    fn test_truncated_values() {
        let mut uart = MockUart::new();
        uart.queue_frame(&[4, 0, 1]);
        let clock = MockClock::new(1);
        let mut vesc = VescUart::new(uart, &clock, LinkConfig::default());

        assert!(matches!(
            vesc.get_values(),
            Err(VescError::Command(CommandError::Truncated(_)))
        ));
    }

    #[test]
    fn test_query_timeout() {
        let clock = MockClock::new(10);
        let config = LinkConfig {
            request_timeout_ms: 30,
            ..Default::default()
        };
        let mut vesc = VescUart::new(MockUart::new(), &clock, config);

        assert_eq!(
            vesc.get_fw_version().unwrap_err(),
            VescError::Link(LinkError::Frame(FrameError::Timeout))
        );
    }

    #[test]
    fn test_setpoints_are_fire_and_forget() {
        let clock = MockClock::new(1);
        let mut vesc = VescUart::new(MockUart::new(), &clock, LinkConfig::default());

        vesc.set_current(10.0).unwrap();
        vesc.set_rpm(3000).unwrap();
        vesc.send_alive().unwrap();

        let mut expected = encoded(&[6, 0x00, 0x00, 0x27, 0x10]);
        expected.extend(encoded(&[8, 0x00, 0x00, 0x0B, 0xB8]));
        expected.extend(encoded(&[30]));
        assert_eq!(vesc.link().uart().tx, expected);
    }

    #[test]
    fn test_can_target() {
        let clock = MockClock::new(1);
        let mut vesc = VescUart::new(MockUart::new(), &clock, LinkConfig::default());
        vesc.set_target(Target::Can(3));
        assert_eq!(vesc.config().target, Target::Can(3));

        vesc.set_brake_current(2.0).unwrap();
        vesc.set_chuck(&ChuckData::default()).unwrap();

        let mut expected = encoded(&[34, 3, 7, 0x00, 0x00, 0x07, 0xD0]);
        expected.extend(encoded(&[34, 3, 35, 127, 127, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(vesc.link().uart().tx, expected);
    }

    #[test]
    fn test_other_setpoints() {
        let clock = MockClock::new(1);
        let mut vesc = VescUart::new(MockUart::new(), &clock, LinkConfig::default());

        vesc.set_duty(-0.25).unwrap();
        vesc.set_handbrake(1.5).unwrap();
        vesc.set_position(45.0).unwrap();
        vesc.reboot().unwrap();

        let mut expected = encoded(&[5, 0xFF, 0xFF, 0x9E, 0x58]);
        expected.extend(encoded(&[10, 0x00, 0x00, 0x05, 0xDC]));
        expected.extend(encoded(&[9, 0x02, 0xAE, 0xA5, 0x40]));
        expected.extend(encoded(&[29]));
        assert_eq!(vesc.link().uart().tx, expected);
    }
}
