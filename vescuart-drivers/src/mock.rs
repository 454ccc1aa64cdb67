//! Host-side transport and clock doubles

use std::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

use vescuart_hal::{Clock, ErrorType, UartRx, UartTx};
use vescuart_protocol::encode_frame;
use vescuart_protocol::{FrameError, FrameObserver, MAX_FRAME_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Disconnected,
}

/// UART with a preloaded receive queue that records everything written
#[derive(Debug, Default)]
pub struct MockUart {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_bytes(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Queue `payload` as a well-formed frame
    pub fn queue_frame(&mut self, payload: &[u8]) {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(payload, &mut buf).unwrap();
        self.queue_bytes(&buf[..len]);
    }
}

impl ErrorType for MockUart {
    type Error = MockError;
}

impl UartTx for MockUart {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), MockError> {
        if self.fail_writes {
            return Err(MockError::Disconnected);
        }
        self.tx.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MockError> {
        Ok(())
    }
}

impl UartRx for MockUart {
    fn available(&mut self) -> Result<usize, MockError> {
        if self.fail_reads {
            return Err(MockError::Disconnected);
        }
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8, MockError> {
        self.rx.pop_front().ok_or(MockError::Disconnected)
    }
}

/// Clock that advances by `step_ms` every time it is read
#[derive(Debug)]
pub struct MockClock {
    now: Cell<u64>,
    step_ms: u64,
}

impl MockClock {
    pub fn new(step_ms: u64) -> Self {
        Self::starting_at(1_000, step_ms)
    }

    pub fn starting_at(now: u64, step_ms: u64) -> Self {
        Self {
            now: Cell::new(now),
            step_ms,
        }
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step_ms));
        now
    }
}

/// Observer that records link events
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub sent: Vec<usize>,
    pub frames: usize,
    pub invalid: Vec<FrameError>,
    pub timeouts: usize,
}

impl FrameObserver for RecordingObserver {
    fn on_frame(&mut self, _payload_len: usize, _consumed: usize) {
        self.frames += 1;
    }

    fn on_invalid(&mut self, error: FrameError) {
        self.invalid.push(error);
    }

    fn on_timeout(&mut self, _discarded: usize) {
        self.timeouts += 1;
    }

    fn on_sent(&mut self, frame_len: usize) {
        self.sent.push(frame_len);
    }
}
