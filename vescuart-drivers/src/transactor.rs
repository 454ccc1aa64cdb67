//! Blocking request/response over a UART
//!
//! A [`Transactor`] owns one transport and one clock. [`Transactor::request`]
//! writes a frame, then polls the transport until a complete frame is
//! assembled or the deadline passes. Bytes that cannot start a frame are
//! dropped one at a time, so noise ahead of the reply is tolerated.
//!
//! Reading stops as soon as one frame is complete. Bytes already taken from
//! the transport behind that frame are kept and scanned first by the next
//! [`Transactor::receive`]; anything not yet read stays in the transport.

use heapless::Vec;
use vescuart_hal::{Clock, Uart};
use vescuart_protocol::{
    decode_frame, encode_frame, Decoded, FrameError, FrameObserver, NoopObserver, Payload,
    MAX_FRAME_SIZE,
};

/// Errors from a link transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// Framing failed, or no frame arrived in time
    Frame(FrameError),
    /// Transport error
    Uart(E),
}

impl<E> From<FrameError> for LinkError<E> {
    fn from(e: FrameError) -> Self {
        LinkError::Frame(e)
    }
}

type ScanResult<E> = Option<Result<Payload, LinkError<E>>>;

/// Synchronous frame transactor
pub struct Transactor<U, C, O = NoopObserver> {
    uart: U,
    clock: C,
    observer: O,
    /// Bytes read from the transport but not yet consumed by a frame
    pending: Vec<u8, MAX_FRAME_SIZE>,
}

impl<U: Uart, C: Clock> Transactor<U, C> {
    /// Create a transactor without an observer
    pub fn new(uart: U, clock: C) -> Self {
        Self::with_observer(uart, clock, NoopObserver)
    }
}

impl<U: Uart, C: Clock, O: FrameObserver> Transactor<U, C, O> {
    /// Create a transactor that reports link events to `observer`
    pub fn with_observer(uart: U, clock: C, observer: O) -> Self {
        Self {
            uart,
            clock,
            observer,
            pending: Vec::new(),
        }
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Bytes read ahead of the next frame
    pub fn buffered_len(&self) -> usize {
        self.pending.len()
    }

    /// Give back the transport, clock and observer
    ///
    /// Read-ahead bytes are discarded.
    pub fn release(self) -> (U, C, O) {
        (self.uart, self.clock, self.observer)
    }

    /// Frame and write `payload` without waiting for a reply
    pub fn send(&mut self, payload: &[u8]) -> Result<(), LinkError<U::Error>> {
        let mut frame = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(payload, &mut frame)?;

        self.uart
            .write_blocking(&frame[..len])
            .map_err(LinkError::Uart)?;
        self.uart.flush().map_err(LinkError::Uart)?;

        self.observer.on_sent(len);
        Ok(())
    }

    /// Send `payload` and wait up to `timeout_ms` for the reply frame
    ///
    /// There are no retries; a lost or corrupted reply is reported to the
    /// caller.
    pub fn request(
        &mut self,
        payload: &[u8],
        timeout_ms: u32,
    ) -> Result<Payload, LinkError<U::Error>> {
        self.send(payload)?;
        self.receive(timeout_ms)
    }

    /// Wait up to `timeout_ms` for one frame
    ///
    /// On timeout the partial frame is discarded.
    pub fn receive(&mut self, timeout_ms: u32) -> Result<Payload, LinkError<U::Error>> {
        let deadline = self.clock.now_ms().saturating_add(u64::from(timeout_ms));

        if let Some(result) = self.scan() {
            return result;
        }

        while self.clock.now_ms() < deadline {
            let mut available = self.uart.available().map_err(LinkError::Uart)?;

            while available > 0 {
                let byte = self.uart.read_byte().map_err(LinkError::Uart)?;
                available -= 1;

                // Never full: a candidate is resolved as soon as it is complete
                if self.pending.push(byte).is_err() {
                    self.observer.on_overflow(self.pending.len());
                    self.pending.clear();
                    continue;
                }

                if let Some(result) = self.scan() {
                    return result;
                }
            }
        }

        self.observer.on_timeout(self.pending.len());
        self.pending.clear();
        Err(LinkError::Frame(FrameError::Timeout))
    }

    /// Decode from the front of the read-ahead bytes
    ///
    /// Structurally invalid starts are dropped one byte at a time. Returns
    /// `None` while more bytes are needed. A complete frame with a bad CRC
    /// is reported; its first byte is dropped so the rest is rescanned.
    fn scan(&mut self) -> ScanResult<U::Error> {
        while !self.pending.is_empty() {
            self.observer.on_decode_attempt(self.pending.len());

            let (result, consumed): (ScanResult<U::Error>, usize) =
                match decode_frame(&self.pending) {
                    Decoded::NeedMoreBytes(needed) => {
                        self.observer.on_need_more(needed);
                        return None;
                    }
                    Decoded::Valid { payload, consumed } => {
                        self.observer.on_frame(payload.len(), consumed);
                        let payload = Vec::from_slice(payload)
                            .map_err(|_| LinkError::Frame(FrameError::OversizedPayload));
                        (Some(payload), consumed)
                    }
                    Decoded::Invalid(error) => {
                        self.observer.on_invalid(error);
                        let result = match error {
                            FrameError::CrcMismatch => Some(Err(LinkError::Frame(error))),
                            _ => None,
                        };
                        (result, 1)
                    }
                };

            self.discard_front(consumed);
            if result.is_some() {
                return result;
            }
        }
        None
    }

    fn discard_front(&mut self, count: usize) {
        let len = self.pending.len();
        let count = count.min(len);
        self.pending.copy_within(count..len, 0);
        self.pending.truncate(len - count);
    }
}
