//! Incremental frame reassembly
//!
//! [`Reassembler`] is fed one byte at a time (typically from a UART RX
//! interrupt or a polling loop) and hands every complete, CRC-valid payload
//! to a callback. Unlike a single-shot receive it copes with noise before a
//! frame, frames split across any number of deliveries, and several frames
//! arriving in one burst.
//!
//! The retained window only holds bytes of the frame attempt in progress.
//! After a `NeedMoreBytes(n)` result the next `n - 1` bytes are appended
//! without re-running the decoder.

use crate::frame::{decode_frame, Decoded, MAX_PAYLOAD_SIZE};
use crate::observer::{FrameObserver, NoopObserver};

/// Receive window capacity
pub const RX_BUFFER_SIZE: usize = MAX_PAYLOAD_SIZE + 8;

/// Default idle time after which a partial frame is discarded
pub const DEFAULT_RX_TIMEOUT_MS: u32 = 100;

/// Byte-at-a-time frame reassembler
///
/// Not reentrant: feed it from one context only.
#[derive(Debug, Clone)]
pub struct Reassembler<O = NoopObserver> {
    buffer: [u8; RX_BUFFER_SIZE],
    read: usize,
    write: usize,
    bytes_left: usize,
    rx_timeout_ms: u32,
    idle_ms: u32,
    observer: O,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reassembler {
    /// Create a reassembler without an observer
    pub fn new() -> Self {
        Self::with_observer(NoopObserver)
    }
}

impl<O: FrameObserver> Reassembler<O> {
    /// Create a reassembler reporting to `observer`
    pub fn with_observer(observer: O) -> Self {
        Self {
            buffer: [0; RX_BUFFER_SIZE],
            read: 0,
            write: 0,
            bytes_left: 0,
            rx_timeout_ms: DEFAULT_RX_TIMEOUT_MS,
            idle_ms: 0,
            observer,
        }
    }

    /// Set the idle time after which [`tick`](Self::tick) drops a partial frame
    pub fn with_rx_timeout(mut self, timeout_ms: u32) -> Self {
        self.rx_timeout_ms = timeout_ms;
        self
    }

    /// Discard all retained bytes
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
        self.bytes_left = 0;
        self.idle_ms = 0;
    }

    /// Unconsumed bytes in the window
    pub fn buffered_len(&self) -> usize {
        self.write - self.read
    }

    /// Access the observer
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable access to the observer
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Feed one received byte
    ///
    /// `on_payload` is called once for every frame completed by this byte,
    /// in arrival order.
    pub fn process_byte<F: FnMut(&[u8])>(&mut self, byte: u8, mut on_payload: F) {
        self.idle_ms = 0;
        let data_len = self.buffered_len();

        // Out of space with nothing resolvable: start over from this byte
        if data_len >= RX_BUFFER_SIZE {
            self.observer.on_overflow(data_len);
            self.reset();
            self.buffer[0] = byte;
            self.write = 1;
            return;
        }

        // Keep the frame attempt contiguous by shifting it to the front
        if self.write >= RX_BUFFER_SIZE {
            self.buffer.copy_within(self.read..self.write, 0);
            self.read = 0;
            self.write = data_len;
        }

        self.buffer[self.write] = byte;
        self.write += 1;

        if self.bytes_left > 1 {
            self.bytes_left -= 1;
            return;
        }
        self.bytes_left = 0;

        // Try decoding at successive offsets until more data is needed
        loop {
            let window = &self.buffer[self.read..self.write];
            self.observer.on_decode_attempt(window.len());

            match decode_frame(window) {
                Decoded::NeedMoreBytes(needed) => {
                    self.observer.on_need_more(needed);
                    self.bytes_left = needed;
                    break;
                }
                Decoded::Valid { payload, consumed } => {
                    self.observer.on_frame(payload.len(), consumed);
                    on_payload(payload);
                    self.read += consumed;
                }
                Decoded::Invalid(error) => {
                    self.observer.on_invalid(error);
                    self.read += 1;
                }
            }
        }

        // Nothing left, rewind to avoid a shift later
        if self.read == self.write {
            self.read = 0;
            self.write = 0;
        }
    }

    /// Feed a burst of received bytes
    pub fn process_bytes<F: FnMut(&[u8])>(&mut self, bytes: &[u8], mut on_payload: F) {
        for &byte in bytes {
            self.process_byte(byte, &mut on_payload);
        }
    }

    /// Advance the receive timer
    ///
    /// Call periodically with the time elapsed since the previous call. A
    /// partial frame that sees no new byte for the configured timeout is
    /// dropped, so a truncated frame cannot hold back the next one.
    pub fn tick(&mut self, elapsed_ms: u32) {
        let retained = self.buffered_len();
        if retained == 0 {
            self.idle_ms = 0;
            return;
        }

        self.idle_ms = self.idle_ms.saturating_add(elapsed_ms);
        if self.idle_ms >= self.rx_timeout_ms {
            self.observer.on_timeout(retained);
            self.reset();
        }
    }
}
