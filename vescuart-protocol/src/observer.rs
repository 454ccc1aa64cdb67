//! Decode/transfer event hooks
//!
//! The link layer performs no I/O of its own for diagnostics. Callers that
//! want visibility pass a [`FrameObserver`]; every method defaults to a
//! no-op so implementations only override what they care about.

use crate::frame::FrameError;

/// Receives link-layer events
pub trait FrameObserver {
    /// A decode attempt over `available` retained bytes
    fn on_decode_attempt(&mut self, _available: usize) {}

    /// A valid frame was decoded
    fn on_frame(&mut self, _payload_len: usize, _consumed: usize) {}

    /// Structure is fine so far, `needed` more bytes required
    fn on_need_more(&mut self, _needed: usize) {}

    /// No frame at the current offset; one byte will be skipped
    fn on_invalid(&mut self, _error: FrameError) {}

    /// Retained data was discarded because the window filled up
    fn on_overflow(&mut self, _discarded: usize) {}

    /// A partial frame or a request timed out
    fn on_timeout(&mut self, _discarded: usize) {}

    /// A frame of `frame_len` bytes was written to the transport
    fn on_sent(&mut self, _frame_len: usize) {}
}

impl<O: FrameObserver + ?Sized> FrameObserver for &mut O {
    fn on_decode_attempt(&mut self, available: usize) {
        (**self).on_decode_attempt(available)
    }

    fn on_frame(&mut self, payload_len: usize, consumed: usize) {
        (**self).on_frame(payload_len, consumed)
    }

    fn on_need_more(&mut self, needed: usize) {
        (**self).on_need_more(needed)
    }

    fn on_invalid(&mut self, error: FrameError) {
        (**self).on_invalid(error)
    }

    fn on_overflow(&mut self, discarded: usize) {
        (**self).on_overflow(discarded)
    }

    fn on_timeout(&mut self, discarded: usize) {
        (**self).on_timeout(discarded)
    }

    fn on_sent(&mut self, frame_len: usize) {
        (**self).on_sent(frame_len)
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl FrameObserver for NoopObserver {}

/// Observer that logs through defmt
#[cfg(feature = "defmt")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefmtObserver;

#[cfg(feature = "defmt")]
impl FrameObserver for DefmtObserver {
    fn on_decode_attempt(&mut self, available: usize) {
        defmt::trace!("decode attempt over {} bytes", available);
    }

    fn on_frame(&mut self, payload_len: usize, consumed: usize) {
        defmt::debug!("frame: {} byte payload ({} on wire)", payload_len, consumed);
    }

    fn on_need_more(&mut self, needed: usize) {
        defmt::trace!("need {} more bytes", needed);
    }

    fn on_invalid(&mut self, error: FrameError) {
        defmt::warn!("frame rejected: {:?}, skipping one byte", error);
    }

    fn on_overflow(&mut self, discarded: usize) {
        defmt::warn!("rx window overflow, discarded {} bytes", discarded);
    }

    fn on_timeout(&mut self, discarded: usize) {
        defmt::warn!("rx timeout, discarded {} bytes", discarded);
    }

    fn on_sent(&mut self, frame_len: usize) {
        defmt::trace!("TX: {} bytes", frame_len);
    }
}

/// Observer that counts events, for tests
#[cfg(test)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountingObserver {
    pub attempts: usize,
    pub frames: usize,
    pub need_more: usize,
    pub invalid: std::vec::Vec<FrameError>,
    pub overflows: usize,
    pub timeouts: usize,
    pub sent: usize,
}

#[cfg(test)]
impl FrameObserver for CountingObserver {
    fn on_decode_attempt(&mut self, _available: usize) {
        self.attempts += 1;
    }

    fn on_frame(&mut self, _payload_len: usize, _consumed: usize) {
        self.frames += 1;
    }

    fn on_need_more(&mut self, _needed: usize) {
        self.need_more += 1;
    }

    fn on_invalid(&mut self, error: FrameError) {
        self.invalid.push(error);
    }

    fn on_overflow(&mut self, _discarded: usize) {
        self.overflows += 1;
    }

    fn on_timeout(&mut self, _discarded: usize) {
        self.timeouts += 1;
    }

    fn on_sent(&mut self, _frame_len: usize) {
        self.sent += 1;
    }
}
