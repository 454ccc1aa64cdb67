//! Monotonic millisecond time source
//!
//! Used for request timeouts. Implementations must never go backwards.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Clock backed by the embassy time driver
#[cfg(feature = "embassy-time")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time")]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

/// Host clock for tools and tests running under `std`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Ticking(Cell<u64>);

    impl Clock for Ticking {
        fn now_ms(&self) -> u64 {
            let now = self.0.get();
            self.0.set(now + 5);
            now
        }
    }

    #[test]
    fn test_clock_by_reference() {
        let clock = Ticking(Cell::new(10));
        let by_ref = &clock;
        assert_eq!(by_ref.now_ms(), 10);
        assert_eq!(clock.now_ms(), 15);
    }
}
