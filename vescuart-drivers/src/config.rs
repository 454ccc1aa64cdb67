//! Link configuration
//!
//! With the `serde` feature the configuration can be persisted as postcard
//! binary data alongside other settings in flash.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use vescuart_protocol::reassembler::DEFAULT_RX_TIMEOUT_MS;
use vescuart_protocol::{FrameObserver, Reassembler, Target, ValuesLayout};

/// Default time to wait for a reply
pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 100;

/// Largest serialized [`LinkConfig`]
#[cfg(feature = "serde")]
pub const MAX_CONFIG_SIZE: usize = 32;

/// Link settings for one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// How long a request waits for its reply (ms)
    pub request_timeout_ms: u32,
    /// Idle time after which a partial frame is dropped (ms)
    pub rx_timeout_ms: u32,
    /// Where requests are routed
    pub target: Target,
    /// How `COMM_GET_VALUES` replies are decoded
    pub values_layout: ValuesLayout,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            rx_timeout_ms: DEFAULT_RX_TIMEOUT_MS,
            target: Target::Local,
            values_layout: ValuesLayout::Full,
        }
    }
}

impl LinkConfig {
    /// Stream reassembler using this link's receive timeout
    ///
    /// For receivers that consume unsolicited frames instead of issuing
    /// requests.
    pub fn reassembler<O: FrameObserver>(&self, observer: O) -> Reassembler<O> {
        Reassembler::with_observer(observer).with_rx_timeout(self.rx_timeout_ms)
    }
}

/// Config persistence errors
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
}

#[cfg(feature = "serde")]
impl LinkConfig {
    /// Serialize into `buf`, returning the number of bytes used
    pub fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ConfigError> {
        let used = postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)?;
        Ok(used.len())
    }

    /// Deserialize from postcard bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)
    }
}
