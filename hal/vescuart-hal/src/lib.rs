//! vescuart Hardware Abstraction Layer
//!
//! This crate defines the transport seams the VESC link layer runs on.
//! Chip-specific HALs implement them so the same protocol code runs on any
//! board (or on the host, under test).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  vescuart-drivers (transactor, VescUart)│
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vescuart-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  embedded-io  │       │  host / mock  │
//! │  serial ports │       │   transports  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial byte sink/source
//! - [`clock::Clock`] - Monotonic millisecond time

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod clock;
#[cfg(feature = "embedded-io")]
pub mod io;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
#[cfg(feature = "embassy-time")]
pub use clock::EmbassyClock;
#[cfg(feature = "std")]
pub use clock::StdClock;
#[cfg(feature = "embedded-io")]
pub use io::{IoError, IoUart};
pub use uart::{ErrorType, Uart, UartRx, UartTx};
