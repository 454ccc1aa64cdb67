//! Link-layer drivers
//!
//! This crate drives the packet protocol from `vescuart-protocol` over the
//! byte transports and clocks defined in `vescuart-hal`:
//!
//! - [`Transactor`]: blocking request/response with a deadline
//! - [`LinkConfig`]: timeouts, routing and telemetry layout
//! - [`VescUart`]: typed commands and telemetry for one controller

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod transactor;
pub mod vesc;

#[cfg(test)]
pub(crate) mod mock;

pub use config::LinkConfig;
#[cfg(feature = "serde")]
pub use config::ConfigError;
pub use transactor::{LinkError, Transactor};
pub use vesc::{VescError, VescUart};
