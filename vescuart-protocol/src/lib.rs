//! VESC UART Packet Protocol
//!
//! This crate implements the packet layer spoken by VESC motor controllers
//! over a serial link, and the payloads of the commands a host commonly
//! sends.
//!
//! # Protocol Overview
//!
//! Every payload travels in a length-prefixed, CRC-protected frame:
//! ```text
//! ┌──────┬──────────┬────────────┬───────┬─────┐
//! │ FORM │ LENGTH   │ PAYLOAD    │ CRC16 │ END │
//! │ 1B   │ 1B or 2B │ 1–512B     │ 2B    │ 1B  │
//! └──────┴──────────┴────────────┴───────┴─────┘
//! ```
//!
//! `FORM` is `2` with a one-byte length (payloads under 255 bytes) or `3`
//! with a two-byte big-endian length. The CRC is CRC-16/XMODEM over the
//! payload only, big-endian. `END` is always `3`.
//!
//! Byte 0 of the payload is the command id. A request may be wrapped as
//! `[34, can_id, command…]` to be relayed over CAN by the controller on the
//! UART.
//!
//! Multi-byte fields are big-endian. Decimal values are sent as integers
//! scaled by a per-field factor; see [`buffer`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod commands;
pub mod crc;
pub mod frame;
pub mod messages;
pub mod observer;
pub mod reassembler;
pub mod values;

pub use buffer::{BufferError, BufferReader, BufferWriter};
pub use commands::{split_envelope, CommandId, Target};
pub use crc::crc16;
pub use frame::{
    decode_frame, encode_frame, frame_len, Decoded, Frame, FrameError, Payload, MAX_FRAME_SIZE,
    MAX_PAYLOAD_SIZE,
};
pub use messages::{ChuckData, CommandError, FwVersion, Request, Response};
pub use observer::{FrameObserver, NoopObserver};
#[cfg(feature = "defmt")]
pub use observer::DefmtObserver;
pub use reassembler::Reassembler;
pub use values::{
    BasicValues, FieldDescriptor, FieldKind, FieldValue, MotorValues, SelectiveValues, Telemetry,
    ValueField, ValuesLayout, ALL_FIELDS_MASK, VALUE_FIELDS,
};
