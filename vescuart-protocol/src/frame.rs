//! Frame encoding and decoding for the VESC UART link.
//!
//! Frame format:
//! - FORM (1 byte): 2 = short form, 3 = extended form
//! - LENGTH (1 byte short, 2 bytes big-endian extended): payload length
//! - PAYLOAD (1-512 bytes): command id followed by command data
//! - CRC (2 bytes, big-endian): CRC16 of PAYLOAD only
//! - END (1 byte): 0x03
//!
//! Extended form is used for payloads of 255 bytes and more. A frame using
//! extended form for a shorter payload is rejected, so every payload has
//! exactly one encoding.

use heapless::Vec;

use crate::commands::CommandId;
use crate::crc::crc16;

/// Form marker for a one-byte length
pub const FORM_SHORT: u8 = 2;

/// Form marker for a two-byte length
pub const FORM_EXTENDED: u8 = 3;

/// Frame terminator
pub const FRAME_END: u8 = 3;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 512;

/// Smallest payload length carried in extended form
pub const MIN_EXTENDED_LEN: usize = 255;

/// CRC (2) + END (1)
pub const TRAILER_SIZE: usize = 3;

/// Maximum complete frame size (FORM + 2B LENGTH + MAX_PAYLOAD + CRC + END)
pub const MAX_FRAME_SIZE: usize = 3 + MAX_PAYLOAD_SIZE + TRAILER_SIZE;

/// Owned payload buffer
pub type Payload = Vec<u8, MAX_PAYLOAD_SIZE>;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Unknown form marker, or extended form used for a short payload
    MalformedHeader,
    /// Payload is empty or exceeds [`MAX_PAYLOAD_SIZE`]
    OversizedPayload,
    /// Checksum mismatch
    CrcMismatch,
    /// Byte after the CRC is not [`FRAME_END`]
    BadEndMarker,
    /// No complete frame arrived before the deadline
    Timeout,
    /// Receive window filled without a resolvable frame
    BufferOverflow,
    /// Output buffer too small for encoding
    BufferTooSmall,
}

/// Outcome of one decode attempt at the start of a byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decoded<'a> {
    /// Structure is valid so far; this many more bytes are needed
    NeedMoreBytes(usize),
    /// No frame starts at this offset; skip one byte and retry
    Invalid(FrameError),
    /// A complete, CRC-checked frame
    Valid {
        /// Payload bytes inside the frame
        payload: &'a [u8],
        /// Total frame length, header through end marker
        consumed: usize,
    },
}

/// Header length for a form marker, `None` if the marker is unknown
pub fn header_len(form: u8) -> Option<usize> {
    match form {
        FORM_SHORT => Some(2),
        FORM_EXTENDED => Some(3),
        _ => None,
    }
}

/// Total wire size of a frame carrying `payload_len` bytes
pub fn frame_len(payload_len: usize) -> usize {
    let header = if payload_len >= MIN_EXTENDED_LEN { 3 } else { 2 };
    header + payload_len + TRAILER_SIZE
}

/// Encode `payload` as a frame into `out`
///
/// Returns the number of bytes written.
pub fn encode_frame(payload: &[u8], out: &mut [u8]) -> Result<usize, FrameError> {
    let len = payload.len();
    if len == 0 || len > MAX_PAYLOAD_SIZE {
        return Err(FrameError::OversizedPayload);
    }

    let total = frame_len(len);
    if out.len() < total {
        return Err(FrameError::BufferTooSmall);
    }

    let mut index = 0;
    if len < MIN_EXTENDED_LEN {
        out[0] = FORM_SHORT;
        out[1] = len as u8;
        index += 2;
    } else {
        out[0] = FORM_EXTENDED;
        out[1..3].copy_from_slice(&(len as u16).to_be_bytes());
        index += 3;
    }

    out[index..index + len].copy_from_slice(payload);
    index += len;

    out[index..index + 2].copy_from_slice(&crc16(payload).to_be_bytes());
    out[index + 2] = FRAME_END;

    Ok(total)
}

/// Try to decode one frame from the start of `buf`
pub fn decode_frame(buf: &[u8]) -> Decoded<'_> {
    let Some(&form) = buf.first() else {
        return Decoded::NeedMoreBytes(1);
    };

    let Some(header) = header_len(form) else {
        return Decoded::Invalid(FrameError::MalformedHeader);
    };

    if buf.len() < header {
        return Decoded::NeedMoreBytes(header - buf.len());
    }

    let len = if form == FORM_SHORT {
        buf[1] as usize
    } else {
        let len = u16::from_be_bytes([buf[1], buf[2]]) as usize;
        // A shorter payload should use fewer length bytes
        if len < MIN_EXTENDED_LEN {
            return Decoded::Invalid(FrameError::MalformedHeader);
        }
        len
    };

    if len == 0 || len > MAX_PAYLOAD_SIZE {
        return Decoded::Invalid(FrameError::OversizedPayload);
    }

    let total = header + len + TRAILER_SIZE;
    if buf.len() < total {
        return Decoded::NeedMoreBytes(total - buf.len());
    }

    if buf[total - 1] != FRAME_END {
        return Decoded::Invalid(FrameError::BadEndMarker);
    }

    let payload = &buf[header..header + len];
    let crc_rx = u16::from_be_bytes([buf[header + len], buf[header + len + 1]]);
    if crc16(payload) != crc_rx {
        return Decoded::Invalid(FrameError::CrcMismatch);
    }

    Decoded::Valid {
        payload,
        consumed: total,
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Payload data
    pub payload: Payload,
}

impl Frame {
    /// Create a new frame with the given payload
    pub fn new(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.is_empty() {
            return Err(FrameError::OversizedPayload);
        }
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::OversizedPayload)?;
        Ok(Self { payload })
    }

    /// Command id (first payload byte)
    pub fn command(&self) -> Option<CommandId> {
        self.payload.first().copied().and_then(CommandId::from_byte)
    }

    /// The total wire size of this frame
    pub fn wire_size(&self) -> usize {
        frame_len(self.payload.len())
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        encode_frame(&self.payload, buffer)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}
