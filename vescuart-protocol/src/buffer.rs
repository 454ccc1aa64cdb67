//! Typed big-endian buffer codec
//!
//! Payload fields have no self-describing schema: their order is fixed by
//! the command id. [`BufferWriter`] and [`BufferReader`] each own a cursor
//! into a caller buffer and advance it by exactly the field width on every
//! call. A field that would cross the end of the buffer is rejected before
//! any byte is touched and the cursor stays where it was.
//!
//! Decimal quantities travel as scaled integers: `float16`/`float32` fields
//! are the value multiplied by a fixed scale and rounded to the nearest
//! integer, stored as a signed 16/32-bit big-endian number.

/// Errors from the buffer codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Field would extend past the end of the buffer
    OutOfBounds {
        /// Cursor position at the time of the call
        position: usize,
        /// Width of the rejected field
        width: usize,
        /// Total buffer length
        capacity: usize,
    },
}

/// Scale `value` and round half away from zero
///
/// The conversion to the wire integer (`as i16`/`as i32`) saturates, so an
/// out-of-range value still occupies exactly the field width.
fn scale_round(value: f32, scale: f32) -> f64 {
    let scaled = value as f64 * scale as f64;
    if scaled >= 0.0 {
        scaled + 0.5
    } else {
        scaled - 0.5
    }
}

/// Cursor-advancing writer over a caller buffer
#[derive(Debug)]
pub struct BufferWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BufferWriter<'a> {
    /// Start writing at offset 0
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor position (bytes written so far)
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the buffer
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The bytes written so far
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Reserve `width` bytes at the cursor, advancing past them
    fn claim(&mut self, width: usize) -> Result<&mut [u8], BufferError> {
        let end = self
            .pos
            .checked_add(width)
            .filter(|&end| end <= self.buf.len())
            .ok_or(BufferError::OutOfBounds {
                position: self.pos,
                width,
                capacity: self.buf.len(),
            })?;
        let start = self.pos;
        self.pos = end;
        Ok(&mut self.buf[start..end])
    }

    /// Append raw bytes
    pub fn append_bytes(&mut self, data: &[u8]) -> Result<(), BufferError> {
        self.claim(data.len())?.copy_from_slice(data);
        Ok(())
    }

    pub fn append_u8(&mut self, value: u8) -> Result<(), BufferError> {
        self.append_bytes(&[value])
    }

    pub fn append_bool(&mut self, value: bool) -> Result<(), BufferError> {
        self.append_u8(value as u8)
    }

    pub fn append_u16(&mut self, value: u16) -> Result<(), BufferError> {
        self.append_bytes(&value.to_be_bytes())
    }

    pub fn append_i16(&mut self, value: i16) -> Result<(), BufferError> {
        self.append_bytes(&value.to_be_bytes())
    }

    pub fn append_u32(&mut self, value: u32) -> Result<(), BufferError> {
        self.append_bytes(&value.to_be_bytes())
    }

    pub fn append_i32(&mut self, value: i32) -> Result<(), BufferError> {
        self.append_bytes(&value.to_be_bytes())
    }

    /// Append `value * scale` as a signed 16-bit integer
    pub fn append_float16(&mut self, value: f32, scale: f32) -> Result<(), BufferError> {
        self.append_i16(scale_round(value, scale) as i16)
    }

    /// Append `value * scale` as a signed 32-bit integer
    pub fn append_float32(&mut self, value: f32, scale: f32) -> Result<(), BufferError> {
        self.append_i32(scale_round(value, scale) as i32)
    }
}

/// Cursor-advancing reader over a received payload
#[derive(Debug, Clone)]
pub struct BufferReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufferReader<'a> {
    /// Start reading at offset 0
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take the next `width` bytes
    fn take(&mut self, width: usize) -> Result<&'a [u8], BufferError> {
        let end = self
            .pos
            .checked_add(width)
            .filter(|&end| end <= self.buf.len())
            .ok_or(BufferError::OutOfBounds {
                position: self.pos,
                width,
                capacity: self.buf.len(),
            })?;
        let buf: &'a [u8] = self.buf;
        let field = &buf[self.pos..end];
        self.pos = end;
        Ok(field)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Skip `width` bytes of fields the caller does not need
    pub fn skip(&mut self, width: usize) -> Result<(), BufferError> {
        self.take(width).map(|_| ())
    }

    /// Take raw bytes
    pub fn get_bytes(&mut self, width: usize) -> Result<&'a [u8], BufferError> {
        self.take(width)
    }

    /// Everything after the cursor; the cursor moves to the end
    pub fn rest(&mut self) -> &'a [u8] {
        let buf: &'a [u8] = self.buf;
        let rest = &buf[self.pos..];
        self.pos = buf.len();
        rest
    }

    pub fn get_u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Any non-zero byte reads as `true`
    pub fn get_bool(&mut self) -> Result<bool, BufferError> {
        Ok(self.get_u8()? != 0)
    }

    pub fn get_u16(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn get_i16(&mut self) -> Result<i16, BufferError> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn get_i32(&mut self) -> Result<i32, BufferError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    /// Read a signed 16-bit integer and divide by `scale`
    pub fn get_float16(&mut self, scale: f32) -> Result<f32, BufferError> {
        let raw = self.get_i16()?;
        Ok((raw as f64 / scale as f64) as f32)
    }

    /// Read a signed 32-bit integer and divide by `scale`
    pub fn get_float32(&mut self, scale: f32) -> Result<f32, BufferError> {
        let raw = self.get_i32()?;
        Ok((raw as f64 / scale as f64) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_big_endian_layout() {
        let mut buf = [0u8; 13];
        let mut w = BufferWriter::new(&mut buf);
        w.append_u8(0xAB).unwrap();
        w.append_u16(0x1234).unwrap();
        w.append_i32(-2).unwrap();
        w.append_u32(0xDEADBEEF).unwrap();
        w.append_bool(true).unwrap();
        w.append_bool(false).unwrap();
        assert_eq!(w.position(), 13);
        assert_eq!(
            buf,
            [0xAB, 0x12, 0x34, 0xFF, 0xFF, 0xFF, 0xFE, 0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x00]
        );

        let mut r = BufferReader::new(&buf);
        assert_eq!(r.get_u8().unwrap(), 0xAB);
        assert_eq!(r.get_u16().unwrap(), 0x1234);
        assert_eq!(r.get_i32().unwrap(), -2);
        assert_eq!(r.get_u32().unwrap(), 0xDEADBEEF);
        assert!(r.get_bool().unwrap());
        assert!(!r.get_bool().unwrap());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_float16_scaling() {
        let mut buf = [0u8; 2];
        BufferWriter::new(&mut buf).append_float16(12.34, 100.0).unwrap();
        assert_eq!(i16::from_be_bytes(buf), 1234);

        let value = BufferReader::new(&buf).get_float16(100.0).unwrap();
        assert!((value - 12.34).abs() < 0.001);
    }

    #[test]
    fn test_float_rounds_to_nearest() {
        let mut buf = [0u8; 8];
        let mut w = BufferWriter::new(&mut buf);
        w.append_float32(0.0196, 100.0).unwrap(); // 1.96 -> 2
        w.append_float32(-0.0196, 100.0).unwrap(); // -1.96 -> -2
        let mut r = BufferReader::new(&buf);
        assert_eq!(r.get_i32().unwrap(), 2);
        assert_eq!(r.get_i32().unwrap(), -2);
    }

    #[test]
    fn test_float16_saturates_but_keeps_width() {
        let mut buf = [0u8; 3];
        let mut w = BufferWriter::new(&mut buf);
        w.append_float16(1.0e6, 100.0).unwrap();
        assert_eq!(w.position(), 2);
        assert_eq!(i16::from_be_bytes([buf[0], buf[1]]), i16::MAX);
    }

    #[test]
    fn test_write_past_end_rejected() {
        let mut buf = [0u8; 3];
        let mut w = BufferWriter::new(&mut buf);
        w.append_u16(7).unwrap();
        assert_eq!(
            w.append_u32(1),
            Err(BufferError::OutOfBounds {
                position: 2,
                width: 4,
                capacity: 3
            })
        );
        // Cursor unchanged, last byte still usable
        assert_eq!(w.position(), 2);
        w.append_u8(9).unwrap();
        assert_eq!(buf, [0, 7, 9]);
    }

    #[test]
    fn test_read_past_end_rejected() {
        let buf = [1u8, 2, 3];
        let mut r = BufferReader::new(&buf);
        r.skip(2).unwrap();
        assert!(matches!(
            r.get_i16(),
            Err(BufferError::OutOfBounds { position: 2, width: 2, capacity: 3 })
        ));
        assert_eq!(r.position(), 2);
        assert_eq!(r.get_u8().unwrap(), 3);
        assert!(r.skip(1).is_err());
    }

    #[test]
    fn test_rest_consumes_tail() {
        let buf = [1u8, 2, 3, 4];
        let mut r = BufferReader::new(&buf);
        r.get_u8().unwrap();
        assert_eq!(r.rest(), &[2, 3, 4]);
        assert_eq!(r.remaining(), 0);
        assert!(r.rest().is_empty());
    }

    proptest! {
        #[test]
        fn prop_float32_scale_100_fidelity(value in -1000.0f32..1000.0) {
            let mut buf = [0u8; 4];
            BufferWriter::new(&mut buf).append_float32(value, 100.0).unwrap();
            let decoded = BufferReader::new(&buf).get_float32(100.0).unwrap();
            prop_assert!((decoded - value).abs() <= 0.01 + 1e-4);
        }

        #[test]
        fn prop_float16_scale_100_fidelity(value in -300.0f32..300.0) {
            let mut buf = [0u8; 2];
            BufferWriter::new(&mut buf).append_float16(value, 100.0).unwrap();
            let decoded = BufferReader::new(&buf).get_float16(100.0).unwrap();
            prop_assert!((decoded - value).abs() <= 0.01 + 1e-4);
        }

        #[test]
        fn prop_cursor_advances_by_width(value in any::<f32>(), scale in 1.0f32..10000.0) {
            let mut buf = [0u8; 6];
            let mut w = BufferWriter::new(&mut buf);
            w.append_float16(value, scale).unwrap();
            prop_assert_eq!(w.position(), 2);
            w.append_float32(value, scale).unwrap();
            prop_assert_eq!(w.position(), 6);
        }
    }
}
