//! CRC16 for frame payloads
//!
//! CCITT polynomial 0x1021, initial value 0, no reflection and no final XOR
//! (the XMODEM variant). Both ends of the link must agree bit for bit.

/// Generator polynomial (x^16 + x^12 + x^5 + 1)
pub const CRC16_POLY: u16 = 0x1021;

/// Lookup table, one entry per leading byte value
static CRC16_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the CRC16 of `data`
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        let index = ((crc >> 8) as u8 ^ byte) as usize;
        crc = (crc << 8) ^ CRC16_TABLE[index];
    }
    crc
}
