//! UART serial communication abstractions
//!
//! The link layer only needs a polled byte source and a blocking byte sink.
//! Chip-specific HALs (or the [`io`](crate::io) adapter) implement these.

/// Shared error type for a UART half
pub trait ErrorType {
    /// Error type for transmit/receive operations
    type Error;
}

/// UART transmitter
pub trait UartTx: ErrorType {
    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
///
/// Polled interface: callers check [`available`](UartRx::available) before
/// reading so that a receive loop never blocks on an idle line.
pub trait UartRx: ErrorType {
    /// Number of received bytes that can be read without blocking
    ///
    /// Implementations that cannot report an exact count may return 1
    /// whenever at least one byte is ready.
    fn available(&mut self) -> Result<usize, Self::Error>;

    /// Read a single byte from the UART
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Read as many bytes as are available into `buf`
    ///
    /// Returns the number of bytes read, which may be zero.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut count = 0;
        while count < buf.len() && self.available()? > 0 {
            buf[count] = self.read_byte()?;
            count += 1;
        }
        Ok(count)
    }
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}
