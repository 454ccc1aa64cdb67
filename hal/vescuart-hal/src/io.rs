//! Adapter from `embedded-io` serial ports
//!
//! Chip HALs (embassy-rp `BufferedUart`, embassy-stm32 `BufferedUart`, ...)
//! implement the blocking `embedded-io` traits. Wrapping one in [`IoUart`]
//! makes it usable as a link byte source/sink.

use embedded_io::{Read, ReadExactError, ReadReady, Write};

use crate::uart::{ErrorType, UartRx, UartTx};

/// Errors from an [`IoUart`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError<E> {
    /// Error from the wrapped port
    Io(E),
    /// Port reported data ready but returned none
    Eof,
}

impl<E> From<ReadExactError<E>> for IoError<E> {
    fn from(e: ReadExactError<E>) -> Self {
        match e {
            ReadExactError::UnexpectedEof => IoError::Eof,
            ReadExactError::Other(e) => IoError::Io(e),
        }
    }
}

/// `embedded-io` port wrapped as a [`Uart`](crate::uart::Uart)
#[derive(Debug)]
pub struct IoUart<T> {
    inner: T,
}

impl<T> IoUart<T> {
    /// Wrap a port
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Unwrap the port
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: embedded_io::ErrorType> ErrorType for IoUart<T> {
    type Error = IoError<T::Error>;
}

impl<T: Read + ReadReady> UartRx for IoUart<T> {
    fn available(&mut self) -> Result<usize, Self::Error> {
        let ready = self.inner.read_ready().map_err(IoError::Io)?;
        Ok(usize::from(ready))
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

impl<T: Write> UartTx for IoUart<T> {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data).map_err(IoError::Io)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush().map_err(IoError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[derive(Default)]
    struct Loopback {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl embedded_io::ErrorType for Loopback {
        type Error = Infallible;
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => buf[n] = b,
                    None => break,
                }
                n += 1;
            }
            Ok(n)
        }
    }

    impl ReadReady for Loopback {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(!self.rx.is_empty())
        }
    }

    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_until_empty() {
        let mut port = IoUart::new(Loopback {
            rx: [0x02, 0x01, 0x04].into_iter().collect(),
            ..Default::default()
        });

        let mut buf = [0u8; 8];
        assert_eq!(port.read_available(&mut buf), Ok(3));
        assert_eq!(&buf[..3], &[0x02, 0x01, 0x04]);
        assert_eq!(port.available(), Ok(0));
    }

    #[test]
    fn test_writes_pass_through() {
        let mut port = IoUart::new(Loopback::default());
        port.write_blocking(&[1, 2, 3]).unwrap();
        port.flush().unwrap();
        assert_eq!(port.into_inner().tx, [1, 2, 3]);
    }

    /// Claims data is ready but never produces any
    struct Starved;

    impl embedded_io::ErrorType for Starved {
        type Error = Infallible;
    }

    impl Read for Starved {
        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Infallible> {
            Ok(0)
        }
    }

    impl ReadReady for Starved {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(true)
        }
    }

    #[test]
    fn test_zero_length_read_is_eof() {
        let mut port = IoUart::new(Starved);
        assert_eq!(port.available(), Ok(1));
        assert_eq!(port.read_byte(), Err(IoError::Eof));

        let mut buf = [0xAAu8; 4];
        assert_eq!(port.read_available(&mut buf), Err(IoError::Eof));
        assert_eq!(buf, [0xAA; 4]);
    }
}
