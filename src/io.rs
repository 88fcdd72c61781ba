//! I/O adapters shared by the command-line filters.

use std::io::{self, Read};

/// Wraps a reader so that reads interrupted by a signal are retried
/// transparently. Any other failure surfaces to the caller, which treats it
/// as fatal.
pub struct RetryReader<R> {
    inner: R,
}

impl<R> RetryReader<R> {
    pub fn new(inner: R) -> Self {
        RetryReader { inner }
    }
}

impl<R: Read> Read for RetryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails with `Interrupted` a fixed number of times before delivering.
    struct Flaky {
        interruptions: usize,
        data: &'static [u8],
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interruptions > 0 {
                self.interruptions -= 1;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let mut reader = RetryReader::new(Flaky {
            interruptions: 3,
            data: b"feed",
        });
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"feed");
    }

    #[test]
    fn other_errors_pass_through() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }
        }
        let err = RetryReader::new(Broken).read(&mut [0; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
