//! A buffered writer with bounded retry/backoff over write failures.

use std::io::Write;
use std::thread;
use std::time::Duration;

use tessera_config::OutputConfig;
use tracing::warn;

use crate::TerminalError;

/// Accumulates bytes and flushes them to `sink` once the configured
/// threshold is reached, an explicit `flush()` is called, or retries are
/// exhausted and the error is surfaced to the caller.
pub struct BufferedWriter<W: Write> {
    sink: W,
    buf: Vec<u8>,
    bytes_written: u64,
    threshold: usize,
    max_retries: u32,
    retry_delay: Duration,
}

impl<W: Write> BufferedWriter<W> {
    pub fn new(sink: W, config: &OutputConfig) -> Self {
        Self {
            sink,
            buf: Vec::with_capacity(config.buffer_size),
            bytes_written: 0,
            threshold: config.buffer_size,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), TerminalError> {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() >= self.threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush the accumulated buffer, retrying up to `max_retries` times
    /// with a fixed backoff if the sink reports an error partway through.
    pub fn flush(&mut self) -> Result<(), TerminalError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let mut attempts = 0;
        loop {
            match self.sink.write_all(&self.buf) {
                Ok(()) => {
                    let _ = self.sink.flush();
                    self.bytes_written += self.buf.len() as u64;
                    self.buf.clear();
                    return Ok(());
                }
                Err(err) if attempts < self.max_retries => {
                    attempts += 1;
                    warn!(attempt = attempts, error = %err, "terminal write failed, retrying");
                    thread::sleep(self.retry_delay);
                }
                Err(err) => {
                    return Err(TerminalError::WriteFailed {
                        attempts: attempts + 1,
                        source: err,
                    });
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_below_threshold_does_not_flush() {
        let config = OutputConfig {
            buffer_size: 1024,
            ..Default::default()
        };
        let mut w = BufferedWriter::new(Vec::new(), &config);
        w.write(b"hi").unwrap();
        assert_eq!(w.bytes_written(), 0);
    }

    #[test]
    fn write_at_threshold_flushes() {
        let config = OutputConfig {
            buffer_size: 2,
            ..Default::default()
        };
        let mut w = BufferedWriter::new(Vec::new(), &config);
        w.write(b"hi").unwrap();
        assert_eq!(w.bytes_written(), 2);
    }

    #[test]
    fn explicit_flush_writes_remaining_bytes() {
        let config = OutputConfig {
            buffer_size: 1024,
            ..Default::default()
        };
        let mut w = BufferedWriter::new(Vec::new(), &config);
        w.write(b"abc").unwrap();
        w.flush().unwrap();
        assert_eq!(w.bytes_written(), 3);
    }

    #[test]
    fn clear_discards_unflushed_bytes() {
        let config = OutputConfig {
            buffer_size: 1024,
            ..Default::default()
        };
        let mut w = BufferedWriter::new(Vec::new(), &config);
        w.write(b"abc").unwrap();
        w.clear();
        w.flush().unwrap();
        assert_eq!(w.bytes_written(), 0);
    }
}
