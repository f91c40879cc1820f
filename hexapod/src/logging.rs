use std::io::{self, Write};
use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging to stdout and broadcast log lines over the provided channel.
///
/// `RUST_LOG` overrides `default_filter`, which is normally the `--log` flag.
///
/// ```no_run
/// use tokio::sync::broadcast;
/// use hexapod::init_logging;
///
/// let (tx, _rx) = broadcast::channel(10);
/// init_logging(tx, "follow=debug,info");
/// ```
pub fn init_logging(tx: broadcast::Sender<String>, default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt()
        .with_env_filter(filter)
        .with_writer(move || TeeWriter::new(io::stdout(), tx.clone()))
        .init();
}

/// Writer that copies every non-blank chunk of output onto a broadcast
/// channel after writing it to `inner`.
struct TeeWriter<W> {
    inner: W,
    tx: broadcast::Sender<String>,
}

impl<W: Write> TeeWriter<W> {
    fn new(inner: W, tx: broadcast::Sender<String>) -> Self {
        Self { inner, tx }
    }
}

impl<W: Write> Write for TeeWriter<W> {
    /// Writes to the inner writer and forwards what was written, minus
    /// trailing whitespace. Lines are dropped when no viewer listens.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if self.tx.receiver_count() > 0 {
            if let Ok(line) = std::str::from_utf8(&buf[..n]) {
                let line = line.trim_end();
                if !line.is_empty() {
                    let _ = self.tx.send(line.to_string());
                }
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
