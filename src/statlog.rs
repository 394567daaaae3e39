use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use crate::dns::name::Name;

/// Append-only per-query statistics file.
///
/// One line per upstream query: `<usec> <rcode> <remote:port> <qname>`.
/// Failures to write are logged and otherwise ignored.
pub struct StatLog {
    writer: Mutex<BufWriter<File>>,
}

impl StatLog {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Write and flush one line synchronously on the calling task.
    pub fn record(&self, elapsed: Duration, rcode: u8, remote: Option<SocketAddr>, qname: &Name) {
        let remote = remote.map_or_else(|| "-".to_string(), |addr| addr.to_string());
        let line = format!("{} {} {} {}\n", elapsed.as_micros(), rcode, remote, qname);

        let mut writer = self.writer.lock();
        if let Err(e) = writer.write_all(line.as_bytes()).and_then(|_| writer.flush()) {
            warn!("Failed to write statistics line: {}", e);
        }
    }
}
