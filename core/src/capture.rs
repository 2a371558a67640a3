//! Per-transfer collection of headers, body, sent-header trace and progress.
//!
//! The same `Collector` serves single and batched execution: it rides inside
//! the engine handle, so headers are captured identically whether the
//! transfer is driven by `perform` or by the multi-handle.

use std::fmt;
use std::fs::File;
use std::io::Write;

use curl::easy::{Handler, InfoType, WriteError};

/// Transfer progress as reported by the engine, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    pub download_total: f64,
    pub downloaded: f64,
    pub upload_total: f64,
    pub uploaded: f64,
}

/// Progress observer; returning `false` aborts the transfer.
pub type ProgressCallback = Box<dyn FnMut(Progress) -> bool + Send>;

/// Record one received header line.
///
/// Trailing CR/LF are trimmed; blank lines and the provisional
/// `HTTP/1.1 100 Continue` status are dropped. Returns the number of bytes
/// consumed, which is always the full untrimmed length.
pub fn capture_header_line(data: &[u8], headers: &mut Vec<String>) -> usize {
    let line = String::from_utf8_lossy(data);
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("HTTP/1.1 100 Continue") {
        tracing::trace!(header = trimmed, "response header");
        headers.push(trimmed.to_string());
    }
    data.len()
}

/// Split the outgoing-header trace into lines, dropping empty ones.
pub fn split_header_trace(trace: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(trace)
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Where the response body goes.
#[derive(Debug)]
pub(crate) enum Sink {
    Buffer(Vec<u8>),
    File(File),
}

impl Default for Sink {
    fn default() -> Self {
        Sink::Buffer(Vec::new())
    }
}

#[derive(Default)]
pub struct Collector {
    pub(crate) headers: Vec<String>,
    pub(crate) sink: Sink,
    pub(crate) header_trace: Vec<u8>,
    pub(crate) progress: Option<ProgressCallback>,
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("headers", &self.headers)
            .field("sink", &self.sink)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Collector {
    /// Clear per-transfer state; the file sink and progress hook stay armed.
    pub(crate) fn begin(&mut self) {
        self.headers.clear();
        self.header_trace.clear();
        if let Sink::Buffer(buf) = &mut self.sink {
            buf.clear();
        }
    }

    /// Take the buffered body. Empty when streaming to a file.
    pub(crate) fn take_body(&mut self) -> Vec<u8> {
        match &mut self.sink {
            Sink::Buffer(buf) => std::mem::take(buf),
            Sink::File(_) => Vec::new(),
        }
    }

    /// Drop any file sink, flushing it, and go back to buffering.
    pub(crate) fn release_file(&mut self) {
        if let Sink::File(mut file) = std::mem::take(&mut self.sink) {
            if let Err(err) = file.flush() {
                tracing::warn!(%err, "flushing download file failed");
            }
        }
    }
}

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        match &mut self.sink {
            Sink::Buffer(buf) => {
                buf.extend_from_slice(data);
                Ok(data.len())
            }
            // A short count makes the engine fail the transfer with a write error.
            Sink::File(file) => Ok(file.write_all(data).map(|_| data.len()).unwrap_or(0)),
        }
    }

    fn header(&mut self, data: &[u8]) -> bool {
        capture_header_line(data, &mut self.headers) == data.len()
    }

    fn debug(&mut self, kind: InfoType, data: &[u8]) {
        if let InfoType::HeaderOut = kind {
            // Keep only the last request of a redirect chain.
            self.header_trace.clear();
            self.header_trace.extend_from_slice(data);
        }
    }

    fn progress(&mut self, dltotal: f64, dlnow: f64, ultotal: f64, ulnow: f64) -> bool {
        match &mut self.progress {
            Some(callback) => callback(Progress {
                download_total: dltotal,
                downloaded: dlnow,
                upload_total: ultotal,
                uploaded: ulnow,
            }),
            None => true,
        }
    }
}
