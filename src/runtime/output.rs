// SPDX-License-Identifier: MIT

//! Draining the engine's combined output stream.
//!
//! Every engine gets a relay thread that reads its stdout/stderr pipe to the
//! end, logging each line under the `engine` target.  A caller that wants the
//! raw bytes takes an [`OutputReader`], which the relay feeds alongside the
//! log.

use std::io::{self, Read};
use std::sync::mpsc::{Receiver, Sender, channel};

use tracing::info;

/// Lines longer than this are logged in pieces.
const MAX_LINE: usize = 8 * 1024;

/// The sending half of an output tap, bound to one engine once it is known.
#[derive(Debug)]
pub(crate) struct OutputTap {
    tx: Sender<Vec<u8>>,
    generation: Option<u64>,
}

impl OutputTap {
    pub(crate) fn new() -> (OutputTap, OutputReader) {
        let (tx, rx) = channel();
        let reader = OutputReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        };
        (
            OutputTap {
                tx,
                generation: None,
            },
            reader,
        )
    }

    /// Attach to an engine, unless already attached.
    pub(crate) fn bind(&mut self, generation: u64) {
        self.generation.get_or_insert(generation);
    }

    pub(crate) fn is_for(&self, generation: u64) -> bool {
        self.generation == Some(generation)
    }

    /// Forward a chunk.  Returns false once the reader is gone.
    pub(crate) fn send(&self, chunk: &[u8]) -> bool {
        self.tx.send(chunk.to_vec()).is_ok()
    }

    /// Whether the reader still exists.
    pub(crate) fn is_open(&self) -> bool {
        self.tx.send(Vec::new()).is_ok()
    }
}

/// Raw bytes of one engine's combined stdout and stderr.
///
/// Reaches end-of-file when that engine's stream closes.  Output is buffered
/// without bound until read.
#[derive(Debug)]
pub struct OutputReader {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for OutputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.chunk.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Read `source` to the end, passing every chunk to `forward` and logging
/// every line.
pub(crate) fn relay(mut source: impl Read, mut forward: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buf = [0u8; 8 * 1024];
    let mut line = Vec::new();
    let res = loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => break Err(err),
        };
        let chunk = &buf[..n];
        forward(chunk);
        for piece in chunk.split_inclusive(|b| *b == b'\n') {
            line.extend_from_slice(piece);
            if line.ends_with(b"\n") || line.len() >= MAX_LINE {
                log_line(&line);
                line.clear();
            }
        }
    };
    if !line.is_empty() {
        log_line(&line);
    }
    res
}

fn log_line(line: &[u8]) {
    let text = String::from_utf8_lossy(line);
    info!(target: "engine", "{}", text.trim_end_matches(['\r', '\n']));
}
