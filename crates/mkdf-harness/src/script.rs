//! Scripted byte transport for single-threaded device tests.

use std::collections::VecDeque;

use mkdf_signer::ByteTransport;
use thiserror::Error;

/// The script ran out of input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("transport script exhausted")]
pub struct ScriptExhausted;

/// Transport fed from a byte queue.
///
/// Every queued byte is delivered on the first poll; once the queue is
/// empty, polls fail with [`ScriptExhausted`], which ends
/// [`Device::run`](mkdf_signer::Device::run). Everything the device writes
/// is collected for inspection.
#[derive(Debug, Default, Clone)]
pub struct ScriptTransport {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl ScriptTransport {
    /// Transport that will deliver `input`.
    pub fn new(input: &[u8]) -> Self {
        Self { input: input.iter().copied().collect(), output: Vec::new() }
    }

    /// Queue more input.
    pub fn push(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Input not yet consumed by the device
    pub fn pending(&self) -> usize {
        self.input.len()
    }

    /// Everything written so far
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Take the output written so far, leaving it empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl ByteTransport for ScriptTransport {
    type Error = ScriptExhausted;

    fn poll_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        self.input.pop_front().map(Some).ok_or(ScriptExhausted)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.output.push(byte);
        Ok(())
    }
}
