//! Per-chunk payload interpretation for the streamed chat body.
//!
//! The backend streams either bare text fragments or JSON envelopes of the
//! shape `{"result":{"output":{"text": "..."}}}`, depending on revision.
//! Each chunk is tried as an envelope first; anything that does not parse
//! is taken as plain text. Multi-byte UTF-8 sequences split across chunk
//! boundaries are carried over to the next chunk instead of being mangled.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChunkEnvelope {
    result: EnvelopeResult,
}

#[derive(Debug, Deserialize)]
struct EnvelopeResult {
    output: EnvelopeOutput,
}

#[derive(Debug, Deserialize)]
struct EnvelopeOutput {
    text: String,
}

/// Assembles the streamed reply text chunk by chunk.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    text: String,
    carry: Vec<u8>,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text assembled so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Feed one chunk; returns the fragment this chunk appended.
    pub fn push(&mut self, chunk: &[u8]) -> &str {
        let start = self.text.len();

        // Envelope parsing only applies on a clean boundary; mid-sequence
        // bytes mean the stream already committed to plain text.
        if self.carry.is_empty() {
            if let Ok(envelope) = serde_json::from_slice::<ChunkEnvelope>(chunk) {
                self.text.push_str(&envelope.result.output.text);
                return &self.text[start..];
            }
        }

        self.carry.extend_from_slice(chunk);
        self.drain_carry();
        &self.text[start..]
    }

    /// Stream finished: flush any incomplete trailing sequence.
    pub fn finish(&mut self) -> &str {
        if !self.carry.is_empty() {
            let tail = String::from_utf8_lossy(&self.carry).into_owned();
            self.text.push_str(&tail);
            self.carry.clear();
        }
        &self.text
    }

    fn drain_carry(&mut self) {
        loop {
            match std::str::from_utf8(&self.carry) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.carry.clear();
                    return;
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    let valid = std::str::from_utf8(&self.carry[..valid_len])
                        .expect("validated utf-8 prefix");
                    self.text.push_str(valid);
                    match err.error_len() {
                        // Genuinely invalid bytes: replace and move on.
                        Some(bad_len) => {
                            self.text.push('\u{FFFD}');
                            self.carry.drain(..valid_len + bad_len);
                        }
                        // Incomplete sequence at the tail: wait for the
                        // next chunk.
                        None => {
                            self.carry.drain(..valid_len);
                            return;
                        }
                    }
                }
            }
        }
    }
}
