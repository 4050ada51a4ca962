//! Running transcript hash. Per spec.md §5, this is the only thing that
//! enforces message ordering within a connection; it is extended once per
//! logical message, in the order the state machine processes them.

use aws_lc_rs::digest;

pub(crate) struct TranscriptHash(digest::Context);

impl TranscriptHash {
    pub(crate) fn new() -> Self {
        Self(digest::Context::new(&digest::SHA256))
    }

    pub(crate) fn update(&mut self, message: &[u8]) {
        self.0.update(message);
    }

    /// The running hash value so far, without consuming the context.
    pub(crate) fn current(&self) -> Vec<u8> {
        self.0.clone().finish().as_ref().to_vec()
    }
}

/// `Derive-Secret`'s zero-length-transcript special case (used for the
/// "derived" intermediate secret between early- and handshake-secret).
pub(crate) fn empty_transcript_hash() -> Vec<u8> {
    digest::digest(&digest::SHA256, &[]).as_ref().to_vec()
}
