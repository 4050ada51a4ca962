//! Serialized-connection blob: the fixed-size wire format spec.md §6
//! describes for handing a completed connection's record-layer state to
//! another process (a warm handoff, not session resumption -- that's out of
//! scope per spec.md §1).
//!
//! This core does not track sequence numbers or negotiate cipher suites
//! itself (record-layer framing is an external collaborator, spec.md §1);
//! this module only defines the layout and encodes/decodes whatever the
//! caller supplies for those fields. The one thing it does own is the
//! negotiated protocol version/cipher suite identity recorded on
//! [`crate::handshake::HandshakeContext`], which [`ConnectionBlob::for_context`]
//! reads directly so callers can't encode a blob that disagrees with what
//! this core actually negotiated.
//!
//! Layout, matching spec.md §6 literally: a 30-byte fixed prefix (6-byte
//! magic + 2-byte format version, then 2-byte protocol version + 2-byte
//! cipher suite id + two 8-byte sequence numbers + a 2-byte tag), followed
//! by an optional TLS-1.2 extension (48-byte master secret + two 32-byte
//! randoms) when the tag indicates one is present.

use crate::error::Error;
use zeroize::Zeroizing;

const MAGIC: [u8; 6] = *b"PQKEXC";
const FORMAT_VERSION: u16 = 1;
const FIXED_PREFIX_LEN: usize = 6 + 2 + 2 + 2 + 8 + 8 + 2;
const TLS12_EXT_LEN: usize = 48 + 32 + 32;

const TAG_NO_EXTENSION: u16 = 0x0001;
const TAG_TLS12_EXTENSION: u16 = 0x0002;

/// The TLS-1.2-only tail of the blob: a master secret plus both peers'
/// randoms, needed to resume decrypting a TLS 1.2 connection elsewhere.
/// Absent entirely for a TLS 1.3 connection, which has no single static
/// master secret to export this way.
pub struct Tls12Extension {
    pub master_secret: Zeroizing<[u8; 48]>,
    pub client_random: [u8; 32],
    pub server_random: [u8; 32],
}

/// A serialized connection: the fixed prefix plus an optional TLS-1.2
/// extension. Construct via [`ConnectionBlob::for_context`] (TLS 1.3, the
/// normal case for this core) or directly (for TLS 1.2 callers attaching
/// their own master secret).
pub struct ConnectionBlob {
    pub protocol_version: u16,
    pub cipher_suite: u16,
    pub read_seq: u64,
    pub write_seq: u64,
    pub tls12_ext: Option<Tls12Extension>,
}

/// IANA-registered `ProtocolVersion` value for TLS 1.3.
pub const TLS13_PROTOCOL_VERSION: u16 = 0x0304;

impl ConnectionBlob {
    /// Build a blob for a completed TLS 1.3 [`crate::handshake::HandshakeContext`].
    /// `read_seq`/`write_seq` are the caller's record-layer sequence numbers;
    /// this core has no notion of them itself.
    #[cfg(feature = "aws-lc-rs")]
    pub fn for_context<C: crate::crypto::CryptoCollaborator>(
        ctx: &crate::handshake::HandshakeContext<C>,
        read_seq: u64,
        write_seq: u64,
    ) -> Self {
        Self {
            protocol_version: TLS13_PROTOCOL_VERSION,
            cipher_suite: ctx.cipher_suite(),
            read_seq,
            write_seq,
            tls12_ext: None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIXED_PREFIX_LEN + TLS12_EXT_LEN);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        out.extend_from_slice(&self.protocol_version.to_be_bytes());
        out.extend_from_slice(&self.cipher_suite.to_be_bytes());
        out.extend_from_slice(&self.read_seq.to_be_bytes());
        out.extend_from_slice(&self.write_seq.to_be_bytes());

        let tag = if self.tls12_ext.is_some() {
            TAG_TLS12_EXTENSION
        } else {
            TAG_NO_EXTENSION
        };
        out.extend_from_slice(&tag.to_be_bytes());

        if let Some(ext) = &self.tls12_ext {
            out.extend_from_slice(ext.master_secret.as_ref());
            out.extend_from_slice(&ext.client_random);
            out.extend_from_slice(&ext.server_random);
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < FIXED_PREFIX_LEN {
            return Err(Error::DecodeError("connection blob shorter than fixed prefix"));
        }
        let (magic, rest) = bytes.split_at(6);
        if magic != MAGIC {
            return Err(Error::DecodeError("connection blob magic mismatch"));
        }
        let (version, rest) = rest.split_at(2);
        if u16::from_be_bytes([version[0], version[1]]) != FORMAT_VERSION {
            return Err(Error::DecodeError("unsupported connection blob format version"));
        }
        let (pv, rest) = rest.split_at(2);
        let protocol_version = u16::from_be_bytes([pv[0], pv[1]]);
        let (cs, rest) = rest.split_at(2);
        let cipher_suite = u16::from_be_bytes([cs[0], cs[1]]);
        let (rseq, rest) = rest.split_at(8);
        let read_seq = u64::from_be_bytes(rseq.try_into().expect("split_at(8) yields 8 bytes"));
        let (wseq, rest) = rest.split_at(8);
        let write_seq = u64::from_be_bytes(wseq.try_into().expect("split_at(8) yields 8 bytes"));
        let (tag, rest) = rest.split_at(2);
        let tag = u16::from_be_bytes([tag[0], tag[1]]);

        let tls12_ext = match tag {
            TAG_NO_EXTENSION => {
                if !rest.is_empty() {
                    return Err(Error::DecodeError("trailing bytes after untagged connection blob"));
                }
                None
            }
            TAG_TLS12_EXTENSION => {
                if rest.len() != TLS12_EXT_LEN {
                    return Err(Error::DecodeError("tls1.2 extension has wrong length"));
                }
                let (ms, rest) = rest.split_at(48);
                let (cr, sr) = rest.split_at(32);
                let mut master_secret = [0u8; 48];
                master_secret.copy_from_slice(ms);
                let mut client_random = [0u8; 32];
                client_random.copy_from_slice(cr);
                let mut server_random = [0u8; 32];
                server_random.copy_from_slice(sr);
                Some(Tls12Extension {
                    master_secret: Zeroizing::new(master_secret),
                    client_random,
                    server_random,
                })
            }
            _ => return Err(Error::DecodeError("unrecognized connection blob tag")),
        };

        Ok(Self {
            protocol_version,
            cipher_suite,
            read_seq,
            write_seq,
            tls12_ext,
        })
    }
}
