//! The handshake state machine: message ordering, transcript hash, and the
//! per-connection context both driver sides share.
//!
//! Grounded in the `eloff-rustls` `client/hs.rs` state machine this pack
//! retrieved -- a `State`/`NextState` chain threading a handshake hash and a
//! `HandshakeContext`-like struct through each message -- generalized from
//! rustls's full handshake down to the key-exchange-only slice spec.md
//! scopes this core to. Unlike that driver this core has exactly one input
//! message type per round (`ClientHelloKx`), so the two sides are plain
//! structs with a `HandshakeState` field rather than a chain of boxed
//! per-state types: the match arms in `client.rs`/`server.rs` already carry
//! the same branching a `Box<dyn State>` indirection would, without
//! duplicating the method signature for every state.

pub mod client;
pub mod messages;
pub mod server;
mod transcript;

use std::collections::HashMap;

use crate::capability::CapabilityProbe;
use crate::crypto::CryptoCollaborator;
use crate::error::Error;
use crate::keyshare::{OfferedCurveShare, OfferedKeyShare};
use crate::logging::trace;
use crate::policy::PreferenceSet;
use crate::select::Selected;
use transcript::TranscriptHash;
use zeroize::Zeroizing;

pub use client::ClientHandshake;
pub use messages::{ClientHelloKx, HelloRetryRequestKx, KeyShareEntry, ServerHelloKx};
pub use server::{ServerHandshake, ServerHandshakeStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// States from spec.md §4.4's diagram. The abbreviated `... (EE, Cert, Fin)`
/// tail collapses to a single `EncryptedExtensions` state: this core derives
/// handshake secrets and stops: everything after that point is out of scope
/// (spec.md §1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    ExpectClientHello,
    SendClientHello,
    Selecting,
    SendHelloRetryRequest,
    ExpectClientHello2,
    Selecting2,
    SendServerHello,
    ExpectServerHelloOrHelloRetryRequest,
    DeriveHandshakeSecrets,
    EncryptedExtensions,
    ApplicationData,
    Aborted,
}

/// `handshake_type_flags` per spec.md §3/§9: a plain bitset rather than a
/// second state dimension, so "did an HRR happen?" stays O(1) and the state
/// enum above doesn't double in size. No `bitflags` dependency for two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandshakeTypeFlags(u8);

impl HandshakeTypeFlags {
    pub const INITIAL: Self = Self(0b01);
    pub const HELLO_RETRY_REQUEST: Self = Self(0b10);

    pub fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }
}

/// The three secrets spec.md §4.5/§8 requires to be byte-equal and non-zero
/// on both peers after a successful handshake.
pub struct DerivedSecrets {
    pub extract_secret: Zeroizing<Vec<u8>>,
    pub client_handshake_secret: Zeroizing<Vec<u8>>,
    pub server_handshake_secret: Zeroizing<Vec<u8>>,
}

/// A key share this side generated and is still waiting to complete.
/// Only ever populated on the client, which must hold its ephemeral private
/// key across the gap between sending ClientHello and receiving either a
/// HelloRetryRequest or a ServerHello; the server completes its half of the
/// exchange synchronously within a single `receive_client_hello` call, so it
/// never needs to park one of these.
enum OurOffer<C: CryptoCollaborator> {
    Hybrid(OfferedKeyShare<C>),
    Classical(OfferedCurveShare<C>),
}

/// Per-connection state, owned exclusively by one handshake driver for its
/// lifetime (spec.md §5). No custom `Drop` impl is needed to satisfy the
/// "secret-bearing memory must be explicitly overwritten" rule: every field
/// that holds a secret is either a `Zeroizing<Vec<u8>>` (`DerivedSecrets`) or
/// a crypto-provider private-key type that zeroes itself on drop already
/// (`aws-lc-rs`'s `agreement::PrivateKey` and KEM decapsulation key both do
/// this internally); `peer_key_shares`/`peer_offered_groups` hold only
/// public wire material, which needs no zeroing.
pub struct HandshakeContext<C: CryptoCollaborator> {
    role: Role,
    state: HandshakeState,
    handshake_type_flags: HandshakeTypeFlags,
    local_prefs: PreferenceSet,
    peer_offered_groups: Vec<u16>,
    peer_key_shares: HashMap<u16, Vec<u8>>,
    negotiated: Option<Selected>,
    cipher_suite: u16,
    probe: CapabilityProbe,
    crypto: C,
    transcript: TranscriptHash,
    our_offer: Option<OurOffer<C>>,
    derived: Option<DerivedSecrets>,
}

impl<C: CryptoCollaborator> HandshakeContext<C> {
    fn new(role: Role, local_prefs: PreferenceSet, crypto: C, probe: CapabilityProbe) -> Self {
        let state = match role {
            Role::Client => HandshakeState::SendClientHello,
            Role::Server => HandshakeState::ExpectClientHello,
        };
        Self {
            role,
            state,
            handshake_type_flags: HandshakeTypeFlags::default(),
            local_prefs,
            peer_offered_groups: Vec::new(),
            peer_key_shares: HashMap::new(),
            negotiated: None,
            cipher_suite: 0,
            probe,
            crypto,
            transcript: TranscriptHash::new(),
            our_offer: None,
            derived: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn handshake_type_flags(&self) -> HandshakeTypeFlags {
        self.handshake_type_flags
    }

    /// Set the cipher suite id this connection is carrying. This core does
    /// not negotiate or validate it (spec.md §3: "opaque... does not
    /// validate or select it"); callers record whatever their own cipher
    /// suite negotiation decided.
    pub fn set_cipher_suite(&mut self, cipher_suite: u16) {
        self.cipher_suite = cipher_suite;
    }

    pub fn cipher_suite(&self) -> u16 {
        self.cipher_suite
    }

    /// Non-empty iff a hybrid group was negotiated.
    pub fn kem_group_name(&self) -> &'static str {
        self.negotiated.as_ref().map_or("", Selected::kem_group_name)
    }

    /// Non-empty iff a classical curve was negotiated.
    pub fn curve_name(&self) -> &'static str {
        self.negotiated.as_ref().map_or("", Selected::curve_name)
    }

    /// Whichever of the two is active, unified.
    pub fn key_exchange_group_name(&self) -> &'static str {
        self.negotiated.as_ref().map_or("", Selected::key_exchange_group_name)
    }

    pub fn negotiated(&self) -> Option<Selected> {
        self.negotiated
    }

    pub fn derived_secrets(&self) -> Option<&DerivedSecrets> {
        self.derived.as_ref()
    }

    /// The ids this side's own preference lists carry, KEM groups first, in
    /// priority order, with KEM groups this side's own crypto collaborator
    /// can't actually run (per `self.probe`) dropped. This is what goes on
    /// the wire as `supported_groups` and what the client eagerly offers a
    /// key share from: listing, or eagerly generating a share for, a group
    /// we can't ourselves run would turn `Error::Unavailable` into a
    /// mid-handshake failure instead of the configuration-time one it's
    /// meant to be (see `registry::KemGroup::is_available`). Curves have no
    /// availability predicate in this registry, so they pass through
    /// unfiltered.
    fn available_group_ids(&self) -> Vec<u16> {
        self.local_prefs
            .kem_groups
            .iter()
            .filter(|g| g.is_available(&self.probe))
            .map(|g| g.iana_id)
            .chain(self.local_prefs.curves.iter().map(|c| c.iana_id))
            .collect()
    }

    fn record_peer_client_hello(&mut self, ch: &ClientHelloKx) {
        self.peer_offered_groups = ch.supported_groups.clone();
        self.peer_key_shares.clear();
        for share in &ch.key_shares {
            self.peer_key_shares.insert(share.group_id, share.payload.clone());
        }
        self.transcript.update(&messages::transcript_bytes_client_hello(ch));
    }

    fn record_sent_client_hello(&mut self, ch: &ClientHelloKx) {
        self.transcript.update(&messages::transcript_bytes_client_hello(ch));
    }

    fn record_hello_retry_request(&mut self, hrr: &HelloRetryRequestKx) {
        self.transcript.update(&messages::transcript_bytes_hrr(hrr));
    }

    fn record_server_hello(&mut self, sh: &ServerHelloKx) {
        self.transcript.update(&messages::transcript_bytes_server_hello(sh));
    }

    /// TLS 1.3 key-schedule shape (RFC 8446 §7.1), specialized to this
    /// core's scope: no PSK, so the early secret is `HKDF-Extract(0, 0)`.
    /// `combined_secret` is the `(EC)DHE` input the key-share exchanger
    /// produced (classical-then-PQ concatenation, or plain ECDHE).
    fn derive_secrets(&mut self, combined_secret: &[u8]) -> Result<(), Error> {
        let zero_ikm = vec![0u8; 32];
        let early_secret = self.crypto.hkdf_extract(&[], &zero_ikm);

        let mut derived_salt = vec![0u8; 32];
        self.crypto.hkdf_expand_label(
            &early_secret,
            b"derived",
            &transcript::empty_transcript_hash(),
            &mut derived_salt,
        )?;

        let extract_secret = self.crypto.hkdf_extract(&derived_salt, combined_secret);

        let running_hash = self.transcript.current();
        let mut client_handshake_secret = vec![0u8; 32];
        self.crypto
            .hkdf_expand_label(&extract_secret, b"c hs traffic", &running_hash, &mut client_handshake_secret)?;
        let mut server_handshake_secret = vec![0u8; 32];
        self.crypto
            .hkdf_expand_label(&extract_secret, b"s hs traffic", &running_hash, &mut server_handshake_secret)?;

        self.derived = Some(DerivedSecrets {
            extract_secret,
            client_handshake_secret: Zeroizing::new(client_handshake_secret),
            server_handshake_secret: Zeroizing::new(server_handshake_secret),
        });
        self.state = HandshakeState::DeriveHandshakeSecrets;
        trace!("{:?}: derived handshake secrets", self.role);
        Ok(())
    }
}

#[cfg(all(test, feature = "aws-lc-rs"))]
mod tests;
