//! Minimal logical representations of the handshake messages this core
//! reads and writes. Record-layer framing is out of scope (spec.md §1), so
//! these carry only the fields the negotiation state machine cares about --
//! not full ClientHello/ServerHello structures.

use crate::policy::{PreferenceSet, TlsVersion};
use crate::registry;

#[derive(Debug, Clone)]
pub struct KeyShareEntry {
    pub group_id: u16,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ClientHelloKx {
    /// Both curve and KEM-group ids, in the client's priority order.
    pub supported_groups: Vec<u16>,
    pub key_shares: Vec<KeyShareEntry>,
    pub hybrid_draft_revision: u8,
}

#[derive(Debug, Clone)]
pub struct HelloRetryRequestKx {
    pub selected_group: u16,
}

#[derive(Debug, Clone)]
pub struct ServerHelloKx {
    pub key_share: KeyShareEntry,
}

/// Reconstruct the peer's advertised preferences from `supported_groups`,
/// looking each id up against the static catalog. An id neither list
/// recognizes is dropped silently -- an unknown codepoint alone is never a
/// protocol violation.
pub(crate) fn peer_preference_set(ch: &ClientHelloKx) -> PreferenceSet {
    let mut kem_groups = Vec::new();
    let mut curves = Vec::new();
    for &id in &ch.supported_groups {
        if let Some(group) = registry::all_groups().iter().find(|g| g.iana_id == id) {
            kem_groups.push(*group);
        } else if let Some(curve) = registry::all_curves().iter().find(|c| c.iana_id == id) {
            curves.push(*curve);
        }
    }
    PreferenceSet::new(kem_groups, curves, ch.hybrid_draft_revision, TlsVersion::Tls13)
}

pub(crate) fn key_share_ids(ch: &ClientHelloKx) -> Vec<u16> {
    ch.key_shares.iter().map(|k| k.group_id).collect()
}

pub(crate) fn find_share<'a>(ch: &'a ClientHelloKx, group_id: u16) -> Option<&'a [u8]> {
    ch.key_shares
        .iter()
        .find(|k| k.group_id == group_id)
        .map(|k| k.payload.as_slice())
}

/// Transcript input for a ClientHello. Both peers hash these same bytes for
/// the same logical message, which is all the integrity property in
/// spec.md §5 actually requires -- it doesn't need to be the real TLS wire
/// encoding, since record-layer framing is out of scope.
pub(crate) fn transcript_bytes_client_hello(ch: &ClientHelloKx) -> Vec<u8> {
    let mut out = vec![b'C'];
    for id in &ch.supported_groups {
        out.extend_from_slice(&id.to_be_bytes());
    }
    out.push(0xff);
    for share in &ch.key_shares {
        out.extend_from_slice(&share.group_id.to_be_bytes());
        out.extend_from_slice(&(share.payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&share.payload);
    }
    out.push(ch.hybrid_draft_revision);
    out
}

pub(crate) fn transcript_bytes_hrr(hrr: &HelloRetryRequestKx) -> Vec<u8> {
    let mut out = vec![b'H'];
    out.extend_from_slice(&hrr.selected_group.to_be_bytes());
    out
}

pub(crate) fn transcript_bytes_server_hello(sh: &ServerHelloKx) -> Vec<u8> {
    let mut out = vec![b'S'];
    out.extend_from_slice(&sh.key_share.group_id.to_be_bytes());
    out.extend_from_slice(&(sh.key_share.payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&sh.key_share.payload);
    out
}
