//! Client side of the handshake: sends the first ClientHello, optionally
//! regenerates a single key share and resends after a HelloRetryRequest,
//! and completes the exchange on ServerHello.

use crate::capability::CapabilityProbe;
use crate::crypto::CryptoCollaborator;
use crate::error::{Error, PeerMisbehaved};
use crate::keyshare::{OfferedCurveShare, OfferedKeyShare, WireFormat};
use crate::logging::{debug, trace};
use crate::policy::PreferenceSet;
use crate::select::Selected;

use super::{
    ClientHelloKx, HandshakeContext, HandshakeState, HandshakeTypeFlags, HelloRetryRequestKx, KeyShareEntry, OurOffer,
    Role, ServerHelloKx,
};

pub struct ClientHandshake<C: CryptoCollaborator> {
    ctx: HandshakeContext<C>,
}

impl<C: CryptoCollaborator> ClientHandshake<C> {
    pub fn new(local_prefs: PreferenceSet, crypto: C, probe: CapabilityProbe) -> Self {
        Self {
            ctx: HandshakeContext::new(Role::Client, local_prefs, crypto, probe),
        }
    }

    pub fn context(&self) -> &HandshakeContext<C> {
        &self.ctx
    }

    /// Build the first ClientHello: advertise every group/curve we know in
    /// priority order, and eagerly generate a key share only for our single
    /// most-preferred *available* entry -- the 1-RTT fast path is the common
    /// case, and generating a share for every listed group would waste bytes
    /// and CPU on PQ public keys that usually go unused (see `select.rs`).
    /// "Available" is load-bearing here: a group our own crypto collaborator
    /// can't actually run (e.g. a Kyber-r3 entry under `AwsLcCollaborator`,
    /// which only wires up ML-KEM) is skipped rather than eagerly offered,
    /// the same filter `select::select` already applies to the server's own
    /// candidate list.
    pub fn send_client_hello(&mut self) -> Result<ClientHelloKx, Error> {
        if self.ctx.state != HandshakeState::SendClientHello {
            return Err(Error::CryptoFailure);
        }
        let top_choice = self
            .ctx
            .available_group_ids()
            .first()
            .copied()
            .ok_or(Error::NoMutualGroup)?;
        let key_shares = self.offer_group(top_choice)?;

        let ch = ClientHelloKx {
            supported_groups: self.ctx.available_group_ids(),
            key_shares,
            hybrid_draft_revision: self.ctx.local_prefs.hybrid_draft_revision,
        };
        self.ctx.record_sent_client_hello(&ch);
        self.ctx.handshake_type_flags.insert(HandshakeTypeFlags::INITIAL);
        self.ctx.state = HandshakeState::ExpectServerHelloOrHelloRetryRequest;
        trace!("client: sent ClientHello, eagerly offering group 0x{top_choice:04x}");
        Ok(ch)
    }

    /// Regenerate our key share for the group the server indicated and
    /// build the second ClientHello. Per spec.md §4.4, a peer that sends a
    /// second HelloRetryRequest, or one naming a group we never listed, or
    /// one naming the group we already offered a share for, has misbehaved.
    pub fn receive_hello_retry_request(&mut self, hrr: HelloRetryRequestKx) -> Result<ClientHelloKx, Error> {
        if self.ctx.state != HandshakeState::ExpectServerHelloOrHelloRetryRequest {
            return Err(Error::CryptoFailure);
        }
        if self.ctx.handshake_type_flags.contains(HandshakeTypeFlags::HELLO_RETRY_REQUEST) {
            self.ctx.state = HandshakeState::Aborted;
            return Err(Error::PeerMisbehaved(PeerMisbehaved::InconsistentSecondOffer));
        }
        let already_offered = match &self.ctx.our_offer {
            Some(OurOffer::Hybrid(o)) => o.group_id(),
            Some(OurOffer::Classical(o)) => o.curve_id(),
            None => return Err(Error::CryptoFailure),
        };
        if hrr.selected_group == already_offered {
            self.ctx.state = HandshakeState::Aborted;
            return Err(Error::PeerMisbehaved(PeerMisbehaved::HelloRetryRequestWithNoChanges));
        }
        if !self.ctx.available_group_ids().contains(&hrr.selected_group) {
            self.ctx.state = HandshakeState::Aborted;
            return Err(Error::PeerMisbehaved(PeerMisbehaved::InconsistentSecondOffer));
        }

        debug!("client: received HelloRetryRequest, regenerating key share for 0x{:04x}", hrr.selected_group);
        self.ctx.record_hello_retry_request(&hrr);
        self.ctx.handshake_type_flags.insert(HandshakeTypeFlags::HELLO_RETRY_REQUEST);
        self.ctx.our_offer = None; // drops the now-unused offer, zeroizing its private keys

        let key_shares = self.offer_group(hrr.selected_group)?;
        let ch = ClientHelloKx {
            supported_groups: self.ctx.available_group_ids(),
            key_shares,
            hybrid_draft_revision: self.ctx.local_prefs.hybrid_draft_revision,
        };
        self.ctx.record_sent_client_hello(&ch);
        self.ctx.state = HandshakeState::ExpectServerHelloOrHelloRetryRequest;
        Ok(ch)
    }

    /// Complete the exchange against the server's reply: ECDH/KEM-decaps
    /// using whichever offer we have pending, verify the server named the
    /// same group we offered, and derive handshake secrets.
    pub fn receive_server_hello(&mut self, sh: ServerHelloKx) -> Result<(), Error> {
        if self.ctx.state != HandshakeState::ExpectServerHelloOrHelloRetryRequest {
            return Err(Error::CryptoFailure);
        }
        let offer = self.ctx.our_offer.take().ok_or(Error::CryptoFailure)?;
        let len_prefixed = self.ctx.local_prefs.hybrid_draft_revision == 5;

        let (combined, negotiated) = match offer {
            OurOffer::Hybrid(offered) => {
                let group_id = offered.group_id();
                if group_id != sh.key_share.group_id {
                    self.ctx.state = HandshakeState::Aborted;
                    return Err(Error::PeerMisbehaved(PeerMisbehaved::InconsistentSecondOffer));
                }
                let group = *self
                    .ctx
                    .local_prefs
                    .kem_groups
                    .iter()
                    .find(|g| g.iana_id == group_id)
                    .expect("we generated this offer from our own preference list");
                let secret = offered.complete(&sh.key_share.payload, &self.ctx.crypto)?;
                (secret, Selected::Hybrid { group, len_prefixed })
            }
            OurOffer::Classical(offered) => {
                let curve_id = offered.curve_id();
                if curve_id != sh.key_share.group_id {
                    self.ctx.state = HandshakeState::Aborted;
                    return Err(Error::PeerMisbehaved(PeerMisbehaved::InconsistentSecondOffer));
                }
                let curve = *self
                    .ctx
                    .local_prefs
                    .curves
                    .iter()
                    .find(|c| c.iana_id == curve_id)
                    .expect("we generated this offer from our own preference list");
                let secret = offered.complete(&sh.key_share.payload, &self.ctx.crypto)?;
                (secret, Selected::Classical { curve })
            }
        };

        self.ctx.negotiated = Some(negotiated);
        self.ctx.record_server_hello(&sh);
        self.ctx.derive_secrets(&combined)?;
        self.ctx.state = HandshakeState::EncryptedExtensions;
        debug!("client: handshake complete, negotiated {}", negotiated.key_exchange_group_name());
        Ok(())
    }

    fn offer_group(&mut self, group_id: u16) -> Result<Vec<KeyShareEntry>, Error> {
        if let Some(&group) = self.ctx.local_prefs.kem_groups.iter().find(|g| g.iana_id == group_id) {
            let format = WireFormat::from_len_prefixed(self.ctx.local_prefs.hybrid_draft_revision == 5);
            let (offered, payload) = OfferedKeyShare::generate(group, format, &self.ctx.crypto)?;
            self.ctx.our_offer = Some(OurOffer::Hybrid(offered));
            return Ok(vec![KeyShareEntry { group_id, payload }]);
        }
        if let Some(&curve) = self.ctx.local_prefs.curves.iter().find(|c| c.iana_id == group_id) {
            let (offered, payload) = OfferedCurveShare::generate(curve, &self.ctx.crypto)?;
            self.ctx.our_offer = Some(OurOffer::Classical(offered));
            return Ok(vec![KeyShareEntry { group_id, payload }]);
        }
        Err(Error::DecodeError("no local group or curve matches the requested id"))
    }
}
