//! Server side of the handshake: selects a group or curve against the
//! client's advertised preferences, optionally emits a HelloRetryRequest,
//! and completes the exchange synchronously once a key share is in hand.

use crate::capability::CapabilityProbe;
use crate::crypto::CryptoCollaborator;
use crate::error::{Error, PeerMisbehaved};
use crate::keyshare::{self, WireFormat};
use crate::logging::{debug, trace};
use crate::policy::PreferenceSet;
use crate::select::{self, Selected};

use super::{
    messages, ClientHelloKx, HandshakeContext, HandshakeState, HandshakeTypeFlags, HelloRetryRequestKx, KeyShareEntry,
    Role, ServerHelloKx,
};

pub struct ServerHandshake<C: CryptoCollaborator> {
    ctx: HandshakeContext<C>,
}

/// What a caller should do after feeding a ClientHello to
/// [`ServerHandshake::receive_client_hello`].
pub enum ServerHandshakeStep {
    /// Emit this HelloRetryRequest, then call `receive_client_hello` again
    /// with the client's second ClientHello.
    SendHelloRetryRequest(HelloRetryRequestKx),
    /// Emit this ServerHello. Handshake secrets are already derived;
    /// `ctx.derived_secrets()` is populated.
    SendServerHello(ServerHelloKx),
}

impl<C: CryptoCollaborator> ServerHandshake<C> {
    pub fn new(local_prefs: PreferenceSet, crypto: C, probe: CapabilityProbe) -> Self {
        Self {
            ctx: HandshakeContext::new(Role::Server, local_prefs, crypto, probe),
        }
    }

    pub fn context(&self) -> &HandshakeContext<C> {
        &self.ctx
    }

    /// Process a ClientHello, whichever round it is: `ExpectClientHello`
    /// for the first, `ExpectClientHello2` for the one following our own
    /// HelloRetryRequest. Any other state is caller error.
    pub fn receive_client_hello(&mut self, ch: ClientHelloKx) -> Result<ServerHandshakeStep, Error> {
        match self.ctx.state {
            HandshakeState::ExpectClientHello => self.handle_first(ch),
            HandshakeState::ExpectClientHello2 => self.handle_second(ch),
            _ => Err(Error::CryptoFailure),
        }
    }

    fn handle_first(&mut self, ch: ClientHelloKx) -> Result<ServerHandshakeStep, Error> {
        self.ctx.record_peer_client_hello(&ch);
        self.ctx.state = HandshakeState::Selecting;

        let peer_prefs = messages::peer_preference_set(&ch);
        let share_ids = messages::key_share_ids(&ch);
        let (selected, requires_hrr) = select::select(&self.ctx.local_prefs, &peer_prefs, &share_ids, &self.ctx.probe)?;
        self.ctx.negotiated = Some(selected);

        if requires_hrr {
            debug!("server: requiring HelloRetryRequest for {}", selected.key_exchange_group_name());
            self.ctx.handshake_type_flags.insert(HandshakeTypeFlags::HELLO_RETRY_REQUEST);
            self.ctx.state = HandshakeState::SendHelloRetryRequest;
            let hrr = HelloRetryRequestKx {
                selected_group: selected.group_id(),
            };
            self.ctx.record_hello_retry_request(&hrr);
            self.ctx.state = HandshakeState::ExpectClientHello2;
            return Ok(ServerHandshakeStep::SendHelloRetryRequest(hrr));
        }

        trace!("server: 1-RTT selection of {}", selected.key_exchange_group_name());
        self.ctx.state = HandshakeState::SendServerHello;
        let sh = self.complete_and_respond(&ch, selected)?;
        Ok(ServerHandshakeStep::SendServerHello(sh))
    }

    fn handle_second(&mut self, ch: ClientHelloKx) -> Result<ServerHandshakeStep, Error> {
        self.ctx.record_peer_client_hello(&ch);
        let selected = self
            .ctx
            .negotiated
            .expect("a group was selected before entering ExpectClientHello2");

        // spec.md §4.4: the state machine does not loop. A second
        // ClientHello still missing a share for the indicated group is
        // fatal, not a second HelloRetryRequest.
        if !messages::key_share_ids(&ch).contains(&selected.group_id()) {
            debug!("server: second ClientHello still missing a key share for 0x{:04x}, aborting", selected.group_id());
            self.ctx.state = HandshakeState::Aborted;
            return Err(Error::PeerMisbehaved(PeerMisbehaved::MissingKeyShareAfterHelloRetryRequest));
        }

        self.ctx.state = HandshakeState::SendServerHello;
        let sh = self.complete_and_respond(&ch, selected)?;
        Ok(ServerHandshakeStep::SendServerHello(sh))
    }

    fn complete_and_respond(&mut self, ch: &ClientHelloKx, selected: Selected) -> Result<ServerHelloKx, Error> {
        let (our_share, secret) = match selected {
            Selected::Hybrid { group, len_prefixed } => {
                let format = WireFormat::from_len_prefixed(len_prefixed);
                let payload = messages::find_share(ch, group.iana_id)
                    .ok_or(Error::PeerMisbehaved(PeerMisbehaved::MissingKeyShareAfterHelloRetryRequest))?;
                let (our_payload, secret) = keyshare::respond(group, format, payload, &self.ctx.crypto)?;
                (
                    KeyShareEntry {
                        group_id: group.iana_id,
                        payload: our_payload,
                    },
                    secret,
                )
            }
            Selected::Classical { curve } => {
                let payload = messages::find_share(ch, curve.iana_id)
                    .ok_or(Error::PeerMisbehaved(PeerMisbehaved::MissingKeyShareAfterHelloRetryRequest))?;
                let (our_pub, secret) = keyshare::respond_classical(curve, payload, &self.ctx.crypto)?;
                (
                    KeyShareEntry {
                        group_id: curve.iana_id,
                        payload: our_pub,
                    },
                    secret,
                )
            }
        };

        let sh = ServerHelloKx { key_share: our_share };
        self.ctx.record_server_hello(&sh);
        self.ctx.derive_secrets(&secret)?;
        self.ctx.state = HandshakeState::EncryptedExtensions;
        debug!("server: handshake complete, negotiated {}", self.ctx.key_exchange_group_name());
        Ok(sh)
    }
}
