use core::fmt;

/// TLS alert description a given [`Error`] should result in on the wire.
///
/// Kept as a plain mirror of the subset of `AlertDescription` this core
/// cares about, rather than pulling in a full alert-registry crate for five
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDescription {
    HandshakeFailure,
    IllegalParameter,
    DecodeError,
    InternalError,
}

/// Why a peer is considered to have misbehaved.
///
/// Split out from [`Error`] the same way `rustls::PeerMisbehaved` is split
/// out from `rustls::Error` in the upstream crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerMisbehaved {
    /// Peer sent a key share for a group it did not list in its preferences.
    KeyShareForUnofferedGroup,
    /// After a HelloRetryRequest, the second ClientHello still lacks a key
    /// share for the group the server indicated.
    MissingKeyShareAfterHelloRetryRequest,
    /// Second ClientHello's selected group disagrees with what the server
    /// requested in the HelloRetryRequest.
    InconsistentSecondOffer,
    /// HelloRetryRequest asked for no change at all.
    HelloRetryRequestWithNoChanges,
}

/// All errors this negotiation core can produce.
///
/// All variants are fatal to the handshake: the owning state machine
/// transitions to `Aborted`, secrets held by the context are zeroed, and the
/// caller is expected to have sent (or is told to send) the paired TLS alert
/// before tearing the connection down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The selection engine found no group or curve common to both peers.
    NoMutualGroup,
    /// The peer violated a protocol invariant.
    PeerMisbehaved(PeerMisbehaved),
    /// A key-share payload could not be decoded in the negotiated wire
    /// format (e.g. length-prefixed expected but concatenated received, or a
    /// length prefix overflowed the remaining payload).
    DecodeError(&'static str),
    /// The underlying crypto collaborator reported failure (malformed KEM
    /// ciphertext, ECDH point not on curve, RNG failure, ...).
    ///
    /// Per ML-KEM decapsulation-failure hygiene this is deliberately as
    /// uninformative as `NoMutualGroup` is informative: callers must not
    /// let this be distinguishable on the wire from any other failure
    /// before MAC verification, so it carries no peer-observable detail.
    CryptoFailure,
    /// A caller asked to use a group or curve whose runtime availability
    /// probe returned `false`. Raised at configuration time, never from
    /// inside a running handshake.
    Unavailable(&'static str),
}

impl Error {
    /// The TLS alert a caller should dispatch on the wire for this error.
    ///
    /// `Unavailable` has no alert: it's a configuration-time error, never
    /// seen by a peer.
    pub fn alert(&self) -> Option<AlertDescription> {
        match self {
            Error::NoMutualGroup => Some(AlertDescription::HandshakeFailure),
            Error::PeerMisbehaved(_) => Some(AlertDescription::IllegalParameter),
            Error::DecodeError(_) => Some(AlertDescription::DecodeError),
            Error::CryptoFailure => Some(AlertDescription::InternalError),
            Error::Unavailable(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoMutualGroup => write!(f, "no mutually supported key-exchange group"),
            Error::PeerMisbehaved(why) => write!(f, "peer misbehaved: {why:?}"),
            Error::DecodeError(why) => write!(f, "key-share decode error: {why}"),
            Error::CryptoFailure => write!(f, "crypto provider operation failed"),
            Error::Unavailable(group) => write!(f, "{group} is not available in this build"),
        }
    }
}

impl std::error::Error for Error {}
