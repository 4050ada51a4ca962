//! The key-share exchanger: wire encoding of hybrid key shares, and the
//! generate/respond/complete operations that turn a [`Selected`] group into
//! a shared secret.
//!
//! Grounded directly in the teacher crate's `X25519MLKEM768` adapter
//! (`start`/`start_and_complete`/`complete` on `SupportedKxGroup` /
//! `ActiveKeyExchange`) and in the OQS-provider hybrid adapter retrieved
//! alongside it (`tofay-rustls-liboqs`'s `hybrid_component` /
//! `complete_hybrid_component` split): the client side generates an
//! ephemeral ECDH keypair *and* a KEM keypair and sends both public halves;
//! the server ECDHs against the client's public key and KEM-encapsulates
//! against the client's KEM public key; the client finishes by ECDH-ing
//! against the server's public key and KEM-decapsulating the ciphertext.

use crate::error::Error;
use crate::registry::{EcCurve, Kem, KemGroup};
use crate::select::Selected;
use zeroize::Zeroizing;

use crate::crypto::CryptoCollaborator;

/// The two hybrid wire formats spec.md §4.3 distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// draft-0: `ec_share || kem_share`, no lengths.
    Concatenated,
    /// draft-5: `u16_be(len(ec)) || ec_share || u16_be(len(kem)) || kem_share`.
    LengthPrefixed,
}

impl WireFormat {
    pub const fn from_len_prefixed(len_prefixed: bool) -> Self {
        if len_prefixed {
            WireFormat::LengthPrefixed
        } else {
            WireFormat::Concatenated
        }
    }
}

/// Fixed secret-ordering rule from spec.md §4.5: classical half first, PQ
/// half second, never the other way around.
fn combine_secrets(ec_shared: &[u8], kem_shared: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut combined = Vec::with_capacity(ec_shared.len() + kem_shared.len());
    combined.extend_from_slice(ec_shared);
    combined.extend_from_slice(kem_shared);
    Zeroizing::new(combined)
}

fn encode_payload(ec: &[u8], kem: &[u8], format: WireFormat) -> Vec<u8> {
    match format {
        WireFormat::Concatenated => {
            let mut out = Vec::with_capacity(ec.len() + kem.len());
            out.extend_from_slice(ec);
            out.extend_from_slice(kem);
            out
        }
        WireFormat::LengthPrefixed => {
            let mut out = Vec::with_capacity(2 + ec.len() + 2 + kem.len());
            out.extend_from_slice(&(ec.len() as u16).to_be_bytes());
            out.extend_from_slice(ec);
            out.extend_from_slice(&(kem.len() as u16).to_be_bytes());
            out.extend_from_slice(kem);
            out
        }
    }
}

/// Split a received hybrid payload into its classical and PQ components.
///
/// `ec_len`/`kem_len` are the *expected* lengths for the concatenated
/// format (needed because that format carries no explicit lengths at all);
/// they're also used as a sanity check against the length-prefixed format's
/// own embedded lengths.
fn decode_payload<'a>(
    payload: &'a [u8],
    ec_len: usize,
    kem_len: usize,
    format: WireFormat,
) -> Result<(&'a [u8], &'a [u8]), Error> {
    match format {
        WireFormat::Concatenated => {
            if payload.len() != ec_len + kem_len {
                return Err(Error::DecodeError("concatenated hybrid payload has wrong length"));
            }
            Ok(payload.split_at(ec_len))
        }
        WireFormat::LengthPrefixed => {
            if payload.len() < 2 {
                return Err(Error::DecodeError("length-prefixed payload truncated before ec length"));
            }
            let (ec_len_bytes, rest) = payload.split_at(2);
            let claimed_ec_len = u16::from_be_bytes([ec_len_bytes[0], ec_len_bytes[1]]) as usize;
            if claimed_ec_len != ec_len || rest.len() < claimed_ec_len + 2 {
                return Err(Error::DecodeError("length-prefixed payload ec length mismatch"));
            }
            let (ec, rest) = rest.split_at(claimed_ec_len);
            let (kem_len_bytes, kem) = rest.split_at(2);
            let claimed_kem_len = u16::from_be_bytes([kem_len_bytes[0], kem_len_bytes[1]]) as usize;
            if claimed_kem_len != kem_len || kem.len() != claimed_kem_len {
                return Err(Error::DecodeError("length-prefixed payload kem length mismatch"));
            }
            Ok((ec, kem))
        }
    }
}

/// A key share this side generated and is waiting to complete, plus
/// whatever we need to finish the exchange once the peer's payload
/// arrives.
pub struct OfferedKeyShare<C: CryptoCollaborator> {
    group: KemGroup,
    format: WireFormat,
    ec_priv: C::EcdhPriv,
    kem_priv: C::KemPriv,
}

impl<C: CryptoCollaborator> OfferedKeyShare<C> {
    /// The group this offer was generated for, so a driver can check the
    /// peer's reply names the same group without holding onto a second copy
    /// of it.
    pub(crate) fn group_id(&self) -> u16 {
        self.group.iana_id
    }

    /// Generate a fresh hybrid key share for `group`, as the client does
    /// when building its first (or post-HRR) ClientHello, or as the server
    /// would if this core were extended to support server-preference
    /// hybrid groups requiring a server-generated keypair.
    ///
    /// This mirrors the teacher's `SupportedKxGroup::start`.
    pub fn generate(group: KemGroup, format: WireFormat, crypto: &C) -> Result<(Self, Vec<u8>), Error> {
        let (ec_priv, ec_pub) = crypto.ecdh_keygen(group.curve.kind())?;
        let (kem_priv, kem_pub) = crypto.kem_keygen(group.kem)?;
        let payload = encode_payload(&ec_pub, &kem_pub, format);
        Ok((
            Self {
                group,
                format,
                ec_priv,
                kem_priv,
            },
            payload,
        ))
    }

    /// Complete the exchange against the peer's (server's) hybrid payload:
    /// ECDH against their classical public key, KEM-decapsulate their
    /// ciphertext, and combine per the fixed secret ordering.
    ///
    /// Mirrors the teacher's `ActiveKeyExchange::complete`.
    pub fn complete(self, peer_payload: &[u8], crypto: &C) -> Result<Zeroizing<Vec<u8>>, Error> {
        let (peer_ec_pub, ciphertext) = decode_payload(
            peer_payload,
            self.group.curve.pub_len(),
            self.group.kem.ciphertext_len(),
            self.format,
        )?;
        let ec_shared = crypto.ecdh(self.ec_priv, peer_ec_pub)?;
        let kem_shared = crypto.kem_decapsulate(self.group.kem, self.kem_priv, ciphertext)?;
        Ok(combine_secrets(&ec_shared, &kem_shared))
    }
}

/// The server's side of a hybrid exchange: given the client's key-share
/// payload for the selected group, generate our own ephemeral ECDH keypair,
/// KEM-encapsulate against the client's KEM public key, and produce both
/// the payload to emit and the combined shared secret.
///
/// Mirrors the teacher's `SupportedKxGroup::start_and_complete`.
pub fn respond<C: CryptoCollaborator>(
    group: KemGroup,
    format: WireFormat,
    client_payload: &[u8],
    crypto: &C,
) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>), Error> {
    let (client_ec_pub, client_kem_pub) =
        decode_payload(client_payload, group.curve.pub_len(), group.kem.pub_len(), format)?;

    let (our_ec_priv, our_ec_pub) = crypto.ecdh_keygen(group.curve.kind())?;
    let ec_shared = crypto.ecdh(our_ec_priv, client_ec_pub)?;
    let (ciphertext, kem_shared) = crypto.kem_encapsulate(group.kem, client_kem_pub)?;

    let payload = encode_payload(&our_ec_pub, &ciphertext, format);
    Ok((payload, combine_secrets(&ec_shared, &kem_shared)))
}

/// Classical-only (non-hybrid) ECDHE, for when selection fell back to a
/// plain curve. No wire-format choice applies: the payload is just the raw
/// public key.
pub struct OfferedCurveShare<C: CryptoCollaborator> {
    curve: EcCurve,
    ec_priv: C::EcdhPriv,
}

impl<C: CryptoCollaborator> OfferedCurveShare<C> {
    pub(crate) fn curve_id(&self) -> u16 {
        self.curve.iana_id
    }

    pub fn generate(curve: EcCurve, crypto: &C) -> Result<(Self, Vec<u8>), Error> {
        let (ec_priv, ec_pub) = crypto.ecdh_keygen(curve.kind())?;
        Ok((Self { curve, ec_priv }, ec_pub))
    }

    pub fn complete(self, peer_pub: &[u8], crypto: &C) -> Result<Zeroizing<Vec<u8>>, Error> {
        if peer_pub.len() != self.curve.pub_len() {
            return Err(Error::DecodeError("classical key share has wrong length"));
        }
        crypto.ecdh(self.ec_priv, peer_pub)
    }
}

pub fn respond_classical<C: CryptoCollaborator>(
    curve: EcCurve,
    client_pub: &[u8],
    crypto: &C,
) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>), Error> {
    if client_pub.len() != curve.pub_len() {
        return Err(Error::DecodeError("classical key share has wrong length"));
    }
    let (our_priv, our_pub) = crypto.ecdh_keygen(curve.kind())?;
    let shared = crypto.ecdh(our_priv, client_pub)?;
    Ok((our_pub, shared))
}

/// Resolve the wire format to use for a given [`Selected`] outcome. Returns
/// `None` for a classical selection, which has no hybrid format to pick.
pub fn wire_format_for(selected: &Selected) -> Option<WireFormat> {
    match selected {
        Selected::Hybrid { len_prefixed, .. } => Some(WireFormat::from_len_prefixed(*len_prefixed)),
        Selected::Classical { .. } => None,
    }
}

#[cfg(all(test, feature = "aws-lc-rs"))]
mod tests {
    use super::*;
    use crate::crypto::AwsLcCollaborator;
    use crate::registry::X25519_MLKEM768;

    #[test]
    fn hybrid_exchange_yields_equal_secrets_both_sides() {
        let crypto = AwsLcCollaborator;
        let group = X25519_MLKEM768;

        for format in [WireFormat::Concatenated, WireFormat::LengthPrefixed] {
            let (offered, client_payload) =
                OfferedKeyShare::generate(group, format, &crypto).unwrap();
            let (server_payload, server_secret) =
                respond(group, format, &client_payload, &crypto).unwrap();
            let client_secret = offered.complete(&server_payload, &crypto).unwrap();

            assert_eq!(*client_secret, *server_secret);
            assert!(client_secret.iter().any(|&b| b != 0), "combined secret must not be all-zero");
        }
    }

    #[test]
    fn concatenated_payload_rejected_when_length_prefixed_expected() {
        let crypto = AwsLcCollaborator;
        let group = X25519_MLKEM768;
        let (_offered, client_payload) =
            OfferedKeyShare::generate(group, WireFormat::Concatenated, &crypto).unwrap();
        let err = respond(group, WireFormat::LengthPrefixed, &client_payload, &crypto).unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[test]
    fn classical_exchange_yields_equal_secrets() {
        let crypto = AwsLcCollaborator;
        let curve = crate::registry::X25519;
        let (offered, client_pub) = OfferedCurveShare::generate(curve, &crypto).unwrap();
        let (server_pub, server_secret) = respond_classical(curve, &client_pub, &crypto).unwrap();
        let client_secret = offered.complete(&server_pub, &crypto).unwrap();
        assert_eq!(*client_secret, *server_secret);
    }
}
