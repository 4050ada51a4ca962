//! Runtime capability probing for the linked crypto provider.
//!
//! Availability of a [`crate::registry::KemGroup`] is not a compile-time
//! property: a single binary may be linked against providers of varying
//! capability, so we probe once and hand the result to the registry.

/// Snapshot of what the linked crypto collaborator can do.
///
/// Computed once per process (see [`CapabilityProbe::detect`]) and passed
/// by reference into every `is_available` check, so the underlying provider
/// probes never run more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityProbe {
    pub(crate) generic_kem: bool,
    pub(crate) x25519: bool,
    pub(crate) mlkem: bool,
    pub(crate) kyber_r3: bool,
}

impl CapabilityProbe {
    /// Probe the given crypto collaborator for its capabilities.
    pub fn detect<C: crate::crypto::CryptoCollaborator>(crypto: &C) -> Self {
        Self {
            generic_kem: crypto.supports_evp_kem(),
            x25519: crypto.supports_x25519(),
            mlkem: crypto.supports_mlkem(),
            kyber_r3: crypto.supports_kyber_r3(),
        }
    }

    /// Build a probe with explicit capability bits, bypassing any real
    /// provider.
    ///
    /// Used by tests that need to reproduce the behavior of an older or
    /// narrower provider build (e.g. one without ML-KEM, `x25519`, or
    /// pre-standard Kyber-r3 support) without needing to actually link such
    /// a provider.
    pub const fn custom(generic_kem: bool, x25519: bool, mlkem: bool, kyber_r3: bool) -> Self {
        Self {
            generic_kem,
            x25519,
            mlkem,
            kyber_r3,
        }
    }

    /// A probe reporting every capability this crate knows how to use.
    pub const fn all() -> Self {
        Self::custom(true, true, true, true)
    }

    /// A probe reporting no capabilities at all (PQ and classical both
    /// runtime-disabled).
    pub const fn none() -> Self {
        Self::custom(false, false, false, false)
    }
}
