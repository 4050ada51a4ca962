//! Static catalog of supported hybrid KEM groups and classical curves.
//!
//! Identity of a [`KemGroup`] or [`EcCurve`] is its `iana_id`, never its
//! address: unlike the pointer-comparison-on-global-singletons scheme this
//! core's upstream relatives use for `NamedGroup`, every group here is a
//! plain `Copy` value, so synthetic groups can be constructed for property
//! testing without touching the real catalog.

use crate::capability::CapabilityProbe;

/// Which ECDH primitive a curve maps to in the crypto collaborator.
/// Kept distinct from [`EcCurve`] (a catalog *value*, with a name and an
/// IANA id) the same way [`Kem`] is kept distinct from a `KemGroup`'s KEM
/// half: the enum is what [`crate::crypto::CryptoCollaborator`] dispatches
/// on, the catalog struct is what the wire and the preference lists carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Secp256r1,
    Secp384r1,
    Secp521r1,
    X25519,
}

/// A classical elliptic curve used for ECDHE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcCurve {
    pub iana_id: u16,
    pub name: &'static str,
}

/// Uncompressed point / raw public-key length for a curve's ECDH share.
impl EcCurve {
    pub const fn pub_len(&self) -> usize {
        match self.iana_id {
            SECP256R1_ID => 65,
            SECP384R1_ID => 97,
            SECP521R1_ID => 133,
            X25519_ID => 32,
            _ => 0,
        }
    }

    pub const fn kind(&self) -> Curve {
        match self.iana_id {
            SECP256R1_ID => Curve::Secp256r1,
            SECP384R1_ID => Curve::Secp384r1,
            SECP521R1_ID => Curve::Secp521r1,
            _ => Curve::X25519,
        }
    }
}

const SECP256R1_ID: u16 = 0x0017;
const SECP384R1_ID: u16 = 0x0018;
const SECP521R1_ID: u16 = 0x0019;
const X25519_ID: u16 = 0x001d;

pub const SECP256R1: EcCurve = EcCurve { iana_id: SECP256R1_ID, name: "secp256r1" };
pub const SECP384R1: EcCurve = EcCurve { iana_id: SECP384R1_ID, name: "secp384r1" };
pub const SECP521R1: EcCurve = EcCurve { iana_id: SECP521R1_ID, name: "secp521r1" };
pub const X25519: EcCurve = EcCurve { iana_id: X25519_ID, name: "x25519" };

/// The full, ordered list of classical curves this core knows about.
pub const fn all_curves() -> &'static [EcCurve] {
    &[X25519, SECP256R1, SECP384R1, SECP521R1]
}

/// The KEM half of a hybrid group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kem {
    Kyber512R3,
    Kyber768R3,
    Kyber1024R3,
    MlKem768,
    MlKem1024,
}

impl Kem {
    pub const fn pub_len(&self) -> usize {
        match self {
            Kem::Kyber512R3 => 800,
            Kem::Kyber768R3 => 1184,
            Kem::Kyber1024R3 => 1568,
            Kem::MlKem768 => 1184,
            Kem::MlKem1024 => 1568,
        }
    }

    pub const fn ciphertext_len(&self) -> usize {
        match self {
            Kem::Kyber512R3 => 768,
            Kem::Kyber768R3 => 1088,
            Kem::Kyber1024R3 => 1568,
            Kem::MlKem768 => 1088,
            Kem::MlKem1024 => 1568,
        }
    }

    pub const fn shared_secret_len(&self) -> usize {
        32
    }

    pub const fn is_mlkem(&self) -> bool {
        matches!(self, Kem::MlKem768 | Kem::MlKem1024)
    }

    pub const fn is_kyber_r3(&self) -> bool {
        matches!(self, Kem::Kyber512R3 | Kem::Kyber768R3 | Kem::Kyber1024R3)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Kem::Kyber512R3 => "Kyber512-r3",
            Kem::Kyber768R3 => "Kyber768-r3",
            Kem::Kyber1024R3 => "Kyber1024-r3",
            Kem::MlKem768 => "ML-KEM-768",
            Kem::MlKem1024 => "ML-KEM-1024",
        }
    }
}

/// A hybrid KEM group: a classical curve paired with a post-quantum KEM.
///
/// Equality and ordering within a [`crate::policy::PreferenceSet`] are by
/// `iana_id` only; two `KemGroup` values with the same id are the same
/// group even if constructed independently (this is what lets tests build
/// synthetic groups).
#[derive(Debug, Clone, Copy)]
pub struct KemGroup {
    pub iana_id: u16,
    pub name: &'static str,
    pub curve: EcCurve,
    pub kem: Kem,
}

impl PartialEq for KemGroup {
    fn eq(&self, other: &Self) -> bool {
        self.iana_id == other.iana_id
    }
}
impl Eq for KemGroup {}

impl KemGroup {
    /// True iff the linked crypto provider can actually run this group:
    /// a generic KEM interface, plus `x25519` if the group's classical half
    /// is `x25519`, plus ML-KEM if the group's PQ half is an ML-KEM variant,
    /// plus Kyber-r3 if the group's PQ half is a pre-standard Kyber-r3
    /// variant. ML-KEM and Kyber-r3 are checked independently, never via
    /// `generic_kem` alone: a provider can expose a generic KEM interface
    /// and still only have wired up one of the two families (`aws-lc-rs`
    /// does exactly this, see `crypto::AwsLcCollaborator`).
    ///
    /// Checked exactly once per candidate by the selection engine; this
    /// function itself does no caching; callers hand in a [`CapabilityProbe`]
    /// that was itself computed once at startup.
    pub fn is_available(&self, probe: &CapabilityProbe) -> bool {
        probe.generic_kem
            && (self.curve.iana_id != X25519_ID || probe.x25519)
            && (!self.kem.is_mlkem() || probe.mlkem)
            && (!self.kem.is_kyber_r3() || probe.kyber_r3)
    }

    pub const fn combined_pub_len(&self) -> usize {
        self.curve.pub_len() + self.kem.pub_len()
    }

    pub const fn combined_ciphertext_len(&self) -> usize {
        self.curve.pub_len() + self.kem.ciphertext_len()
    }
}

macro_rules! group {
    ($id:expr, $name:expr, $curve:expr, $kem:expr) => {
        KemGroup { iana_id: $id, name: $name, curve: $curve, kem: $kem }
    };
}

// Real, registered/draft codepoints where one exists; the remaining
// combinations of this crate's full curve x KEM matrix have no IANA
// assignment, so they're given values from the 0xFE00-0xFEFF private-use
// range (see DESIGN.md).
pub const X25519_KYBER512: KemGroup = group!(0xfe00, "x25519_kyber512", X25519, Kem::Kyber512R3);
pub const X25519_KYBER768: KemGroup = group!(0x6399, "x25519_kyber768_draft00", X25519, Kem::Kyber768R3);
pub const X25519_KYBER1024: KemGroup = group!(0xfe01, "x25519_kyber1024", X25519, Kem::Kyber1024R3);
pub const X25519_MLKEM768: KemGroup = group!(0x11ec, "X25519MLKEM768", X25519, Kem::MlKem768);
pub const X25519_MLKEM1024: KemGroup = group!(0xfe02, "x25519_mlkem1024", X25519, Kem::MlKem1024);

pub const SECP256R1_KYBER512: KemGroup = group!(0xfe10, "secp256r1_kyber512", SECP256R1, Kem::Kyber512R3);
pub const SECP256R1_KYBER768: KemGroup = group!(0x639a, "secp256r1_kyber768_draft00", SECP256R1, Kem::Kyber768R3);
pub const SECP256R1_KYBER1024: KemGroup = group!(0xfe11, "secp256r1_kyber1024", SECP256R1, Kem::Kyber1024R3);
pub const SECP256R1_MLKEM768: KemGroup = group!(0x11eb, "SecP256r1MLKEM768", SECP256R1, Kem::MlKem768);
pub const SECP256R1_MLKEM1024: KemGroup = group!(0xfe12, "secp256r1_mlkem1024", SECP256R1, Kem::MlKem1024);

pub const SECP384R1_KYBER512: KemGroup = group!(0xfe20, "secp384r1_kyber512", SECP384R1, Kem::Kyber512R3);
pub const SECP384R1_KYBER768: KemGroup = group!(0xfe21, "secp384r1_kyber768", SECP384R1, Kem::Kyber768R3);
pub const SECP384R1_KYBER1024: KemGroup = group!(0xfe22, "secp384r1_kyber1024", SECP384R1, Kem::Kyber1024R3);
pub const SECP384R1_MLKEM768: KemGroup = group!(0xfe23, "secp384r1_mlkem768", SECP384R1, Kem::MlKem768);
pub const SECP384R1_MLKEM1024: KemGroup = group!(0x11ed, "SecP384r1MLKEM1024", SECP384R1, Kem::MlKem1024);

pub const SECP521R1_KYBER512: KemGroup = group!(0xfe30, "secp521r1_kyber512", SECP521R1, Kem::Kyber512R3);
pub const SECP521R1_KYBER768: KemGroup = group!(0xfe31, "secp521r1_kyber768", SECP521R1, Kem::Kyber768R3);
pub const SECP521R1_KYBER1024: KemGroup = group!(0xfe32, "secp521r1_kyber1024", SECP521R1, Kem::Kyber1024R3);
pub const SECP521R1_MLKEM768: KemGroup = group!(0xfe33, "secp521r1_mlkem768", SECP521R1, Kem::MlKem768);
pub const SECP521R1_MLKEM1024: KemGroup = group!(0xfe34, "secp521r1_mlkem1024", SECP521R1, Kem::MlKem1024);

/// Every hybrid group this build knows about, in no particular priority
/// order (priority lives on a [`crate::policy::PreferenceSet`], not here).
pub const fn all_groups() -> &'static [KemGroup] {
    &[
        X25519_KYBER512,
        X25519_KYBER768,
        X25519_KYBER1024,
        X25519_MLKEM768,
        X25519_MLKEM1024,
        SECP256R1_KYBER512,
        SECP256R1_KYBER768,
        SECP256R1_KYBER1024,
        SECP256R1_MLKEM768,
        SECP256R1_MLKEM1024,
        SECP384R1_KYBER512,
        SECP384R1_KYBER768,
        SECP384R1_KYBER1024,
        SECP384R1_MLKEM768,
        SECP384R1_MLKEM1024,
        SECP521R1_KYBER512,
        SECP521R1_KYBER768,
        SECP521R1_KYBER1024,
        SECP521R1_MLKEM768,
        SECP521R1_MLKEM1024,
    ]
}
