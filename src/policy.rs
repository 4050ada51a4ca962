//! Named, versioned security policies: ordered lists of hybrid groups and
//! classical curves, plus the hybrid-draft revision they speak.

use crate::registry::{self, EcCurve, KemGroup};

/// An ordered list of KEM groups, an ordered list of curves, and the
/// hybrid-draft revision governing wire encoding of the former.
///
/// Order encodes priority: index 0 is most preferred. Constructing one
/// directly (rather than through [`default_pq`] et al.) is how tests model
/// an arbitrary peer's advertised preferences.
#[derive(Debug, Clone)]
pub struct PreferenceSet {
    pub kem_groups: Vec<KemGroup>,
    pub curves: Vec<EcCurve>,
    /// `0` selects the concatenated hybrid wire format, `5` the
    /// length-prefixed one. See [`crate::keyshare`].
    pub hybrid_draft_revision: u8,
    pub min_tls_version: TlsVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

impl PreferenceSet {
    /// Build a preference set, rejecting duplicate `iana_id`s in either
    /// list up front rather than silently shadowing them later.
    pub fn new(
        kem_groups: Vec<KemGroup>,
        curves: Vec<EcCurve>,
        hybrid_draft_revision: u8,
        min_tls_version: TlsVersion,
    ) -> Self {
        debug_assert!(
            !has_duplicate_ids(&kem_groups, |g| g.iana_id),
            "duplicate iana_id in kem_groups"
        );
        debug_assert!(
            !has_duplicate_ids(&curves, |c| c.iana_id),
            "duplicate iana_id in curves"
        );
        Self {
            kem_groups,
            curves,
            hybrid_draft_revision,
            min_tls_version,
        }
    }
}

fn has_duplicate_ids<T>(items: &[T], id: impl Fn(&T) -> u16) -> bool {
    let mut ids: Vec<u16> = items.iter().map(id).collect();
    ids.sort_unstable();
    let before = ids.len();
    ids.dedup();
    before != ids.len()
}

/// The current recommended policy: ML-KEM hybrids first (these are
/// standardized, per FIPS 203), then the pre-standard Kyber-r3 hybrids for
/// interop with older deployments, then plain classical curves, carried in
/// the length-prefixed (draft-5) hybrid wire format.
pub fn default_pq() -> PreferenceSet {
    PreferenceSet::new(
        vec![
            registry::X25519_MLKEM768,
            registry::SECP256R1_MLKEM768,
            registry::SECP384R1_MLKEM1024,
            registry::SECP521R1_MLKEM1024,
            registry::X25519_KYBER768,
            registry::SECP256R1_KYBER768,
        ],
        registry::all_curves().to_vec(),
        5,
        TlsVersion::Tls13,
    )
}

/// A dated policy pinned to the pre-standard, concatenated (draft-0) hybrid
/// wire format, for interop testing against deployments that predate the
/// ML-KEM hybrid drafts.
///
/// `name` is accepted purely for the caller's own bookkeeping/logging; this
/// core does not look policies up by name.
pub fn legacy_pq_tls_1(_name: &str) -> PreferenceSet {
    PreferenceSet::new(
        vec![
            registry::X25519_KYBER768,
            registry::SECP256R1_KYBER768,
            registry::X25519_KYBER512,
            registry::SECP256R1_KYBER512,
        ],
        registry::all_curves().to_vec(),
        0,
        TlsVersion::Tls13,
    )
}

/// A policy with no hybrid groups at all: classical ECDHE only. Models a
/// peer that has PQ disabled, or one speaking pre-PQ TLS 1.3.
pub fn classical_only() -> PreferenceSet {
    PreferenceSet::new(vec![], registry::all_curves().to_vec(), 0, TlsVersion::Tls13)
}

/// A dated security-policy snapshot, the shape spec.md §4.2 calls out
/// (`20250721`): the ML-KEM hybrids in front, but trimmed to the two curves
/// actually deployed at that date rather than the full curve matrix, and
/// still on the length-prefixed (draft-5) wire format. Unlike
/// [`default_pq`], a dated policy is expected to never change underfoot --
/// new dates get new functions rather than mutating an existing one, so a
/// caller that pins to `pq_tls_1_20250721` keeps getting exactly this list.
pub fn pq_tls_1_20250721() -> PreferenceSet {
    PreferenceSet::new(
        vec![
            registry::X25519_MLKEM768,
            registry::SECP256R1_MLKEM768,
            registry::X25519_KYBER768,
        ],
        vec![registry::X25519, registry::SECP256R1],
        5,
        TlsVersion::Tls13,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pq_has_no_duplicates() {
        let p = default_pq();
        assert!(!has_duplicate_ids(&p.kem_groups, |g| g.iana_id));
        assert!(!has_duplicate_ids(&p.curves, |c| c.iana_id));
    }

    #[test]
    fn classical_only_has_no_kem_groups() {
        assert!(classical_only().kem_groups.is_empty());
    }

    #[test]
    fn dated_policy_has_no_duplicates_and_uses_length_prefixed_format() {
        let p = pq_tls_1_20250721();
        assert!(!has_duplicate_ids(&p.kem_groups, |g| g.iana_id));
        assert_eq!(p.hybrid_draft_revision, 5);
    }
}
