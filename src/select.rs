//! The selection engine: a pure function from two peers' preferences to a
//! chosen group (or curve) and whether a HelloRetryRequest is required.
//!
//! This is the only place the negotiation rule lives; both the production
//! handshake drivers in [`crate::handshake`] and the boundary-scenario
//! tests below call through the same [`select`] function, per spec.

use crate::capability::CapabilityProbe;
use crate::error::Error;
use crate::logging::{debug, trace};
use crate::policy::PreferenceSet;
use crate::registry::{EcCurve, KemGroup};

/// The outcome of a successful selection: exactly one of a hybrid group or
/// a classical curve, never both, never neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selected {
    Hybrid { group: KemGroup, len_prefixed: bool },
    Classical { curve: EcCurve },
}

impl Selected {
    /// Non-empty iff a hybrid group was negotiated.
    pub fn kem_group_name(&self) -> &'static str {
        match self {
            Selected::Hybrid { group, .. } => group.name,
            Selected::Classical { .. } => "",
        }
    }

    /// Non-empty iff a classical curve was negotiated.
    pub fn curve_name(&self) -> &'static str {
        match self {
            Selected::Hybrid { .. } => "",
            Selected::Classical { curve } => curve.name,
        }
    }

    /// Whichever of the two is active, unified.
    pub fn key_exchange_group_name(&self) -> &'static str {
        match self {
            Selected::Hybrid { group, .. } => group.name,
            Selected::Classical { curve } => curve.name,
        }
    }

    /// The `iana_id` of whichever entry is active, for matching against a
    /// HelloRetryRequest's `selected_group` or a peer's key-share list.
    pub fn group_id(&self) -> u16 {
        match self {
            Selected::Hybrid { group, .. } => group.iana_id,
            Selected::Classical { curve } => curve.iana_id,
        }
    }
}

trait HasIanaId: Copy {
    fn iana_id(&self) -> u16;
}
impl HasIanaId for KemGroup {
    fn iana_id(&self) -> u16 {
        self.iana_id
    }
}
impl HasIanaId for EcCurve {
    fn iana_id(&self) -> u16 {
        self.iana_id
    }
}

/// Keep only the first occurrence of each `iana_id`, preserving order.
/// Later duplicates are invisible, per spec's tie-break rule.
fn dedup_by_id<T: HasIanaId>(items: &[T]) -> Vec<T> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for item in items {
        if !seen.contains(&item.iana_id()) {
            seen.push(item.iana_id());
            out.push(*item);
        }
    }
    out
}

/// The two-tier preference-intersection rule from spec.md §4.3, applied
/// identically to the KEM-group list and the curve list.
///
/// `local` is the server's ordered list (`S`), `peer` is the peer's ordered
/// list as read off the wire (`C`), and `peer_key_share_ids` are the groups
/// for which the peer actually sent key-share bytes (a peer can list a
/// group in `supported_groups` without offering a share for it).
///
/// Returns `Some((chosen, requires_hrr))`, or `None` if the two lists don't
/// intersect at all.
fn two_tier_pick<T: HasIanaId>(
    local: &[T],
    peer: &[T],
    peer_key_share_ids: &[u16],
) -> Option<(T, bool)> {
    let local = dedup_by_id(local);
    let peer = dedup_by_id(peer);

    // 1-RTT fast path: honor the peer's top choice whenever we support it
    // too, even if we'd have personally preferred something later in `S`.
    if let Some(first) = peer.first() {
        if peer_key_share_ids.contains(&first.iana_id()) && local.iter().any(|l| l.iana_id() == first.iana_id())
        {
            trace!("selection: 1-RTT fast path on peer's top choice 0x{:04x}", first.iana_id());
            return Some((*first, false));
        }
    }

    // Otherwise scan our own list in priority order for the first entry
    // the peer also lists at all (spec.md phrases this as a scan of
    // `C[1..]`, but restricting to peer entries beyond index 0 leaves a
    // peer whose sole choice lacked a key share with no match at all --
    // see DESIGN.md. HRR necessity is about whether the group we end up
    // choosing has a key share attached, not about its position in the
    // peer's list, so this scans the peer's full (deduped) list.
    for candidate in &local {
        if let Some(found) = peer.iter().find(|p| p.iana_id() == candidate.iana_id()) {
            let has_share = peer_key_share_ids.contains(&found.iana_id());
            if !has_share {
                debug!(
                    "selection: 0x{:04x} is mutually supported but peer sent no key share for it, requiring HRR",
                    candidate.iana_id()
                );
            }
            return Some((*candidate, !has_share));
        }
    }

    None
}

/// Server-side selection: choose a hybrid group or classical curve given
/// the server's own preferences, the peer's advertised preferences, the
/// peer's offered key shares, and the provider's runtime capabilities.
///
/// PQ always wins over classical when both intersect (post-quantum users
/// explicitly opted into the extra cost by listing a KEM group at all). If
/// the server's available KEM-group list is empty (PQ runtime-disabled, or
/// a classical-only policy), PQ selection is skipped entirely and only the
/// classical tier runs, which may force an HRR if the peer only offered PQ
/// shares.
pub fn select(
    local: &PreferenceSet,
    peer: &PreferenceSet,
    peer_key_share_ids: &[u16],
    probe: &CapabilityProbe,
) -> Result<(Selected, bool), Error> {
    let local_groups: Vec<KemGroup> = local
        .kem_groups
        .iter()
        .copied()
        .filter(|g| g.is_available(probe))
        .collect();
    let peer_groups: Vec<KemGroup> = peer
        .kem_groups
        .iter()
        .copied()
        .filter(|g| g.is_available(probe))
        .collect();

    if local_groups.is_empty() && !local.kem_groups.is_empty() {
        debug!("selection: all locally-configured KEM groups are runtime-unavailable, skipping straight to classical");
    }

    if !local_groups.is_empty() {
        if let Some((group, requires_hrr)) = two_tier_pick(&local_groups, &peer_groups, peer_key_share_ids) {
            let len_prefixed = peer.hybrid_draft_revision == 5;
            debug!("selection: chose hybrid group {} (hrr={requires_hrr}, len_prefixed={len_prefixed})", group.name);
            return Ok((
                Selected::Hybrid {
                    group,
                    len_prefixed,
                },
                requires_hrr,
            ));
        }
    }

    match two_tier_pick(&local.curves, &peer.curves, peer_key_share_ids) {
        Some((curve, requires_hrr)) => {
            debug!("selection: fell through to classical curve {} (hrr={requires_hrr})", curve.name);
            Ok((Selected::Classical { curve }, requires_hrr))
        }
        None => {
            debug!("selection: no mutually supported group or curve");
            Err(Error::NoMutualGroup)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PreferenceSet, TlsVersion};
    use crate::registry::*;

    fn prefs(groups: Vec<KemGroup>, curves: Vec<EcCurve>, rev: u8) -> PreferenceSet {
        PreferenceSet::new(groups, curves, rev, TlsVersion::Tls13)
    }

    // Boundary scenario #1: client's single choice matches server's top
    // choice, 1-RTT, draft-0 (concatenated).
    #[test]
    fn scenario_1_fast_path_draft0() {
        let client = prefs(vec![X25519_KYBER512], vec![X25519], 0);
        let server = prefs(
            vec![X25519_KYBER512, SECP256R1_KYBER768],
            all_curves().to_vec(),
            5, // server's own revision is irrelevant; client's governs wire format
        );
        let (selected, hrr) = select(&server, &client, &[X25519_KYBER512.iana_id], &CapabilityProbe::all()).unwrap();
        assert_eq!(selected, Selected::Hybrid { group: X25519_KYBER512, len_prefixed: false });
        assert!(!hrr);
    }

    // Boundary scenario #2: the client lists a single PQ group but, to
    // avoid spending bytes on a PQ public key it may not need, sends no
    // key share at all on its first flight. The group is still mutually
    // supported (found deep in the server's list), so the server selects
    // it -- but since no share arrived for it, an HRR round-trip is
    // required before the handshake can continue.
    #[test]
    fn scenario_2_mutual_but_no_key_share_requires_hrr() {
        let client = prefs(vec![X25519_KYBER512], vec![X25519], 5);
        let server = prefs(
            vec![
                SECP256R1_KYBER768,
                SECP384R1_KYBER768,
                X25519_KYBER512,
            ],
            all_curves().to_vec(),
            5,
        );
        let (selected, hrr) = select(&server, &client, &[], &CapabilityProbe::all()).unwrap();
        assert_eq!(selected, Selected::Hybrid { group: X25519_KYBER512, len_prefixed: true });
        assert!(hrr);
    }

    // Boundary scenario #3: client only offers a PQ group the server
    // doesn't support at all; fall through to classical. The client's
    // curve list has a match but (again) no key share was sent for it on
    // the first flight, so HRR is required.
    #[test]
    fn scenario_3_falls_through_to_classical_with_hrr() {
        let client = prefs(vec![X25519_KYBER512], vec![X25519], 0);
        let server = prefs(vec![], all_curves().to_vec(), 0);
        let (selected, hrr) = select(&server, &client, &[X25519_KYBER512.iana_id], &CapabilityProbe::all()).unwrap();
        assert_eq!(selected, Selected::Classical { curve: X25519 });
        assert!(hrr);
    }

    // Boundary scenario #4: ML-KEM hybrid fast path, draft-5 (length
    // prefixed).
    #[test]
    fn scenario_4_mlkem_fast_path_draft5() {
        let client = prefs(
            vec![X25519_MLKEM768, SECP256R1_MLKEM768],
            vec![X25519],
            5,
        );
        let server = prefs(
            vec![X25519_MLKEM768, SECP256R1_MLKEM768],
            all_curves().to_vec(),
            5,
        );
        let (selected, hrr) =
            select(&server, &client, &[X25519_MLKEM768.iana_id], &CapabilityProbe::all()).unwrap();
        assert_eq!(selected, Selected::Hybrid { group: X25519_MLKEM768, len_prefixed: true });
        assert!(!hrr);

        // If ML-KEM is unavailable at runtime, the same inputs fall
        // through to classical.
        let probe_no_mlkem = CapabilityProbe::custom(true, true, false, true);
        let (selected, hrr) = select(&server, &client, &[X25519_MLKEM768.iana_id], &probe_no_mlkem).unwrap();
        assert_eq!(selected, Selected::Classical { curve: X25519 });
        assert!(!hrr);
    }

    // Boundary scenario #5: the client's top choice is mutually supported
    // (even though it sits last in the server's own list) and the client
    // sent a share for it, so this is a 1-RTT fast path like scenario #1.
    #[test]
    fn scenario_5_deep_intersection_no_hrr() {
        let client = prefs(
            vec![SECP521R1_KYBER1024, SECP256R1_KYBER512],
            vec![SECP521R1],
            0,
        );
        let server = prefs(
            vec![SECP256R1_KYBER768, SECP384R1_KYBER768, SECP521R1_KYBER1024],
            all_curves().to_vec(),
            0,
        );
        let shares = [SECP521R1_KYBER1024.iana_id, SECP256R1_KYBER512.iana_id];
        let (selected, hrr) = select(&server, &client, &shares, &CapabilityProbe::all()).unwrap();
        assert_eq!(selected, Selected::Hybrid { group: SECP521R1_KYBER1024, len_prefixed: false });
        assert!(!hrr);
    }

    // Boundary scenario #6: classical-only client against a PQ-capable
    // server; server's PQ list simply never matches anything the client
    // offered, straight classical selection, no HRR (client sent a share
    // for its top curve).
    #[test]
    fn scenario_6_classical_only_client_no_hrr() {
        let client = prefs(vec![], vec![X25519, SECP256R1], 0);
        let server = prefs(
            vec![X25519_MLKEM768],
            vec![X25519, SECP256R1, SECP384R1],
            5,
        );
        let (selected, hrr) = select(&server, &client, &[X25519.iana_id], &CapabilityProbe::all()).unwrap();
        assert_eq!(selected, Selected::Classical { curve: X25519 });
        assert!(!hrr);
    }

    #[test]
    fn no_intersection_is_an_error() {
        let client = prefs(vec![], vec![SECP521R1], 0);
        let server = prefs(vec![], vec![X25519], 0);
        let err = select(&server, &client, &[], &CapabilityProbe::all()).unwrap_err();
        assert_eq!(err, Error::NoMutualGroup);
    }

    #[test]
    fn duplicates_use_earliest_occurrence() {
        // Two entries sharing an iana_id in the peer's list; the later one
        // (a different value with the same identity) must be invisible --
        // the first occurrence's data is what the engine reports.
        let first_occurrence = X25519_KYBER512;
        let later_duplicate = KemGroup { name: "duplicate-should-be-ignored", ..X25519_KYBER512 };
        let client = prefs(vec![first_occurrence, later_duplicate], vec![X25519], 0);
        let server = prefs(vec![X25519_KYBER512], all_curves().to_vec(), 0);
        let (selected, hrr) = select(&server, &client, &[X25519_KYBER512.iana_id], &CapabilityProbe::all()).unwrap();
        match selected {
            Selected::Hybrid { group, len_prefixed } => {
                assert_eq!(group.name, first_occurrence.name);
                assert!(!len_prefixed);
            }
            other => panic!("expected hybrid selection, got {other:?}"),
        }
        assert!(!hrr);
    }

    #[test]
    fn selection_is_deterministic_across_repeated_calls() {
        let client = prefs(vec![X25519_MLKEM768], vec![X25519], 5);
        let server = prefs(vec![X25519_MLKEM768], all_curves().to_vec(), 5);
        let probe = CapabilityProbe::all();
        let shares = [X25519_MLKEM768.iana_id];
        let first = select(&server, &client, &shares, &probe).unwrap();
        let second = select(&server, &client, &shares, &probe).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn pq_runtime_disabled_skips_straight_to_classical() {
        let client = prefs(vec![X25519_KYBER512], vec![X25519], 0);
        let server = prefs(vec![], all_curves().to_vec(), 0); // PQ disabled locally
        let (selected, hrr) = select(&server, &client, &[X25519_KYBER512.iana_id], &CapabilityProbe::all()).unwrap();
        assert_eq!(selected, Selected::Classical { curve: X25519 });
        assert!(hrr, "client never sent a curve key share, so HRR is needed");
    }
}
