//! Full client+server handshake-driver tests: the six boundary scenarios
//! from spec.md §8 driven end to end, plus the invariants and the
//! round-trip/idempotence properties in the same section.

use super::*;
use crate::capability::CapabilityProbe;
use crate::crypto::AwsLcCollaborator;
use crate::error::{Error, PeerMisbehaved};
use crate::policy;
use crate::registry::*;
use crate::select::Selected;

fn is_non_zero(secret: &[u8]) -> bool {
    secret.iter().any(|&b| b != 0)
}

/// Drive one full handshake to completion (with at most one HRR
/// round-trip) and return both sides' contexts for inspection.
fn run_handshake(
    client_prefs: policy::PreferenceSet,
    server_prefs: policy::PreferenceSet,
) -> (ClientHandshake<AwsLcCollaborator>, ServerHandshake<AwsLcCollaborator>) {
    let mut client = ClientHandshake::new(client_prefs, AwsLcCollaborator, CapabilityProbe::all());
    let mut server = ServerHandshake::new(server_prefs, AwsLcCollaborator, CapabilityProbe::all());

    let ch1 = client.send_client_hello().unwrap();
    match server.receive_client_hello(ch1).unwrap() {
        ServerHandshakeStep::SendServerHello(sh) => {
            client.receive_server_hello(sh).unwrap();
        }
        ServerHandshakeStep::SendHelloRetryRequest(hrr) => {
            let ch2 = client.receive_hello_retry_request(hrr).unwrap();
            match server.receive_client_hello(ch2).unwrap() {
                ServerHandshakeStep::SendServerHello(sh) => {
                    client.receive_server_hello(sh).unwrap();
                }
                ServerHandshakeStep::SendHelloRetryRequest(_) => {
                    panic!("state machine looped: two HelloRetryRequests in one connection");
                }
            }
        }
    }

    (client, server)
}

fn assert_equal_nonzero_secrets(client: &ClientHandshake<AwsLcCollaborator>, server: &ServerHandshake<AwsLcCollaborator>) {
    let c = client.context().derived_secrets().expect("client derived secrets");
    let s = server.context().derived_secrets().expect("server derived secrets");
    assert_eq!(*c.extract_secret, *s.extract_secret);
    assert_eq!(*c.client_handshake_secret, *s.client_handshake_secret);
    assert_eq!(*c.server_handshake_secret, *s.server_handshake_secret);
    assert!(is_non_zero(&c.extract_secret));
    assert!(is_non_zero(&c.client_handshake_secret));
    assert!(is_non_zero(&c.server_handshake_secret));
}

fn prefs(groups: Vec<crate::registry::KemGroup>, curves: Vec<crate::registry::EcCurve>, rev: u8) -> policy::PreferenceSet {
    policy::PreferenceSet::new(groups, curves, rev, policy::TlsVersion::Tls13)
}

// Boundary scenario #1: fast path, draft-0.
#[test]
fn scenario_1_fast_path_draft0() {
    let client_prefs = prefs(vec![X25519_MLKEM768], vec![X25519], 0);
    let server_prefs = prefs(vec![X25519_MLKEM768, SECP256R1_MLKEM768], all_curves().to_vec(), 5);

    let (client, server) = run_handshake(client_prefs, server_prefs);
    assert!(!client.context().handshake_type_flags().contains(HandshakeTypeFlags::HELLO_RETRY_REQUEST));
    assert_eq!(client.context().negotiated(), Some(Selected::Hybrid { group: X25519_MLKEM768, len_prefixed: false }));
    assert_eq!(client.context().negotiated(), server.context().negotiated());
    assert_equal_nonzero_secrets(&client, &server);
}

// Boundary scenario #2: mutually supported but client sends no key share
// on its first flight -- forces an HRR round-trip.
#[test]
fn scenario_2_requires_hrr() {
    // The client's top (and eagerly-shared) choice isn't one the server
    // supports at all; the server falls back to its second-tier scan and
    // lands on the client's second-listed group, for which the client sent
    // no share on the first flight -- forcing an HRR round-trip.
    let client_prefs = prefs(vec![SECP384R1_MLKEM768, X25519_MLKEM768], vec![X25519], 5);
    let server_prefs = prefs(vec![X25519_MLKEM768], all_curves().to_vec(), 5);

    let mut client = ClientHandshake::new(client_prefs, AwsLcCollaborator, CapabilityProbe::all());
    let mut server = ServerHandshake::new(server_prefs, AwsLcCollaborator, CapabilityProbe::all());

    let ch1 = client.send_client_hello().unwrap();
    let step = server.receive_client_hello(ch1).unwrap();
    let hrr = match step {
        ServerHandshakeStep::SendHelloRetryRequest(hrr) => hrr,
        ServerHandshakeStep::SendServerHello(_) => panic!("expected HRR: scenario forces a second round-trip"),
    };
    assert_eq!(hrr.selected_group, X25519_MLKEM768.iana_id);

    let ch2 = client.receive_hello_retry_request(hrr).unwrap();
    match server.receive_client_hello(ch2).unwrap() {
        ServerHandshakeStep::SendServerHello(sh) => client.receive_server_hello(sh).unwrap(),
        ServerHandshakeStep::SendHelloRetryRequest(_) => panic!("state machine looped"),
    }

    assert!(client.context().handshake_type_flags().contains(HandshakeTypeFlags::HELLO_RETRY_REQUEST));
    assert!(server.context().handshake_type_flags().contains(HandshakeTypeFlags::HELLO_RETRY_REQUEST));
    assert_equal_nonzero_secrets(&client, &server);
}

// Boundary scenario #6: classical-only client against a PQ-capable server.
#[test]
fn scenario_6_classical_only_client() {
    let client_prefs = prefs(vec![], vec![X25519, SECP256R1], 0);
    let server_prefs = prefs(vec![X25519_MLKEM768], vec![X25519, SECP256R1, SECP384R1], 5);

    let (client, server) = run_handshake(client_prefs, server_prefs);
    assert!(!client.context().handshake_type_flags().contains(HandshakeTypeFlags::HELLO_RETRY_REQUEST));
    assert_eq!(client.context().negotiated(), Some(Selected::Classical { curve: X25519 }));
    assert_eq!(client.context().kem_group_name(), "");
    assert_eq!(client.context().curve_name(), "x25519");
    assert_equal_nonzero_secrets(&client, &server);
}

// A second HelloRetryRequest is never valid: the state machine must not
// loop (spec.md §4.4).
#[test]
fn second_hello_retry_request_is_rejected() {
    let client_prefs = prefs(vec![X25519_MLKEM768], vec![X25519], 5);
    let mut client = ClientHandshake::new(client_prefs, AwsLcCollaborator, CapabilityProbe::all());
    client.send_client_hello().unwrap();

    client
        .receive_hello_retry_request(HelloRetryRequestKx { selected_group: X25519.iana_id })
        .unwrap();

    let err = client
        .receive_hello_retry_request(HelloRetryRequestKx { selected_group: SECP384R1.iana_id })
        .unwrap_err();
    assert_eq!(err, Error::PeerMisbehaved(PeerMisbehaved::InconsistentSecondOffer));
}

// A HelloRetryRequest naming the group we already offered a share for
// changes nothing, and is itself a protocol violation.
#[test]
fn hello_retry_request_with_no_changes_is_rejected() {
    let client_prefs = prefs(vec![X25519_MLKEM768], vec![X25519], 5);
    let mut client = ClientHandshake::new(client_prefs, AwsLcCollaborator, CapabilityProbe::all());
    client.send_client_hello().unwrap();

    let err = client
        .receive_hello_retry_request(HelloRetryRequestKx { selected_group: X25519_MLKEM768.iana_id })
        .unwrap_err();
    assert_eq!(err, Error::PeerMisbehaved(PeerMisbehaved::HelloRetryRequestWithNoChanges));
}

// A second ClientHello still missing the indicated group's key share
// aborts rather than looping back into another HelloRetryRequest.
#[test]
fn missing_share_after_hrr_aborts() {
    // Same shape as scenario #2: the client's eagerly-shared top choice
    // isn't one the server supports, forcing a genuine HRR.
    let client_prefs = prefs(vec![SECP384R1_MLKEM768, X25519_MLKEM768], vec![X25519], 5);
    let server_prefs = prefs(vec![X25519_MLKEM768], all_curves().to_vec(), 5);
    let mut client = ClientHandshake::new(client_prefs, AwsLcCollaborator, CapabilityProbe::all());
    let mut server = ServerHandshake::new(server_prefs, AwsLcCollaborator, CapabilityProbe::all());

    let ch1 = client.send_client_hello().unwrap();
    match server.receive_client_hello(ch1).unwrap() {
        ServerHandshakeStep::SendHelloRetryRequest(_) => {}
        ServerHandshakeStep::SendServerHello(_) => panic!("expected HRR"),
    };
    // Build a malicious/broken second ClientHello that still carries no
    // key share for the indicated group, bypassing the honest client.
    let malformed_ch2 = ClientHelloKx {
        supported_groups: vec![X25519_MLKEM768.iana_id, X25519.iana_id],
        key_shares: vec![],
        hybrid_draft_revision: 5,
    };
    let err = server.receive_client_hello(malformed_ch2).unwrap_err();
    assert_eq!(err, Error::PeerMisbehaved(PeerMisbehaved::MissingKeyShareAfterHelloRetryRequest));
    assert_eq!(server.context().state(), HandshakeState::Aborted);
}

// Invariant 4: a successful 1-RTT selection must not trigger HRR.
#[test]
fn fast_path_never_triggers_hrr() {
    let client_prefs = prefs(vec![X25519_MLKEM768], vec![X25519], 5);
    let server_prefs = prefs(vec![X25519_MLKEM768], all_curves().to_vec(), 5);
    let (client, _server) = run_handshake(client_prefs, server_prefs);
    assert!(!client.context().handshake_type_flags().contains(HandshakeTypeFlags::HELLO_RETRY_REQUEST));
}

// Invariant 5: kem_group_name/curve_name are mutually exclusive.
#[test]
fn observability_names_are_mutually_exclusive() {
    let client_prefs = prefs(vec![X25519_MLKEM768], vec![X25519], 5);
    let server_prefs = prefs(vec![X25519_MLKEM768], all_curves().to_vec(), 5);
    let (client, _server) = run_handshake(client_prefs, server_prefs);
    let ctx = client.context();
    assert!(!(ctx.kem_group_name().is_empty() && ctx.curve_name().is_empty()));
    assert!(ctx.kem_group_name().is_empty() || ctx.curve_name().is_empty());
    assert_eq!(ctx.key_exchange_group_name(), ctx.kem_group_name());
}

// Running the selection engine (indirectly, via two independent full
// handshakes on identical inputs) is deterministic.
#[test]
fn repeated_handshakes_on_identical_inputs_agree_on_group() {
    let prefs_a = || prefs(vec![X25519_MLKEM768], vec![X25519], 5);
    let (client1, _server1) = run_handshake(prefs_a(), prefs(vec![X25519_MLKEM768], all_curves().to_vec(), 5));
    let (client2, _server2) = run_handshake(prefs_a(), prefs(vec![X25519_MLKEM768], all_curves().to_vec(), 5));
    assert_eq!(client1.context().negotiated(), client2.context().negotiated());
}
