//! A hybrid, post-quantum-secure[^1] key-exchange negotiation core for
//! TLS 1.3.
//!
//! This crate is the negotiation *core* only: the static catalog of
//! supported hybrid KEM groups and classical curves ([`registry`]), named
//! security policies built from it ([`policy`]), the pure preference-
//! intersection selection rule ([`select`]), the generate/complete key-share
//! exchange ([`keyshare`]), and the client/server handshake drivers that tie
//! them together ([`handshake`]), plus the fixed-size connection-export
//! wire format ([`export`]) for handing a completed connection's
//! record-layer state to another process. It does not implement TLS
//! record-layer framing, certificate validation, or AEAD -- those live in a
//! full TLS stack built on top of this core.
//!
//! Primitive crypto (ECDH, KEM, HKDF) is supplied through the
//! [`crypto::CryptoCollaborator`] trait; the `aws-lc-rs` feature (on by
//! default) ships [`crypto::AwsLcCollaborator`], the same backend used
//! elsewhere in the `rustls` ecosystem this crate is descended from.
//!
//! # Quick start
//!
//! ```rust
//! use pq_tls_kex::capability::CapabilityProbe;
//! use pq_tls_kex::crypto::AwsLcCollaborator;
//! use pq_tls_kex::handshake::{ClientHandshake, ServerHandshake, ServerHandshakeStep};
//! use pq_tls_kex::policy;
//!
//! let probe = CapabilityProbe::detect(&AwsLcCollaborator);
//! let mut client = ClientHandshake::new(policy::default_pq(), AwsLcCollaborator, probe);
//! let mut server = ServerHandshake::new(policy::default_pq(), AwsLcCollaborator, probe);
//!
//! let client_hello = client.send_client_hello().unwrap();
//! match server.receive_client_hello(client_hello).unwrap() {
//!     ServerHandshakeStep::SendServerHello(server_hello) => {
//!         client.receive_server_hello(server_hello).unwrap();
//!     }
//!     ServerHandshakeStep::SendHelloRetryRequest(hrr) => {
//!         let client_hello_2 = client.receive_hello_retry_request(hrr).unwrap();
//!         if let ServerHandshakeStep::SendServerHello(server_hello) =
//!             server.receive_client_hello(client_hello_2).unwrap()
//!         {
//!             client.receive_server_hello(server_hello).unwrap();
//!         }
//!     }
//! }
//!
//! assert!(client.context().derived_secrets().is_some());
//! ```
//!
//! [^1]: a "post-quantum-secure" algorithm is one posited to be invulnerable
//!       to attack using a cryptographically-relevant quantum computer. Such
//!       computers do not currently exist, but captured traffic could be
//!       decrypted retroactively once they do -- this is why the hybrid
//!       construction here always runs a classical exchange alongside the PQ
//!       one, rather than replacing it.

pub mod capability;
pub mod crypto;
pub mod error;
pub mod export;
#[cfg(feature = "aws-lc-rs")]
pub mod handshake;
pub mod keyshare;
mod logging;
pub mod policy;
pub mod registry;
pub mod select;

pub use error::Error;
