//! The four stages of a convergence cycle.
//!
//! Each stage is a free function over the client traits so it can run
//! against the real APIs or the mocks. Per-peer work is sequential and a
//! stage returns on its first error.

pub mod identity;
pub mod membership;
pub mod pairing;
pub mod sharing;

pub use identity::resolve_identities;
pub use membership::{resolve_membership, Membership};
pub use pairing::reconcile_pairing;
pub use sharing::{reconcile_sharing, SharingOutcome};
