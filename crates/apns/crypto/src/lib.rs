//! APNs Client Identity
//!
//! Loading and validation of the TLS client certificate used to
//! authenticate against the push service.

mod identity;

pub use identity::*;
