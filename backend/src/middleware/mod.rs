//! Request middleware shared by every route.

pub mod trace;
pub mod trusted_host;

pub use trace::Trace;
pub use trusted_host::TrustedHost;
