//! Business services: identity verification, session tokens, invite codes.

pub mod identity;
pub mod invite_code;
pub mod session;

pub use identity::IdentityVerifier;
