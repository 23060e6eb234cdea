//! Credential model: header, body, signatures and attachments.

#[allow(clippy::module_inception)]
mod credential;
mod header;
mod signature;
mod wire;

pub use credential::{Body, Credential};
pub use header::{Header, CREDENTIAL_VERSION};
pub use signature::{Signature, SignatureMetadata, VerificationStack};
