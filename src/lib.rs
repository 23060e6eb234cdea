//! zkcred - Zero-knowledge verifiable credentials
//!
//! Issue typed, signed credentials and prove statements about their claims
//! (range membership, set membership, boolean reveal) without revealing the
//! raw values.
//!
//! # Architecture
//!
//! 1. A type DSL (`age:uint<8>;country:prop<64,keccak256,2>;@revocable(16);`)
//!    is parsed into a [`types::CredType`]
//! 2. The type is compiled into a circuit: signal layout, public signal
//!    table, aggregation rules and circuit source
//! 3. Issuers sign [`credential::Credential`]s through a [`stack::ProvingStack`]
//! 4. Holders check [`statement::StatementList`]s against their credential
//!    and build the circuit input the compiled circuit expects
//! 5. Proofs are verified off-chain or by the rendered on-chain verifier

pub mod babyzk;
pub mod circuit;
pub mod claim;
pub mod config;
pub mod credential;
pub mod error;
pub mod field;
pub mod poseidon;
pub mod revocation;
pub mod stack;
pub mod statement;
pub mod types;

// Re-export main types
pub use babyzk::BabyzkStack;
pub use circuit::{gen_circuit, Circuit};
pub use claim::ClaimValue;
pub use config::StackConfig;
pub use credential::{Body, Credential, Header, SignatureMetadata};
pub use error::{Error, ErrorKind, Result};
pub use stack::ProvingStack;
pub use statement::{Query, Statement, StatementList};
pub use types::{parse_type, CredType};
