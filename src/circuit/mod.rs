//! Circuit compilation for credential types.

mod aggregation;
mod codegen;
mod compiler;
mod field_def;
mod signals;

pub use aggregation::{solidity_uint, Aggregation, AggregationMode};
pub use codegen::CodeBuilder;
pub use compiler::{gen_circuit, layout, Circuit, CircuitLayout, InputSignal, MAX_PUBLIC_SIGNALS};
pub use field_def::{FieldDef, FieldDefList};
pub use signals::{IntrinsicSignal, PublicSignalDef};
