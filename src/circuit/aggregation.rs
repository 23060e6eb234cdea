//! Rules for merging the public signals of two proofs of the same type and
//! context into one on-chain record.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::join_u256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationMode {
    TakeGreater,
    TakeGreaterUint256,
    TakeLess,
    TakeLessUint256,
    /// Source is `value * 2 + revealed`; only revealed values are stored.
    SetIfRevealed,
    /// Keeps the value; a different incoming value is a conflict.
    MergeUnlessEq,
    SetToNewValue,
}

impl AggregationMode {
    /// Number of source signals the mode reads.
    pub fn arity(&self) -> usize {
        match self {
            AggregationMode::TakeGreaterUint256 | AggregationMode::TakeLessUint256 => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One destination slot and the rule that fills it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub dest_name: String,
    /// Solidity storage type of the destination, e.g. `uint64`.
    pub dest_type: String,
    pub src_names: Vec<String>,
    pub mode: AggregationMode,
}

impl Aggregation {
    /// Create a new aggregation writing `dest_name` from `src_names`.
    pub fn new(
        dest_name: impl Into<String>,
        dest_bits: u32,
        src_names: Vec<String>,
        mode: AggregationMode,
    ) -> Self {
        Self {
            dest_name: dest_name.into(),
            dest_type: solidity_uint(dest_bits),
            src_names,
            mode,
        }
    }

    /// Merge incoming source signals into the current destination value.
    ///
    /// `current` is `None` when the destination has not been written yet.
    pub fn apply(&self, current: Option<&BigUint>, src: &[BigUint]) -> Result<Option<BigUint>> {
        if src.len() != self.mode.arity() {
            return Err(Error::InternalError(format!(
                "aggregation {} expects {} source value(s), got {}",
                self.dest_name,
                self.mode.arity(),
                src.len()
            )));
        }
        let incoming = match self.mode {
            AggregationMode::TakeGreaterUint256 | AggregationMode::TakeLessUint256 => {
                join_u256(&src[0], &src[1])
            }
            _ => src[0].clone(),
        };

        let merged = match (self.mode, current) {
            (AggregationMode::SetToNewValue, _) => Some(incoming),
            (AggregationMode::SetIfRevealed, current) => {
                if (&incoming & &BigUint::one()).is_one() {
                    Some(incoming >> 1u32)
                } else {
                    current.cloned()
                }
            }
            (_, None) => Some(incoming),
            (AggregationMode::TakeGreater | AggregationMode::TakeGreaterUint256, Some(c)) => {
                Some(c.max(&incoming).clone())
            }
            (AggregationMode::TakeLess | AggregationMode::TakeLessUint256, Some(c)) => {
                Some(c.min(&incoming).clone())
            }
            (AggregationMode::MergeUnlessEq, Some(c)) => match c.cmp(&incoming) {
                Ordering::Equal => Some(incoming),
                _ => {
                    return Err(Error::InvalidQuery(format!(
                        "aggregation {} conflict: {c} != {incoming}",
                        self.dest_name
                    )))
                }
            },
        };
        Ok(merged)
    }
}

/// Smallest Solidity `uintN` holding `bits` bits.
pub fn solidity_uint(bits: u32) -> String {
    let rounded = bits.div_ceil(8).clamp(1, 32) * 8;
    format!("uint{rounded}")
}
