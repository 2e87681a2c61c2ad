//! Term core for equality-tracking abstract domains.
//!
//! - [`term`]: hash-consed, reference-counted term DAG
//! - [`congruence`]: congruence closure over a term table
//! - [`generalize`]: anti-unification and copying between tables

pub mod config;
pub mod congruence;
pub mod error;
pub mod generalize;
pub mod symbol;
pub mod term;
pub mod trace;

pub use congruence::{CongruenceClosure, RunStats};
pub use error::TermError;
pub use term::{Term, TermId, TermTable};

/// Table over arbitrary-precision integers and interned functor names.
pub type AnalysisTable = TermTable<num_bigint::BigInt, symbol::FuncId>;

#[cfg(test)]
pub(crate) mod test_utils;
