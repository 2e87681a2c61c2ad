use crate::term::TermId;
use std::fmt;

/// Contract violations detected at the term-table boundary.
///
/// These are caller bugs rather than recoverable conditions, but they are
/// reported before any state is touched so the table stays consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermError {
    /// The id does not name a live term in this table.
    UnknownTerm(TermId),
    /// `deref` on a term whose reference count is already zero.
    ZeroRefCount(TermId),
    /// `fresh_var` after the last variable slot was issued.
    VarSlotsExhausted,
}

impl fmt::Display for TermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermError::UnknownTerm(id) => {
                write!(f, "reference to unknown term id t{}", id.raw())
            }
            TermError::ZeroRefCount(id) => {
                write!(f, "deref of term t{} with zero reference count", id.raw())
            }
            TermError::VarSlotsExhausted => write!(f, "no fresh variable slot left"),
        }
    }
}

impl std::error::Error for TermError {}
