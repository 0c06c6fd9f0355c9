use std::fmt;

/// The two ways this engine can fail to return a simplified/negated result.
///
/// Every other size-bound violation degrades silently (an empty clause
/// list, meaning "no simplification achieved, treat as trivially true") —
/// see the module docs on `simplify_cnf` and `combine_ored_clauses`. Only
/// two failure kinds get a typed error instead: the grouper's exponential
/// blow-up, which is recoverable, and a broken calling convention, which is
/// a caller bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The grouper's cross-product growth exceeded its complexity ceiling.
    /// Recoverable: the caller should omit assertions for this conditional
    /// rather than propagate the failure further.
    ComplicatedExpression,

    /// A clause reached the grouper without `impossibilities` computed
    /// (i.e. `Clause::calculate_negation` was never called on it). This is
    /// a programming error in the caller, not a resource bound.
    InvalidState(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ComplicatedExpression => {
                write!(f, "expression too complicated to reason about")
            }
            Error::InvalidState(detail) => write!(f, "invalid state: {detail}"),
        }
    }
}

impl std::error::Error for Error {}
