use std::fmt::Debug;
use std::hash::Hash;

/// The contract the engine needs from an atomic, per-variable predicate.
///
/// Everything about *what* an assertion means — how `is_string` relates to
/// `is_int`, what a literal type looks like — belongs to the type system
/// that produced it, not to this crate. The engine only needs to render an
/// assertion, negate it, and compare it against another assertion's negation.
pub trait Assertion: Clone + Debug + PartialEq + Eq + Hash {
    /// Canonical textual form, used for equality/hashing across the engine.
    fn render(&self) -> String;

    /// The logical complement of this assertion.
    fn negate(&self) -> Self;

    /// True if `self` is the negation of `other` (i.e. `self == other.negate()`
    /// by rendered form, without requiring the caller to materialize it).
    fn is_negation_of(&self, other: &Self) -> bool;

    /// True if this assertion is itself already a negative form (`!is_string`
    /// as opposed to `is_string`). Distinct from `is_negation_of`, which
    /// compares two assertions against each other.
    fn is_negation(&self) -> bool;

    /// True for the "falsy" marker variant used by the truth extractor to
    /// decide whether a multi-possibility clause reads as a positive fact.
    fn is_falsy(&self) -> bool;
}

/// Hashes an assertion by its rendered form, the same identity the engine
/// uses everywhere (clause content hashing, possibility dedup).
pub(crate) fn render_hash<A: Assertion>(assertion: &A) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    assertion.render().hash(&mut hasher);
    std::hash::Hasher::finish(&hasher)
}
