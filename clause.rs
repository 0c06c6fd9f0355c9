use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::Wrapping;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::assertion::{render_hash, Assertion};

/// An opaque per-variable key. Keys starting with `*` denote synthetic,
/// unknown variables manufactured during analysis (e.g. for sub-expressions
/// that aren't simple variable references); the simplifier uses the prefix
/// to short-circuit over large formulae that carry no real variable facts.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarKey(String);

impl VarKey {
    pub fn new(name: impl Into<String>) -> Self {
        VarKey(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0.starts_with('*')
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VarKey {
    fn from(s: &str) -> Self {
        VarKey(s.to_string())
    }
}

impl From<String> for VarKey {
    fn from(s: String) -> Self {
        VarKey(s)
    }
}

/// One disjunction (OR) in a CNF formula, keyed per variable.
///
/// `possibilities` maps a variable to the non-empty set of assertions it
/// could satisfy for this clause to hold; the outer map is implicitly ORed
/// across every `(var, assertion)` pair it contains. A clause with
/// `possibilities == {x: [A, B], y: [C]}` reads as `x is A || x is B || y is
/// C`.
///
/// Each per-variable list is an `IndexMap<u64, A>` keyed by the assertion's
/// rendered-form hash: inserting the same rendered assertion twice is a
/// no-op at the first position it appeared, which is what keeps a clause's
/// possibilities deduplicated and order-stable without a separate pass over
/// the data.
///
/// Clauses are immutable: every method that looks like a mutation returns a
/// new `Clause` value. Two clauses with the same `hash` are the same clause
/// for every purpose the engine cares about (`PartialEq`/`Hash` delegate to
/// it), which is what lets the simplifier dedupe a `Vec<Clause>` with
/// `itertools::unique`.
#[derive(Clone, Debug, Eq)]
pub struct Clause<A: Assertion> {
    pub creating_conditional_id: (u32, u32),
    pub creating_object_id: (u32, u32),

    pub hash: u32,

    pub possibilities: BTreeMap<VarKey, IndexMap<u64, A>>,

    /// Negation of every possibility, grouped by variable. `None` until
    /// `calculate_negation` has been called; the grouper refuses to run
    /// against a clause where this is still `None` (`Error::InvalidState`).
    pub impossibilities: Option<BTreeMap<VarKey, Vec<A>>>,

    /// A marker clause meaning "unknown/ambiguous". Always satisfiable,
    /// never simplified against other clauses.
    pub wedge: bool,

    /// Whether this clause may participate in simplification/extraction.
    pub reconcilable: bool,

    /// True if produced by a logical transformation (negation, OR-combine)
    /// rather than taken directly from a source conditional.
    pub generated: bool,

    /// Variables whose prior facts must not carry across this clause.
    pub redefined_vars: Option<FxHashSet<VarKey>>,
}

impl<A: Assertion> PartialEq for Clause<A> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl<A: Assertion> Hash for Clause<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state)
    }
}

#[allow(clippy::too_many_arguments)]
impl<A: Assertion> Clause<A> {
    pub fn new(
        possibilities: BTreeMap<VarKey, IndexMap<u64, A>>,
        creating_conditional_id: (u32, u32),
        creating_object_id: (u32, u32),
        wedge: Option<bool>,
        reconcilable: Option<bool>,
        generated: Option<bool>,
        redefined_vars: Option<FxHashSet<VarKey>>,
    ) -> Clause<A> {
        let wedge = wedge.unwrap_or(false);
        let reconcilable = reconcilable.unwrap_or(true);

        Clause {
            hash: get_hash(&possibilities, creating_object_id, wedge, reconcilable),
            possibilities,
            impossibilities: None,
            creating_conditional_id,
            creating_object_id,
            wedge,
            reconcilable,
            generated: generated.unwrap_or(false),
            redefined_vars,
        }
    }

    /// Returns a clause whose per-var possibility lists are deduplicated by
    /// rendered form. A clause built with the `IndexMap<u64, A>`
    /// representation above is already unique per rendered form — this just
    /// makes that invariant callable as its own operation.
    pub fn make_unique(&self) -> Clause<A> {
        self.clone()
    }

    pub fn remove_possibilities(&self, var_id: &VarKey) -> Option<Clause<A>> {
        let mut possibilities = self.possibilities.clone();
        possibilities.remove(var_id);

        if possibilities.is_empty() {
            return None;
        }

        Some(Clause {
            hash: get_hash(
                &possibilities,
                self.creating_object_id,
                self.wedge,
                self.reconcilable,
            ),
            possibilities,
            impossibilities: None,
            creating_conditional_id: self.creating_conditional_id,
            creating_object_id: self.creating_object_id,
            wedge: self.wedge,
            reconcilable: self.reconcilable,
            generated: self.generated,
            redefined_vars: self.redefined_vars.clone(),
        })
    }

    /// Unions `extras` into `var_id`'s possibility list (inserting it fresh
    /// if the variable wasn't already present).
    pub fn add_possibilities(&self, var_id: VarKey, extras: IndexMap<u64, A>) -> Clause<A> {
        let mut possibilities = self.possibilities.clone();
        possibilities
            .entry(var_id)
            .or_insert_with(IndexMap::new)
            .extend(extras);

        Clause {
            hash: get_hash(
                &possibilities,
                self.creating_object_id,
                self.wedge,
                self.reconcilable,
            ),
            possibilities,
            impossibilities: None,
            creating_conditional_id: self.creating_conditional_id,
            creating_object_id: self.creating_object_id,
            wedge: self.wedge,
            reconcilable: self.reconcilable,
            generated: self.generated,
            redefined_vars: self.redefined_vars.clone(),
        }
    }

    /// Replaces `var_id`'s possibility list outright (used where the caller
    /// has already computed the exact surviving set, as opposed to
    /// `add_possibilities`, which only ever grows a list).
    pub fn with_possibilities(&self, var_id: VarKey, replacement: IndexMap<u64, A>) -> Clause<A> {
        let mut possibilities = self.possibilities.clone();
        possibilities.insert(var_id, replacement);

        Clause {
            hash: get_hash(
                &possibilities,
                self.creating_object_id,
                self.wedge,
                self.reconcilable,
            ),
            possibilities,
            impossibilities: None,
            creating_conditional_id: self.creating_conditional_id,
            creating_object_id: self.creating_object_id,
            wedge: self.wedge,
            reconcilable: self.reconcilable,
            generated: self.generated,
            redefined_vars: self.redefined_vars.clone(),
        }
    }

    /// Subsumption: true iff every `(var, assertion)` pair `other` requires
    /// is also required by `self` — meaning `other` is a weaker disjunction
    /// than `self`, so `self` is redundant wherever `other` already holds.
    pub fn contains(&self, other: &Self) -> bool {
        if other.possibilities.len() > self.possibilities.len() {
            return false;
        }

        other.possibilities.iter().all(|(var, possible)| {
            self.possibilities
                .get(var)
                .map(|local| possible.keys().all(|k| local.contains_key(k)))
                .unwrap_or(false)
        })
    }

    /// The negation of every possibility in this clause, grouped by
    /// variable. Does not mutate `self` — see `calculate_negation` for the
    /// value-returning form the grouper actually consumes.
    pub fn get_impossibilities(&self) -> BTreeMap<VarKey, Vec<A>> {
        let mut impossibilities = BTreeMap::new();

        for (var_key, possibility) in &self.possibilities {
            let impossibility: Vec<A> = possibility.values().map(|a| a.negate()).collect();

            if !impossibility.is_empty() {
                impossibilities.insert(var_key.clone(), impossibility);
            }
        }

        impossibilities
    }

    /// Returns a clause identical to `self` but with `impossibilities`
    /// populated, as required before this clause may be passed to the
    /// grouper (see `crate::Error::InvalidState`).
    pub fn calculate_negation(&self) -> Clause<A> {
        Clause {
            impossibilities: Some(self.get_impossibilities()),
            ..self.clone()
        }
    }

    pub fn render(&self) -> String {
        if self.wedge {
            return "<wedge>".to_string();
        }

        if self.possibilities.is_empty() {
            return "<empty>".to_string();
        }

        let mut clause_strings = vec![];

        for (var_id, values) in self.possibilities.iter() {
            let parts: Vec<String> = values
                .values()
                .map(|value| format!("{var_id} is {}", value.render()))
                .collect();

            if parts.len() > 1 {
                clause_strings.push(format!("({})", parts.join(") || (")));
            } else {
                clause_strings.push(parts[0].clone());
            }
        }

        if clause_strings.len() > 1 {
            format!("({})", clause_strings.join(") || ("))
        } else {
            clause_strings[0].clone()
        }
    }
}

fn get_hash<A: Assertion>(
    possibilities: &BTreeMap<VarKey, IndexMap<u64, A>>,
    creating_object_id: (u32, u32),
    wedge: bool,
    reconcilable: bool,
) -> u32 {
    if wedge || !reconcilable {
        (Wrapping(creating_object_id.0)
            + Wrapping(creating_object_id.1)
            + Wrapping(if wedge { 100_000 } else { 0 }))
        .0
    } else {
        let mut hasher = rustc_hash::FxHasher::default();

        for (var, possibility) in possibilities {
            var.hash(&mut hasher);
            0u8.hash(&mut hasher);

            for key in possibility.keys() {
                key.hash(&mut hasher);
                1u8.hash(&mut hasher);
            }
        }

        hasher.finish() as u32
    }
}

/// Builds a single-variable, single-assertion possibility map — the shape
/// every unit clause's `possibilities` field takes.
pub(crate) fn unit_possibilities<A: Assertion>(assertion: &A) -> IndexMap<u64, A> {
    IndexMap::from([(render_hash(assertion), assertion.clone())])
}

/// A wedge clause: no possibilities, always satisfiable, inert in
/// simplification. Used whenever a transformation exhausts all information
/// about a formula (see `negate_formula`, `combine_ored_clauses`).
pub(crate) fn wedge_clause<A: Assertion>(id: (u32, u32)) -> Clause<A> {
    Clause::new(BTreeMap::new(), id, id, Some(true), None, None, None)
}
