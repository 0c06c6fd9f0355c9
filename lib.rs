//! A propositional-logic engine over type assertions.
//!
//! A surrounding static analyzer builds a conjunction of disjunctive
//! [`Clause`]s per conditional it walks, then uses this crate to simplify
//! that CNF, negate it, extract single-valued facts per variable, and
//! combine two branches' formulae under logical OR. The engine is pure and
//! synchronous: every operation takes clause values in and returns fresh
//! clause values out, with no shared mutable state.
//!
//! What an assertion *means* — how `is_string` relates to `is_int`, what a
//! literal type looks like — belongs to the type system that produced it,
//! not to this crate; see the [`assertion::Assertion`] trait for the
//! narrow contract the engine actually needs.

pub mod assertion;
pub mod clause;
pub mod error;
mod grouper;
mod simplify;
pub mod type_assertion;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};

pub use assertion::Assertion;
pub use clause::{Clause, VarKey};
pub use error::Error;
pub use simplify::simplify_cnf;

/// A fresh id for a wedge clause manufactured mid-transformation (an
/// exhausted negation, an all-wedge OR-combine). Only needed to give
/// otherwise-identical wedges distinct provenance; a monotonic counter
/// would serve the same purpose, but the corpus this engine is modeled on
/// draws from the process RNG, so this does too.
fn fresh_wedge_id() -> (u32, u32) {
    let n: u32 = rand::thread_rng().gen();
    (n, n)
}

/// Negates a whole CNF formula, producing a new CNF.
///
/// ```text
/// negate_formula([a || b]) => (!a) && (!b)
/// negate_formula([a, b]) => (!a) || (!b)
/// negate_formula([a, b || c]) =>
///   (!a || !b) && (!a || !c)
/// ```
///
/// Unreconcilable clauses carry no information for this purpose and are
/// dropped before negation. If nothing reconcilable remains, or the
/// grouper/simplifier end up eliminating every clause, the result is a
/// single wedge clause — "no information survives negation" rather than
/// "the formula negates to nothing" (an empty CNF would otherwise read as
/// trivially true, the opposite of what an exhausted negation means).
pub fn negate_formula<A: Assertion>(mut clauses: Vec<Clause<A>>) -> Result<Vec<Clause<A>>, Error> {
    clauses.retain(|clause| clause.reconcilable);

    if clauses.is_empty() {
        return Ok(vec![clause::wedge_clause(fresh_wedge_id())]);
    }

    let negated_inputs: Vec<Clause<A>> =
        clauses.iter().map(Clause::calculate_negation).collect();

    let impossible_clauses = grouper::group_impossibilities(negated_inputs)?;

    if impossible_clauses.is_empty() {
        return Ok(vec![clause::wedge_clause(fresh_wedge_id())]);
    }

    let negated = simplify_cnf(&impossible_clauses);

    if negated.is_empty() {
        return Ok(vec![clause::wedge_clause(fresh_wedge_id())]);
    }

    Ok(negated)
}

/// Reads single-valued facts per variable out of a CNF.
///
/// `creating_conditional_id`, when given, selects the subset of `truths`
/// attributable to that particular conditional — returned as
/// `active_truths`. `cond_referenced_var_ids` is updated in place: a
/// variable whose disjunction came from a `generated` multi-possibility
/// clause is removed from it, since such a clause is a side effect of an
/// earlier transformation rather than a direct reference the analyzer
/// should credit to this conditional.
///
/// Skips clauses that aren't reconcilable, that mention more than one
/// variable, or whose sole variable is synthetic (`'*'`-prefixed).
pub fn truths_from_formula<A: Assertion>(
    clauses: &[Clause<A>],
    creating_conditional_id: Option<(u32, u32)>,
    cond_referenced_var_ids: &mut FxHashSet<VarKey>,
) -> (
    BTreeMap<VarKey, Vec<Vec<A>>>,
    BTreeMap<VarKey, FxHashSet<usize>>,
) {
    let mut truths: BTreeMap<VarKey, Vec<Vec<A>>> = BTreeMap::new();
    let mut active_truths: BTreeMap<VarKey, FxHashSet<usize>> = BTreeMap::new();

    for clause in clauses {
        if !clause.reconcilable || clause.possibilities.len() != 1 {
            continue;
        }

        let (var_id, possible_types) = clause.possibilities.iter().next().unwrap();

        if var_id.is_unknown() {
            continue;
        }

        if possible_types.len() == 1 {
            let only_type = possible_types.values().next().unwrap();

            let redefined = clause
                .redefined_vars
                .as_ref()
                .is_some_and(|vars| vars.contains(var_id));

            if redefined {
                truths.insert(var_id.clone(), vec![vec![only_type.clone()]]);
            } else {
                truths
                    .entry(var_id.clone())
                    .or_default()
                    .push(vec![only_type.clone()]);
            }

            if creating_conditional_id == Some(clause.creating_conditional_id) {
                let index = truths.get(var_id).unwrap().len() - 1;
                active_truths.entry(var_id.clone()).or_default().insert(index);
            }

            continue;
        }

        // Multiple possibilities: only worth recording as a positive fact
        // if nothing in the list is a pure negative assertion alongside
        // them (a mix of `is string` and `is not null` doesn't collapse
        // into a single disjunctive truth the same way `is string || is
        // int` does).
        let non_negative_count = possible_types
            .values()
            .filter(|assertion| assertion.is_falsy() || !assertion.is_negation())
            .count();

        if non_negative_count == 0 || non_negative_count != possible_types.len() {
            continue;
        }

        if clause.generated {
            cond_referenced_var_ids.remove(var_id);
        }

        let disjunction: Vec<A> = possible_types.values().cloned().collect();
        truths.insert(var_id.clone(), vec![disjunction]);

        if creating_conditional_id == Some(clause.creating_conditional_id) {
            let index = truths.get(var_id).unwrap().len() - 1;
            active_truths.entry(var_id.clone()).or_default().insert(index);
        }
    }

    (truths, active_truths)
}

/// Merges two CNF formulae under logical OR via pairwise disjunction: each
/// output clause is the union of one clause from the left side and one
/// from the right.
///
/// Either side exceeding the per-side ceiling degrades silently to an
/// empty formula (§7: bound violations outside the grouper never raise,
/// they just mean "no information gained"). An all-wedge cross product
/// collapses to a single wedge clause rather than a cartesian product of
/// indistinguishable wedges.
pub fn combine_ored_clauses<A: Assertion>(
    left_clauses: &[Clause<A>],
    right_clauses: &[Clause<A>],
    conditional_object_id: (u32, u32),
) -> Vec<Clause<A>> {
    const MAX_SIDE: usize = 60_000;

    if left_clauses.is_empty() || right_clauses.is_empty() {
        return vec![];
    }

    if left_clauses.len() > MAX_SIDE || right_clauses.len() > MAX_SIDE {
        log::debug!(
            "combine_ored_clauses: side of {}/{} clauses exceeds the {MAX_SIDE} limit, giving up",
            left_clauses.len(),
            right_clauses.len()
        );
        return vec![];
    }

    let all_wedges = left_clauses
        .iter()
        .all(|l| right_clauses.iter().all(|r| l.wedge && r.wedge));

    if all_wedges {
        return vec![clause::wedge_clause(conditional_object_id)];
    }

    let mut has_wedge_pair = false;
    let mut clauses = vec![];

    for left in left_clauses {
        'right: for right in right_clauses {
            if left.wedge && right.wedge {
                has_wedge_pair = true;
                continue;
            }

            let mut possibilities: BTreeMap<VarKey, IndexMap<u64, A>> = BTreeMap::new();

            for (var, possible) in &left.possibilities {
                if right
                    .redefined_vars
                    .as_ref()
                    .is_some_and(|vars| vars.contains(var))
                {
                    continue;
                }

                possibilities
                    .entry(var.clone())
                    .or_insert_with(IndexMap::new)
                    .extend(possible.clone());
            }

            for (var, possible) in &right.possibilities {
                possibilities
                    .entry(var.clone())
                    .or_insert_with(IndexMap::new)
                    .extend(possible.clone());
            }

            // A var slot holding exactly two mutual negations is a
            // tautology (t || !t) — this pair is always true, so it
            // constrains nothing and is dropped rather than emitted.
            for var_possibilities in possibilities.values() {
                if var_possibilities.len() == 2 {
                    let vals: Vec<&A> = var_possibilities.values().collect();
                    if vals[0].is_negation_of(vals[1]) {
                        continue 'right;
                    }
                }
            }

            let can_reconcile =
                !left.wedge && !right.wedge && left.reconcilable && right.reconcilable;

            let creating_conditional_id = if left.creating_conditional_id
                == right.creating_conditional_id
            {
                left.creating_conditional_id
            } else {
                conditional_object_id
            };

            let generated = left.generated
                || right.generated
                || left_clauses.len() > 1
                || right_clauses.len() > 1;

            clauses.push(Clause::new(
                possibilities,
                creating_conditional_id,
                creating_conditional_id,
                Some(false),
                Some(can_reconcile),
                Some(generated),
                None,
            ));
        }
    }

    if has_wedge_pair {
        clauses.push(clause::wedge_clause(conditional_object_id));
    }

    clauses
}

/// DNF-style negation of a per-variable AND-of-ORs type map: for each
/// variable's shape, apply De Morgan's law as far as the shape allows
/// without losing precision, and drop the variable where it doesn't.
///
/// - Outer length > 1 and every inner disjunction a singleton (a pure
///   conjunction of literals): negate each literal and re-wrap it as its
///   own singleton outer entry — De Morgan turns an AND of literals into
///   an OR of their negations, represented the same way
///   `truths_from_formula`'s multi-possibility rule reads a map
///   disjunctively across outer entries.
/// - Outer length == 1 (a pure disjunction): negate each disjunct and emit
///   each as its own singleton outer entry — De Morgan turns an OR into an
///   AND of negations, each a one-element outer group.
/// - Otherwise (a genuinely mixed AND-of-ORs shape): drop the variable.
///   Heuristic incompleteness here is allowed by the engine's non-goal of
///   full SAT completeness.
pub fn negate_types<A: Assertion>(
    types: FxHashMap<VarKey, Vec<Vec<A>>>,
) -> FxHashMap<VarKey, Vec<Vec<A>>> {
    let mut negated = FxHashMap::default();

    for (var_id, or_groups) in types {
        if or_groups.len() > 1 && or_groups.iter().all(|group| group.len() == 1) {
            let new_groups: Vec<Vec<A>> = or_groups
                .iter()
                .map(|group| vec![group[0].negate()])
                .collect();
            negated.insert(var_id, new_groups);
        } else if or_groups.len() == 1 {
            let new_groups: Vec<Vec<A>> = or_groups[0]
                .iter()
                .map(|assertion| vec![assertion.negate()])
                .collect();
            negated.insert(var_id, new_groups);
        }
    }

    negated
}
