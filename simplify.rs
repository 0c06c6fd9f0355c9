use std::collections::BTreeMap;

use indexmap::IndexMap;
use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::assertion::{render_hash, Assertion};
use crate::clause::{Clause, VarKey};

/// Hard ceiling on total clauses; beyond this the formula is abandoned
/// rather than reasoned about.
const MAX_CLAUSE_COUNT: usize = 65_536;

/// Above this many clauses, a formula made up entirely of synthetic
/// (`*`-prefixed) variables is returned unchanged rather than simplified —
/// such formulae carry no real per-variable facts, so simplifying them
/// buys nothing but costs an O(n^2) pass.
const UNKNOWN_SHORT_CIRCUIT_THRESHOLD: usize = 50;

/// The three-way resolution pass is only worth its O(n^2) cost in this
/// range: too few clauses and there's nothing to resolve, too many and the
/// pass itself risks becoming the bottleneck it's meant to avoid.
const THREE_WAY_MIN: usize = 2;
const THREE_WAY_MAX: usize = 256;

fn keys_match<A: Assertion>(
    a: &BTreeMap<VarKey, IndexMap<u64, A>>,
    b: &BTreeMap<VarKey, IndexMap<u64, A>>,
) -> bool {
    a.len() == b.len() && a.keys().all(|k| b.contains_key(k))
}

/// A very simple simplification heuristic for CNF formulae.
///
/// It simplifies formulae like:
///     (a) && (a || b) => (a)
///     (!a) && (!b) && (a || b || c) => (!a) && (!b) && (c)
///
/// No claim of SAT completeness is made — this is a fixed-point-free pass
/// of unit resolution, subsumption and a bounded three-way resolution, run
/// once over the input. Two logically-equivalent inputs may simplify to
/// different (but still logically-equivalent) outputs; see the module docs
/// on ordering sensitivity.
pub fn simplify_cnf<A: Assertion>(clauses: &[Clause<A>]) -> Vec<Clause<A>> {
    if clauses.len() > MAX_CLAUSE_COUNT {
        log::debug!(
            "simplify_cnf: {} clauses exceeds the {} hard limit, giving up",
            clauses.len(),
            MAX_CLAUSE_COUNT
        );
        return vec![];
    }

    if clauses.len() > UNKNOWN_SHORT_CIRCUIT_THRESHOLD {
        let all_have_unknown = clauses
            .iter()
            .all(|clause| clause.possibilities.keys().any(|key| key.is_unknown()));

        if all_have_unknown {
            return clauses.to_vec();
        }
    }

    let mut unique_clauses: Vec<Clause<A>> = clauses.iter().cloned().unique().collect();

    let mut removed_clauses: FxHashSet<Clause<A>> = FxHashSet::default();
    let mut added_clauses: Vec<Clause<A>> = vec![];

    // Unit resolution over complementary literals.
    'outer: for clause_a in &unique_clauses {
        if !clause_a.reconcilable || clause_a.wedge {
            continue;
        }

        let is_unit_clause = clause_a.possibilities.len() == 1
            && clause_a.possibilities.values().next().unwrap().len() == 1;

        if !is_unit_clause {
            // (a || x) && (!a || y) && (x || y) style: two non-unit clauses
            // over the same key set, disagreeing on exactly one opposing
            // key, resolve on that key.
            'inner: for clause_b in &unique_clauses {
                if clause_a == clause_b || !clause_b.reconcilable || clause_b.wedge {
                    continue;
                }

                if !keys_match(&clause_a.possibilities, &clause_b.possibilities) {
                    continue;
                }

                let mut opposing_keys = vec![];

                for (key, a_possible) in clause_a.possibilities.iter() {
                    let b_possible = &clause_b.possibilities[key];

                    if a_possible.len() == b_possible.len()
                        && a_possible.keys().all(|k| b_possible.contains_key(k))
                    {
                        continue;
                    }

                    if a_possible.len() == 1 && b_possible.len() == 1 {
                        let a_val = a_possible.values().next().unwrap();
                        let b_val = b_possible.values().next().unwrap();
                        if a_val.is_negation_of(b_val) {
                            opposing_keys.push(key.clone());
                            continue;
                        }
                    }

                    continue 'inner;
                }

                if opposing_keys.len() == 1 {
                    removed_clauses.insert(clause_a.clone());

                    match clause_a.remove_possibilities(&opposing_keys[0]) {
                        Some(new_clause) => added_clauses.push(new_clause),
                        None => continue 'outer,
                    }
                }
            }

            continue;
        }

        // (a) && (!a || b) => (a) && (b): clause_a is a unit clause {v: [t]};
        // strip !t out of every other clause mentioning v.
        let (clause_var, var_possibilities) = clause_a.possibilities.iter().next().unwrap();
        let only_type = var_possibilities.values().next().unwrap();
        let negated_hash = render_hash(&only_type.negate());

        for clause_b in &unique_clauses {
            if clause_a == clause_b || !clause_b.reconcilable || clause_b.wedge {
                continue;
            }

            if let Some(matching) = clause_b.possibilities.get(clause_var) {
                if matching.contains_key(&negated_hash) {
                    let mut retained = matching.clone();
                    retained.retain(|k, _| *k != negated_hash);

                    removed_clauses.insert(clause_b.clone());

                    if retained.is_empty() {
                        if let Some(updated) = clause_b.remove_possibilities(clause_var) {
                            added_clauses.push(updated);
                        }
                    } else {
                        added_clauses.push(clause_b.with_possibilities(clause_var.clone(), retained));
                    }
                }
            }
        }
    }

    unique_clauses.retain(|c| !removed_clauses.contains(c));

    if !added_clauses.is_empty() {
        unique_clauses.extend(added_clauses);
        unique_clauses = unique_clauses.into_iter().unique().collect();
    }

    // Subsumption: a clause implied by a strictly weaker one already in the
    // set is redundant.
    let mut simplified_clauses = vec![];

    for clause_a in &unique_clauses {
        let is_redundant = unique_clauses.iter().any(|clause_b| {
            clause_a != clause_b
                && clause_b.reconcilable
                && !clause_b.wedge
                && !clause_a.wedge
                && clause_a.contains(clause_b)
        });

        if !is_redundant {
            simplified_clauses.push(clause_a.clone());
        }
    }

    // (A || X) && (!A || Y) && (X || Y) => (A || X) && (!A || Y)
    if simplified_clauses.len() > THREE_WAY_MIN && simplified_clauses.len() < THREE_WAY_MAX {
        let mut compared_clauses: FxHashSet<(u32, u32)> = FxHashSet::default();
        let mut removed: FxHashSet<Clause<A>> = FxHashSet::default();

        for clause_a in &simplified_clauses {
            for clause_b in &simplified_clauses {
                if clause_a == clause_b || compared_clauses.contains(&(clause_b.hash, clause_a.hash))
                {
                    continue;
                }

                compared_clauses.insert((clause_a.hash, clause_b.hash));

                let common_keys: Vec<&VarKey> = clause_a
                    .possibilities
                    .keys()
                    .filter(|key| clause_b.possibilities.contains_key(*key))
                    .collect();

                if common_keys.is_empty() {
                    continue;
                }

                let mut common_negated_keys: FxHashSet<VarKey> = FxHashSet::default();

                for key in common_keys {
                    let a_possible = clause_a.possibilities.get(key).unwrap();
                    let b_possible = clause_b.possibilities.get(key).unwrap();

                    if a_possible.len() == 1 && b_possible.len() == 1 {
                        let a_val = a_possible.values().next().unwrap();
                        let b_val = b_possible.values().next().unwrap();
                        if a_val.is_negation_of(b_val) {
                            common_negated_keys.insert(key.clone());
                        }
                    }
                }

                if common_negated_keys.is_empty() {
                    continue;
                }

                let mut new_possibilities: BTreeMap<VarKey, IndexMap<u64, A>> = BTreeMap::new();

                for (var_id, possibilities) in
                    clause_a.possibilities.iter().chain(clause_b.possibilities.iter())
                {
                    if common_negated_keys.contains(var_id) {
                        continue;
                    }

                    new_possibilities
                        .entry(var_id.clone())
                        .or_insert_with(IndexMap::new)
                        .extend(possibilities.clone());
                }

                let conflict_clause = Clause::new(
                    new_possibilities,
                    clause_a.creating_conditional_id,
                    clause_a.creating_object_id,
                    None,
                    None,
                    None,
                    None,
                );

                removed.insert(conflict_clause);
            }
        }

        simplified_clauses.retain(|c| !removed.contains(c));
    }

    simplified_clauses
}
