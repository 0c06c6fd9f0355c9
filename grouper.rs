use std::collections::BTreeMap;

use crate::assertion::Assertion;
use crate::clause::{unit_possibilities, Clause};
use crate::error::Error;

/// Growth ceiling for the cross-product below. A chain of clauses with many
/// alternatives each can blow this up combinatorially; past this point the
/// negation is abandoned rather than computed.
const COMPLEXITY_LIMIT: usize = 20_000;

const MISSING_IMPOSSIBILITIES: &str =
    "calculate_negation must be called on every clause before grouping";

/// Distributes one impossibility per clause across all clauses, producing
/// the CNF of the negated conjunction (the distributive expansion of ANDing
/// one impossibility from each clause). Only ever called by
/// `negate_formula`, on a non-empty list of clauses that have already had
/// `calculate_negation` run on them.
pub(crate) fn group_impossibilities<A: Assertion>(
    mut clauses: Vec<Clause<A>>,
) -> Result<Vec<Clause<A>>, Error> {
    let mut complexity = 1usize;
    let mut seed_clauses = vec![];

    let clause = clauses
        .pop()
        .expect("group_impossibilities requires at least one clause");

    if !clause.wedge {
        let impossibilities = clause
            .impossibilities
            .as_ref()
            .ok_or(Error::InvalidState(MISSING_IMPOSSIBILITIES))?;

        for (var, impossible_types) in impossibilities.iter() {
            for impossible_type in impossible_types.iter() {
                let mut possibilities = BTreeMap::new();
                possibilities.insert(var.clone(), unit_possibilities(impossible_type));

                seed_clauses.push(Clause::new(
                    possibilities,
                    clause.creating_conditional_id,
                    clause.creating_object_id,
                    None,
                    None,
                    None,
                    None,
                ));

                complexity += 1;
            }
        }
    }

    if clauses.is_empty() || seed_clauses.is_empty() {
        return Ok(seed_clauses);
    }

    // Upper-bound the eventual clause count before doing any of the work,
    // so a chain of wide clauses fails fast instead of after generating
    // most of the blow-up.
    let mut upper_bound = seed_clauses.len();

    for c in &clauses {
        let impossibilities = c
            .impossibilities
            .as_ref()
            .ok_or(Error::InvalidState(MISSING_IMPOSSIBILITIES))?;

        let alternatives: usize = impossibilities.values().map(|v| v.len()).sum::<usize>().max(1);
        upper_bound = upper_bound.saturating_mul(alternatives);

        if upper_bound > COMPLEXITY_LIMIT {
            return Err(Error::ComplicatedExpression);
        }
    }

    while let Some(clause) = clauses.pop() {
        let impossibilities = clause
            .impossibilities
            .as_ref()
            .ok_or(Error::InvalidState(MISSING_IMPOSSIBILITIES))?;

        let mut new_clauses = vec![];

        for grouped_clause in &seed_clauses {
            for (var, impossible_types) in impossibilities.iter() {
                'next: for impossible_type in impossible_types {
                    // If the growing clause already carries the negation of
                    // this impossibility for the same var, OR-ing it in
                    // would make that var's slot a tautology (t || !t) —
                    // skip emitting this branch rather than generate it and
                    // filter it back out.
                    if let Some(existing) = grouped_clause.possibilities.get(var) {
                        for assertion in existing.values() {
                            if assertion.is_negation_of(impossible_type) {
                                continue 'next;
                            }
                        }
                    }

                    let mut possibilities = grouped_clause.possibilities.clone();
                    possibilities
                        .entry(var.clone())
                        .or_insert_with(indexmap::IndexMap::new)
                        .insert(
                            crate::assertion::render_hash(impossible_type),
                            impossible_type.clone(),
                        );

                    new_clauses.push(Clause::new(
                        possibilities,
                        grouped_clause.creating_conditional_id,
                        clause.creating_object_id,
                        Some(false),
                        Some(true),
                        Some(true),
                        None,
                    ));

                    complexity += 1;

                    if complexity > COMPLEXITY_LIMIT {
                        return Err(Error::ComplicatedExpression);
                    }
                }
            }
        }

        seed_clauses = new_clauses;
    }

    seed_clauses.reverse();

    Ok(seed_clauses)
}
