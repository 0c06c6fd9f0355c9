use std::collections::BTreeMap;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::clause::{unit_possibilities, Clause, VarKey};
use crate::type_assertion::TypeAssertion;
use crate::{combine_ored_clauses, negate_formula, negate_types, simplify_cnf, truths_from_formula};

fn unit(var: &str, assertion: TypeAssertion, ids: (u32, u32)) -> Clause<TypeAssertion> {
    let mut possibilities = BTreeMap::new();
    possibilities.insert(VarKey::new(var), unit_possibilities(&assertion));
    Clause::new(possibilities, ids, ids, None, None, None, None)
}

fn disjunction(var: &str, assertions: &[TypeAssertion], ids: (u32, u32)) -> Clause<TypeAssertion> {
    let mut list = IndexMap::new();
    for a in assertions {
        list.insert(crate::assertion::render_hash(a), a.clone());
    }
    let mut possibilities = BTreeMap::new();
    possibilities.insert(VarKey::new(var), list);
    Clause::new(possibilities, ids, ids, None, None, None, None)
}

fn pair(
    var_a: &str,
    a: TypeAssertion,
    var_b: &str,
    b: TypeAssertion,
    ids: (u32, u32),
) -> Clause<TypeAssertion> {
    let mut possibilities = BTreeMap::new();
    possibilities.insert(VarKey::new(var_a), unit_possibilities(&a));
    possibilities.insert(VarKey::new(var_b), unit_possibilities(&b));
    Clause::new(possibilities, ids, ids, None, None, None, None)
}

// (a) && (a || b) => (a)
#[test]
fn simplify_unit_resolution_collapses_to_unit() {
    let unit_a = unit("a", TypeAssertion::Truthy, (1, 1));
    let a_or_b = pair("a", TypeAssertion::Truthy, "b", TypeAssertion::Truthy, (2, 2));

    let simplified = simplify_cnf(&[unit_a, a_or_b]);

    // (a) subsumes (a || b), so only the unit clause on a survives
    assert_eq!(simplified.len(), 1);
    assert_eq!(simplified[0].render(), "a is truthy");
}

// (!a) && (a || b) => (!a) && (b): the unit clause strips its own literal out
// of every other clause mentioning the same var.
#[test]
fn simplify_strips_resolved_literal_from_disjunction() {
    let not_a = unit("a", TypeAssertion::Falsy, (1, 1));
    let a_or_b = pair("a", TypeAssertion::Truthy, "b", TypeAssertion::Truthy, (2, 2));

    let simplified = simplify_cnf(&[not_a, a_or_b]);

    assert_eq!(simplified.len(), 2);
    assert!(simplified
        .iter()
        .any(|c| c.possibilities.len() == 1 && c.possibilities.contains_key(&VarKey::new("a"))));
    let b_clause = simplified
        .iter()
        .find(|c| c.possibilities.contains_key(&VarKey::new("b")))
        .expect("expected a clause isolating b");
    assert_eq!(b_clause.possibilities.len(), 1, "a's literal should have been stripped out");
}

// (!a) && (!b) && (a || b || c): each unit clause independently strips its
// own var out of the wide disjunction, leaving two partially-resolved
// clauses rather than the fully minimal single unit on c — the heuristic
// doesn't re-visit clauses it has already generated within one pass (see
// the simplifier's own docs on order sensitivity), though a second pass
// over its own output does converge further.
#[test]
fn simplify_wide_disjunction_needs_a_second_pass_to_fully_resolve() {
    let not_a = unit("a", TypeAssertion::Falsy, (1, 1));
    let not_b = unit("b", TypeAssertion::Falsy, (2, 2));

    let mut wide_possibilities = BTreeMap::new();
    wide_possibilities.insert(VarKey::new("a"), unit_possibilities(&TypeAssertion::Truthy));
    wide_possibilities.insert(VarKey::new("b"), unit_possibilities(&TypeAssertion::Truthy));
    wide_possibilities.insert(VarKey::new("c"), unit_possibilities(&TypeAssertion::Truthy));
    let wide = Clause::new(wide_possibilities, (3, 3), (3, 3), None, None, None, None);

    let once = simplify_cnf(&[not_a, not_b, wide]);
    assert_eq!(once.len(), 4);

    let twice = simplify_cnf(&once);
    assert_eq!(twice.len(), 3);
    assert!(twice
        .iter()
        .any(|c| c.possibilities.len() == 1 && c.possibilities.contains_key(&VarKey::new("c"))));
}

// (a || x) && (!a || y) && (x || y) => (a || x) && (!a || y)
#[test]
fn simplify_three_way_resolution_drops_redundant_clause() {
    let clause_1 = pair("a", TypeAssertion::Truthy, "x", TypeAssertion::Truthy, (1, 1));
    let clause_2 = pair("a", TypeAssertion::Falsy, "y", TypeAssertion::Truthy, (2, 2));
    let clause_3 = pair("x", TypeAssertion::Truthy, "y", TypeAssertion::Truthy, (3, 3));

    let simplified = simplify_cnf(&[clause_1.clone(), clause_2.clone(), clause_3]);

    assert_eq!(simplified.len(), 2);
    assert!(simplified.contains(&clause_1));
    assert!(simplified.contains(&clause_2));
}

#[test]
fn simplify_is_idempotent() {
    let not_a = unit("a", TypeAssertion::Falsy, (1, 1));
    let a_or_b = pair("a", TypeAssertion::Truthy, "b", TypeAssertion::Truthy, (2, 2));

    let once = simplify_cnf(&[not_a, a_or_b]);
    let twice = simplify_cnf(&once);

    assert_eq!(once.len(), twice.len());
    for clause in &once {
        assert!(twice.contains(clause));
    }
}

#[test]
fn simplify_returns_empty_past_hard_clause_limit() {
    let _ = env_logger::try_init();

    let clauses: Vec<Clause<TypeAssertion>> = (0..65_537)
        .map(|i| unit(&format!("v{i}"), TypeAssertion::Truthy, (i as u32, i as u32)))
        .collect();

    let simplified = simplify_cnf(&clauses);

    assert!(simplified.is_empty());
}

#[test]
fn wedge_clauses_never_participate_in_resolution() {
    // a and b share no var, so neither resolves against the other; the
    // wedge alongside them must survive untouched rather than being
    // folded into either (wedges neither subsume nor are subsumed).
    let a = unit("a", TypeAssertion::Truthy, (1, 1));
    let b = unit("b", TypeAssertion::Truthy, (2, 2));
    let wedge = crate::clause::wedge_clause::<TypeAssertion>((9, 9));

    let simplified = simplify_cnf(&[a, b, wedge.clone()]);

    assert!(simplified.iter().any(|c| c.wedge));
    assert_eq!(simplified.len(), 3);
}

#[test]
fn negate_conjunction_of_units_yields_single_disjunction() {
    // negate_formula([a, b, c]) => (!a || !b || !c)
    let a = unit("a", TypeAssertion::Truthy, (1, 1));
    let b = unit("b", TypeAssertion::Truthy, (2, 2));
    let c = unit("c", TypeAssertion::Truthy, (3, 3));

    let negated = negate_formula(vec![a, b, c]).expect("small formula must not overflow");

    assert_eq!(negated.len(), 1);
    let clause = &negated[0];
    assert_eq!(clause.possibilities.len(), 3);
    for values in clause.possibilities.values() {
        assert_eq!(values.values().next().unwrap(), &TypeAssertion::Falsy);
    }
}

#[test]
fn negate_conjunction_with_disjunction_distributes() {
    // negate_formula([a, b || c]) => (!a || !b) && (!a || !c)
    let a = unit("a", TypeAssertion::Truthy, (1, 1));
    let bc = pair("b", TypeAssertion::Truthy, "c", TypeAssertion::Truthy, (2, 2));

    let negated = negate_formula(vec![a, bc]).expect("small formula must not overflow");

    assert_eq!(negated.len(), 2);
    for clause in &negated {
        assert_eq!(clause.possibilities.len(), 2);
        assert!(clause.possibilities.contains_key(&VarKey::new("a")));
    }
}

#[test]
fn negate_formula_is_an_involution_up_to_equivalence() {
    let a = unit("a", TypeAssertion::Truthy, (1, 1));
    let b = unit("b", TypeAssertion::Truthy, (2, 2));

    let once = negate_formula(vec![a.clone(), b.clone()]).unwrap();
    let twice = negate_formula(once).unwrap();
    let simplified_original = simplify_cnf(&[a, b]);

    assert_eq!(twice.len(), simplified_original.len());
}

#[test]
fn negate_formula_on_no_reconcilable_clauses_returns_wedge() {
    let mut possibilities = BTreeMap::new();
    possibilities.insert(VarKey::new("a"), unit_possibilities(&TypeAssertion::Truthy));
    let unreconcilable =
        Clause::new(possibilities, (1, 1), (1, 1), None, Some(false), None, None);

    let negated = negate_formula(vec![unreconcilable]).unwrap();

    assert_eq!(negated.len(), 1);
    assert!(negated[0].wedge);
}

#[test]
fn grouper_overflow_is_reported_as_complicated_expression() {
    let _ = env_logger::try_init();

    // Five clauses with 10 alternatives each: 10^5 = 100,000 > 20,000.
    let clauses: Vec<Clause<TypeAssertion>> = (0..5)
        .map(|i| {
            let assertions: Vec<TypeAssertion> = (0..10)
                .map(|j| TypeAssertion::IsType(format!("T{i}_{j}")))
                .collect();
            disjunction(&format!("v{i}"), &assertions, (i as u32, i as u32))
        })
        .collect();

    let result = negate_formula(clauses);

    assert_eq!(result, Err(crate::error::Error::ComplicatedExpression));
}

#[test]
fn truths_extracts_unit_facts_per_variable() {
    let a = unit("a", TypeAssertion::Truthy, (1, 1));
    let bc = {
        let mut possibilities = BTreeMap::new();
        let mut list = IndexMap::new();
        list.insert(
            crate::assertion::render_hash(&TypeAssertion::IsType("string".into())),
            TypeAssertion::IsType("string".into()),
        );
        list.insert(
            crate::assertion::render_hash(&TypeAssertion::IsType("int".into())),
            TypeAssertion::IsType("int".into()),
        );
        possibilities.insert(VarKey::new("b"), list);
        Clause::new(possibilities, (2, 2), (2, 2), None, None, None, None)
    };

    let mut referenced = FxHashSet::default();
    referenced.insert(VarKey::new("a"));
    referenced.insert(VarKey::new("b"));

    let (truths, active) = truths_from_formula(&[a, bc], Some((1, 1)), &mut referenced);

    assert_eq!(truths[&VarKey::new("a")], vec![vec![TypeAssertion::Truthy]]);
    assert_eq!(
        truths[&VarKey::new("b")][0].len(),
        2,
        "both alternatives for b should be recorded as one disjunctive truth"
    );
    assert!(active.get(&VarKey::new("a")).is_some());
    assert!(active.get(&VarKey::new("b")).is_none());
}

#[test]
fn truths_skips_mixed_positive_and_negative_disjunction() {
    let mut possibilities = BTreeMap::new();
    let mut list = IndexMap::new();
    list.insert(
        crate::assertion::render_hash(&TypeAssertion::IsType("string".into())),
        TypeAssertion::IsType("string".into()),
    );
    list.insert(
        crate::assertion::render_hash(&TypeAssertion::IsNotType("int".into())),
        TypeAssertion::IsNotType("int".into()),
    );
    possibilities.insert(VarKey::new("b"), list);
    let clause = Clause::new(possibilities, (1, 1), (1, 1), None, None, None, None);

    let mut referenced = FxHashSet::default();
    let (truths, _) = truths_from_formula(&[clause], None, &mut referenced);

    assert!(!truths.contains_key(&VarKey::new("b")));
}

#[test]
fn redefined_vars_overrides_rather_than_appends() {
    let first = unit("a", TypeAssertion::Truthy, (1, 1));

    let mut possibilities = BTreeMap::new();
    possibilities.insert(VarKey::new("a"), unit_possibilities(&TypeAssertion::Falsy));
    let mut redefined = FxHashSet::default();
    redefined.insert(VarKey::new("a"));
    let second = Clause::new(
        possibilities,
        (2, 2),
        (2, 2),
        None,
        None,
        None,
        Some(redefined),
    );

    let mut referenced = FxHashSet::default();
    let (truths, _) = truths_from_formula(&[first, second], None, &mut referenced);

    assert_eq!(truths[&VarKey::new("a")], vec![vec![TypeAssertion::Falsy]]);
}

#[test]
fn combine_ored_clauses_is_commutative_up_to_order() {
    let left = vec![
        unit("a", TypeAssertion::Truthy, (1, 1)),
        unit("b", TypeAssertion::Truthy, (1, 1)),
    ];
    let right = vec![
        unit("a", TypeAssertion::Falsy, (1, 1)),
        unit("c", TypeAssertion::Truthy, (1, 1)),
    ];

    let forward = combine_ored_clauses(&left, &right, (1, 1));
    let backward = combine_ored_clauses(&right, &left, (1, 1));

    assert_eq!(forward.len(), backward.len());
    for clause in &forward {
        assert!(backward.contains(clause));
    }
}

#[test]
fn combine_ored_clauses_drops_tautological_pairs() {
    let left = vec![unit("a", TypeAssertion::Truthy, (1, 1))];
    let right = vec![unit("a", TypeAssertion::Falsy, (1, 1))];

    let combined = combine_ored_clauses(&left, &right, (1, 1));

    assert!(combined.is_empty());
}

#[test]
fn combine_ored_clauses_all_wedges_collapses_to_one_wedge() {
    let left = vec![crate::clause::wedge_clause::<TypeAssertion>((1, 1))];
    let right = vec![crate::clause::wedge_clause::<TypeAssertion>((2, 2))];

    let combined = combine_ored_clauses(&left, &right, (3, 3));

    assert_eq!(combined.len(), 1);
    assert!(combined[0].wedge);
}

#[test]
fn negate_types_handles_pure_conjunction_of_literals() {
    let mut types = rustc_hash::FxHashMap::default();
    types.insert(
        VarKey::new("a"),
        vec![
            vec![TypeAssertion::IsType("string".into())],
            vec![TypeAssertion::IsType("int".into())],
        ],
    );

    let negated = negate_types(types);

    let groups = &negated[&VarKey::new("a")];
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0], vec![TypeAssertion::IsNotType("string".into())]);
    assert_eq!(groups[1], vec![TypeAssertion::IsNotType("int".into())]);
}

#[test]
fn negate_types_handles_pure_disjunction() {
    let mut types = rustc_hash::FxHashMap::default();
    types.insert(
        VarKey::new("a"),
        vec![vec![
            TypeAssertion::IsType("string".into()),
            TypeAssertion::IsType("int".into()),
        ]],
    );

    let negated = negate_types(types);

    let groups = &negated[&VarKey::new("a")];
    assert_eq!(groups.len(), 2);
    assert!(groups.contains(&vec![TypeAssertion::IsNotType("string".into())]));
    assert!(groups.contains(&vec![TypeAssertion::IsNotType("int".into())]));
}

#[test]
fn negate_types_drops_genuinely_mixed_shapes() {
    let mut types = rustc_hash::FxHashMap::default();
    types.insert(
        VarKey::new("a"),
        vec![
            vec![
                TypeAssertion::IsType("string".into()),
                TypeAssertion::IsType("int".into()),
            ],
            vec![TypeAssertion::IsType("bool".into())],
        ],
    );

    let negated = negate_types(types);

    assert!(!negated.contains_key(&VarKey::new("a")));
}
