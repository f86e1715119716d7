use super::*;
use probalog_ast::Atom;
use probalog_formula::{Label, LogicFormula, NodeRef};

fn atom(name: &str) -> Atom {
    Atom::new(name, vec![])
}

/// q = a AND NOT b
fn conjunction() -> LogicFormula {
    let mut formula = LogicFormula::new();
    let a = formula.add_atom(atom("a"), 0.25, None);
    let b = formula.add_atom(atom("b"), 0.5, None);
    let q = formula.add_and(vec![a, b.negate()]);
    formula.add_name(atom("q"), q, Label::Query);
    formula
}

fn gate_count(cnf: &Cnf) -> usize {
    (1..=cnf.num_vars() as i32)
        .filter(|v| matches!(cnf.kind(*v), Some(VarKind::Gate { .. })))
        .count()
}

#[test]
fn test_and_gate_clauses() {
    let cnf = Cnf::encode(&conjunction());
    assert_eq!(cnf.num_vars(), 3);
    assert_eq!(
        cnf.clauses(),
        &[vec![-3, 1], vec![-3, -2], vec![3, -1, 2]]
    );
    assert_eq!(cnf.queries().next().unwrap().literal, CnfLit::Lit(3));
    assert_eq!(
        cnf.weight(1),
        Some(Weight {
            positive: 0.25,
            negative: 0.75
        })
    );
    assert_eq!(
        cnf.weight(3),
        Some(Weight {
            positive: 1.0,
            negative: 1.0
        })
    );
}

#[test]
fn test_or_gate_clauses() {
    let mut formula = LogicFormula::new();
    let a = formula.add_atom(atom("a"), 0.25, None);
    let b = formula.add_atom(atom("b"), 0.5, None);
    let q = formula.add_or(vec![a, b]);
    formula.add_name(atom("q"), q.negate(), Label::EvidenceNegative);

    let cnf = Cnf::encode(&formula);
    assert_eq!(cnf.clauses(), &[vec![3, -1], vec![3, -2], vec![-3, 1, 2]]);
    let evidence: Vec<_> = cnf.evidence().collect();
    assert_eq!(evidence[0].literal, CnfLit::Lit(-3));
    assert_eq!(evidence[0].label, Label::EvidenceNegative);
}

#[test]
fn test_group_is_encoded_whole() {
    let mut formula = LogicFormula::new();
    let (group, members) = formula.add_group(vec![(atom("red"), 0.2), (atom("blue"), 0.5)]);
    formula.add_name(atom("red"), members[0], Label::Query);

    let cnf = Cnf::encode(&formula);
    assert_eq!(cnf.num_vars(), 3);
    assert_eq!(
        cnf.clauses(),
        &[vec![1, 2, 3], vec![-1, -2], vec![-1, -3], vec![-2, -3]]
    );
    assert_eq!(cnf.weight(1).unwrap().negative, 1.0);
    assert_eq!(cnf.weight(2).unwrap().positive, 0.5);
    match cnf.kind(3) {
        Some(VarKind::GroupNone { group: g, residual }) => {
            assert_eq!(*g, group);
            assert!((residual - 0.3).abs() < 1e-12);
        }
        other => panic!("expected a none variable, got {:?}", other),
    }
}

#[test]
fn test_full_group_has_no_none_variable() {
    let mut formula = LogicFormula::new();
    let (_, members) = formula.add_group(vec![(atom("heads"), 0.5), (atom("tails"), 0.5)]);
    formula.add_name(atom("heads"), members[0], Label::Query);

    let cnf = Cnf::encode(&formula);
    assert_eq!(cnf.num_vars(), 2);
    assert_eq!(cnf.clauses(), &[vec![1, 2], vec![-1, -2]]);
}

#[test]
fn test_shared_nodes_get_one_variable() {
    let mut formula = LogicFormula::new();
    let a = formula.add_atom(atom("a"), 0.5, None);
    let b = formula.add_atom(atom("b"), 0.5, None);
    let c = formula.add_atom(atom("c"), 0.5, None);
    let d = formula.add_atom(atom("d"), 0.5, None);
    let x = formula.add_and(vec![a, b]);
    let y = formula.add_or(vec![x, c]);
    let z = formula.add_and(vec![x, d]);
    formula.add_name(atom("y"), y, Label::Query);
    formula.add_name(atom("z"), z, Label::Query);

    let cnf = Cnf::encode(&formula);
    assert_eq!(cnf.num_vars(), 7);
    assert_eq!(gate_count(&cnf), 3);
    let x_var = cnf.var_of(x.node().unwrap()).unwrap();
    let uses = cnf
        .clauses()
        .iter()
        .filter(|clause| clause.contains(&x_var) || clause.contains(&-x_var))
        .count();
    // 3 clauses defining x, 2 for each parent
    assert_eq!(uses, 3 + 2 + 2);
}

#[test]
fn test_unreachable_nodes_and_constant_names() {
    let mut formula = LogicFormula::new();
    let a = formula.add_atom(atom("a"), 0.5, None);
    formula.add_atom(atom("unused"), 0.5, None);
    formula.add_name(atom("a"), a, Label::Query);
    formula.add_name(atom("yes"), NodeRef::True, Label::Query);
    formula.add_name(atom("no"), NodeRef::False, Label::EvidencePositive);

    let cnf = Cnf::encode(&formula);
    assert_eq!(cnf.num_vars(), 1);
    assert!(cnf.clauses().is_empty());
    assert_eq!(cnf.lookup(&atom("yes")), Some(CnfLit::True));
    assert_eq!(cnf.lookup(&atom("no")), Some(CnfLit::False));
    assert_eq!(cnf.lookup(&atom("unused")), None);
}

#[test]
fn test_lookup_prefers_names_then_atoms() {
    let mut formula = conjunction();
    let q = formula.lookup(&atom("q")).unwrap();
    formula.add_name(atom("not_q"), q.negate(), Label::Query);

    let cnf = Cnf::encode(&formula);
    assert_eq!(cnf.lookup(&atom("not_q")), Some(CnfLit::Lit(-3)));
    assert_eq!(cnf.lookup(&atom("b")), Some(CnfLit::Lit(2)));
    assert_eq!(cnf.lookup(&atom("c")), None);
}

#[test]
fn test_dimacs_output() {
    let cnf = Cnf::encode(&conjunction());
    let expected = "\
c query q 3
c weight 1 0.25 0.75 a
c weight 2 0.5 0.5 b
p cnf 3 3
-3 1 0
-3 -2 0
3 -1 2 0
";
    assert_eq!(cnf.to_dimacs(), expected);
}
