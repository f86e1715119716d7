use super::*;
use probalog_ast::Atom;
use probalog_formula::{Label, LogicFormula};

fn atom(name: &str) -> Atom {
    Atom::new(name, vec![])
}

fn satisfies(clauses: &[Vec<i32>], model: &[i32]) -> bool {
    clauses
        .iter()
        .all(|clause| clause.iter().any(|lit| model.contains(lit)))
}

#[test]
fn test_tseitin_cnf_is_satisfiable() {
    let mut formula = LogicFormula::new();
    let a = formula.add_atom(atom("a"), 0.25, None);
    let b = formula.add_atom(atom("b"), 0.5, None);
    let q = formula.add_and(vec![a, b.negate()]);
    formula.add_name(atom("q"), q, Label::Query);
    let cnf = Cnf::encode(&formula);

    let model = cnf.solve(&[]).unwrap().expect("should be satisfiable");
    assert_eq!(model.len(), 3);
    assert!(satisfies(cnf.clauses(), &model));

    // q forces a and not b
    let model = cnf.solve(&[3]).unwrap().expect("q should be satisfiable");
    assert!(model.contains(&1));
    assert!(model.contains(&-2));

    assert!(!cnf.is_satisfiable(&[3, 2]).unwrap());
    assert!(cnf.is_satisfiable(&[-3, 2]).unwrap());
}

#[test]
fn test_group_members_are_exclusive() {
    let mut formula = LogicFormula::new();
    let (_, members) = formula.add_group(vec![(atom("red"), 0.2), (atom("blue"), 0.5)]);
    let either = formula.add_or(members.clone());
    formula.add_name(atom("either"), either, Label::Query);
    let cnf = Cnf::encode(&formula);

    assert!(cnf.is_satisfiable(&[1]).unwrap());
    assert!(!cnf.is_satisfiable(&[1, 2]).unwrap());
    // neither member: only "none" remains
    let none = cnf.num_vars() as i32;
    assert!(cnf.is_satisfiable(&[-1, -2]).unwrap());
    assert!(!cnf.is_satisfiable(&[-1, -2, -none]).unwrap());
}

#[test]
fn test_empty_cnf_is_satisfiable() {
    let mut formula = LogicFormula::new();
    let a = formula.add_atom(atom("a"), 0.5, None);
    formula.add_name(atom("a"), a, Label::Query);
    let cnf = Cnf::encode(&formula);

    assert!(cnf.clauses().is_empty());
    assert_eq!(cnf.solve(&[]).unwrap(), Some(vec![1]));
    assert!(cnf.is_satisfiable(&[-1]).unwrap());
}
