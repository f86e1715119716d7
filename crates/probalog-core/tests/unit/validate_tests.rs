use super::*;

fn var(name: &str) -> Term {
    Term::variable(name)
}

fn int(n: i64) -> Term {
    Term::integer(n)
}

fn pos(pred: &str, terms: Vec<Term>) -> Literal {
    Literal::Positive(Atom::new(pred, terms))
}

fn neg(pred: &str, terms: Vec<Term>) -> Literal {
    Literal::Negative(Atom::new(pred, terms))
}

#[test]
fn test_valid_program() {
    let mut program = Program::new();
    program
        .probabilistic_fact(0.6, Atom::new("edge", vec![int(1), int(2)]))
        .rule(
            Atom::new("path", vec![var("X"), var("Y")]),
            vec![pos("edge", vec![var("X"), var("Y")])],
        )
        .rule(
            Atom::new("far", vec![var("X"), var("Y")]),
            vec![
                pos("path", vec![var("X"), var("Z")]),
                pos("is", vec![var("Y"), Term::compound("+", vec![var("Z"), int(1)])]),
                neg("edge", vec![var("X"), var("Y")]),
            ],
        )
        .annotated_disjunction(
            vec![
                (0.5, Atom::new("heads", vec![var("C")])),
                (0.5, Atom::new("tails", vec![var("C")])),
            ],
            vec![pos("coin", vec![var("C")])],
        )
        .query(Atom::new("path", vec![int(1), var("Y")]))
        .evidence(Atom::new("edge", vec![int(1), int(2)]), true);

    assert_eq!(validate_program(&program), Ok(()));
}

#[test]
fn test_invalid_weights() {
    for weight in [1.5, -0.1, f64::NAN] {
        let mut program = Program::new();
        program.probabilistic_fact(weight, Atom::new("a", vec![]));
        assert!(matches!(
            validate_program(&program),
            Err(ProgramError::InvalidWeight { .. })
        ));
    }

    let mut program = Program::new();
    program
        .probabilistic_fact(0.0, Atom::new("a", vec![]))
        .probabilistic_fact(1.0, Atom::new("b", vec![]));
    assert_eq!(validate_program(&program), Ok(()));
}

#[test]
fn test_annotated_disjunction_mass() {
    let mut program = Program::new();
    program.annotated_disjunction(
        vec![(0.7, Atom::new("a", vec![])), (0.4, Atom::new("b", vec![]))],
        vec![],
    );
    match validate_program(&program) {
        Err(ProgramError::DisjunctionMass { total, .. }) => assert!((total - 1.1).abs() < 1e-9),
        other => panic!("expected mass error, got {:?}", other),
    }

    let mut program = Program::new();
    program.annotated_disjunction(vec![], vec![]);
    assert!(matches!(
        validate_program(&program),
        Err(ProgramError::EmptyDisjunction { .. })
    ));
}

#[test]
fn test_disjunction_mass_tolerance() {
    let mut program = Program::new();
    program.annotated_disjunction(
        vec![
            (0.1, Atom::new("a", vec![])),
            (0.2, Atom::new("b", vec![])),
            (0.7, Atom::new("c", vec![])),
        ],
        vec![],
    );
    assert_eq!(validate_program(&program), Ok(()));
}

#[test]
fn test_unsafe_head_variable() {
    let mut program = Program::new();
    program.rule(
        Atom::new("bad", vec![var("X"), var("Y")]),
        vec![pos("p", vec![var("X")])],
    );

    match validate_program(&program) {
        Err(ProgramError::UnsafeClause { variables, clause }) => {
            assert_eq!(variables, vec!["Y".to_string()]);
            assert!(clause.starts_with("bad(X,Y)"));
        }
        other => panic!("expected unsafe clause, got {:?}", other),
    }
}

#[test]
fn test_unsafe_negation() {
    let mut program = Program::new();
    program.rule(
        Atom::new("lonely", vec![]),
        vec![neg("friend", vec![var("X")])],
    );
    assert!(matches!(
        validate_program(&program),
        Err(ProgramError::UnsafeClause { .. })
    ));
}

#[test]
fn test_comparison_does_not_bind() {
    let mut program = Program::new();
    program.rule(
        Atom::new("small", vec![var("X")]),
        vec![pos("<", vec![var("X"), int(3)])],
    );
    assert!(matches!(
        validate_program(&program),
        Err(ProgramError::UnsafeClause { .. })
    ));
}

#[test]
fn test_unification_chain_binds() {
    let mut program = Program::new();
    program.rule(
        Atom::new("shifted", vec![var("Y")]),
        vec![
            pos("=", vec![var("Y"), var("Z")]),
            pos("base", vec![var("X")]),
            pos("is", vec![var("Z"), Term::compound("*", vec![var("X"), int(2)])]),
        ],
    );
    assert_eq!(validate_program(&program), Ok(()));
}

#[test]
fn test_non_ground_evidence() {
    let mut program = Program::new();
    program.evidence(Atom::new("p", vec![var("X")]), true);
    assert!(matches!(
        validate_program(&program),
        Err(ProgramError::NonGroundEvidence { .. })
    ));
}

#[test]
fn test_builtin_head() {
    let mut program = Program::new();
    program.fact(Atom::new("true", vec![]));
    assert!(matches!(
        validate_program(&program),
        Err(ProgramError::BuiltinHead { .. })
    ));
}

#[test]
fn test_non_ground_fact_is_unsafe() {
    let mut program = Program::new();
    program.probabilistic_fact(0.5, Atom::new("coin", vec![var("X")]));
    assert!(matches!(
        validate_program(&program),
        Err(ProgramError::UnsafeClause { .. })
    ));
}
